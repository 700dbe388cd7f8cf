use nalgebra::{DMatrix, DVector};
use crate::errors::EigenError;
use crate::operator::{LinearOperator, ensure_compatible};
use crate::options::IterationOptions;
use crate::orth::{orthonormalize, orthonormalize_drop};
use crate::rayleigh::{sorted_symmetric_eigen, BASIS_DROP_TOL};
use crate::results::{column_residual_norms, BlockEigenResult, BlockHistory};

/// Validates a starting block and returns it orthonormalised.
pub(crate) fn prepare_block<O: LinearOperator + ?Sized>(
    a: &O,
    x0: &DMatrix<f64>,
) -> Result<DMatrix<f64>, EigenError> {
    let n = ensure_compatible(a, x0.nrows())?;
    let p = x0.ncols();
    if p == 0 {
        return Err(EigenError::InvalidParameter(
            "The starting block must have at least one column".to_string(),
        ));
    }
    if p > n {
        return Err(EigenError::InvalidParameter(format!(
            "Block size {p} exceeds the problem dimension {n}"
        )));
    }
    let x = orthonormalize_drop(x0, BASIS_DROP_TOL)?;
    if x.ncols() < p {
        return Err(EigenError::InvalidParameter(format!(
            "The starting block has rank {} but {p} columns",
            x.ncols()
        )));
    }
    Ok(x)
}

/// Subspace iteration for the `p = x0.ncols()` eigenvalues of largest magnitude.
///
/// Eigenvalue estimates are the diagonal Rayleigh quotients `xⱼᵀ A xⱼ`; no
/// Rayleigh-Ritz rotation is performed. The iterate keeps its QR column order,
/// but the recorded history and the returned pairs are sorted by decreasing
/// magnitude of the estimate.
pub fn subspace_iteration<O: LinearOperator + ?Sized>(
    a: &O,
    x0: &DMatrix<f64>,
    opts: &IterationOptions,
) -> Result<BlockEigenResult, EigenError> {
    opts.validate()?;
    let mut x = prepare_block(a, x0)?;
    let p = x.ncols();

    let mut history = BlockHistory::default();
    let mut values = DVector::zeros(p);
    let mut residuals = vec![f64::INFINITY; p];
    let mut order: Vec<usize> = (0..p).collect();
    let mut converged = false;
    let mut iterations = 0;

    for k in 1..=opts.maxiter {
        let ax = a.apply(&x);
        let estimates = DVector::from_fn(p, |j, _| x.column(j).dot(&ax.column(j)));
        let column_residuals = column_residual_norms(&ax, &x, &estimates);
        order = magnitude_order(&estimates);
        values = estimates.select_rows(&order);
        residuals = order.iter().map(|&j| column_residuals[j]).collect();
        history.push(&values, &residuals);
        iterations = k;
        log::trace!("subspace iteration {k}: max ‖r‖ = {:.3e}", max_of(&residuals));

        if residuals.iter().all(|&r| r < opts.tol) {
            converged = true;
            break;
        }
        if k == opts.maxiter {
            break;
        }
        x = orthonormalize(&ax);
    }

    opts.report("Subspace iteration", converged, iterations, max_of(&residuals));
    Ok(BlockEigenResult {
        eigenvalues: values,
        eigenvectors: x.select_columns(&order),
        converged,
        iterations,
        history,
    })
}

/// Subspace iteration with a Rayleigh-Ritz projection at every step.
///
/// Ritz pairs are ordered by decreasing magnitude of the Ritz value.
pub fn projected_subspace_iteration<O: LinearOperator + ?Sized>(
    a: &O,
    x0: &DMatrix<f64>,
    opts: &IterationOptions,
) -> Result<BlockEigenResult, EigenError> {
    opts.validate()?;
    let mut x = prepare_block(a, x0)?;
    let p = x.ncols();

    let mut history = BlockHistory::default();
    let mut values = DVector::zeros(p);
    let mut residuals = vec![f64::INFINITY; p];
    let mut converged = false;
    let mut iterations = 0;

    for k in 1..=opts.maxiter {
        let av = a.apply(&x);
        let (theta, y) = sorted_symmetric_eigen(x.transpose() * &av);

        let order = magnitude_order(&theta);
        let y = y.select_columns(&order);
        values = DVector::from_iterator(p, order.iter().map(|&i| theta[i]));

        // Rotating AX alongside X avoids a second application of A
        x = &x * &y;
        let ax = av * &y;
        residuals = column_residual_norms(&ax, &x, &values);
        history.push(&values, &residuals);
        iterations = k;
        log::trace!("projected subspace iteration {k}: max ‖r‖ = {:.3e}", max_of(&residuals));

        if residuals.iter().all(|&r| r < opts.tol) {
            converged = true;
            break;
        }
        if k == opts.maxiter {
            break;
        }
        x = orthonormalize(&ax);
    }

    opts.report("Projected subspace iteration", converged, iterations, max_of(&residuals));
    Ok(BlockEigenResult {
        eigenvalues: values,
        eigenvectors: x,
        converged,
        iterations,
        history,
    })
}

/// Indices that sort `values` by decreasing magnitude.
fn magnitude_order(values: &DVector<f64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| values[j].abs().total_cmp(&values[i].abs()));
    order
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(0.0, f64::max)
}
