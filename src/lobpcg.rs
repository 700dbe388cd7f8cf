use nalgebra::{stack, DMatrix, DVector};
use crate::errors::EigenError;
use crate::operator::{LinearOperator, ensure_compatible};
use crate::options::IterationOptions;
use crate::orth::orthonormalize_drop;
use crate::power::normalized_start;
use crate::preconditioner::Preconditioner;
use crate::rayleigh::{rayleigh_ritz_orthonormal, BASIS_DROP_TOL};
use crate::results::{column_residual_norms, BlockEigenResult, BlockHistory, ConvergenceHistory, EigenResult};
use crate::subspace::prepare_block;

/// Single-vector LOPCG for the smallest eigenpair.
pub fn lopcg<O, P>(
    a: &O,
    x0: &DVector<f64>,
    preconditioner: &P,
    opts: &IterationOptions,
) -> Result<EigenResult, EigenError>
where
    O: LinearOperator + ?Sized,
    P: Preconditioner + ?Sized,
{
    opts.validate()?;
    ensure_compatible(a, x0.len())?;
    let mut x = normalized_start(x0)?;
    let mut p: Option<DVector<f64>> = None;

    let mut history = ConvergenceHistory::with_capacity(opts.maxiter);
    let mut rho = 0.0;
    let mut residual_norm = f64::INFINITY;
    let mut converged = false;
    let mut iterations = 0;

    for k in 1..=opts.maxiter {
        let ax = a.apply_vector(&x);
        rho = x.dot(&ax);
        let r = &ax - &x * rho;
        residual_norm = r.norm();
        history.push(rho, residual_norm);
        iterations = k;
        log::trace!("LOPCG iteration {k}: ρ = {rho:.12e}, ‖r‖ = {residual_norm:.3e}");

        if residual_norm < opts.tol {
            converged = true;
            break;
        }
        if k == opts.maxiter {
            break;
        }

        let w = preconditioner.apply_vector(&r);
        let mut columns = vec![x.clone(), w];
        if let Some(dir) = p.take() {
            columns.push(dir);
        }
        let z = orthonormalize_drop(&DMatrix::from_columns(&columns), BASIS_DROP_TOL)?;
        let ritz = rayleigh_ritz_orthonormal(a, &z).smallest(1);

        let mut x_new = ritz.vectors.column(0).into_owned();
        x_new /= x_new.norm();
        let dir = &x_new - &x * x.dot(&x_new);
        p = if dir.norm() > 0.0 { Some(dir) } else { None };
        x = x_new;
    }

    opts.report("LOPCG", converged, iterations, residual_norm);
    Ok(EigenResult {
        eigenvalue: rho,
        eigenvector: x,
        converged,
        iterations,
        history,
    })
}

/// Block LOPCG for the `m = x0.ncols()` smallest eigenpairs.
///
/// Converged columns are soft-locked: they stay in the block but their
/// residuals no longer contribute search directions.
pub fn lobpcg<O, P>(
    a: &O,
    x0: &DMatrix<f64>,
    preconditioner: &P,
    opts: &IterationOptions,
) -> Result<BlockEigenResult, EigenError>
where
    O: LinearOperator + ?Sized,
    P: Preconditioner + ?Sized,
{
    opts.validate()?;
    let x_start = prepare_block(a, x0)?;
    let m = x_start.ncols();

    let initial = rayleigh_ritz_orthonormal(a, &x_start);
    let mut x = initial.vectors;
    let mut values = initial.values;
    let mut p: Option<DMatrix<f64>> = None;

    let mut history = BlockHistory::default();
    let mut residuals = vec![f64::INFINITY; m];
    let mut converged = false;
    let mut iterations = 0;

    for k in 1..=opts.maxiter {
        let ax = a.apply(&x);
        residuals = column_residual_norms(&ax, &x, &values);
        history.push(&values, &residuals);
        iterations = k;
        log::trace!(
            "LOBPCG iteration {k}: max ‖r‖ = {:.3e}",
            residuals.iter().copied().fold(0.0, f64::max)
        );

        let active: Vec<usize> = (0..m).filter(|&j| residuals[j] >= opts.tol).collect();
        if active.is_empty() {
            converged = true;
            break;
        }
        if k == opts.maxiter {
            break;
        }

        let r = &ax - &x * DMatrix::from_diagonal(&values);
        let w = preconditioner.apply(&r.select_columns(&active));
        let basis = match p.take() {
            Some(dir) => stack![x.clone(), w, dir],
            None => stack![x.clone(), w],
        };
        let z = orthonormalize_drop(&basis, BASIS_DROP_TOL)?;
        let ritz = rayleigh_ritz_orthonormal(a, &z).smallest(m);

        let x_new = ritz.vectors;
        // Part of the update orthogonal to the old block; spans the same space as W c_w + P c_p
        let dir = &x_new - &x * (x.transpose() * &x_new);
        p = Some(dir);
        x = x_new;
        values = ritz.values;
    }

    opts.report(
        "LOBPCG",
        converged,
        iterations,
        residuals.iter().copied().fold(0.0, f64::max),
    );
    Ok(BlockEigenResult {
        eigenvalues: values,
        eigenvectors: x,
        converged,
        iterations,
        history,
    })
}
