use nalgebra::DVector;
use crate::errors::EigenError;
use crate::operator::{LinearOperator, ensure_compatible};
use crate::options::IterationOptions;
use crate::results::{ConvergenceHistory, EigenResult};
use crate::solvers::shifted;

pub(crate) fn normalized_start(x0: &DVector<f64>) -> Result<DVector<f64>, EigenError> {
    let norm = x0.norm();
    if norm == 0.0 || !norm.is_finite() {
        return Err(EigenError::InvalidParameter(
            "The initial vector must be finite and nonzero".to_string(),
        ));
    }
    Ok(x0 / norm)
}

/// Computes the eigenpair of largest magnitude of `a`.
///
/// The eigenvalue estimate at each step is the Rayleigh quotient of the
/// normalised iterate; the method stops once `‖Ax - λx‖ < opts.tol`.
pub fn power_method<O: LinearOperator + ?Sized>(
    a: &O,
    x0: &DVector<f64>,
    opts: &IterationOptions,
) -> Result<EigenResult, EigenError> {
    opts.validate()?;
    ensure_compatible(a, x0.len())?;
    let mut x = normalized_start(x0)?;

    let mut history = ConvergenceHistory::with_capacity(opts.maxiter);
    let mut lambda = 0.0;
    let mut residual_norm = f64::INFINITY;
    let mut converged = false;
    let mut iterations = 0;

    for k in 1..=opts.maxiter {
        let ax = a.apply_vector(&x);
        lambda = x.dot(&ax);
        residual_norm = (&ax - &x * lambda).norm();
        history.push(lambda, residual_norm);
        iterations = k;
        log::trace!("power method iteration {k}: λ = {lambda:.12e}, ‖r‖ = {residual_norm:.3e}");

        if residual_norm < opts.tol {
            converged = true;
            break;
        }
        // Stop before stepping so x stays paired with λ and the recorded residual
        if k == opts.maxiter {
            break;
        }

        let ax_norm = ax.norm();
        if ax_norm == 0.0 {
            // x lies in the kernel, so (0, x) is an exact eigenpair and ‖r‖ = 0 above
            break;
        }
        x = ax / ax_norm;
    }

    opts.report("Power method", converged, iterations, residual_norm);
    Ok(EigenResult {
        eigenvalue: lambda,
        eigenvector: x,
        converged,
        iterations,
        history,
    })
}

/// Computes the eigenpair of `a` whose eigenvalue is closest to `shift`.
///
/// `A - σI` is factorised once; every step is then a pair of triangular solves.
pub fn inverse_iteration<O: LinearOperator + ?Sized>(
    a: &O,
    shift: f64,
    x0: &DVector<f64>,
    opts: &IterationOptions,
) -> Result<EigenResult, EigenError> {
    opts.validate()?;
    ensure_compatible(a, x0.len())?;
    let mut x = normalized_start(x0)?;

    let lu = shifted(&a.to_dense(), shift).lu();
    if !lu.is_invertible() {
        return Err(EigenError::SingularSystem { shift });
    }

    let mut history = ConvergenceHistory::with_capacity(opts.maxiter);
    let mut lambda = shift;
    let mut residual_norm = f64::INFINITY;
    let mut converged = false;
    let mut iterations = 0;

    for k in 1..=opts.maxiter {
        let ax = a.apply_vector(&x);
        lambda = x.dot(&ax);
        residual_norm = (&ax - &x * lambda).norm();
        history.push(lambda, residual_norm);
        iterations = k;
        log::trace!("inverse iteration {k}: λ = {lambda:.12e}, ‖r‖ = {residual_norm:.3e}");

        if residual_norm < opts.tol {
            converged = true;
            break;
        }
        if k == opts.maxiter {
            break;
        }

        let y = lu.solve(&x).ok_or(EigenError::SingularSystem { shift })?;
        let y_norm = y.norm();
        if !y_norm.is_finite() {
            return Err(EigenError::SingularSystem { shift });
        }
        x = y / y_norm;
    }

    opts.report("Inverse iteration", converged, iterations, residual_norm);
    Ok(EigenResult {
        eigenvalue: lambda,
        eigenvector: x,
        converged,
        iterations,
        history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, dmatrix, dvector};
    use crate::test_assist::matrix_with_spectrum;
    use crate::bounds::ErrorBounds;
    use crate::rayleigh::{rayleigh_quotient, residual_norm};

    #[test]
    fn test_power_method_finds_dominant_eigenvalue() {
        let a = matrix_with_spectrum(&[1.0, 2.0, 3.0, 4.0, 10.0], 3);
        let x0 = DVector::from_element(5, 1.0);
        let opts = IterationOptions::default().with_tol(1e-10).with_maxiter(500);
        let result = power_method(&a, &x0, &opts).unwrap();
        assert!(result.converged);
        assert_relative_eq!(result.eigenvalue, 10.0, epsilon = 1e-9);
        assert_relative_eq!(result.eigenvector.norm(), 1.0, epsilon = 1e-12);
        assert!(residual_norm(&a, result.eigenvalue, &result.eigenvector) < 1e-10);
        assert_eq!(result.history.len(), result.iterations);
    }

    #[test]
    fn test_power_method_contraction_rate() {
        let a = DMatrix::from_diagonal(&dvector![1.0, 5.0, 10.0]);
        let x0 = dvector![1.0, 1.0, 1.0];
        let opts = IterationOptions::default().with_tol(1e-8).with_maxiter(200);
        let result = power_method(&a, &x0, &opts).unwrap();
        let factors = result.history.contraction_factors();
        // Late contraction factors approach |λ₂/λ₁| = 0.5
        let last = factors[factors.len() - 2];
        assert_relative_eq!(last, 0.5, epsilon = 1e-3);
    }

    #[test]
    fn test_power_method_negative_dominant() {
        let a = DMatrix::from_diagonal(&dvector![-6.0, 1.0, 2.0]);
        let x0 = dvector![1.0, 1.0, 1.0];
        let result = power_method(&a, &x0, &IterationOptions::default().with_maxiter(200)).unwrap();
        assert!(result.converged);
        assert_relative_eq!(result.eigenvalue, -6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_power_method_reports_non_convergence() {
        let a = DMatrix::from_diagonal(&dvector![1.0, 0.99, 0.5]);
        let x0 = dvector![1.0, 1.0, 1.0];
        let opts = IterationOptions::default().with_maxiter(5);
        let result = power_method(&a, &x0, &opts).unwrap();
        assert!(!result.converged);
        assert_eq!(result.iterations, 5);
        assert_eq!(result.history.len(), 5);
    }

    #[test]
    fn test_capped_power_method_returns_matching_pair() {
        let a = DMatrix::from_diagonal(&dvector![1.0, 5.0, 10.0]);
        let x0 = dvector![1.0, 1.0, 1.0];
        for maxiter in [6, 10, 15, 20] {
            let opts = IterationOptions::default().with_tol(1e-14).with_maxiter(maxiter);
            let result = power_method(&a, &x0, &opts).unwrap();
            assert!(!result.converged);
            let v = &result.eigenvector;
            assert_relative_eq!(result.eigenvalue, rayleigh_quotient(&a, v).unwrap(), max_relative = 1e-14);
            let recorded = *result.history.residual_norms.last().unwrap();
            assert_relative_eq!(residual_norm(&a, result.eigenvalue, v), recorded, max_relative = 1e-10);
            // λ₁ - λ₂ = 5 bounds the gap from below
            let bounds = ErrorBounds::for_pair(&a, result.eigenvalue, v, Some(4.9)).unwrap();
            assert!((result.eigenvalue - 10.0).abs() <= bounds.eigenvalue_bound());
        }
    }

    #[test]
    fn test_unbounded_iteration_limit() {
        let a = DMatrix::from_diagonal(&dvector![1.0, 2.0]);
        let opts = IterationOptions::default().with_maxiter(usize::MAX);
        let result = power_method(&a, &dvector![0.0, 1.0], &opts).unwrap();
        assert!(result.converged);
        assert_eq!(result.iterations, 1);
        assert_relative_eq!(result.eigenvalue, 2.0);
    }

    #[test]
    fn test_power_method_rejects_bad_input() {
        let a = dmatrix![1.0, 0.0; 0.0, 2.0];
        let opts = IterationOptions::default();
        assert!(power_method(&a, &dvector![0.0, 0.0], &opts).is_err());
        assert!(matches!(
            power_method(&a, &dvector![1.0, 1.0, 1.0], &opts),
            Err(EigenError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_inverse_iteration_targets_shift() {
        let a = matrix_with_spectrum(&[1.0, 2.0, 3.0, 4.0, 10.0], 8);
        let x0 = DVector::from_element(5, 1.0);
        let result = inverse_iteration(&a, 2.9, &x0, &IterationOptions::default()).unwrap();
        assert!(result.converged);
        assert_relative_eq!(result.eigenvalue, 3.0, epsilon = 1e-9);
        // |3 - 2.9| / |2 - 2.9| ≈ 0.11, so few iterations are needed
        assert!(result.iterations < 20);
    }

    #[test]
    fn test_inverse_iteration_singular_shift() {
        let a = DMatrix::from_diagonal(&dvector![1.0, 2.0]);
        let x0 = dvector![1.0, 1.0];
        assert_eq!(
            inverse_iteration(&a, 2.0, &x0, &IterationOptions::default()).unwrap_err(),
            EigenError::SingularSystem { shift: 2.0 }
        );
    }
}
