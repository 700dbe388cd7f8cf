use nalgebra::DVector;
use crate::errors::EigenError;
use crate::operator::{LinearOperator, ensure_compatible};
use crate::options::IterationOptions;
use crate::power::normalized_start;
use crate::results::{ConvergenceHistory, EigenResult};
use crate::solvers::solve_shifted;

/// Rayleigh quotient iteration.
///
/// Inverse iteration whose shift is updated to the current Rayleigh quotient
/// at every step. Close to an eigenpair the convergence is cubic for symmetric
/// matrices, but which eigenpair is found depends on the starting vector.
///
/// Each step refactorises `A - σₖI`. If σₖ hits an eigenvalue exactly while
/// the residual is still above tolerance the shifted solve fails and
/// [`EigenError::SingularSystem`] is returned.
pub fn rayleigh_quotient_iteration<O: LinearOperator + ?Sized>(
    a: &O,
    x0: &DVector<f64>,
    opts: &IterationOptions,
) -> Result<EigenResult, EigenError> {
    opts.validate()?;
    ensure_compatible(a, x0.len())?;
    let dense = a.to_dense();
    let mut x = normalized_start(x0)?;

    let mut history = ConvergenceHistory::with_capacity(opts.maxiter);
    let mut sigma = 0.0;
    let mut residual_norm = f64::INFINITY;
    let mut converged = false;
    let mut iterations = 0;

    for k in 1..=opts.maxiter {
        let ax = a.apply_vector(&x);
        sigma = x.dot(&ax);
        residual_norm = (&ax - &x * sigma).norm();
        history.push(sigma, residual_norm);
        iterations = k;
        log::trace!("RQI iteration {k}: σ = {sigma:.15e}, ‖r‖ = {residual_norm:.3e}");

        if residual_norm < opts.tol {
            converged = true;
            break;
        }
        if k == opts.maxiter {
            break;
        }

        let y = solve_shifted(&dense, sigma, &x)?;
        x = &y / y.norm();
    }

    opts.report("Rayleigh quotient iteration", converged, iterations, residual_norm);
    Ok(EigenResult {
        eigenvalue: sigma,
        eigenvector: x,
        converged,
        iterations,
        history,
    })
}
