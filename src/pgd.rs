use nalgebra::DVector;
use crate::errors::EigenError;
use crate::operator::{LinearOperator, ensure_compatible};
use crate::options::IterationOptions;
use crate::power::normalized_start;
use crate::preconditioner::Preconditioner;
use crate::results::{ConvergenceHistory, EigenResult};

/// Preconditioned gradient descent on the Rayleigh quotient.
///
/// The gradient of `R_A` at a unit vector `x` is proportional to the residual
/// `r = Ax - R_A(x) x`, so the update is `x ← (x - α P r) / ‖x - α P r‖` with
/// a fixed step `α`. For a small enough step the iteration approaches the
/// smallest eigenpair. A good preconditioner `P ≈ (A - σI)⁻¹` with σ below
/// the spectrum makes the convergence rate independent of the conditioning
/// of `A`.
pub fn preconditioned_gradient_descent<O, P>(
    a: &O,
    x0: &DVector<f64>,
    preconditioner: &P,
    step: f64,
    opts: &IterationOptions,
) -> Result<EigenResult, EigenError>
where
    O: LinearOperator + ?Sized,
    P: Preconditioner + ?Sized,
{
    opts.validate()?;
    ensure_compatible(a, x0.len())?;
    if !(step > 0.0) || !step.is_finite() {
        return Err(EigenError::InvalidParameter(format!(
            "Step size must be a positive finite number, found {step}"
        )));
    }
    let mut x = normalized_start(x0)?;

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
        log::trace!("PGD iteration {k}: ρ = {rho:.12e}, ‖r‖ = {residual_norm:.3e}");

        if residual_norm < opts.tol {
            converged = true;
            break;
        }
        if k == opts.maxiter {
            break;
        }

        let update = &x - preconditioner.apply_vector(&r) * step;
        let norm = update.norm();
        if norm == 0.0 || !norm.is_finite() {
            return Err(EigenError::InvalidParameter(format!(
                "Gradient step of size {step} produced a degenerate iterate at iteration {k}"
            )));
        }
        x = update / norm;
    }

    opts.report("Preconditioned gradient descent", converged, iterations, residual_norm);
    Ok(EigenResult {
        eigenvalue: rho,
        eigenvector: x,
        converged,
        iterations,
        history,
    })
}
