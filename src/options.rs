use serde::{Deserialize, Serialize};
use crate::errors::EigenError;

/// Stopping criteria shared by all iterative eigensolvers.
///
/// An iteration stops as soon as the residual norm `‖Ax - λx‖` of the current
/// (normalised) iterate drops below `tol`, or after `maxiter` iterations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IterationOptions {
    pub tol: f64,
    pub maxiter: usize,
    /// Report convergence at `info` level instead of `debug`.
    pub verbose: bool,
}

impl Default for IterationOptions {
    fn default() -> Self {
        Self {
            tol: 1e-10,
            maxiter: 100,
            verbose: false,
        }
    }
}

impl IterationOptions {
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn validate(&self) -> Result<(), EigenError> {
        if !(self.tol > 0.0) || !self.tol.is_finite() {
            return Err(EigenError::InvalidParameter(format!(
                "Tolerance must be a positive finite number, found {}",
                self.tol
            )));
        }
        if self.maxiter == 0 {
            return Err(EigenError::InvalidParameter(
                "At least one iteration is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Logs the outcome of a run: convergence at `info`/`debug`, exhaustion at `warn`.
    pub(crate) fn report(&self, method: &str, converged: bool, iterations: usize, residual: f64) {
        if converged {
            if self.verbose {
                log::info!("{method} converged after {iterations} iterations (residual {residual:.3e})");
            } else {
                log::debug!("{method} converged after {iterations} iterations (residual {residual:.3e})");
            }
        } else {
            log::warn!(
                "{method} did not converge after {} iterations: residual {residual:.3e} is above tolerance {:.3e}",
                self.maxiter,
                self.tol
            );
        }
    }
}
