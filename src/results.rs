use nalgebra::{DMatrix, DVector};
use serde::Serialize;

/// Upper limit on the history reserved up front; longer runs grow on demand.
const MAX_RESERVED_ITERATIONS: usize = 1024;

/// Per-iteration trace of a single-vector method.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConvergenceHistory {
    pub eigenvalues: Vec<f64>,
    pub residual_norms: Vec<f64>,
}

impl ConvergenceHistory {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            eigenvalues: Vec::with_capacity(capacity.min(MAX_RESERVED_ITERATIONS)),
            residual_norms: Vec::with_capacity(capacity.min(MAX_RESERVED_ITERATIONS)),
        }
    }

    pub(crate) fn push(&mut self, eigenvalue: f64, residual_norm: f64) {
        self.eigenvalues.push(eigenvalue);
        self.residual_norms.push(residual_norm);
    }

    pub fn len(&self) -> usize {
        self.residual_norms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residual_norms.is_empty()
    }

    /// Observed ratios `‖r_{k+1}‖ / ‖r_k‖`, the empirical convergence factor.
    pub fn contraction_factors(&self) -> Vec<f64> {
        self.residual_norms
            .windows(2)
            .map(|w| w[1] / w[0])
            .collect()
    }
}

/// Outcome of a single-vector method (power method, RQI, PGD, LOPCG, ...).
#[derive(Debug, Clone)]
pub struct EigenResult {
    pub eigenvalue: f64,
    pub eigenvector: DVector<f64>,
    pub converged: bool,
    pub iterations: usize,
    pub history: ConvergenceHistory,
}

impl EigenResult {
    pub fn residual_norm(&self) -> f64 {
        self.history.residual_norms.last().copied().unwrap_or(f64::INFINITY)
    }
}

/// Per-iteration trace of a block method, one inner vector per iteration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlockHistory {
    pub eigenvalues: Vec<Vec<f64>>,
    pub residual_norms: Vec<Vec<f64>>,
}

impl BlockHistory {
    pub(crate) fn push(&mut self, eigenvalues: &DVector<f64>, residual_norms: &[f64]) {
        self.eigenvalues.push(eigenvalues.iter().copied().collect());
        self.residual_norms.push(residual_norms.to_vec());
    }

    pub fn len(&self) -> usize {
        self.residual_norms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residual_norms.is_empty()
    }

    /// Largest residual norm of the block at every iteration.
    pub fn max_residual_norms(&self) -> Vec<f64> {
        self.residual_norms
            .iter()
            .map(|r| r.iter().copied().fold(0.0, f64::max))
            .collect()
    }
}

/// Outcome of a block method (subspace iteration, LOBPCG).
#[derive(Debug, Clone)]
pub struct BlockEigenResult {
    pub eigenvalues: DVector<f64>,
    /// Eigenvector estimates, one per column, in the order of `eigenvalues`.
    pub eigenvectors: DMatrix<f64>,
    pub converged: bool,
    pub iterations: usize,
    pub history: BlockHistory,
}

impl BlockEigenResult {
    pub fn residual_norms(&self) -> Vec<f64> {
        self.history.residual_norms.last().cloned().unwrap_or_default()
    }
}

/// Residual norms `‖A xᵢ - λᵢ xᵢ‖` of every column, given `AX` precomputed.
pub(crate) fn column_residual_norms(
    ax: &DMatrix<f64>,
    x: &DMatrix<f64>,
    values: &DVector<f64>,
) -> Vec<f64> {
    (0..x.ncols())
        .map(|j| (ax.column(j) - x.column(j) * values[j]).norm())
        .collect()
}
