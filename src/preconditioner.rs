use nalgebra::{DMatrix, DVector};
use crate::errors::EigenError;
use crate::operator::{LinearOperator, ensure_square};
use crate::solvers::{shifted, solve_lower_triangular_system, solve_upper_triangular_system};

/// Smallest magnitude accepted on the diagonal of a Jacobi preconditioner.
const JACOBI_GUARD: f64 = 1e-12;

pub trait Preconditioner {
    /// Applies `P` to every column of `r`.
    fn apply(&self, r: &DMatrix<f64>) -> DMatrix<f64>;

    fn apply_vector(&self, r: &DVector<f64>) -> DVector<f64> {
        let block = DMatrix::from_column_slice(r.len(), 1, r.as_slice());
        self.apply(&block).column(0).into_owned()
    }
}

/// `P = I`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityPreconditioner;

impl Preconditioner for IdentityPreconditioner {
    fn apply(&self, r: &DMatrix<f64>) -> DMatrix<f64> {
        r.clone()
    }
}

/// `P = diag(A - σI)⁻¹`.
#[derive(Debug, Clone)]
pub struct JacobiPreconditioner {
    inverse_diagonal: DVector<f64>,
}

impl JacobiPreconditioner {
    pub fn new<O: LinearOperator + ?Sized>(a: &O, shift: f64) -> Result<Self, EigenError> {
        ensure_square(a)?;
        let inverse_diagonal = a.diagonal().map(|d| {
            let shifted = d - shift;
            if shifted.abs() < JACOBI_GUARD {
                1.0 / JACOBI_GUARD.copysign(shifted)
            } else {
                1.0 / shifted
            }
        });
        Ok(Self { inverse_diagonal })
    }
}

impl Preconditioner for JacobiPreconditioner {
    fn apply(&self, r: &DMatrix<f64>) -> DMatrix<f64> {
        let mut out = r.clone();
        for (i, mut row) in out.row_iter_mut().enumerate() {
            row *= self.inverse_diagonal[i];
        }
        out
    }
}

/// Exact `(A - σI)⁻¹` for a symmetric positive definite `A - σI`, applied
/// through its Cholesky factor `L Lᵀ`.
#[derive(Debug, Clone)]
pub struct CholeskyPreconditioner {
    l: DMatrix<f64>,
    lt: DMatrix<f64>,
}

impl CholeskyPreconditioner {
    pub fn new<O: LinearOperator + ?Sized>(a: &O, shift: f64) -> Result<Self, EigenError> {
        ensure_square(a)?;
        let chol = shifted(&a.to_dense(), shift).cholesky().ok_or_else(|| {
            EigenError::FactorizationFailed(format!(
                "A - {shift}I is not positive definite, Cholesky factorisation impossible"
            ))
        })?;
        let l = chol.l();
        let lt = l.transpose();
        Ok(Self { l, lt })
    }
}

impl Preconditioner for CholeskyPreconditioner {
    fn apply(&self, r: &DMatrix<f64>) -> DMatrix<f64> {
        let y = solve_lower_triangular_system(&self.l, r);
        solve_upper_triangular_system(&self.lt, &y)
    }
}
