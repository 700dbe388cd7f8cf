use nalgebra::{DMatrix, DVector};
use crate::errors::EigenError;

/// A real symmetric linear operator that can be applied to a block of vectors.
pub trait LinearOperator {
    fn nrows(&self) -> usize;

    fn ncols(&self) -> usize;

    /// Applies the operator to every column of `rhs`.
    ///
    /// # Panics
    ///
    /// Panics if `rhs.nrows()` does not match `self.ncols()`.
    fn apply(&self, rhs: &DMatrix<f64>) -> DMatrix<f64>;

    fn apply_vector(&self, x: &DVector<f64>) -> DVector<f64> {
        let block = DMatrix::from_column_slice(x.len(), 1, x.as_slice());
        self.apply(&block).column(0).into_owned()
    }

    /// Dense representation, used by Rayleigh-Ritz projections and direct solves.
    fn to_dense(&self) -> DMatrix<f64> {
        self.apply(&DMatrix::identity(self.ncols(), self.ncols()))
    }

    /// Diagonal entries, used to build Jacobi preconditioners.
    fn diagonal(&self) -> DVector<f64> {
        self.to_dense().diagonal()
    }
}

impl LinearOperator for DMatrix<f64> {
    #[inline]
    fn nrows(&self) -> usize {
        self.shape().0
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.shape().1
    }

    fn apply(&self, rhs: &DMatrix<f64>) -> DMatrix<f64> {
        assert_eq!(
            self.shape().1,
            rhs.nrows(),
            "Dimension mismatch: operator columns ({}) do not match vector rows ({}).",
            self.shape().1,
            rhs.nrows(),
        );
        self * rhs
    }

    fn to_dense(&self) -> DMatrix<f64> {
        self.clone()
    }

    fn diagonal(&self) -> DVector<f64> {
        DMatrix::diagonal(self)
    }
}

/// Diagonal operator `diag(d)`, stored as its diagonal only.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagonalOperator {
    entries: DVector<f64>,
}

impl DiagonalOperator {
    pub fn new(entries: DVector<f64>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &DVector<f64> {
        &self.entries
    }
}

impl LinearOperator for DiagonalOperator {
    fn nrows(&self) -> usize {
        self.entries.len()
    }

    fn ncols(&self) -> usize {
        self.entries.len()
    }

    fn apply(&self, rhs: &DMatrix<f64>) -> DMatrix<f64> {
        assert_eq!(
            self.entries.len(),
            rhs.nrows(),
            "Dimension mismatch: operator columns ({}) do not match vector rows ({}).",
            self.entries.len(),
            rhs.nrows(),
        );
        let mut out = rhs.clone();
        for (i, mut row) in out.row_iter_mut().enumerate() {
            row *= self.entries[i];
        }
        out
    }

    fn to_dense(&self) -> DMatrix<f64> {
        DMatrix::from_diagonal(&self.entries)
    }

    fn diagonal(&self) -> DVector<f64> {
        self.entries.clone()
    }
}

/// Checks that `op` is square and returns its dimension.
pub fn ensure_square<O: LinearOperator + ?Sized>(op: &O) -> Result<usize, EigenError> {
    if op.nrows() != op.ncols() {
        return Err(EigenError::NotSquare {
            rows: op.nrows(),
            cols: op.ncols(),
        });
    }
    Ok(op.nrows())
}

/// Checks that a starting block of vectors fits the operator.
pub(crate) fn ensure_compatible<O: LinearOperator + ?Sized>(
    op: &O,
    rows: usize,
) -> Result<usize, EigenError> {
    let n = ensure_square(op)?;
    if n != rows {
        return Err(EigenError::DimensionMismatch {
            operator: n,
            vector: rows,
        });
    }
    Ok(n)
}
