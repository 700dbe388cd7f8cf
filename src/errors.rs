use thiserror::Error;

/// Errors raised by the eigensolvers when their inputs cannot be used.
///
/// Running out of iterations is not an error: the solvers log a warning and
/// report `converged == false` in their result instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EigenError {
    #[error("Operator must be square, found {rows} rows and {cols} columns")]
    NotSquare { rows: usize, cols: usize },

    #[error("Dimension mismatch: operator has {operator} columns but the vector has {vector} rows")]
    DimensionMismatch { operator: usize, vector: usize },

    #[error("Invalid input parameter: {0}")]
    InvalidParameter(String),

    #[error("Shifted system A - {shift}I is singular")]
    SingularSystem { shift: f64 },

    #[error("Factorization failed: {0}")]
    FactorizationFailed(String),

    #[error("Subspace basis has no numerically independent columns")]
    EmptyBasis,
}
