use nalgebra::{DMatrix, DVector, Scalar, RealField};
use num_traits::{Zero, One};
use std::ops::{AddAssign, SubAssign, MulAssign, DivAssign};
use crate::errors::EigenError;

/// Solves `U X = Y` by back substitution, column by column.
pub fn solve_upper_triangular_system<T>(u: &DMatrix<T>, y: &DMatrix<T>) -> DMatrix<T>
where
    T: Scalar + RealField + Zero + One + AddAssign + SubAssign + MulAssign + DivAssign + Copy,
{
    let n = u.nrows();
    let mut x = DMatrix::zeros(n, y.ncols());

    for c in 0..y.ncols() {
        for i in (0..n).rev() {
            let mut sum = T::zero();
            for j in (i + 1)..n {
                sum += u[(i, j)] * x[(j, c)];
            }
            x[(i, c)] = (y[(i, c)] - sum) / u[(i, i)];
        }
    }
    x
}

/// Solves `L X = Y` by forward substitution, column by column.
pub fn solve_lower_triangular_system<T>(l: &DMatrix<T>, y: &DMatrix<T>) -> DMatrix<T>
where
    T: Scalar + RealField + Zero + One + AddAssign + SubAssign + MulAssign + DivAssign + Copy,
{
    let n = l.nrows();
    let mut x = DMatrix::zeros(n, y.ncols());

    for c in 0..y.ncols() {
        for i in 0..n {
            let mut sum = T::zero();
            for j in 0..i {
                sum += l[(i, j)] * x[(j, c)];
            }
            x[(i, c)] = (y[(i, c)] - sum) / l[(i, i)];
        }
    }
    x
}

/// Dense shifted operator `A - σI`.
pub fn shifted(a: &DMatrix<f64>, shift: f64) -> DMatrix<f64> {
    let n = a.nrows();
    a - DMatrix::<f64>::identity(n, n) * shift
}

/// Solves `(A - σI) y = b` through an LU factorisation with partial pivoting.
///
/// Returns [`EigenError::SingularSystem`] when σ coincides with an eigenvalue
/// to working precision.
pub fn solve_shifted(a: &DMatrix<f64>, shift: f64, b: &DVector<f64>) -> Result<DVector<f64>, EigenError> {
    if a.nrows() != a.ncols() {
        return Err(EigenError::NotSquare { rows: a.nrows(), cols: a.ncols() });
    }
    if a.ncols() != b.len() {
        return Err(EigenError::DimensionMismatch { operator: a.ncols(), vector: b.len() });
    }
    let solution = shifted(a, shift).lu().solve(b).ok_or(EigenError::SingularSystem { shift })?;
    if solution.iter().any(|v| !v.is_finite()) {
        return Err(EigenError::SingularSystem { shift });
    }
    Ok(solution)
}
