use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use crate::guess::orthonormal_guess;

/// Generates a random matrix of size (rows, cols) with normally distributed elems
pub fn generate_random_matrix(rows: usize, cols: usize, seed: u64) -> DMatrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    DMatrix::from_fn(rows, cols, |_, _| StandardNormal.sample(&mut rng))
}

/// Generates a random symmetric matrix of size (n, n) with normally distributed elems
pub fn generate_random_symmetric_matrix(n: usize, seed: u64) -> DMatrix<f64> {
    let matrix = generate_random_matrix(n, n, seed);
    let matrix_t = matrix.transpose();
    0.5 * (matrix + matrix_t)
}

/// Generates a random spd matrix of size (n, n), shifted away from singularity
pub fn generate_random_spd_matrix(n: usize, seed: u64) -> DMatrix<f64> {
    let matrix = generate_random_matrix(n, n, seed);
    let matrix_t = matrix.transpose();
    matrix * matrix_t + DMatrix::identity(n, n) * (n as f64)
}

/// Symmetric matrix `Q diag(eigenvalues) Qᵀ` with a random orthogonal `Q`.
pub fn matrix_with_spectrum(eigenvalues: &[f64], seed: u64) -> DMatrix<f64> {
    let n = eigenvalues.len();
    let q = orthonormal_guess(n, n, seed).unwrap_or_else(|_| DMatrix::identity(n, n));
    let d = DMatrix::from_diagonal(&DVector::from_column_slice(eigenvalues));
    let a = &q * d * q.transpose();
    // Remove the rounding asymmetry of the triple product
    0.5 * (&a + a.transpose())
}

pub fn check_approx_equal(a: &DMatrix<f64>, b: &DMatrix<f64>, tolerance: f64) -> bool {
    if a.shape() != b.shape() {
        return false;
    }

    for i in 0..a.nrows() {
        for j in 0..a.ncols() {
            if (a[(i, j)] - b[(i, j)]).abs() > tolerance {
                return false;
            }
        }
    }

    true
}
