use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, Uniform, Bernoulli};
use crate::errors::EigenError;

pub enum DistributionType {
    Gaussian,
    Uniform,
    Rademacher,
}

/// Random starting block with i.i.d. entries, reproducible from `seed`.
pub fn random_guess(
    dist_type: DistributionType,
    rows: usize,
    cols: usize,
    seed: u64,
) -> Result<DMatrix<f64>, EigenError> {
    if rows == 0 || cols == 0 {
        return Err(EigenError::InvalidParameter(
            "Rows and columns must be greater than 0".to_string(),
        ));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let matrix = match dist_type {
        DistributionType::Gaussian => {
            let normal = Normal::new(0.0, 1.0)
                .map_err(|e| EigenError::InvalidParameter(e.to_string()))?;
            DMatrix::from_fn(rows, cols, |_i, _j| normal.sample(&mut rng))
        },
        DistributionType::Uniform => {
            let uniform = Uniform::new(-1.0, 1.0);
            DMatrix::from_fn(rows, cols, |_i, _j| uniform.sample(&mut rng))
        },
        DistributionType::Rademacher => {
            let bernoulli = Bernoulli::new(0.5)
                .map_err(|e| EigenError::InvalidParameter(e.to_string()))?;
            DMatrix::from_fn(rows, cols, |_i, _j| if bernoulli.sample(&mut rng) { 1.0 } else { -1.0 })
        }
    };

    Ok(matrix)
}

/// Random block with orthonormal columns (Haar distributed up to the QR sign fix).
pub fn orthonormal_guess(rows: usize, cols: usize, seed: u64) -> Result<DMatrix<f64>, EigenError> {
    if cols > rows {
        return Err(EigenError::InvalidParameter(format!(
            "Cannot have more columns ({}) than rows ({}) for column-orthonormal matrix",
            cols, rows
        )));
    }
    let matrix = random_guess(DistributionType::Gaussian, rows, cols, seed)?;
    let (mut q, r) = matrix.qr().unpack();
    for i in 0..q.ncols() {
        // Scale the i-th column of q by the sign of the matching diagonal entry of r
        let sign = r[(i, i)].signum();
        q.set_column(i, &(&q.column(i) * sign));
    }
    Ok(q)
}
