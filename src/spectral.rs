use nalgebra::{DMatrix, DVector};
use std::f64::consts::PI;
use crate::errors::EigenError;
use crate::operator::{DiagonalOperator, LinearOperator, ensure_compatible};
use crate::rayleigh::residual_norm;

/// Dirichlet finite-difference discretisation of `-d²/dx²` on `(0, length)`
/// with `n` interior points.
///
/// Panics if `length` is not positive.
pub fn laplacian_1d(n: usize, length: f64) -> DMatrix<f64> {
    assert!(length > 0.0, "Interval length must be positive, found {}", length);
    let h = length / (n as f64 + 1.0);
    let scale = 1.0 / (h * h);
    let mut a = DMatrix::zeros(n, n);
    for i in 0..n {
        a[(i, i)] = 2.0 * scale;
        if i + 1 < n {
            a[(i, i + 1)] = -scale;
            a[(i + 1, i)] = -scale;
        }
    }
    a
}

/// Exact eigenvalues of [`laplacian_1d`] in ascending order:
/// `λ_k = 4/h² sin²(kπ / (2(n+1)))`, `k = 1..n`.
pub fn laplacian_1d_eigenvalues(n: usize, length: f64) -> DVector<f64> {
    assert!(length > 0.0, "Interval length must be positive, found {}", length);
    let h = length / (n as f64 + 1.0);
    DVector::from_fn(n, |i, _| {
        let s = ((i as f64 + 1.0) * PI / (2.0 * (n as f64 + 1.0))).sin();
        4.0 * s * s / (h * h)
    })
}

/// Cell midpoints `(i + 1/2)/n` of a uniform grid on `[0, 1]`.
pub fn midpoint_grid(n: usize) -> DVector<f64> {
    DVector::from_fn(n, |i, _| (i as f64 + 0.5) / n as f64)
}

/// Discretisation of `(Mf)(x) = x f(x)` on [`midpoint_grid`].
pub fn multiplication_operator(n: usize) -> DiagonalOperator {
    DiagonalOperator::new(midpoint_grid(n))
}

/// Gaussian bump of the given width centred at `lambda`, sampled on `grid`
/// and normalised to unit 2-norm.
///
/// The exponent is shifted by its maximum before exponentiation, so a centre
/// far from the grid still yields a usable vector instead of underflowing.
pub fn weyl_vector(grid: &DVector<f64>, lambda: f64, width: f64) -> Result<DVector<f64>, EigenError> {
    if grid.is_empty() {
        return Err(EigenError::InvalidParameter("The grid must not be empty".to_string()));
    }
    if !(width > 0.0) || !width.is_finite() {
        return Err(EigenError::InvalidParameter(format!(
            "Bump width must be a positive finite number, found {width}"
        )));
    }
    let exponents = grid.map(|x| -((x - lambda) / width).powi(2) / 2.0);
    let peak = exponents.max();
    let bump = exponents.map(|e| (e - peak).exp());
    Ok(&bump / bump.norm())
}

/// Residual norms `‖(M - λ)uₖ‖` of the Weyl vectors `uₖ` for each width.
///
/// For `λ` in the spectrum of `M` the residuals tend to zero as the widths
/// shrink; otherwise they stay bounded below by the distance from `λ` to the
/// spectrum.
pub fn weyl_sequence_residuals<O: LinearOperator + ?Sized>(
    op: &O,
    grid: &DVector<f64>,
    lambda: f64,
    widths: &[f64],
) -> Result<Vec<f64>, EigenError> {
    ensure_compatible(op, grid.len())?;
    widths
        .iter()
        .map(|&width| {
            let u = weyl_vector(grid, lambda, width)?;
            let r = residual_norm(op, lambda, &u);
            log::debug!("Weyl vector at λ = {lambda}, width {width:.3e}: ‖(M - λ)u‖ = {r:.3e}");
            Ok(r)
        })
        .collect()
}
