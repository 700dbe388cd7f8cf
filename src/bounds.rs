//! A posteriori error bounds for approximate eigenpairs.
//!
//! For a symmetric `A`, a unit vector `x` with Rayleigh quotient `ρ` and
//! residual `r = Ax - ρx`:
//!
//! * Bauer-Fike: some eigenvalue `λ` of `A` satisfies `|λ - ρ| ≤ ‖r‖`.
//! * Kato-Temple: if `δ` is the distance from `ρ` to the rest of the spectrum,
//!   the eigenvalue closest to `ρ` satisfies `|λ - ρ| ≤ ‖r‖² / δ`.
//! * The angle `θ` between `x` and the eigenvector of `λ` satisfies
//!   `sin θ ≤ ‖r‖ / δ`.
//!
//! The residual bound is guaranteed without any knowledge of the spectrum; the
//! sharper quadratic bound needs a lower estimate of the gap `δ`.

use nalgebra::DVector;
use crate::errors::EigenError;
use crate::operator::{LinearOperator, ensure_compatible};
use crate::rayleigh::residual_norm;

pub fn bauer_fike_bound(residual_norm: f64) -> f64 {
    residual_norm
}

fn check_gap(gap: f64) -> Result<(), EigenError> {
    if !(gap > 0.0) || !gap.is_finite() {
        return Err(EigenError::InvalidParameter(format!(
            "Spectral gap must be a positive finite number, found {gap}"
        )));
    }
    Ok(())
}

pub fn kato_temple_bound(residual_norm: f64, gap: f64) -> Result<f64, EigenError> {
    check_gap(gap)?;
    Ok(residual_norm * residual_norm / gap)
}

/// Bound on `sin θ` between an approximate and the exact eigenvector.
pub fn eigenvector_angle_bound(residual_norm: f64, gap: f64) -> Result<f64, EigenError> {
    check_gap(gap)?;
    Ok((residual_norm / gap).min(1.0))
}

/// Lower estimate of the gap between `rho` and the eigenvalues it does not
/// approximate, given estimates `others` of those eigenvalues. Each estimate is
/// widened by its own error bound `margins[i]` (e.g. a residual norm).
pub fn gap_estimate(rho: f64, others: &[f64], margins: &[f64]) -> Result<f64, EigenError> {
    if others.len() != margins.len() {
        return Err(EigenError::InvalidParameter(format!(
            "Got {} eigenvalue estimates but {} error margins",
            others.len(),
            margins.len()
        )));
    }
    let gap = others
        .iter()
        .zip(margins)
        .map(|(mu, m)| (rho - mu).abs() - m)
        .fold(f64::INFINITY, f64::min);
    if gap <= 0.0 {
        return Err(EigenError::InvalidParameter(
            "Eigenvalue estimates overlap, no positive gap can be guaranteed".to_string(),
        ));
    }
    Ok(gap)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorBounds {
    pub eigenvalue: f64,
    pub residual_norm: f64,
    pub bauer_fike: f64,
    pub kato_temple: Option<f64>,
    pub angle: Option<f64>,
}

impl ErrorBounds {
    /// Computes all bounds for the approximate eigenpair `(lambda, x)`.
    ///
    /// The quadratic bound assumes `lambda` is the Rayleigh quotient of `x`,
    /// which is what every solver in this crate returns. The gap-dependent
    /// bounds are only filled in when `gap` is provided.
    pub fn for_pair<O: LinearOperator + ?Sized>(
        a: &O,
        lambda: f64,
        x: &DVector<f64>,
        gap: Option<f64>,
    ) -> Result<Self, EigenError> {
        ensure_compatible(a, x.len())?;
        let norm = x.norm();
        if norm == 0.0 {
            return Err(EigenError::InvalidParameter(
                "Cannot bound an eigenpair with a zero vector".to_string(),
            ));
        }
        let r = residual_norm(a, lambda, &(x / norm));
        let (kato_temple, angle) = match gap {
            Some(g) => (Some(kato_temple_bound(r, g)?), Some(eigenvector_angle_bound(r, g)?)),
            None => (None, None),
        };
        Ok(Self {
            eigenvalue: lambda,
            residual_norm: r,
            bauer_fike: bauer_fike_bound(r),
            kato_temple,
            angle,
        })
    }

    /// Tightest available bound on the eigenvalue error.
    pub fn eigenvalue_bound(&self) -> f64 {
        match self.kato_temple {
            Some(kt) => kt.min(self.bauer_fike),
            None => self.bauer_fike,
        }
    }
}
