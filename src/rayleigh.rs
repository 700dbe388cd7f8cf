use nalgebra::{DMatrix, DVector};
use crate::errors::EigenError;
use crate::operator::{LinearOperator, ensure_compatible};
use crate::orth::orthonormalize_drop;

/// Relative threshold below which a basis direction is treated as dependent.
pub(crate) const BASIS_DROP_TOL: f64 = 1e-10;

pub fn rayleigh_quotient<O: LinearOperator + ?Sized>(a: &O, x: &DVector<f64>) -> Result<f64, EigenError> {
    ensure_compatible(a, x.len())?;
    let norm_sq = x.norm_squared();
    if norm_sq == 0.0 {
        return Err(EigenError::InvalidParameter(
            "The Rayleigh quotient of the zero vector is undefined".to_string(),
        ));
    }
    Ok(x.dot(&a.apply_vector(x)) / norm_sq)
}

/// Residual `Ax - λx`.
pub fn residual<O: LinearOperator + ?Sized>(a: &O, lambda: f64, x: &DVector<f64>) -> DVector<f64> {
    a.apply_vector(x) - x * lambda
}

pub fn residual_norm<O: LinearOperator + ?Sized>(a: &O, lambda: f64, x: &DVector<f64>) -> f64 {
    residual(a, lambda, x).norm()
}

/// Ritz values (ascending) and the matching Ritz vectors as columns.
#[derive(Debug, Clone)]
pub struct RitzPairs {
    pub values: DVector<f64>,
    pub vectors: DMatrix<f64>,
}

impl RitzPairs {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The `k` algebraically smallest pairs.
    pub fn smallest(&self, k: usize) -> RitzPairs {
        let k = k.min(self.len());
        RitzPairs {
            values: self.values.rows(0, k).into_owned(),
            vectors: self.vectors.columns(0, k).into_owned(),
        }
    }

    /// The `k` pairs of largest magnitude, ordered by decreasing `|θ|`.
    pub fn largest_magnitude(&self, k: usize) -> RitzPairs {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&i, &j| self.values[j].abs().total_cmp(&self.values[i].abs()));
        order.truncate(k);
        self.select(&order)
    }

    fn select(&self, indices: &[usize]) -> RitzPairs {
        RitzPairs {
            values: DVector::from_iterator(indices.len(), indices.iter().map(|&i| self.values[i])),
            vectors: self.vectors.select_columns(indices),
        }
    }
}

/// Dense eigendecomposition of a small symmetric matrix, sorted ascending.
pub(crate) fn sorted_symmetric_eigen(h: DMatrix<f64>) -> (DVector<f64>, DMatrix<f64>) {
    let h_sym = 0.5 * (&h + h.transpose());
    let eig = h_sym.symmetric_eigen();
    let mut order: Vec<usize> = (0..eig.eigenvalues.len()).collect();
    order.sort_by(|&i, &j| eig.eigenvalues[i].total_cmp(&eig.eigenvalues[j]));
    let values = DVector::from_iterator(order.len(), order.iter().map(|&i| eig.eigenvalues[i]));
    let vectors = eig.eigenvectors.select_columns(&order);
    (values, vectors)
}

/// Rayleigh-Ritz projection of `a` onto an already orthonormal basis `v`.
pub(crate) fn rayleigh_ritz_orthonormal<O: LinearOperator + ?Sized>(a: &O, v: &DMatrix<f64>) -> RitzPairs {
    let av = a.apply(v);
    let h = v.transpose() * &av;
    let (values, y) = sorted_symmetric_eigen(h);
    RitzPairs {
        values,
        vectors: v * y,
    }
}

/// Rayleigh-Ritz projection of `a` onto the span of the columns of `basis`.
///
/// The basis is orthonormalised first and dependent columns are dropped, so
/// the number of returned pairs can be smaller than `basis.ncols()`.
pub fn rayleigh_ritz<O: LinearOperator + ?Sized>(a: &O, basis: &DMatrix<f64>) -> Result<RitzPairs, EigenError> {
    ensure_compatible(a, basis.nrows())?;
    let v = orthonormalize_drop(basis, BASIS_DROP_TOL)?;
    Ok(rayleigh_ritz_orthonormal(a, &v))
}
