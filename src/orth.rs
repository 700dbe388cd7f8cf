use nalgebra::DMatrix;
use crate::errors::EigenError;
use crate::solvers::solve_lower_triangular_system;

/// Thin QR orthonormalisation with the signs fixed so that `diag(R) ≥ 0`.
pub fn orthonormalize(v: &DMatrix<f64>) -> DMatrix<f64> {
    let (mut q, r) = v.clone().qr().unpack();
    for i in 0..q.ncols().min(r.nrows()) {
        if r[(i, i)] < 0.0 {
            q.set_column(i, &(-q.column(i)));
        }
    }
    q
}

/// Modified Gram-Schmidt with one re-orthogonalisation pass.
///
/// A column whose norm shrinks below `drop_tol` times its original norm after
/// projection is considered linearly dependent on the previous ones and
/// removed. Fails with [`EigenError::EmptyBasis`] if nothing survives.
pub fn orthonormalize_drop(v: &DMatrix<f64>, drop_tol: f64) -> Result<DMatrix<f64>, EigenError> {
    let n = v.nrows();
    let mut kept: Vec<nalgebra::DVector<f64>> = Vec::with_capacity(v.ncols());

    for j in 0..v.ncols() {
        let mut w = v.column(j).into_owned();
        let original = w.norm();
        if original == 0.0 || !original.is_finite() {
            continue;
        }
        for _pass in 0..2 {
            for q in &kept {
                let coeff = q.dot(&w);
                w.axpy(-coeff, q, 1.0);
            }
        }
        let norm = w.norm();
        if norm > drop_tol * original {
            kept.push(w / norm);
        } else {
            log::trace!("Dropping dependent basis column {j} (relative norm {:.2e})", norm / original);
        }
    }

    if kept.is_empty() {
        return Err(EigenError::EmptyBasis);
    }
    let mut q = DMatrix::zeros(n, kept.len());
    for (j, col) in kept.iter().enumerate() {
        q.set_column(j, col);
    }
    Ok(q)
}

/// Cholesky-QR: `R = chol(VᵀV)ᵀ` and `Q = V R⁻¹`.
///
/// Cheaper than Householder QR but only reliable for well conditioned `V`.
pub fn cholesky_qr(v: &DMatrix<f64>) -> Result<(DMatrix<f64>, DMatrix<f64>), EigenError> {
    let gram = v.transpose() * v;
    let chol = gram.cholesky().ok_or_else(|| {
        EigenError::FactorizationFailed("Gram matrix of the basis is not positive definite".to_string())
    })?;
    let l = chol.l();
    // Q R = V  <=>  L Qᵀ = Vᵀ
    let q = solve_lower_triangular_system(&l, &v.transpose()).transpose();
    Ok((q, l.transpose()))
}

/// Frobenius norm of `I - VᵀV`.
pub fn orthogonality_loss(v: &DMatrix<f64>) -> f64 {
    let k = v.ncols();
    (DMatrix::<f64>::identity(k, k) - v.transpose() * v).norm()
}
