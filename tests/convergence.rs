//! Cross-checks between the eigensolvers.
//!
//! Every test builds a symmetric matrix with a known spectrum, runs one or more
//! iterative methods on it and compares the result against the exact
//! eigenvalues, the dense reference decomposition, or the a posteriori error
//! bounds.

use anyhow::{Result, ensure};
use approx::assert_relative_eq;
use diagonalisation::bounds::{ErrorBounds, gap_estimate};
use diagonalisation::guess::{orthonormal_guess, random_guess, DistributionType};
use diagonalisation::lobpcg::{lobpcg, lopcg};
use diagonalisation::pgd::preconditioned_gradient_descent;
use diagonalisation::power::{inverse_iteration, power_method};
use diagonalisation::preconditioner::{CholeskyPreconditioner, IdentityPreconditioner, JacobiPreconditioner};
use diagonalisation::rayleigh::rayleigh_ritz;
use diagonalisation::rqi::rayleigh_quotient_iteration;
use diagonalisation::spectral::{laplacian_1d, laplacian_1d_eigenvalues};
use diagonalisation::subspace::{projected_subspace_iteration, subspace_iteration};
use diagonalisation::test_assist::matrix_with_spectrum;
use diagonalisation::{BlockEigenResult, DiagonalOperator, EigenError, EigenResult, IterationOptions};
use nalgebra::{DMatrix, DVector, dmatrix, dvector};

const SPECTRUM: [f64; 6] = [1.0, 2.0, 3.0, 5.0, 8.0, 13.0];

fn start_vector(n: usize, seed: u64) -> Result<DVector<f64>> {
    Ok(random_guess(DistributionType::Gaussian, n, 1, seed)?.column(0).into_owned())
}

/// The returned pair must be the one whose residual was recorded last, and the
/// error to the nearest exact eigenvalue must respect the a posteriori bounds.
fn check_returned_pair(a: &DMatrix<f64>, result: &EigenResult, exact: &[f64]) -> Result<()> {
    let lambda = result.eigenvalue;
    let x = &result.eigenvector;
    assert_relative_eq!(x.norm(), 1.0, epsilon = 1e-12);
    assert_relative_eq!(lambda, x.dot(&(a * x)), epsilon = 1e-12, max_relative = 1e-12);

    let mut distances: Vec<f64> = exact.iter().map(|mu| (mu - lambda).abs()).collect();
    distances.sort_by(f64::total_cmp);
    let bounds = ErrorBounds::for_pair(a, lambda, x, Some(distances[1]))?;
    assert_relative_eq!(bounds.residual_norm, result.residual_norm(), epsilon = 1e-12, max_relative = 1e-9);
    ensure!(
        distances[0] <= bounds.eigenvalue_bound() + 1e-12,
        "error {:.3e} exceeds the bound {:.3e}",
        distances[0],
        bounds.eigenvalue_bound()
    );
    Ok(())
}

fn check_returned_block(a: &DMatrix<f64>, result: &BlockEigenResult) -> Result<()> {
    let residuals = result.residual_norms();
    ensure!(residuals.len() == result.eigenvalues.len(), "history and result disagree on the block size");
    for (j, &recorded) in residuals.iter().enumerate() {
        let x = result.eigenvectors.column(j).into_owned();
        let ax = a * &x;
        assert_relative_eq!(result.eigenvalues[j], x.dot(&ax), epsilon = 1e-12, max_relative = 1e-12);
        let actual = (ax - &x * result.eigenvalues[j]).norm();
        assert_relative_eq!(actual, recorded, epsilon = 1e-12, max_relative = 1e-9);
    }
    Ok(())
}

#[test]
fn test_methods_agree_on_extreme_eigenvalues() -> Result<()> {
    let a = matrix_with_spectrum(&SPECTRUM, 101);
    let x0 = start_vector(6, 3)?;
    let opts = IterationOptions::default().with_tol(1e-9).with_maxiter(2000);

    let power = power_method(&a, &x0, &opts)?;
    ensure!(power.converged, "power method did not converge");
    assert_relative_eq!(power.eigenvalue, 13.0, epsilon = 1e-8);

    let block = projected_subspace_iteration(&a, &random_guess(DistributionType::Gaussian, 6, 2, 4)?, &opts)?;
    ensure!(block.converged, "projected subspace iteration did not converge");
    assert_relative_eq!(block.eigenvalues[0], 13.0, epsilon = 1e-8);
    assert_relative_eq!(block.eigenvalues[1], 8.0, epsilon = 1e-8);

    let gd = preconditioned_gradient_descent(&a, &x0, &IdentityPreconditioner, 0.1, &opts)?;
    let lo = lopcg(&a, &x0, &IdentityPreconditioner, &opts)?;
    let blo = lobpcg(&a, &random_guess(DistributionType::Gaussian, 6, 2, 5)?, &IdentityPreconditioner, &opts)?;
    ensure!(gd.converged && lo.converged && blo.converged, "a smallest-eigenvalue method did not converge");
    assert_relative_eq!(gd.eigenvalue, 1.0, epsilon = 1e-8);
    assert_relative_eq!(lo.eigenvalue, 1.0, epsilon = 1e-8);
    assert_relative_eq!(blo.eigenvalues[0], 1.0, epsilon = 1e-8);
    assert_relative_eq!(blo.eigenvalues[1], 2.0, epsilon = 1e-8);
    ensure!(lo.iterations < gd.iterations, "LOPCG should need fewer iterations than gradient descent");
    Ok(())
}

#[test]
fn test_rayleigh_ritz_on_invariant_subspace_is_exact() -> Result<()> {
    let a = matrix_with_spectrum(&SPECTRUM, 7);
    let eig = a.clone().symmetric_eigen();
    let pick: Vec<usize> = [3.0, 8.0]
        .iter()
        .filter_map(|&target| eig.eigenvalues.iter().position(|&v| (v - target).abs() < 1e-8))
        .collect();
    ensure!(pick.len() == 2, "reference decomposition lost an eigenvalue");

    // Mix the two eigenvectors so the basis itself is not an eigenbasis
    let mixing = dmatrix![1.0, 2.0; -1.0, 0.5];
    let basis = eig.eigenvectors.select_columns(&pick) * mixing;
    let ritz = rayleigh_ritz(&a, &basis)?;
    assert_relative_eq!(ritz.values[0], 3.0, epsilon = 1e-10);
    assert_relative_eq!(ritz.values[1], 8.0, epsilon = 1e-10);
    for j in 0..2 {
        let v = ritz.vectors.column(j).into_owned();
        let r = &a * &v - &v * ritz.values[j];
        ensure!(r.norm() < 1e-10, "Ritz vector {j} is not an eigenvector");
    }
    Ok(())
}

#[test]
fn test_error_bounds_hold_for_computed_pairs() -> Result<()> {
    let a = matrix_with_spectrum(&SPECTRUM, 12);
    let x0 = start_vector(6, 8)?;
    // Loose tolerance so the bounds are not trivially tiny
    let opts = IterationOptions::default().with_tol(1e-3);
    let result = lopcg(&a, &x0, &IdentityPreconditioner, &opts)?;
    ensure!(result.converged, "LOPCG did not converge");

    let others: Vec<f64> = SPECTRUM[1..].to_vec();
    let gap = gap_estimate(result.eigenvalue, &others, &[0.0; 5])?;
    let bounds = ErrorBounds::for_pair(&a, result.eigenvalue, &result.eigenvector, Some(gap))?;
    let error = (result.eigenvalue - 1.0).abs();
    ensure!(error <= bounds.bauer_fike, "Bauer-Fike bound violated");
    ensure!(error <= bounds.eigenvalue_bound(), "Kato-Temple bound violated");
    assert_relative_eq!(bounds.residual_norm, result.residual_norm(), epsilon = 1e-10);
    Ok(())
}

#[test]
fn test_shifted_methods_target_interior_eigenvalues() -> Result<()> {
    let n = 30;
    let a = laplacian_1d(n, 1.0);
    let exact = laplacian_1d_eigenvalues(n, 1.0);
    let x0 = start_vector(n, 21)?;
    let opts = IterationOptions::default().with_tol(1e-8).with_maxiter(500);

    // Shift just above the fourth eigenvalue
    let shift = exact[3] + 0.1 * (exact[4] - exact[3]);
    let inverse = inverse_iteration(&a, shift, &x0, &opts)?;
    ensure!(inverse.converged, "inverse iteration did not converge");
    assert_relative_eq!(inverse.eigenvalue, exact[3], max_relative = 1e-10);

    let rqi = rayleigh_quotient_iteration(&a, &inverse.eigenvector, &opts)?;
    ensure!(rqi.converged, "RQI did not converge");
    ensure!(rqi.iterations <= 2, "RQI from a converged vector should stop immediately");
    assert_relative_eq!(rqi.eigenvalue, exact[3], max_relative = 1e-10);

    match inverse_iteration(&DMatrix::from_diagonal(&dvector![1.0, 2.0]), 2.0, &dvector![1.0, 1.0], &opts) {
        Err(EigenError::SingularSystem { shift }) => assert_eq!(shift, 2.0),
        other => anyhow::bail!("expected a singular system, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_matrix_free_operator() -> Result<()> {
    let op = DiagonalOperator::new(dvector![1.0, -4.0, 2.0, 3.0, 0.5]);
    let x0 = DVector::from_element(5, 1.0);
    let opts = IterationOptions::default().with_tol(1e-10).with_maxiter(500);

    let power = power_method(&op, &x0, &opts)?;
    ensure!(power.converged, "power method did not converge");
    assert_relative_eq!(power.eigenvalue, -4.0, epsilon = 1e-10);

    let lowest = lobpcg(&op, &orthonormal_guess(5, 2, 17)?, &IdentityPreconditioner, &opts)?;
    ensure!(lowest.converged, "LOBPCG did not converge");
    assert_relative_eq!(lowest.eigenvalues[0], -4.0, epsilon = 1e-10);
    assert_relative_eq!(lowest.eigenvalues[1], 0.5, epsilon = 1e-10);
    Ok(())
}

#[test]
fn test_iteration_cap_is_not_an_error() -> Result<()> {
    let n = 50;
    let a = laplacian_1d(n, 1.0);
    let x0 = start_vector(n, 2)?;
    let opts = IterationOptions::default().with_tol(1e-12).with_maxiter(5);

    let power = power_method(&a, &x0, &opts)?;
    ensure!(!power.converged, "power method should not converge in 5 steps");
    assert_eq!(power.iterations, 5);
    assert_eq!(power.history.len(), 5);

    let precond = CholeskyPreconditioner::new(&a, 0.0)?;
    let block = lobpcg(&a, &random_guess(DistributionType::Rademacher, n, 3, 9)?, &precond, &opts)?;
    assert_eq!(block.history.len(), block.iterations);
    ensure!(block.iterations <= 5, "iteration cap exceeded");

    check_returned_pair(&a, &power, laplacian_1d_eigenvalues(n, 1.0).as_slice())?;
    check_returned_block(&a, &block)
}

#[test]
fn test_capped_runs_return_the_last_recorded_pair() -> Result<()> {
    let a = matrix_with_spectrum(&SPECTRUM, 33);
    let x0 = start_vector(6, 14)?;
    let opts = IterationOptions::default().with_tol(1e-14).with_maxiter(3);
    let jacobi = JacobiPreconditioner::new(&a, 0.0)?;

    let runs = [
        power_method(&a, &x0, &opts)?,
        inverse_iteration(&a, 4.0, &x0, &opts)?,
        rayleigh_quotient_iteration(&a, &x0, &opts.with_maxiter(2))?,
        preconditioned_gradient_descent(&a, &x0, &IdentityPreconditioner, 0.05, &opts)?,
        lopcg(&a, &x0, &jacobi, &opts)?,
    ];
    for result in &runs {
        ensure!(result.iterations <= 3, "iteration cap exceeded");
        assert_eq!(result.history.len(), result.iterations);
        check_returned_pair(&a, result, &SPECTRUM)?;
    }

    let block0 = random_guess(DistributionType::Gaussian, 6, 2, 15)?;
    let blocks = [
        subspace_iteration(&a, &block0, &opts)?,
        projected_subspace_iteration(&a, &block0, &opts)?,
        lobpcg(&a, &block0, &jacobi, &opts)?,
    ];
    for result in &blocks {
        ensure!(result.iterations <= 3, "iteration cap exceeded");
        check_returned_block(&a, result)?;
    }
    Ok(())
}
