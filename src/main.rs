//! Runs one eigensolver on a model problem and writes its convergence history as CSV.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use diagonalisation::bounds::ErrorBounds;
use diagonalisation::guess::{random_guess, DistributionType};
use diagonalisation::lobpcg::{lobpcg, lopcg};
use diagonalisation::pgd::preconditioned_gradient_descent;
use diagonalisation::power::{inverse_iteration, power_method};
use diagonalisation::preconditioner::{
    CholeskyPreconditioner, IdentityPreconditioner, JacobiPreconditioner, Preconditioner,
};
use diagonalisation::rqi::rayleigh_quotient_iteration;
use diagonalisation::spectral::{
    laplacian_1d, laplacian_1d_eigenvalues, midpoint_grid, multiplication_operator, weyl_sequence_residuals,
};
use diagonalisation::subspace::{projected_subspace_iteration, subspace_iteration};
use diagonalisation::test_assist::generate_random_spd_matrix;
use diagonalisation::{BlockEigenResult, EigenResult, IterationOptions};
use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Number of halvings of the bump width in the Weyl experiment.
const WEYL_STEPS: usize = 12;

#[derive(ValueEnum, Clone, Debug, Copy, PartialEq)]
enum Algorithm {
    Power,
    Inverse,
    Rqi,
    Subspace,
    ProjectedSubspace,
    Pgd,
    Lopcg,
    Lobpcg,
    /// Weyl sequence residuals of the multiplication operator at `--shift`.
    Weyl,
}

#[derive(ValueEnum, Clone, Debug, Copy)]
enum Problem {
    /// Dirichlet finite-difference Laplacian on (0, 1).
    Laplacian,
    /// Random symmetric positive definite matrix.
    Random,
}

#[derive(ValueEnum, Clone, Debug, Copy)]
enum PreconditionerKind {
    None,
    Jacobi,
    Cholesky,
}

#[derive(Parser, Debug)]
#[clap(
    name = "diagonalisation",
    about = "Runs an iterative eigensolver on a model problem and records its convergence history."
)]
struct Args {
    #[clap(long, value_enum)]
    algorithm: Algorithm,
    #[clap(long, value_enum, default_value = "laplacian")]
    problem: Problem,
    /// Dimension of the test matrix.
    #[clap(long, default_value_t = 100)]
    n: usize,
    /// Number of eigenpairs for the block methods.
    #[clap(long, default_value_t = 4)]
    nev: usize,
    #[clap(long, default_value_t = 1e-8)]
    tol: f64,
    #[clap(long, default_value_t = 1000)]
    maxiter: usize,
    /// Shift for inverse iteration and the preconditioners, point of the
    /// spectrum examined by `weyl`.
    #[clap(long, default_value_t = 0.0)]
    shift: f64,
    /// Step size of preconditioned gradient descent.
    #[clap(long, default_value_t = 0.5)]
    step: f64,
    #[clap(long, value_enum, default_value = "jacobi")]
    preconditioner: PreconditionerKind,
    #[clap(long, default_value_t = 42)]
    seed: u64,
    /// Path to the output CSV file.
    #[clap(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

/// One row per iteration and eigenpair of the history.
#[derive(Debug, Serialize)]
struct HistoryRow {
    iteration: usize,
    index: usize,
    eigenvalue: f64,
    residual_norm: f64,
}

#[derive(Debug, Serialize)]
struct WeylRow {
    width: f64,
    residual_norm: f64,
}

fn build_problem(args: &Args) -> DMatrix<f64> {
    match args.problem {
        Problem::Laplacian => laplacian_1d(args.n, 1.0),
        Problem::Random => generate_random_spd_matrix(args.n, args.seed),
    }
}

fn build_preconditioner(args: &Args, a: &DMatrix<f64>) -> Result<Box<dyn Preconditioner>> {
    Ok(match args.preconditioner {
        PreconditionerKind::None => Box::new(IdentityPreconditioner),
        PreconditionerKind::Jacobi => Box::new(JacobiPreconditioner::new(a, args.shift)?),
        PreconditionerKind::Cholesky => Box::new(CholeskyPreconditioner::new(a, args.shift)?),
    })
}

/// Distance from `lambda` to the exact eigenvalues other than the closest one.
fn exact_gap(exact: &DVector<f64>, lambda: f64) -> Option<f64> {
    let nearest = exact.iter().map(|mu| (mu - lambda).abs()).enumerate().min_by(|a, b| a.1.total_cmp(&b.1))?.0;
    exact
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != nearest)
        .map(|(_, mu)| (mu - lambda).abs())
        .reduce(f64::min)
}

fn single_rows(result: &EigenResult) -> Vec<HistoryRow> {
    result
        .history
        .eigenvalues
        .iter()
        .zip(&result.history.residual_norms)
        .enumerate()
        .map(|(k, (&eigenvalue, &residual_norm))| HistoryRow {
            iteration: k + 1,
            index: 0,
            eigenvalue,
            residual_norm,
        })
        .collect()
}

fn block_rows(result: &BlockEigenResult) -> Vec<HistoryRow> {
    let mut rows = Vec::new();
    for (k, (values, residuals)) in result
        .history
        .eigenvalues
        .iter()
        .zip(&result.history.residual_norms)
        .enumerate()
    {
        for (j, (&eigenvalue, &residual_norm)) in values.iter().zip(residuals).enumerate() {
            rows.push(HistoryRow {
                iteration: k + 1,
                index: j,
                eigenvalue,
                residual_norm,
            });
        }
    }
    rows
}

fn write_rows<T: Serialize>(path: Option<&Path>, rows: &[T]) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    log::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

fn run_weyl(args: &Args) -> Result<()> {
    let grid = midpoint_grid(args.n);
    let m = multiplication_operator(args.n);
    let widths: Vec<f64> = (0..WEYL_STEPS).map(|k| 0.25 * 0.5f64.powi(k as i32)).collect();
    let residuals = weyl_sequence_residuals(&m, &grid, args.shift, &widths)?;
    for (width, residual) in widths.iter().zip(&residuals) {
        log::info!("width = {width:.3e}: ‖(M - λ)u‖ = {residual:.3e}");
    }
    let rows: Vec<WeylRow> = widths
        .iter()
        .zip(&residuals)
        .map(|(&width, &residual_norm)| WeylRow { width, residual_norm })
        .collect();
    write_rows(args.output.as_deref(), &rows)
}

fn report_single(a: &DMatrix<f64>, result: &EigenResult, exact: Option<&DVector<f64>>) -> Result<()> {
    let gap = exact.and_then(|e| exact_gap(e, result.eigenvalue));
    let bounds = ErrorBounds::for_pair(a, result.eigenvalue, &result.eigenvector, gap)?;
    log::info!(
        "λ = {:.12e} after {} iterations (converged: {}), ‖r‖ = {:.3e}",
        result.eigenvalue,
        result.iterations,
        result.converged,
        bounds.residual_norm
    );
    log::info!("Guaranteed eigenvalue error bound: {:.3e}", bounds.eigenvalue_bound());
    if let Some(angle) = bounds.angle {
        log::info!("Eigenvector angle bound: sin θ ≤ {angle:.3e}");
    }
    Ok(())
}

fn report_block(result: &BlockEigenResult, exact: Option<&DVector<f64>>, smallest: bool) {
    log::info!(
        "{} Ritz pairs after {} iterations (converged: {})",
        result.eigenvalues.len(),
        result.iterations,
        result.converged
    );
    for (j, (value, residual)) in result.eigenvalues.iter().zip(result.residual_norms()).enumerate() {
        match exact {
            // Ascending exact eigenvalues line up with the lowest Ritz values only
            Some(e) if smallest && j < e.len() => {
                log::info!("  λ_{j} = {value:.12e}, ‖r‖ = {residual:.3e}, error = {:.3e}", (value - e[j]).abs())
            }
            _ => log::info!("  λ_{j} = {value:.12e}, ‖r‖ = {residual:.3e}"),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .try_init()?;
    let args = Args::parse();
    log::info!("Running {:?} on the {:?} problem with n = {}", args.algorithm, args.problem, args.n);

    if args.algorithm == Algorithm::Weyl {
        return run_weyl(&args);
    }

    let a = build_problem(&args);
    let exact = match args.problem {
        Problem::Laplacian => Some(laplacian_1d_eigenvalues(args.n, 1.0)),
        Problem::Random => None,
    };
    let opts = IterationOptions::default()
        .with_tol(args.tol)
        .with_maxiter(args.maxiter)
        .with_verbose(true);
    let x0 = random_guess(DistributionType::Gaussian, args.n, 1, args.seed)?.column(0).into_owned();

    let single = match args.algorithm {
        Algorithm::Power => Some(power_method(&a, &x0, &opts)?),
        Algorithm::Inverse => Some(inverse_iteration(&a, args.shift, &x0, &opts)?),
        Algorithm::Rqi => Some(rayleigh_quotient_iteration(&a, &x0, &opts)?),
        Algorithm::Pgd => {
            let p = build_preconditioner(&args, &a)?;
            Some(preconditioned_gradient_descent(&a, &x0, p.as_ref(), args.step, &opts)?)
        }
        Algorithm::Lopcg => {
            let p = build_preconditioner(&args, &a)?;
            Some(lopcg(&a, &x0, p.as_ref(), &opts)?)
        }
        _ => None,
    };
    if let Some(result) = single {
        report_single(&a, &result, exact.as_ref())?;
        return write_rows(args.output.as_deref(), &single_rows(&result));
    }

    let block0 = random_guess(DistributionType::Gaussian, args.n, args.nev, args.seed)?;
    let (block, smallest) = match args.algorithm {
        Algorithm::Subspace => (subspace_iteration(&a, &block0, &opts)?, false),
        Algorithm::ProjectedSubspace => (projected_subspace_iteration(&a, &block0, &opts)?, false),
        Algorithm::Lobpcg => {
            let p = build_preconditioner(&args, &a)?;
            (lobpcg(&a, &block0, p.as_ref(), &opts)?, true)
        }
        other => anyhow::bail!("Algorithm {other:?} is not a block method"),
    };
    report_block(&block, exact.as_ref(), smallest);
    write_rows(args.output.as_deref(), &block_rows(&block))
}
