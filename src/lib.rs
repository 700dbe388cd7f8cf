//! Iterative eigensolvers for real symmetric operators.

pub mod errors;
pub mod operator;
pub mod options;
pub mod results;
pub mod solvers;
pub mod guess;
pub mod orth;
pub mod rayleigh;
pub mod preconditioner;
pub mod power;
pub mod rqi;
pub mod subspace;
pub mod pgd;
pub mod lobpcg;
pub mod bounds;
pub mod spectral;
pub mod test_assist;

pub use errors::EigenError;
pub use operator::{DiagonalOperator, LinearOperator};
pub use options::IterationOptions;
pub use results::{BlockEigenResult, BlockHistory, ConvergenceHistory, EigenResult};
