//! Crate-level error type.
//!
//! Each concern owns its own error enum next to the code that raises it;
//! this module only gathers them for callers that drive a whole run.

use thiserror::Error;

use crate::agent::BudgetError;
use crate::config::ConfigError;
use crate::dialogue::TransitionError;
use crate::framework::FrameworkError;
use crate::solver::SolverError;

/// Result type alias for precedence operations
pub type Result<T> = std::result::Result<T, PrecedenceError>;

#[derive(Error, Debug)]
pub enum PrecedenceError {
    #[error("Framework error: {0}")]
    Framework(#[from] FrameworkError),

    #[error("Budget error: {0}")]
    Budget(#[from] BudgetError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    /// Dialogue phase machine was driven out of order
    #[error("Dialogue state error: {0}")]
    Transition(#[from] TransitionError),
}
