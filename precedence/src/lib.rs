//! Privacy-aware argumentation for agent precedence.
//!
//! This library provides:
//! - Argumentation frameworks with a perspective split (observer vs.
//!   counterparty) derived from a culture's arguments
//! - A turn-based dialogue game in which each side pays a privacy cost for
//!   every argument it reveals
//! - A sorting network that orders a queue of agents using dialogues as its
//!   comparator
//! - A ground-truth oracle that asks an external argumentation solver who
//!   should win each pairwise dispute
//!
//! # Usage
//!
//! ```bash
//! # Print the split framework of a seeded random culture in APX form
//! precedence split --seed 7
//!
//! # Sort a queue of 8 agents with the budget-aware least-cost strategy
//! precedence sort --size 8 --strategy least-cost-private
//!
//! # Compare dialogue outcomes against the solver's ground truth
//! PRECEDENCE_SOLVER=/opt/mu-toksia precedence oracle --workers 4
//! ```

pub mod agent;
pub mod config;
pub mod culture;
pub mod dialogue;
pub mod error;
pub mod framework;
pub mod oracle;
pub mod queue;
pub mod solver;

pub use agent::{Agent, AgentId, BudgetError, DialogueOutcome, PrivacyBudget};
pub use config::{ConfigError, RunConfig};
pub use culture::{Culture, RandomCulture, RandomCultureConfig};
pub use dialogue::{DialogueGame, Strategy};
pub use error::{PrecedenceError, Result};
pub use framework::{
    Argument, ArgumentId, ArgumentationFramework, FrameworkError, PerspectiveSplitFramework,
    PropertySet, Verifier,
};
pub use oracle::{GroundTruth, GroundTruthOracle, OracleConfig};
pub use queue::{
    AgentQueue, DagDistance, MatrixReport, PriorityQueueSorter, SortReport, WinnerMatrix,
};
pub use solver::{DecisionProcedure, ExternalSolver, Semantics, SolverConfig, SolverError};
