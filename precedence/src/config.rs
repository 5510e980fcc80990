//! Run configuration.
//!
//! Defaults < TOML file < `PRECEDENCE_*` environment variables < CLI flags.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::culture::RandomCultureConfig;
use crate::dialogue::Strategy;
use crate::oracle::OracleConfig;
use crate::solver::SolverConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Budget-aware strategies need at least one argument with a cost.
    #[error("strategy '{strategy}' is budget-aware but no argument outside the motion has a privacy cost")]
    CostlessFramework { strategy: String },

    #[error("agent queue is empty")]
    EmptyQueue,

    /// Dialogues run on a split whose motion support has been removed.
    #[error("dialogue framework still contains the motion's support nodes")]
    MotionSupportPresent,

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of agents in the queue.
    pub queue_size: usize,
    /// Per-dialogue privacy budget of every agent.
    pub max_privacy_budget: u32,
    /// Seed of the run-wide random source.
    pub seed: u64,
    pub strategy: Strategy,
    pub culture: RandomCultureConfig,
    pub solver: SolverConfig,
    pub oracle: OracleConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            queue_size: 5,
            max_privacy_budget: 10,
            seed: 0,
            strategy: Strategy::default(),
            culture: RandomCultureConfig::default(),
            solver: SolverConfig::default(),
            oracle: OracleConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load a TOML config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `PRECEDENCE_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Recognised keys: `PRECEDENCE_SOLVER`, `PRECEDENCE_SEED`,
    /// `PRECEDENCE_WORKERS`, `PRECEDENCE_BUDGET`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("PRECEDENCE_SOLVER").filter(|s| !s.is_empty()) {
            self.solver.path = PathBuf::from(path);
        }
        if let Some(seed) = lookup("PRECEDENCE_SEED") {
            self.seed = parse_var("PRECEDENCE_SEED", &seed)?;
        }
        if let Some(workers) = lookup("PRECEDENCE_WORKERS") {
            self.oracle.max_workers = parse_var("PRECEDENCE_WORKERS", &workers)?;
        }
        if let Some(budget) = lookup("PRECEDENCE_BUDGET") {
            self.max_privacy_budget = parse_var("PRECEDENCE_BUDGET", &budget)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_size == 0 {
            return Err(ConfigError::EmptyQueue);
        }
        if self.oracle.max_workers == 0 {
            return Err(ConfigError::invalid("oracle.max_workers", "must be at least 1"));
        }
        if self.culture.arguments == 0 {
            return Err(ConfigError::invalid(
                "culture.arguments",
                "must include the motion",
            ));
        }
        if self.solver.timeout_secs == Some(0) {
            return Err(ConfigError::invalid("solver.timeout_secs", "must be positive"));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(key, format!("cannot parse '{value}'")))
}
