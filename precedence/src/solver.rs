//! Argumentation-semantics decision procedures.
//!
//! The oracle and `occurrence_strength` talk to a [`DecisionProcedure`].
//! [`ExternalSolver`] drives any ICCMA-style command-line solver:
//!
//! ```text
//! <solver> -p <TASK>-<SEM> -fo <format> -f <file> [-a <argument>]
//! ```
//!
//! The framework is written to a uniquely named APX file in the configured
//! work directory and removed once the solver returns.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::framework::{ArgumentId, ArgumentationFramework};

/// Extension semantics understood by the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Semantics {
    #[default]
    Preferred,
    Grounded,
    Complete,
    Stable,
}

impl Semantics {
    /// ICCMA problem suffix.
    pub fn code(self) -> &'static str {
        match self {
            Self::Preferred => "PR",
            Self::Grounded => "GR",
            Self::Complete => "CO",
            Self::Stable => "ST",
        }
    }
}

impl std::fmt::Display for Semantics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Preferred => write!(f, "preferred"),
            Self::Grounded => write!(f, "grounded"),
            Self::Complete => write!(f, "complete"),
            Self::Stable => write!(f, "stable"),
        }
    }
}

/// Solver task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Enumerate all extensions.
    Enumerate,
    /// Decide skeptical acceptance of one argument.
    DecideSkeptical,
}

impl Task {
    pub fn code(self) -> &'static str {
        match self {
            Self::Enumerate => "EE",
            Self::DecideSkeptical => "DS",
        }
    }

    /// Full problem string, e.g. `DS-PR`.
    pub fn problem(self, semantics: Semantics) -> String {
        format!("{}-{}", self.code(), semantics.code())
    }
}

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("failed to launch solver {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("solver failed on {problem} (exit code {exit_code:?}): {stderr}")]
    Invocation {
        problem: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("malformed solver output for {problem}: {detail}")]
    Malformed { problem: String, detail: String },

    #[error("solver timed out after {0}s")]
    Timeout(u64),

    #[error("solver scratch file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Black-box extension oracle.
#[async_trait]
pub trait DecisionProcedure: Send + Sync {
    /// All extensions of `framework` under `semantics`.
    async fn enumerate_extensions(
        &self,
        framework: &ArgumentationFramework,
        semantics: Semantics,
    ) -> Result<Vec<BTreeSet<ArgumentId>>, SolverError>;

    /// Whether `argument` belongs to every extension of `framework`.
    async fn decide_skeptical(
        &self,
        framework: &ArgumentationFramework,
        argument: ArgumentId,
        semantics: Semantics,
    ) -> Result<bool, SolverError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Solver executable.
    pub path: PathBuf,
    /// Value passed to `-fo`.
    pub format: String,
    /// Semantics used by the oracle.
    pub semantics: Semantics,
    /// Where framework files are written; system temp dir when unset.
    pub work_dir: Option<PathBuf>,
    /// Per-call timeout; none by default.
    pub timeout_secs: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("mu-toksia"),
            format: "apx".to_string(),
            semantics: Semantics::Preferred,
            work_dir: None,
            timeout_secs: None,
        }
    }
}

/// [`DecisionProcedure`] backed by an external solver process.
#[derive(Debug, Clone)]
pub struct ExternalSolver {
    config: SolverConfig,
}

impl ExternalSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    async fn invoke(
        &self,
        framework: &ArgumentationFramework,
        problem: &str,
        argument: Option<ArgumentId>,
    ) -> Result<String, SolverError> {
        let dir = self
            .config
            .work_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        let file = dir.join(format!("precedence-{}.apx", Uuid::new_v4()));
        tokio::fs::write(&file, framework.to_apx()).await?;

        let result = self.run(&file, problem, argument).await;

        if let Err(e) = tokio::fs::remove_file(&file).await {
            warn!(path = %file.display(), error = %e, "failed to remove solver input file");
        }
        result
    }

    async fn run(
        &self,
        file: &Path,
        problem: &str,
        argument: Option<ArgumentId>,
    ) -> Result<String, SolverError> {
        let mut cmd = tokio::process::Command::new(&self.config.path);
        cmd.args(["-p", problem, "-fo", self.config.format.as_str()])
            .arg("-f")
            .arg(file);
        if let Some(argument) = argument {
            cmd.arg("-a").arg(argument.to_string());
        }
        cmd.kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        debug!(solver = %self.config.path.display(), problem, ?argument, "invoking solver");

        let spawned = match self.config.timeout_secs {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), cmd.output())
                .await
                .map_err(|_| SolverError::Timeout(secs))?,
            None => cmd.output().await,
        };
        let output = spawned.map_err(|source| SolverError::Spawn {
            program: self.config.path.display().to_string(),
            source,
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !stderr.is_empty() || !output.status.success() {
            return Err(SolverError::Invocation {
                problem: problem.to_string(),
                exit_code: output.status.code(),
                stderr,
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl DecisionProcedure for ExternalSolver {
    async fn enumerate_extensions(
        &self,
        framework: &ArgumentationFramework,
        semantics: Semantics,
    ) -> Result<Vec<BTreeSet<ArgumentId>>, SolverError> {
        let problem = Task::Enumerate.problem(semantics);
        let stdout = self.invoke(framework, &problem, None).await?;
        parse_extensions(&stdout).map_err(|detail| SolverError::Malformed { problem, detail })
    }

    async fn decide_skeptical(
        &self,
        framework: &ArgumentationFramework,
        argument: ArgumentId,
        semantics: Semantics,
    ) -> Result<bool, SolverError> {
        let problem = Task::DecideSkeptical.problem(semantics);
        let stdout = self.invoke(framework, &problem, Some(argument)).await?;
        parse_decision(&stdout).map_err(|detail| SolverError::Malformed { problem, detail })
    }
}

// ── Output parsing ──────────────────────────────────────────────────

static NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\[\]"'\t]"#).expect("noise regex should compile"));

/// Parse enumerate-mode output: one extension per line.
///
/// Brackets, quotes and tabs are stripped; ids may be separated by commas or
/// whitespace. Lines that held only a bracket are skipped.
pub fn parse_extensions(output: &str) -> Result<Vec<BTreeSet<ArgumentId>>, String> {
    let mut extensions = Vec::new();
    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed == "[" || trimmed == "]" {
            continue;
        }
        let cleaned = NOISE.replace_all(trimmed, " ");
        let mut extension = BTreeSet::new();
        for token in cleaned
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            let id = token
                .parse::<ArgumentId>()
                .map_err(|_| format!("unexpected token '{token}' in line '{trimmed}'"))?;
            extension.insert(id);
        }
        extensions.push(extension);
    }
    Ok(extensions)
}

/// Parse decide-mode output: the first `YES` or `NO` token wins.
pub fn parse_decision(output: &str) -> Result<bool, String> {
    output
        .split(|c: char| !c.is_ascii_alphanumeric())
        .find_map(|token| match token {
            "YES" => Some(true),
            "NO" => Some(false),
            _ => None,
        })
        .ok_or_else(|| format!("no YES/NO token in solver output '{}'", output.trim()))
}
