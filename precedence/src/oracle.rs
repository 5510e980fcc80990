//! Exhaustive ground truth for pairwise precedence.
//!
//! For every ordered pair `(i, j)` the split framework is specialised to the
//! binding observer = i, counterparty = j and the solver is asked whether the
//! challenger's motion claim (node 1) is skeptically accepted. YES means the
//! challenger `j` wins, NO means the defender `i` keeps its place.
//!
//! Pairs are independent, so they fan out over a `JoinSet` bounded by a
//! semaphore. A failed pair is kept with its error instead of aborting the
//! run; [`GroundTruthOracle::retry_failures`] re-runs just those.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::agent::{Agent, AgentId};
use crate::config::ConfigError;
use crate::framework::{PerspectiveSplitFramework, PropertySet};
use crate::queue::{PairRecord, WinnerMatrix};
use crate::solver::{DecisionProcedure, Semantics, SolverError, Task};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Concurrent solver invocations.
    pub max_workers: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            max_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleStats {
    pub solver_calls: u32,
    pub failures: u32,
    pub elapsed_ms: u64,
}

/// Winner of every ordered pair, plus the pairs that could not be resolved.
#[derive(Debug, Default)]
pub struct GroundTruth {
    pub winners: WinnerMatrix,
    pub failures: BTreeMap<(AgentId, AgentId), SolverError>,
    pub stats: OracleStats,
    expected_pairs: usize,
}

impl GroundTruth {
    /// Whether every ordered pair has a winner.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.winners.len() == self.expected_pairs
    }

    pub fn winner(&self, defender: AgentId, challenger: AgentId) -> Option<AgentId> {
        self.winners.winner(defender, challenger)
    }

    /// Pairs whose outcome depends on who defends.
    pub fn role_dependent_pairs(&self) -> Vec<(AgentId, AgentId)> {
        self.winners.role_dependent_pairs()
    }

    pub fn records(&self) -> Vec<PairRecord> {
        self.winners.records()
    }
}

type PairOutcome = ((AgentId, AgentId), Result<AgentId, SolverError>);

pub struct GroundTruthOracle {
    solver: Arc<dyn DecisionProcedure>,
    semantics: Semantics,
    config: OracleConfig,
}

impl GroundTruthOracle {
    pub fn new(
        solver: Arc<dyn DecisionProcedure>,
        semantics: Semantics,
        config: OracleConfig,
    ) -> Result<Self, ConfigError> {
        if config.max_workers == 0 {
            return Err(ConfigError::invalid("oracle.max_workers", "must be at least 1"));
        }
        Ok(Self {
            solver,
            semantics,
            config,
        })
    }

    /// Resolve a single ordered pair.
    pub async fn resolve_pair(
        &self,
        split: &PerspectiveSplitFramework,
        defender: &Agent,
        challenger: &Agent,
    ) -> Result<AgentId, SolverError> {
        let pruned = split.prune_for_pair(defender.properties(), challenger.properties());
        let accepted = self
            .solver
            .decide_skeptical(pruned.framework(), pruned.motion_claim(), self.semantics)
            .await?;
        Ok(if accepted { challenger.id() } else { defender.id() })
    }

    /// Resolve every ordered pair of `agents`.
    pub async fn compute(&self, split: &PerspectiveSplitFramework, agents: &[Agent]) -> GroundTruth {
        let pairs: Vec<(AgentId, AgentId)> = agents
            .iter()
            .flat_map(|d| {
                agents
                    .iter()
                    .filter(move |c| c.id() != d.id())
                    .map(move |c| (d.id(), c.id()))
            })
            .collect();

        let mut truth = GroundTruth {
            expected_pairs: pairs.len(),
            ..GroundTruth::default()
        };
        let started = Instant::now();
        let outcomes = self.fan_out(split, agents, pairs).await;
        Self::absorb(&mut truth, outcomes);
        truth.stats.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            agents = agents.len(),
            pairs = truth.expected_pairs,
            resolved = truth.winners.len(),
            failures = truth.failures.len(),
            role_dependent = truth.role_dependent_pairs().len(),
            elapsed_ms = truth.stats.elapsed_ms,
            "ground truth computed"
        );
        truth
    }

    /// Re-run the failed pairs of `truth`; pairs that fail again stay failed.
    pub async fn retry_failures(
        &self,
        split: &PerspectiveSplitFramework,
        agents: &[Agent],
        truth: &mut GroundTruth,
    ) {
        if truth.failures.is_empty() {
            return;
        }
        let pairs: Vec<(AgentId, AgentId)> = std::mem::take(&mut truth.failures)
            .into_keys()
            .collect();
        let retried = pairs.len();
        let started = Instant::now();
        let outcomes = self.fan_out(split, agents, pairs).await;
        Self::absorb(truth, outcomes);
        truth.stats.elapsed_ms += started.elapsed().as_millis() as u64;

        info!(
            retried,
            still_failing = truth.failures.len(),
            "retried failed pairs"
        );
    }

    fn absorb(truth: &mut GroundTruth, outcomes: Vec<PairOutcome>) {
        for ((defender, challenger), result) in outcomes {
            truth.stats.solver_calls += 1;
            match result {
                Ok(winner) => truth.winners.insert(defender, challenger, winner),
                Err(e) => {
                    warn!(defender, challenger, error = %e, "pair unresolved");
                    truth.stats.failures += 1;
                    truth.failures.insert((defender, challenger), e);
                }
            }
        }
    }

    async fn fan_out(
        &self,
        split: &PerspectiveSplitFramework,
        agents: &[Agent],
        pairs: Vec<(AgentId, AgentId)>,
    ) -> Vec<PairOutcome> {
        let properties: HashMap<AgentId, PropertySet> = agents
            .iter()
            .map(|a| (a.id(), a.properties().clone()))
            .collect();
        let split = Arc::new(split.clone());
        let sem = Arc::new(Semaphore::new(self.config.max_workers));
        let mut pending: BTreeSet<(AgentId, AgentId)> = BTreeSet::new();
        let mut join_set: JoinSet<PairOutcome> = JoinSet::new();
        let mut outcomes = Vec::with_capacity(pairs.len());

        for (defender, challenger) in pairs {
            let (Some(observer), Some(counterparty)) = (
                properties.get(&defender).cloned(),
                properties.get(&challenger).cloned(),
            ) else {
                warn!(defender, challenger, "pair references an unknown agent");
                continue;
            };
            pending.insert((defender, challenger));

            let sem = sem.clone();
            let split = split.clone();
            let solver = self.solver.clone();
            let semantics = self.semantics;
            join_set.spawn(async move {
                let _permit = sem.acquire().await.expect("semaphore closed");
                let pruned = split.prune_for_pair(&observer, &counterparty);
                let result = solver
                    .decide_skeptical(pruned.framework(), pruned.motion_claim(), semantics)
                    .await
                    .map(|accepted| if accepted { challenger } else { defender });
                ((defender, challenger), result)
            });
        }

        while let Some(res) = join_set.join_next().await {
            match res {
                Ok((pair, result)) => {
                    pending.remove(&pair);
                    outcomes.push((pair, result));
                }
                Err(e) => warn!(error = %e, "oracle worker panicked"),
            }
        }

        for pair in pending {
            outcomes.push((
                pair,
                Err(SolverError::Invocation {
                    problem: Task::DecideSkeptical.problem(self.semantics),
                    exit_code: None,
                    stderr: "oracle worker panicked".to_string(),
                }),
            ));
        }
        outcomes
    }
}
