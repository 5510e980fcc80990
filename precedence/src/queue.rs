//! Agent queue and the dialogue-driven sorting network.
//!
//! The sorter alternates two scans over adjacent pairs: scan A compares
//! `(0,1), (2,3), …`, scan B compares `(1,2), (3,4), …`. In each pair the
//! lower index defends its slot; the pair swaps when the defender loses.
//! Agents that have already argued keep their current order, so every pair
//! is decided by at most one dialogue and the sort halts after the first
//! pass without swaps.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::agent::{Agent, AgentId, AgentReport, DialogueOutcome};
use crate::culture::Culture;
use crate::dialogue::{DialogueGame, Rankings, Strategy};
use crate::error::Result;
use crate::framework::PerspectiveSplitFramework;

// ── Queue ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct AgentQueue {
    agents: Vec<Agent>,
}

impl AgentQueue {
    pub fn new(agents: Vec<Agent>) -> Self {
        Self { agents }
    }

    /// `size` agents with ids `0..size`, properties assigned by `culture`.
    pub fn from_culture(
        culture: &dyn Culture,
        size: usize,
        max_privacy_budget: u32,
        rng: &mut dyn RngCore,
    ) -> Self {
        let agents = (0..size)
            .map(|id| {
                let mut agent = Agent::new(id, max_privacy_budget);
                culture.assign(&mut agent, rng);
                agent
            })
            .collect();
        Self { agents }
    }

    /// Independent copy for a new trial.
    pub fn fork(&self) -> Self {
        self.clone()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, slot: usize) -> Option<&Agent> {
        self.agents.get(slot)
    }

    /// Agent ids front to back.
    pub fn order(&self) -> Vec<AgentId> {
        self.agents.iter().map(Agent::id).collect()
    }

    pub fn set_privacy_budget(&mut self, max: u32) {
        for agent in &mut self.agents {
            agent.set_max_privacy_budget(max);
        }
    }

    pub fn report(&self) -> QueueReport {
        QueueReport {
            order: self.order(),
            agents: self.agents.iter().map(Agent::report).collect(),
        }
    }

    /// Mutable access to two distinct slots, first one defending.
    fn pair_mut(&mut self, defender: usize, challenger: usize) -> (&mut Agent, &mut Agent) {
        debug_assert_ne!(defender, challenger);
        if defender < challenger {
            let (head, tail) = self.agents.split_at_mut(challenger);
            (&mut head[defender], &mut tail[0])
        } else {
            let (head, tail) = self.agents.split_at_mut(defender);
            (&mut tail[0], &mut head[challenger])
        }
    }
}

/// Downstream export of a queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueReport {
    pub order: Vec<AgentId>,
    pub agents: Vec<AgentReport>,
}

// ── Sorter ──────────────────────────────────────────────────────────

/// Summary of one sort run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SortReport {
    pub passes: u32,
    pub swaps: u32,
    pub interactions: u32,
    pub unfair_terminations: u32,
    pub local_unfairness_rate: f64,
    pub order: Vec<AgentId>,
}

impl SortReport {
    fn count(&mut self, outcome: &DialogueOutcome) {
        self.interactions += 1;
        if outcome.considered_unfair {
            self.unfair_terminations += 1;
        }
    }

    fn finish(mut self, order: Vec<AgentId>) -> Self {
        self.local_unfairness_rate = unfairness_rate(self.unfair_terminations, self.interactions);
        self.order = order;
        self
    }
}

/// Result of an all-pairs run: the winners plus the unfairness seen on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatrixReport {
    pub matrix: WinnerMatrix,
    pub interactions: u32,
    pub unfair_terminations: u32,
    pub local_unfairness_rate: f64,
}

impl MatrixReport {
    fn count(&mut self, defender: AgentId, challenger: AgentId, outcome: &DialogueOutcome) {
        self.matrix.insert(defender, challenger, outcome.winner);
        self.interactions += 1;
        if outcome.considered_unfair {
            self.unfair_terminations += 1;
        }
    }
}

fn unfairness_rate(unfair: u32, interactions: u32) -> f64 {
    if interactions == 0 {
        0.0
    } else {
        f64::from(unfair) / f64::from(interactions)
    }
}

/// Sorting network that uses dialogues as its comparator.
#[derive(Debug, Clone)]
pub struct PriorityQueueSorter {
    framework: PerspectiveSplitFramework,
    rankings: Rankings,
    strategy: Strategy,
}

impl PriorityQueueSorter {
    /// Prepare the dialogue framework once for every dialogue of the sorter.
    pub fn new(split: &PerspectiveSplitFramework, strategy: Strategy) -> Result<Self> {
        let framework = split.without_motion_support();
        strategy.check_against(&framework)?;
        let rankings = Rankings::from_framework(framework.framework());
        Ok(Self {
            framework,
            rankings,
            strategy,
        })
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn framework(&self) -> &PerspectiveSplitFramework {
        &self.framework
    }

    fn game(&self) -> Result<DialogueGame<'_>> {
        Ok(DialogueGame::new(&self.framework, &self.rankings, self.strategy)?)
    }

    /// Sort `queue` in place.
    pub fn sort<R: Rng + ?Sized>(&self, queue: &mut AgentQueue, rng: &mut R) -> Result<SortReport> {
        let game = self.game()?;
        let mut report = SortReport::default();

        loop {
            report.passes += 1;
            let mut pass_swaps = 0;

            for start in [0, 1] {
                let mut slot = start;
                while slot + 1 < queue.len() {
                    if self.challenger_takes_slot(&game, queue, slot, rng, &mut report)? {
                        queue.agents.swap(slot, slot + 1);
                        pass_swaps += 1;
                    }
                    slot += 2;
                }
            }

            report.swaps += pass_swaps;
            info!(
                pass = report.passes,
                swaps = pass_swaps,
                interactions = report.interactions,
                order = ?queue.order(),
                "sorter pass complete"
            );
            if pass_swaps == 0 {
                break;
            }
        }

        let report = report.finish(queue.order());
        info!(
            passes = report.passes,
            swaps = report.swaps,
            unfair = report.unfair_terminations,
            rate = report.local_unfairness_rate,
            "queue sorted"
        );
        Ok(report)
    }

    fn challenger_takes_slot<R: Rng + ?Sized>(
        &self,
        game: &DialogueGame<'_>,
        queue: &mut AgentQueue,
        slot: usize,
        rng: &mut R,
        report: &mut SortReport,
    ) -> Result<bool> {
        let (defender, challenger) = queue.pair_mut(slot, slot + 1);
        if defender.has_argued_with(challenger.id()) {
            debug!(
                defender = defender.id(),
                challenger = challenger.id(),
                "pair already argued, keeping order"
            );
            return Ok(false);
        }
        let outcome = game.play(defender, challenger, rng)?;
        report.count(&outcome);
        Ok(outcome.winner != defender.id())
    }

    /// Dialogue for every ordered pair `(defender, challenger)`, without
    /// touching the queue order.
    pub fn interact_all_pairs<R: Rng + ?Sized>(
        &self,
        queue: &mut AgentQueue,
        rng: &mut R,
    ) -> Result<MatrixReport> {
        let game = self.game()?;
        let mut report = MatrixReport::default();
        for d in 0..queue.len() {
            for c in 0..queue.len() {
                if d == c {
                    continue;
                }
                let (defender, challenger) = queue.pair_mut(d, c);
                let outcome = game.play(defender, challenger, rng)?;
                report.count(defender.id(), challenger.id(), &outcome);
            }
        }
        report.local_unfairness_rate =
            unfairness_rate(report.unfair_terminations, report.interactions);
        info!(
            pairs = report.matrix.len(),
            unfair = report.unfair_terminations,
            rate = report.local_unfairness_rate,
            "all-pairs interaction complete"
        );
        Ok(report)
    }
}

// ── Pairwise results ────────────────────────────────────────────────

/// Winner of each ordered `(defender, challenger)` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WinnerMatrix {
    winners: BTreeMap<(AgentId, AgentId), AgentId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairRecord {
    pub defender: AgentId,
    pub challenger: AgentId,
    pub winner: AgentId,
}

impl WinnerMatrix {
    pub fn insert(&mut self, defender: AgentId, challenger: AgentId, winner: AgentId) {
        self.winners.insert((defender, challenger), winner);
    }

    pub fn winner(&self, defender: AgentId, challenger: AgentId) -> Option<AgentId> {
        self.winners.get(&(defender, challenger)).copied()
    }

    pub fn len(&self) -> usize {
        self.winners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.winners.is_empty()
    }

    /// Every agent appearing in any pair.
    pub fn agents(&self) -> BTreeSet<AgentId> {
        self.winners
            .keys()
            .flat_map(|&(d, c)| [d, c])
            .collect()
    }

    /// Winner of `{a, b}` when both role assignments agree.
    pub fn settled_winner(&self, a: AgentId, b: AgentId) -> Option<AgentId> {
        match (self.winner(a, b), self.winner(b, a)) {
            (Some(x), Some(y)) if x == y => Some(x),
            _ => None,
        }
    }

    /// Unordered pairs (smaller id first) whose two directions disagree.
    pub fn role_dependent_pairs(&self) -> Vec<(AgentId, AgentId)> {
        self.winners
            .iter()
            .filter_map(|(&(d, c), &w)| {
                let disagrees = self.winner(c, d).is_some_and(|reverse| reverse != w);
                (d < c && disagrees).then_some((d, c))
            })
            .collect()
    }

    pub fn records(&self) -> Vec<PairRecord> {
        self.winners
            .iter()
            .map(|(&(defender, challenger), &winner)| PairRecord {
                defender,
                challenger,
                winner,
            })
            .collect()
    }
}

/// Agreement between a reference relation and a tested one.
///
/// Both matrices are read as graphs with an edge `{a, b}` whenever both
/// directions name the same winner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagDistance {
    /// Same edge, same winner.
    pub agreeing: u32,
    /// Edge present in only one of the two.
    pub one_sided: u32,
    /// Edge present in neither.
    pub undetermined: u32,
    /// Edge present in both with opposite winners.
    pub reversed: u32,
}

impl DagDistance {
    pub fn between(reference: &WinnerMatrix, result: &WinnerMatrix) -> Self {
        let agents: Vec<AgentId> = reference
            .agents()
            .union(&result.agents())
            .copied()
            .collect();
        let mut distance = Self::default();
        for (i, &a) in agents.iter().enumerate() {
            for &b in &agents[i + 1..] {
                match (reference.settled_winner(a, b), result.settled_winner(a, b)) {
                    (Some(x), Some(y)) if x == y => distance.agreeing += 1,
                    (Some(_), Some(_)) => distance.reversed += 1,
                    (Some(_), None) | (None, Some(_)) => distance.one_sided += 1,
                    (None, None) => distance.undetermined += 1,
                }
            }
        }
        distance
    }

    /// Pairs the two relations disagree on.
    pub fn disagreements(&self) -> u32 {
        self.one_sided + self.reversed
    }
}
