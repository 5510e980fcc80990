//! Agents, their privacy budgets and the outcomes of their dialogues.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::framework::PropertySet;

/// Identifier of an agent; equal to its initial queue slot.
pub type AgentId = usize;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BudgetError {
    #[error("privacy cost {cost} exceeds remaining budget {remaining}")]
    Insufficient { cost: u64, remaining: u32 },
}

/// Per-dialogue allowance for revealing private information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacyBudget {
    max: u32,
    remaining: u32,
}

impl PrivacyBudget {
    pub fn new(max: u32) -> Self {
        Self {
            max,
            remaining: max,
        }
    }

    pub fn unlimited() -> Self {
        Self::new(u32::MAX)
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn spent(&self) -> u32 {
        self.max - self.remaining
    }

    pub fn can_afford(&self, cost: u64) -> bool {
        cost <= u64::from(self.remaining)
    }

    /// Deduct `cost`, refusing if it would overdraw the budget.
    pub fn spend(&mut self, cost: u64) -> Result<(), BudgetError> {
        if !self.can_afford(cost) {
            return Err(BudgetError::Insufficient {
                cost,
                remaining: self.remaining,
            });
        }
        // can_afford bounds cost by remaining, so it fits in u32
        self.remaining -= cost as u32;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.remaining = self.max;
    }
}

/// Result of a single dialogue. Stored by both participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueOutcome {
    pub winner: AgentId,
    pub considered_unfair: bool,
    pub total_privacy_cost: u64,
    pub turns: u32,
}

#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    properties: PropertySet,
    budget: PrivacyBudget,
    argued_with: BTreeSet<AgentId>,
    outcomes: BTreeMap<(AgentId, AgentId), DialogueOutcome>,
    unfair_losses: u32,
}

impl Agent {
    pub fn new(id: AgentId, max_privacy_budget: u32) -> Self {
        Self {
            id,
            properties: PropertySet::new(),
            budget: PrivacyBudget::new(max_privacy_budget),
            argued_with: BTreeSet::new(),
            outcomes: BTreeMap::new(),
            unfair_losses: 0,
        }
    }

    pub fn with_properties(mut self, properties: PropertySet) -> Self {
        self.properties = properties;
        self
    }

    /// Snapshot the culture-assigned properties.
    pub fn assign_properties(&mut self, properties: PropertySet) {
        self.properties = properties;
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }

    pub fn budget(&self) -> &PrivacyBudget {
        &self.budget
    }

    pub(crate) fn budget_mut(&mut self) -> &mut PrivacyBudget {
        &mut self.budget
    }

    /// Change the maximum budget; the remaining allowance is refilled.
    pub fn set_max_privacy_budget(&mut self, max: u32) {
        self.budget = PrivacyBudget::new(max);
    }

    pub fn has_argued_with(&self, other: AgentId) -> bool {
        self.argued_with.contains(&other)
    }

    pub fn argued_with(&self) -> &BTreeSet<AgentId> {
        &self.argued_with
    }

    /// Outcome of the dialogue in which `defender` defended against `challenger`.
    pub fn outcome(&self, defender: AgentId, challenger: AgentId) -> Option<&DialogueOutcome> {
        self.outcomes.get(&(defender, challenger))
    }

    pub fn outcomes(&self) -> impl Iterator<Item = ((AgentId, AgentId), &DialogueOutcome)> + '_ {
        self.outcomes.iter().map(|(pair, outcome)| (*pair, outcome))
    }

    pub fn unfair_losses(&self) -> u32 {
        self.unfair_losses
    }

    pub(crate) fn record(
        &mut self,
        defender: AgentId,
        challenger: AgentId,
        outcome: DialogueOutcome,
    ) {
        let other = if self.id == defender {
            challenger
        } else {
            defender
        };
        self.argued_with.insert(other);
        self.outcomes.insert((defender, challenger), outcome);
    }

    pub(crate) fn note_unfair_loss(&mut self) {
        self.unfair_losses += 1;
    }

    pub fn report(&self) -> AgentReport {
        AgentReport {
            id: self.id,
            max_privacy_budget: self.budget.max(),
            unfair_losses: self.unfair_losses,
            properties: self.properties.clone(),
            dialogues: self
                .outcomes
                .iter()
                .map(|(&(defender, challenger), &outcome)| DialogueRecord {
                    defender,
                    challenger,
                    outcome,
                })
                .collect(),
        }
    }
}

/// Serializable view of one agent for downstream analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentReport {
    pub id: AgentId,
    pub max_privacy_budget: u32,
    pub unfair_losses: u32,
    pub properties: PropertySet,
    pub dialogues: Vec<DialogueRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueRecord {
    pub defender: AgentId,
    pub challenger: AgentId,
    #[serde(flatten)]
    pub outcome: DialogueOutcome,
}
