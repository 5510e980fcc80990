//! Dialogue state machine: phases, transitions, and the move log.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::framework::{ArgumentId, Side};

/// Phase of a dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialoguePhase {
    /// Budgets reset, motion not yet on the table.
    Setup,
    /// Defender must rebut the challenger's last play.
    DefenderTurn,
    /// Challenger must rebut the defender's last play.
    ChallengerTurn,
    /// A side ran out of moves.
    Concluded,
}

impl DialoguePhase {
    /// Whether this is a terminal phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Concluded)
    }

    /// Valid transitions from this phase.
    pub fn valid_transitions(self) -> &'static [DialoguePhase] {
        match self {
            Self::Setup => &[Self::DefenderTurn],
            Self::DefenderTurn => &[Self::ChallengerTurn, Self::Concluded],
            Self::ChallengerTurn => &[Self::DefenderTurn, Self::Concluded],
            Self::Concluded => &[],
        }
    }

    /// Turn phase of the side about to play.
    pub fn turn_of(side: Side) -> Self {
        match side {
            Side::Observer => Self::DefenderTurn,
            Side::Counterparty => Self::ChallengerTurn,
        }
    }
}

impl std::fmt::Display for DialoguePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Setup => write!(f, "setup"),
            Self::DefenderTurn => write!(f, "defender_turn"),
            Self::ChallengerTurn => write!(f, "challenger_turn"),
            Self::Concluded => write!(f, "concluded"),
        }
    }
}

/// A single play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    /// Turn number (1-indexed; the motion is turn 0).
    pub turn: u32,
    pub side: Side,
    /// Nodes put forward this turn; more than one only for mass rebuttals.
    pub played: Vec<ArgumentId>,
    /// Privacy cost of the play.
    pub cost: u64,
}

/// A phase transition record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: DialoguePhase,
    pub to: DialoguePhase,
    pub reason: String,
}

/// Rejected phase change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("dialogue already concluded; cannot enter {to}")]
    AlreadyConcluded { to: DialoguePhase },

    #[error("dialogue cannot go from {from} to {to}")]
    Illegal {
        from: DialoguePhase,
        to: DialoguePhase,
    },
}

/// Current phase plus its history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueState {
    phase: DialoguePhase,
    transitions: Vec<PhaseTransition>,
}

impl Default for DialogueState {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogueState {
    pub fn new() -> Self {
        Self {
            phase: DialoguePhase::Setup,
            transitions: Vec::new(),
        }
    }

    pub fn phase(&self) -> DialoguePhase {
        self.phase
    }

    pub fn transitions(&self) -> &[PhaseTransition] {
        &self.transitions
    }

    pub fn into_transitions(self) -> Vec<PhaseTransition> {
        self.transitions
    }

    /// Enter `to`, logging why.
    pub fn transition(
        &mut self,
        to: DialoguePhase,
        reason: impl Into<String>,
    ) -> Result<(), TransitionError> {
        let from = self.phase;
        if from.is_terminal() {
            return Err(TransitionError::AlreadyConcluded { to });
        }
        if !from.valid_transitions().contains(&to) {
            return Err(TransitionError::Illegal { from, to });
        }
        self.phase = to;
        self.transitions.push(PhaseTransition {
            from,
            to,
            reason: reason.into(),
        });
        Ok(())
    }
}
