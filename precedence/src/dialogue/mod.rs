//! Turn-based, privacy-aware dialogue game.

pub mod game;
pub mod state;
pub mod strategy;

pub use game::{DialogueGame, DialogueTranscript};
pub use state::{DialoguePhase, DialogueState, Move, PhaseTransition, TransitionError};
pub use strategy::{Candidate, Rankings, Selection, Strategy};
