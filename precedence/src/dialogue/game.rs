//! One dialogue between a defender and a challenger.
//!
//! The challenger opens by putting the motion (node 1) forward. Sides then
//! alternate, each rebutting the opponent's last play with a node of its own
//! colour. A side with no legal rebuttal loses; a budget-aware side whose
//! legal rebuttals are all too expensive loses *unfairly*.

use rand::Rng;
use std::collections::BTreeSet;
use tracing::debug;

use super::state::{DialoguePhase, DialogueState, Move, PhaseTransition};
use super::strategy::{Candidate, Rankings, Selection, Strategy};
use crate::agent::{Agent, AgentId, DialogueOutcome};
use crate::config::ConfigError;
use crate::error::Result;
use crate::framework::{ArgumentId, PerspectiveSplitFramework, Side};

/// Full record of a dialogue.
#[derive(Debug, Clone)]
pub struct DialogueTranscript {
    pub outcome: DialogueOutcome,
    pub moves: Vec<Move>,
    pub transitions: Vec<PhaseTransition>,
}

/// Why a dialogue ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ending {
    /// The acting side had no legal rebuttal.
    NoLegalMove,
    /// Legal rebuttals existed but none was affordable.
    OutOfBudget,
    /// A mass rebuttal left part of the opponent's play unanswered.
    Uncovered,
}

impl Ending {
    fn reason(self) -> &'static str {
        match self {
            Self::NoLegalMove => "no legal rebuttal",
            Self::OutOfBudget => "no affordable rebuttal",
            Self::Uncovered => "rebuttal does not cover the previous play",
        }
    }
}

/// Dialogue engine over a motion-stripped split framework.
#[derive(Debug, Clone, Copy)]
pub struct DialogueGame<'a> {
    framework: &'a PerspectiveSplitFramework,
    rankings: &'a Rankings,
    strategy: Strategy,
}

impl<'a> DialogueGame<'a> {
    /// `framework` must have had its motion support removed
    /// (see [`PerspectiveSplitFramework::without_motion_support`]).
    pub fn new(
        framework: &'a PerspectiveSplitFramework,
        rankings: &'a Rankings,
        strategy: Strategy,
    ) -> std::result::Result<Self, ConfigError> {
        if framework.has_motion_support() {
            return Err(ConfigError::MotionSupportPresent);
        }
        strategy.check_against(framework)?;
        Ok(Self {
            framework,
            rankings,
            strategy,
        })
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Run the dialogue and record its outcome on both agents.
    pub fn play<R: Rng + ?Sized>(
        &self,
        defender: &mut Agent,
        challenger: &mut Agent,
        rng: &mut R,
    ) -> Result<DialogueOutcome> {
        Ok(self.play_transcript(defender, challenger, rng)?.outcome)
    }

    /// Run the dialogue, returning every move and phase transition.
    pub fn play_transcript<R: Rng + ?Sized>(
        &self,
        defender: &mut Agent,
        challenger: &mut Agent,
        rng: &mut R,
    ) -> Result<DialogueTranscript> {
        let af = self.framework.framework();
        let motion = self.framework.motion_claim();
        let budget_aware = self.strategy.is_budget_aware();

        defender.budget_mut().reset();
        challenger.budget_mut().reset();

        let mut state = DialogueState::new();
        let mut played: [BTreeSet<ArgumentId>; 2] = Default::default();
        let mut last: [Vec<ArgumentId>; 2] = Default::default();
        played[Side::Counterparty.index()].insert(motion);
        last[Side::Counterparty.index()] = vec![motion];
        state.transition(DialoguePhase::DefenderTurn, "challenger put the motion forward")?;

        let mut moves = Vec::new();
        let mut total_cost: u64 = 0;
        let mut side = Side::Observer;

        let (loser, ending) = loop {
            let opponent = side.opponent();
            let previous = &last[opponent.index()];

            let already_played: BTreeSet<ArgumentId> =
                played[0].union(&played[1]).copied().collect();
            let blocked = af.attacked_by_all(already_played.iter().copied())?;

            let mut legal = Vec::new();
            for id in af.attackers_of_all(previous.iter().copied())? {
                if Side::of(id) != side || already_played.contains(&id) || blocked.contains(&id) {
                    continue;
                }
                if self
                    .framework
                    .holds(id, defender.properties(), challenger.properties())?
                {
                    legal.push(Candidate {
                        id,
                        cost: af.argument(id)?.privacy_cost(),
                    });
                }
            }
            if legal.is_empty() {
                break (side, Ending::NoLegalMove);
            }

            let actor = seat(side, defender, challenger);
            let affordable: Vec<Candidate> = if budget_aware {
                let budget = actor.budget();
                legal
                    .into_iter()
                    .filter(|c| budget.can_afford(u64::from(c.cost)))
                    .collect()
            } else {
                legal
            };

            let Some(selection) = self.strategy.select(&affordable, self.rankings, rng) else {
                break (side, Ending::OutOfBudget);
            };

            let play = match selection {
                Selection::One(id) => vec![id],
                Selection::All(ids) => {
                    let answered = af.attacked_by_all(ids.iter().copied())?;
                    if !previous.iter().all(|id| answered.contains(id)) {
                        break (side, Ending::Uncovered);
                    }
                    ids
                }
            };

            let cost: u64 = affordable
                .iter()
                .filter(|c| play.contains(&c.id))
                .map(|c| u64::from(c.cost))
                .sum();
            if budget_aware {
                actor.budget_mut().spend(cost)?;
            }
            total_cost += cost;

            let turn = moves.len() as u32 + 1;
            debug!(
                turn,
                side = %side,
                played = ?play,
                cost,
                remaining = actor.budget().remaining(),
                "dialogue move"
            );

            played[side.index()].extend(play.iter().copied());
            last[side.index()] = play.clone();
            moves.push(Move {
                turn,
                side,
                played: play,
                cost,
            });

            state.transition(DialoguePhase::turn_of(opponent), "rebuttal played")?;
            side = opponent;
        };

        let considered_unfair = ending == Ending::OutOfBudget;
        if considered_unfair {
            seat(loser, defender, challenger).note_unfair_loss();
        }
        state.transition(DialoguePhase::Concluded, ending.reason())?;

        let winner: AgentId = match loser {
            Side::Observer => challenger.id(),
            Side::Counterparty => defender.id(),
        };
        let outcome = DialogueOutcome {
            winner,
            considered_unfair,
            total_privacy_cost: total_cost,
            turns: moves.len() as u32,
        };
        debug!(
            defender = defender.id(),
            challenger = challenger.id(),
            winner,
            unfair = considered_unfair,
            cost = total_cost,
            reason = ending.reason(),
            "dialogue concluded"
        );

        let (defender_id, challenger_id) = (defender.id(), challenger.id());
        defender.record(defender_id, challenger_id, outcome);
        challenger.record(defender_id, challenger_id, outcome);

        Ok(DialogueTranscript {
            outcome,
            moves,
            transitions: state.into_transitions(),
        })
    }
}

fn seat<'b>(side: Side, defender: &'b mut Agent, challenger: &'b mut Agent) -> &'b mut Agent {
    match side {
        Side::Observer => defender,
        Side::Counterparty => challenger,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::{Argument, ArgumentationFramework, PropertySet};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dialogue_framework(cost: u32) -> PerspectiveSplitFramework {
        let mut af = ArgumentationFramework::new();
        af.add_argument(Argument::new(0, "motion"));
        af.add_argument(
            Argument::new(1, "property check")
                .with_cost(cost)
                .with_fact(|me, them| me.get("value") > them.get("value")),
        );
        af.add_attack(1, 0).unwrap();
        PerspectiveSplitFramework::build(&af)
            .unwrap()
            .without_motion_support()
    }

    fn agent(id: AgentId, value: i64, budget: u32) -> Agent {
        Agent::new(id, budget).with_properties(PropertySet::new().with("value", value))
    }

    #[test]
    fn test_higher_value_challenger_wins() {
        let split = dialogue_framework(5);
        let rankings = Rankings::from_framework(split.framework());
        let game =
            DialogueGame::new(&split, &rankings, Strategy::LeastCost { with_budget: false })
                .unwrap();
        let (mut low, mut high) = (agent(0, 5, 0), agent(1, 10, 0));

        let transcript = game
            .play_transcript(&mut low, &mut high, &mut StdRng::seed_from_u64(0))
            .unwrap();

        assert_eq!(transcript.outcome.winner, 1);
        assert!(!transcript.outcome.considered_unfair);
        let plays: Vec<Vec<ArgumentId>> =
            transcript.moves.iter().map(|m| m.played.clone()).collect();
        assert_eq!(plays, vec![vec![4], vec![7]]);
        assert_eq!(transcript.outcome.total_privacy_cost, 10);
        assert_eq!(
            transcript.transitions.last().map(|t| t.to),
            Some(DialoguePhase::Concluded)
        );
    }

    #[test]
    fn test_defender_with_higher_value_holds_its_place() {
        let split = dialogue_framework(5);
        let rankings = Rankings::from_framework(split.framework());
        let game =
            DialogueGame::new(&split, &rankings, Strategy::LeastCost { with_budget: false })
                .unwrap();
        let (mut high, mut low) = (agent(0, 10, 0), agent(1, 5, 0));

        let outcome = game
            .play(&mut high, &mut low, &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(outcome.winner, 0);
        assert_eq!(outcome.turns, 1);
    }

    #[test]
    fn test_budget_shortfall_is_an_unfair_loss() {
        let split = dialogue_framework(5);
        let rankings = Rankings::from_framework(split.framework());
        let game =
            DialogueGame::new(&split, &rankings, Strategy::LeastCost { with_budget: true })
                .unwrap();
        let (mut low, mut high) = (agent(0, 5, 10), agent(1, 10, 3));

        let outcome = game
            .play(&mut low, &mut high, &mut StdRng::seed_from_u64(0))
            .unwrap();

        assert_eq!(outcome.winner, 0);
        assert!(outcome.considered_unfair);
        assert_eq!(high.unfair_losses(), 1);
        assert_eq!(low.unfair_losses(), 0);
        assert_eq!(low.budget().remaining(), 5);
        assert_eq!(high.outcome(0, 1), Some(&outcome));
    }

    #[test]
    fn test_costless_framework_rejects_budget_aware_strategy() {
        let split = dialogue_framework(0);
        let rankings = Rankings::from_framework(split.framework());
        assert!(DialogueGame::new(&split, &rankings, Strategy::RandomChoice { with_budget: true })
            .is_err());
        assert!(DialogueGame::new(&split, &rankings, Strategy::AllArguments).is_ok());
    }

    #[test]
    fn test_unstripped_split_is_rejected() {
        let mut af = ArgumentationFramework::new();
        af.add_argument(Argument::new(0, "motion"));
        af.add_argument(Argument::new(1, "property check").with_cost(5));
        af.add_attack(1, 0).unwrap();
        let split = PerspectiveSplitFramework::build(&af).unwrap();
        let rankings = Rankings::from_framework(split.framework());

        let err = DialogueGame::new(&split, &rankings, Strategy::LeastCost { with_budget: false })
            .unwrap_err();
        assert!(matches!(err, ConfigError::MotionSupportPresent));
    }
}
