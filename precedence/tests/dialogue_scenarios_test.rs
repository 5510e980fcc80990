//! End-to-end dialogue scenarios over hand-built frameworks.

mod common;

use common::{valued_agent, value_framework};
use precedence::dialogue::{DialogueGame, DialoguePhase, Rankings, Strategy};
use precedence::framework::Side;
use precedence::{Argument, ArgumentationFramework, PerspectiveSplitFramework, PropertySet};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn dialogue_split(base: &ArgumentationFramework) -> PerspectiveSplitFramework {
    PerspectiveSplitFramework::build(base)
        .unwrap()
        .without_motion_support()
}

// ── Value comparison ────────────────────────────────────────────────

#[test]
fn test_unlimited_budget_higher_value_challenger_wins() {
    let split = dialogue_split(&value_framework(5));
    let rankings = Rankings::from_framework(split.framework());
    let mut rng = StdRng::seed_from_u64(0);

    for strategy in Strategy::ALL.into_iter().filter(|s| !s.is_budget_aware()) {
        let game = DialogueGame::new(&split, &rankings, strategy).unwrap();
        let mut defender = valued_agent(0, 5, 0);
        let mut challenger = valued_agent(1, 10, 0);

        let outcome = game.play(&mut defender, &mut challenger, &mut rng).unwrap();
        assert_eq!(outcome.winner, 1, "strategy {strategy}");
        assert!(!outcome.considered_unfair);
    }
}

#[test]
fn test_budget_aware_challenger_priced_out_loses_unfairly() {
    let split = dialogue_split(&value_framework(5));
    let rankings = Rankings::from_framework(split.framework());
    let game =
        DialogueGame::new(&split, &rankings, Strategy::RandomChoice { with_budget: true }).unwrap();
    let mut defender = valued_agent(0, 5, 20);
    let mut challenger = valued_agent(1, 10, 4);

    let transcript = game
        .play_transcript(&mut defender, &mut challenger, &mut StdRng::seed_from_u64(1))
        .unwrap();

    assert_eq!(transcript.outcome.winner, 0);
    assert!(transcript.outcome.considered_unfair);
    assert_eq!(challenger.unfair_losses(), 1);
    assert_eq!(transcript.moves.len(), 1);
    assert_eq!(transcript.moves[0].side, Side::Observer);
    assert_eq!(transcript.outcome.total_privacy_cost, 5);
}

#[test]
fn test_budgets_reset_between_dialogues() {
    let split = dialogue_split(&value_framework(5));
    let rankings = Rankings::from_framework(split.framework());
    let game =
        DialogueGame::new(&split, &rankings, Strategy::LeastCost { with_budget: true }).unwrap();
    let mut defender = valued_agent(0, 5, 5);
    let mut challenger = valued_agent(1, 10, 5);
    let mut rng = StdRng::seed_from_u64(0);

    let first = game.play(&mut defender, &mut challenger, &mut rng).unwrap();
    let second = game.play(&mut defender, &mut challenger, &mut rng).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.winner, 1);
    assert!(!first.considered_unfair);
}

#[test]
fn test_outcome_is_recorded_on_both_agents() {
    let split = dialogue_split(&value_framework(2));
    let rankings = Rankings::from_framework(split.framework());
    let game =
        DialogueGame::new(&split, &rankings, Strategy::LeastCost { with_budget: false }).unwrap();
    let mut defender = valued_agent(3, 1, 0);
    let mut challenger = valued_agent(8, 2, 0);

    let outcome = game
        .play(&mut defender, &mut challenger, &mut StdRng::seed_from_u64(0))
        .unwrap();

    assert_eq!(defender.outcome(3, 8), Some(&outcome));
    assert_eq!(challenger.outcome(3, 8), Some(&outcome));
    assert!(defender.has_argued_with(8));
    assert!(challenger.has_argued_with(3));
}

// ── Phase log ───────────────────────────────────────────────────────

#[test]
fn test_transcript_alternates_sides_and_concludes() {
    let split = dialogue_split(&value_framework(5));
    let rankings = Rankings::from_framework(split.framework());
    let game =
        DialogueGame::new(&split, &rankings, Strategy::LeastCost { with_budget: false }).unwrap();
    let transcript = game
        .play_transcript(
            &mut valued_agent(0, 5, 0),
            &mut valued_agent(1, 10, 0),
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap();

    let phases: Vec<DialoguePhase> = transcript.transitions.iter().map(|t| t.to).collect();
    assert_eq!(
        phases,
        vec![
            DialoguePhase::DefenderTurn,
            DialoguePhase::ChallengerTurn,
            DialoguePhase::DefenderTurn,
            DialoguePhase::Concluded,
        ]
    );
    let sides: Vec<Side> = transcript.moves.iter().map(|m| m.side).collect();
    assert_eq!(sides, vec![Side::Observer, Side::Counterparty]);
}

// ── Mass rebuttal ───────────────────────────────────────────────────

/// Two independent supporting arguments for each side's position.
fn double_support() -> ArgumentationFramework {
    let mut af = ArgumentationFramework::new();
    af.add_argument(Argument::new(0, "motion"));
    af.add_argument(
        Argument::new(1, "I am older")
            .with_cost(1)
            .with_fact(|me, them| me.get("age") > them.get("age")),
    );
    af.add_argument(
        Argument::new(2, "I am bigger")
            .with_cost(1)
            .with_fact(|me, them| me.get("size") > them.get("size")),
    );
    af.add_attack(1, 0).unwrap();
    af.add_attack(2, 0).unwrap();
    af
}

#[test]
fn test_all_arguments_plays_every_legal_rebuttal() {
    let split = dialogue_split(&double_support());
    let rankings = Rankings::from_framework(split.framework());
    let game = DialogueGame::new(&split, &rankings, Strategy::AllArguments).unwrap();

    let mut defender = valued_agent(0, 0, 0);
    defender.assign_properties(PropertySet::new().with("age", 1).with("size", 1));
    let mut challenger = valued_agent(1, 0, 0);
    challenger.assign_properties(PropertySet::new().with("age", 9).with("size", 9));

    let transcript = game
        .play_transcript(&mut defender, &mut challenger, &mut StdRng::seed_from_u64(0))
        .unwrap();

    // Both observer claims rebut the motion at once.
    assert_eq!(transcript.moves[0].played, vec![4, 8]);
    assert_eq!(transcript.moves[0].cost, 2);
    // The challenger answers both with its true facts.
    assert_eq!(transcript.moves[1].played, vec![7, 11]);
    assert_eq!(transcript.outcome.winner, 1);
    assert!(!transcript.outcome.considered_unfair);
}

#[test]
fn test_all_arguments_loses_when_rebuttal_leaves_a_gap() {
    let split = dialogue_split(&double_support());
    let rankings = Rankings::from_framework(split.framework());
    let game = DialogueGame::new(&split, &rankings, Strategy::AllArguments).unwrap();

    // Challenger is older but smaller: it can only rebut node 4 with fact 7,
    // leaving the defender's claim 8 unanswered by any fact.
    let mut defender = valued_agent(0, 0, 0);
    defender.assign_properties(PropertySet::new().with("age", 1).with("size", 9));
    let mut challenger = valued_agent(1, 0, 0);
    challenger.assign_properties(PropertySet::new().with("age", 9).with("size", 1));

    let transcript = game
        .play_transcript(&mut defender, &mut challenger, &mut StdRng::seed_from_u64(0))
        .unwrap();

    assert_eq!(transcript.moves.len(), 1);
    assert_eq!(transcript.outcome.winner, 0);
    assert!(!transcript.outcome.considered_unfair);
}
