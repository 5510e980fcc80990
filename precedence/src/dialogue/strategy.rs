//! Argument-selection strategies.
//!
//! A strategy picks the play from the affordable candidates of a turn.
//! Budget-aware variants only ever see candidates the acting side can pay
//! for; budget-oblivious ones see every legal candidate.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;
use crate::framework::{ArgumentId, ArgumentationFramework, PerspectiveSplitFramework};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Strategy {
    /// Uniformly random candidate.
    RandomChoice { with_budget: bool },
    /// Cheapest candidate; ties by lowest id.
    LeastCost { with_budget: bool },
    /// First candidate in least-attacked order.
    LeastAttackers { with_budget: bool },
    /// First candidate in strongest-attackers order.
    MostAttacks { with_budget: bool },
    /// Every legal candidate at once, ignoring the budget.
    AllArguments,
}

impl Strategy {
    pub const ALL: [Strategy; 9] = [
        Self::RandomChoice { with_budget: false },
        Self::RandomChoice { with_budget: true },
        Self::LeastCost { with_budget: false },
        Self::LeastCost { with_budget: true },
        Self::LeastAttackers { with_budget: false },
        Self::LeastAttackers { with_budget: true },
        Self::MostAttacks { with_budget: false },
        Self::MostAttacks { with_budget: true },
        Self::AllArguments,
    ];

    /// Whether plays are limited by the acting side's remaining budget.
    pub fn is_budget_aware(self) -> bool {
        match self {
            Self::RandomChoice { with_budget }
            | Self::LeastCost { with_budget }
            | Self::LeastAttackers { with_budget }
            | Self::MostAttacks { with_budget } => with_budget,
            Self::AllArguments => false,
        }
    }

    /// Reject a budget-aware strategy on a framework where nothing costs
    /// anything; budgets would be meaningless.
    pub fn check_against(self, framework: &PerspectiveSplitFramework) -> Result<(), ConfigError> {
        if self.is_budget_aware() && !framework.has_private_arguments() {
            return Err(ConfigError::CostlessFramework {
                strategy: self.to_string(),
            });
        }
        Ok(())
    }

    /// Pick the play among `affordable` (sorted by id). `None` when empty.
    pub fn select<R: Rng + ?Sized>(
        self,
        affordable: &[Candidate],
        rankings: &Rankings,
        rng: &mut R,
    ) -> Option<Selection> {
        if affordable.is_empty() {
            return None;
        }
        let pick = match self {
            Self::RandomChoice { .. } => affordable.choose(rng).map(|c| c.id),
            Self::LeastCost { .. } => affordable
                .iter()
                .min_by_key(|c| (c.cost, c.id))
                .map(|c| c.id),
            Self::LeastAttackers { .. } => rankings.first_least_attacked(affordable),
            Self::MostAttacks { .. } => rankings.first_strongest(affordable),
            Self::AllArguments => {
                return Some(Selection::All(affordable.iter().map(|c| c.id).collect()))
            }
        };
        pick.map(Selection::One)
    }

    fn name(self) -> &'static str {
        match self {
            Self::RandomChoice { with_budget: false } => "random",
            Self::RandomChoice { with_budget: true } => "random-private",
            Self::LeastCost { with_budget: false } => "least-cost",
            Self::LeastCost { with_budget: true } => "least-cost-private",
            Self::LeastAttackers { with_budget: false } => "least-attackers",
            Self::LeastAttackers { with_budget: true } => "least-attackers-private",
            Self::MostAttacks { with_budget: false } => "most-attacks",
            Self::MostAttacks { with_budget: true } => "most-attacks-private",
            Self::AllArguments => "all-arguments",
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::RandomChoice { with_budget: true }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name() == wanted)
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "strategy".into(),
                reason: format!("unknown strategy '{s}'"),
            })
    }
}

impl TryFrom<String> for Strategy {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Strategy> for String {
    fn from(strategy: Strategy) -> Self {
        strategy.to_string()
    }
}

/// A legal node together with what it costs to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub id: ArgumentId,
    pub cost: u32,
}

/// What a strategy decided to play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    One(ArgumentId),
    All(Vec<ArgumentId>),
}

/// Structural rankings of the dialogue framework, computed once per sorter.
#[derive(Debug, Clone, Default)]
pub struct Rankings {
    least_attacked: HashMap<ArgumentId, usize>,
    strongest: HashMap<ArgumentId, usize>,
}

impl Rankings {
    pub fn from_framework(framework: &ArgumentationFramework) -> Self {
        let position = |order: Vec<ArgumentId>| {
            order
                .into_iter()
                .enumerate()
                .map(|(rank, id)| (id, rank))
                .collect::<HashMap<_, _>>()
        };
        Self {
            least_attacked: position(framework.least_attacked()),
            strongest: position(framework.strongest_attackers()),
        }
    }

    fn first_least_attacked(&self, candidates: &[Candidate]) -> Option<ArgumentId> {
        Self::first_in(&self.least_attacked, candidates)
    }

    fn first_strongest(&self, candidates: &[Candidate]) -> Option<ArgumentId> {
        Self::first_in(&self.strongest, candidates)
    }

    fn first_in(order: &HashMap<ArgumentId, usize>, candidates: &[Candidate]) -> Option<ArgumentId> {
        candidates
            .iter()
            .min_by_key(|c| (order.get(&c.id).copied().unwrap_or(usize::MAX), c.id))
            .map(|c| c.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::Argument;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn candidates() -> Vec<Candidate> {
        vec![
            Candidate { id: 4, cost: 6 },
            Candidate { id: 8, cost: 2 },
            Candidate { id: 12, cost: 2 },
        ]
    }

    fn star() -> ArgumentationFramework {
        // 12 attacks 4 and 8; 8 attacks 4
        let mut af = ArgumentationFramework::new();
        for id in [4, 8, 12] {
            af.add_argument(Argument::new(id, ""));
        }
        af.add_attack(12, 4).unwrap();
        af.add_attack(12, 8).unwrap();
        af.add_attack(8, 4).unwrap();
        af
    }

    #[test]
    fn test_least_cost_breaks_ties_by_id() {
        let mut rng = StdRng::seed_from_u64(1);
        let pick = Strategy::LeastCost { with_budget: true }.select(
            &candidates(),
            &Rankings::default(),
            &mut rng,
        );
        assert_eq!(pick, Some(Selection::One(8)));
    }

    #[test]
    fn test_ranked_strategies_follow_framework_order() {
        let mut rng = StdRng::seed_from_u64(1);
        let rankings = Rankings::from_framework(&star());

        let least = Strategy::LeastAttackers { with_budget: false }.select(
            &candidates(),
            &rankings,
            &mut rng,
        );
        assert_eq!(least, Some(Selection::One(12)));

        let subset = [Candidate { id: 4, cost: 1 }, Candidate { id: 8, cost: 1 }];
        let most =
            Strategy::MostAttacks { with_budget: false }.select(&subset, &rankings, &mut rng);
        assert_eq!(most, Some(Selection::One(8)));
    }

    #[test]
    fn test_random_choice_is_seed_deterministic() {
        let rankings = Rankings::default();
        let strategy = Strategy::RandomChoice { with_budget: false };
        let first = strategy.select(&candidates(), &rankings, &mut StdRng::seed_from_u64(9));
        let second = strategy.select(&candidates(), &rankings, &mut StdRng::seed_from_u64(9));
        assert_eq!(first, second);
        assert!(matches!(first, Some(Selection::One(id)) if [4, 8, 12].contains(&id)));
    }

    #[test]
    fn test_all_arguments_plays_everything() {
        let mut rng = StdRng::seed_from_u64(0);
        let pick = Strategy::AllArguments.select(&candidates(), &Rankings::default(), &mut rng);
        assert_eq!(pick, Some(Selection::All(vec![4, 8, 12])));
        assert!(!Strategy::AllArguments.is_budget_aware());
    }

    #[test]
    fn test_empty_candidates_select_nothing() {
        let mut rng = StdRng::seed_from_u64(0);
        for strategy in Strategy::ALL {
            assert_eq!(strategy.select(&[], &Rankings::default(), &mut rng), None);
        }
    }

    #[test]
    fn test_parse_accepts_names_and_rejects_unknown() {
        assert_eq!(
            "least-cost-private".parse::<Strategy>().unwrap(),
            Strategy::LeastCost { with_budget: true }
        );
        assert_eq!(
            "ALL_ARGUMENTS".parse::<Strategy>().unwrap(),
            Strategy::AllArguments
        );
        assert!(matches!(
            "cheapest".parse::<Strategy>(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_budget_aware_strategy_needs_costs() {
        let mut af = ArgumentationFramework::new();
        af.add_argument(Argument::new(0, "motion"));
        af.add_argument(Argument::new(1, "free"));
        af.add_attack(1, 0).unwrap();
        let split = PerspectiveSplitFramework::build(&af).unwrap();

        assert!(matches!(
            Strategy::LeastCost { with_budget: true }.check_against(&split),
            Err(ConfigError::CostlessFramework { .. })
        ));
        assert!(Strategy::LeastCost { with_budget: false }
            .check_against(&split)
            .is_ok());
    }
}
