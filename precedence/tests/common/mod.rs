//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use precedence::framework::ArgumentId;
use precedence::solver::{DecisionProcedure, Semantics, SolverError};
use precedence::{Agent, AgentId, Argument, ArgumentationFramework, PropertySet};

/// Motion plus one "my value is higher" argument attacking it.
pub fn value_framework(cost: u32) -> ArgumentationFramework {
    let mut af = ArgumentationFramework::new();
    af.add_argument(Argument::new(0, "We should swap places"));
    af.add_argument(
        Argument::new(1, "my value is higher")
            .with_cost(cost)
            .with_fact(|me, them| me.get("value") > them.get("value")),
    );
    af.add_attack(1, 0).unwrap();
    af
}

pub fn valued_agent(id: AgentId, value: i64, budget: u32) -> Agent {
    Agent::new(id, budget).with_properties(PropertySet::new().with("value", value))
}

/// In-process preferred-semantics procedure for small frameworks.
///
/// Enumerates every subset, keeps the admissible ones and returns the
/// maximal ones. Other semantics are rejected.
#[derive(Debug, Default)]
pub struct BruteForcePreferred {
    pub calls: AtomicU32,
}

impl BruteForcePreferred {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn preferred(framework: &ArgumentationFramework) -> Vec<BTreeSet<ArgumentId>> {
        let ids: Vec<ArgumentId> = framework.ids().collect();
        assert!(ids.len() <= 20, "brute force needs a small framework");
        let attacks: Vec<(usize, usize)> = framework
            .attacks()
            .map(|(a, b)| {
                let ia = ids.iter().position(|&x| x == a).unwrap();
                let ib = ids.iter().position(|&x| x == b).unwrap();
                (ia, ib)
            })
            .collect();

        let admissible: Vec<u32> = (0u32..(1 << ids.len()))
            .filter(|&set| is_admissible(set, &attacks))
            .collect();
        let maximal: Vec<u32> = admissible
            .iter()
            .copied()
            .filter(|&s| !admissible.iter().any(|&t| t != s && t & s == s))
            .collect();

        maximal
            .into_iter()
            .map(|set| {
                ids.iter()
                    .enumerate()
                    .filter(|(i, _)| set & (1 << i) != 0)
                    .map(|(_, &id)| id)
                    .collect()
            })
            .collect()
    }
}

fn is_admissible(set: u32, attacks: &[(usize, usize)]) -> bool {
    let member = |i: usize| set & (1 << i) != 0;
    let conflict_free = attacks.iter().all(|&(a, b)| !(member(a) && member(b)));
    let defended = attacks.iter().all(|&(attacker, target)| {
        !member(target)
            || attacks
                .iter()
                .any(|&(defender, victim)| victim == attacker && member(defender))
    });
    conflict_free && defended
}

#[async_trait]
impl DecisionProcedure for BruteForcePreferred {
    async fn enumerate_extensions(
        &self,
        framework: &ArgumentationFramework,
        semantics: Semantics,
    ) -> Result<Vec<BTreeSet<ArgumentId>>, SolverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        require_preferred(semantics)?;
        Ok(Self::preferred(framework))
    }

    async fn decide_skeptical(
        &self,
        framework: &ArgumentationFramework,
        argument: ArgumentId,
        semantics: Semantics,
    ) -> Result<bool, SolverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        require_preferred(semantics)?;
        Ok(Self::preferred(framework)
            .iter()
            .all(|extension| extension.contains(&argument)))
    }
}

fn require_preferred(semantics: Semantics) -> Result<(), SolverError> {
    if semantics == Semantics::Preferred {
        Ok(())
    } else {
        Err(SolverError::Invocation {
            problem: semantics.code().to_string(),
            exit_code: Some(1),
            stderr: "only preferred semantics is supported".to_string(),
        })
    }
}
