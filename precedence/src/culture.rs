//! Cultures: the source of arguments, attacks and agent properties.
//!
//! Domain cultures (right-of-way rules and the like) live outside this crate.
//! [`RandomCulture`] generates a seeded framework for tests and benchmarks.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agent::Agent;
use crate::error::Result;
use crate::framework::{
    Argument, ArgumentId, ArgumentationFramework, PerspectiveSplitFramework, PropertySet, MOTION,
};

/// Supplier of a populated framework and of agent property snapshots.
pub trait Culture: Send + Sync {
    fn name(&self) -> &str;

    /// Property keys with their default values.
    fn properties(&self) -> &PropertySet;

    fn framework(&self) -> &ArgumentationFramework;

    /// Split framework derived once from [`Culture::framework`].
    fn split_framework(&self) -> &PerspectiveSplitFramework;

    /// Give `agent` its property snapshot.
    fn assign(&self, agent: &mut Agent, rng: &mut dyn RngCore);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomCultureConfig {
    /// Number of arguments, motion included.
    pub arguments: u32,
    /// Attack draws; duplicates collapse, so the final count can be lower.
    pub attacks: u32,
    /// Upper bound of the per-argument privacy cost (lower bound 1).
    pub max_cost: u32,
    /// Agent properties are drawn from `0..=property_range`.
    pub property_range: u32,
}

impl Default for RandomCultureConfig {
    fn default() -> Self {
        Self {
            arguments: 7,
            attacks: 12,
            max_cost: 20,
            property_range: 1000,
        }
    }
}

/// Culture with one property per argument: argument `i` claims
/// "my property `p{i}` is higher than yours".
#[derive(Debug, Clone)]
pub struct RandomCulture {
    properties: PropertySet,
    framework: ArgumentationFramework,
    split: PerspectiveSplitFramework,
    property_range: u32,
}

impl RandomCulture {
    pub fn generate<R: Rng + ?Sized>(config: &RandomCultureConfig, rng: &mut R) -> Result<Self> {
        let mut framework = ArgumentationFramework::new();
        let mut properties = PropertySet::new();

        framework.add_argument(Argument::new(MOTION, "We should swap places"));
        for i in 1..config.arguments {
            let key = property_key(i);
            properties.set(key.clone(), 0);
            let cost = rng.gen_range(1..=config.max_cost.max(1));
            framework.add_argument(
                Argument::new(i, format!("my {key} is higher"))
                    .with_cost(cost)
                    .with_fact(move |me, them| me.get(&key) > them.get(&key)),
            );
        }

        if config.arguments > 1 {
            let n = config.arguments;
            // Saturated graphs may never admit another edge.
            let max_tries = config.attacks.saturating_mul(16).max(16);
            let mut drawn = 0;
            let mut tries = 0;
            while drawn < config.attacks && tries < max_tries {
                tries += 1;
                let attacker: ArgumentId = rng.gen_range(1..n);
                let target: ArgumentId = rng.gen_range(0..n);
                if attacker == target || framework.has_attack(target, attacker) {
                    continue;
                }
                framework.add_attack(attacker, target)?;
                drawn += 1;
            }
        }

        let split = PerspectiveSplitFramework::build(&framework)?;
        debug!(
            arguments = framework.len(),
            attacks = framework.attack_count(),
            "generated random culture"
        );
        Ok(Self {
            properties,
            framework,
            split,
            property_range: config.property_range,
        })
    }
}

impl Culture for RandomCulture {
    fn name(&self) -> &str {
        "random"
    }

    fn properties(&self) -> &PropertySet {
        &self.properties
    }

    fn framework(&self) -> &ArgumentationFramework {
        &self.framework
    }

    fn split_framework(&self) -> &PerspectiveSplitFramework {
        &self.split
    }

    fn assign(&self, agent: &mut Agent, rng: &mut dyn RngCore) {
        let snapshot = self
            .properties
            .iter()
            .map(|(key, _)| {
                let value = rng.gen_range(0..=i64::from(self.property_range));
                (key.to_string(), value)
            })
            .collect();
        agent.assign_properties(snapshot);
    }
}

fn property_key(argument: ArgumentId) -> String {
    format!("p{argument}")
}
