//! Attack graph over arguments.
//!
//! The attack relation lives in a `DiGraphMap`, so the forward ("attacks")
//! and reverse ("attacked by") adjacency can never drift apart: removing a
//! node removes every incident edge in both directions.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as _;

use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use thiserror::Error;

use super::argument::{Argument, ArgumentId};
use crate::solver::{DecisionProcedure, Semantics, SolverError};

/// Errors from framework construction and lookup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameworkError {
    #[error("argument {0} not found in framework")]
    ArgumentNotFound(ArgumentId),

    #[error("framework has no motion argument (id 0)")]
    MissingMotion,

    #[error("argument id {0} is too large to split into four nodes")]
    IdOutOfRange(ArgumentId),
}

/// Directed attack graph plus the argument payloads.
#[derive(Debug, Clone)]
pub struct ArgumentationFramework {
    arguments: HashMap<ArgumentId, Argument>,
    attacks: DiGraphMap<ArgumentId, ()>,
}

impl Default for ArgumentationFramework {
    fn default() -> Self {
        Self::new()
    }
}

impl ArgumentationFramework {
    pub fn new() -> Self {
        Self {
            arguments: HashMap::new(),
            attacks: DiGraphMap::new(),
        }
    }

    /// Insert an argument. An existing id has its payload replaced; its
    /// attacks are kept.
    pub fn add_argument(&mut self, argument: Argument) {
        let id = argument.id();
        self.attacks.add_node(id);
        self.arguments.insert(id, argument);
    }

    /// Record `attacker -> target`. Adding the same attack twice is a no-op.
    pub fn add_attack(
        &mut self,
        attacker: ArgumentId,
        target: ArgumentId,
    ) -> Result<(), FrameworkError> {
        self.require(attacker)?;
        self.require(target)?;
        self.attacks.add_edge(attacker, target, ());
        Ok(())
    }

    /// Remove an argument and every attack it takes part in.
    pub fn remove_argument(&mut self, id: ArgumentId) -> Result<Argument, FrameworkError> {
        let argument = self
            .arguments
            .remove(&id)
            .ok_or(FrameworkError::ArgumentNotFound(id))?;
        self.attacks.remove_node(id);
        Ok(argument)
    }

    pub fn argument(&self, id: ArgumentId) -> Result<&Argument, FrameworkError> {
        self.arguments
            .get(&id)
            .ok_or(FrameworkError::ArgumentNotFound(id))
    }

    pub fn contains(&self, id: ArgumentId) -> bool {
        self.arguments.contains_key(&id)
    }

    /// Argument ids in framework iteration (insertion) order.
    pub fn ids(&self) -> impl Iterator<Item = ArgumentId> + '_ {
        self.attacks.nodes()
    }

    pub fn arguments(&self) -> impl Iterator<Item = &Argument> + '_ {
        self.attacks
            .nodes()
            .filter_map(move |id| self.arguments.get(&id))
    }

    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    pub fn attack_count(&self) -> usize {
        self.attacks.edge_count()
    }

    /// Every `(attacker, target)` pair.
    pub fn attacks(&self) -> impl Iterator<Item = (ArgumentId, ArgumentId)> + '_ {
        self.attacks.all_edges().map(|(a, b, _)| (a, b))
    }

    pub fn has_attack(&self, attacker: ArgumentId, target: ArgumentId) -> bool {
        self.attacks.contains_edge(attacker, target)
    }

    /// Arguments attacking `id`.
    pub fn attackers(&self, id: ArgumentId) -> Result<BTreeSet<ArgumentId>, FrameworkError> {
        self.require(id)?;
        Ok(self
            .attacks
            .neighbors_directed(id, Direction::Incoming)
            .collect())
    }

    /// Arguments attacked by `id`.
    pub fn attacked(&self, id: ArgumentId) -> Result<BTreeSet<ArgumentId>, FrameworkError> {
        self.require(id)?;
        Ok(self
            .attacks
            .neighbors_directed(id, Direction::Outgoing)
            .collect())
    }

    /// Union of the attackers of every id.
    pub fn attackers_of_all<I>(&self, ids: I) -> Result<BTreeSet<ArgumentId>, FrameworkError>
    where
        I: IntoIterator<Item = ArgumentId>,
    {
        self.union_directed(ids, Direction::Incoming)
    }

    /// Union of the arguments attacked by every id.
    pub fn attacked_by_all<I>(&self, ids: I) -> Result<BTreeSet<ArgumentId>, FrameworkError>
    where
        I: IntoIterator<Item = ArgumentId>,
    {
        self.union_directed(ids, Direction::Outgoing)
    }

    /// Ids ascending by number of attackers; ties by ascending id.
    pub fn least_attacked(&self) -> Vec<ArgumentId> {
        let mut ids: Vec<ArgumentId> = self.attacks.nodes().collect();
        ids.sort_by_key(|&id| (self.degree(id, Direction::Incoming), id));
        ids
    }

    /// Ids descending by number of attacked arguments; ties by ascending id.
    pub fn strongest_attackers(&self) -> Vec<ArgumentId> {
        let mut ids: Vec<ArgumentId> = self.attacks.nodes().collect();
        ids.sort_by_key(|&id| (Reverse(self.degree(id, Direction::Outgoing)), id));
        ids
    }

    /// Fraction of extensions (under `semantics`) each argument occurs in.
    ///
    /// When the solver returns no extension the denominator is floored to 1,
    /// so every argument scores 0.
    pub async fn occurrence_strength(
        &self,
        solver: &dyn DecisionProcedure,
        semantics: Semantics,
    ) -> Result<BTreeMap<ArgumentId, f64>, SolverError> {
        let extensions = solver.enumerate_extensions(self, semantics).await?;
        let denominator = extensions.len().max(1) as f64;

        let mut counts: BTreeMap<ArgumentId, usize> = self.ids().map(|id| (id, 0)).collect();
        for extension in &extensions {
            for id in extension {
                if let Some(count) = counts.get_mut(id) {
                    *count += 1;
                }
            }
        }

        Ok(counts
            .into_iter()
            .map(|(id, count)| (id, count as f64 / denominator))
            .collect())
    }

    /// Aspartix (APX) rendering: `arg(id).` per node, then `att(a,b).` per edge.
    pub fn to_apx(&self) -> String {
        let mut out = String::new();
        for id in self.attacks.nodes() {
            let _ = writeln!(out, "arg({id}).");
        }
        for (a, b, _) in self.attacks.all_edges() {
            let _ = writeln!(out, "att({a},{b}).");
        }
        out
    }

    fn require(&self, id: ArgumentId) -> Result<(), FrameworkError> {
        if self.arguments.contains_key(&id) {
            Ok(())
        } else {
            Err(FrameworkError::ArgumentNotFound(id))
        }
    }

    fn degree(&self, id: ArgumentId, direction: Direction) -> usize {
        self.attacks.neighbors_directed(id, direction).count()
    }

    fn union_directed<I>(
        &self,
        ids: I,
        direction: Direction,
    ) -> Result<BTreeSet<ArgumentId>, FrameworkError>
    where
        I: IntoIterator<Item = ArgumentId>,
    {
        let mut out = BTreeSet::new();
        for id in ids {
            self.require(id)?;
            out.extend(self.attacks.neighbors_directed(id, direction));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> ArgumentationFramework {
        // 1 -> 0, 2 -> 0, 2 -> 1
        let mut af = ArgumentationFramework::new();
        for id in 0..3 {
            af.add_argument(Argument::new(id, format!("a{id}")));
        }
        af.add_attack(1, 0).unwrap();
        af.add_attack(2, 0).unwrap();
        af.add_attack(2, 1).unwrap();
        af
    }

    #[test]
    fn test_attack_requires_both_endpoints() {
        let mut af = triangle();
        assert_eq!(
            af.add_attack(0, 9),
            Err(FrameworkError::ArgumentNotFound(9))
        );
        assert_eq!(af.attack_count(), 3);
    }

    #[test]
    fn test_duplicate_attack_is_idempotent() {
        let mut af = triangle();
        af.add_attack(1, 0).unwrap();
        assert_eq!(af.attack_count(), 3);
    }

    #[test]
    fn test_replacing_payload_keeps_edges() {
        let mut af = triangle();
        af.add_argument(Argument::new(1, "renamed").with_cost(3));
        assert_eq!(af.argument(1).unwrap().text(), "renamed");
        assert_eq!(af.attackers(0).unwrap(), BTreeSet::from([1, 2]));
    }

    #[test]
    fn test_remove_cascades_both_directions() {
        let mut af = triangle();
        let removed = af.remove_argument(1).unwrap();
        assert_eq!(removed.id(), 1);

        assert!(!af.contains(1));
        assert_eq!(af.attackers(0).unwrap(), BTreeSet::from([2]));
        assert!(af.attacked(2).unwrap().iter().all(|&t| t != 1));
        assert!(af.attacks().all(|(a, b)| a != 1 && b != 1));
        assert_eq!(af.attackers(1), Err(FrameworkError::ArgumentNotFound(1)));
        assert!(af.remove_argument(1).is_err());
    }

    #[test]
    fn test_list_lookups_union_results() {
        let af = triangle();
        assert_eq!(af.attackers_of_all([0, 1]).unwrap(), BTreeSet::from([1, 2]));
        assert_eq!(af.attacked_by_all([1, 2]).unwrap(), BTreeSet::from([0, 1]));
        assert!(af.attackers_of_all([0, 7]).is_err());
    }

    #[test]
    fn test_rankings_break_ties_by_id() {
        let af = triangle();
        // in-degrees: 0 -> 2, 1 -> 1, 2 -> 0
        assert_eq!(af.least_attacked(), vec![2, 1, 0]);
        // out-degrees: 2 -> 2, 1 -> 1, 0 -> 0
        assert_eq!(af.strongest_attackers(), vec![2, 1, 0]);

        let mut flat = ArgumentationFramework::new();
        for id in [5, 3, 4] {
            flat.add_argument(Argument::new(id, ""));
        }
        assert_eq!(flat.least_attacked(), vec![3, 4, 5]);
        assert_eq!(flat.strongest_attackers(), vec![3, 4, 5]);
    }

    #[test]
    fn test_apx_lists_nodes_then_edges() {
        let af = triangle();
        let apx = af.to_apx();
        let lines: Vec<&str> = apx.lines().collect();

        assert_eq!(&lines[..3], &["arg(0).", "arg(1).", "arg(2)."]);
        assert_eq!(lines.len(), 6);
        assert!(lines.contains(&"att(2,1)."));
        assert!(lines[3..].iter().all(|l| l.starts_with("att(")));
    }
}
