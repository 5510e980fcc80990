//! Perspective-split framework.
//!
//! Every base argument `k` becomes four nodes, one per (side, kind):
//!
//! | id       | role               |
//! |----------|--------------------|
//! | `4k`     | observer claim     |
//! | `4k + 1` | counterparty claim |
//! | `4k + 2` | observer fact      |
//! | `4k + 3` | counterparty fact  |
//!
//! Even ids belong to the observer (the defender in a dialogue), odd ids to
//! the counterparty (the challenger). Base argument 0 is the motion; the
//! challenger opens every dialogue by playing its claim, node 1.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::argument::{Argument, ArgumentId, PropertySet};
use super::graph::{ArgumentationFramework, FrameworkError};

/// Base id of the motion argument.
pub const MOTION: ArgumentId = 0;

/// Largest base id whose four split nodes fit in an [`ArgumentId`].
pub const MAX_BASE_ID: ArgumentId = (ArgumentId::MAX - 3) / 4;

/// Which perspective a split node speaks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The defender's colour (even ids).
    Observer,
    /// The challenger's colour (odd ids).
    Counterparty,
}

impl Side {
    pub fn of(node: ArgumentId) -> Self {
        if node % 2 == 0 {
            Self::Observer
        } else {
            Self::Counterparty
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Self::Observer => Self::Counterparty,
            Self::Counterparty => Self::Observer,
        }
    }

    /// Slot for side-indexed arrays.
    pub fn index(self) -> usize {
        match self {
            Self::Observer => 0,
            Self::Counterparty => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Observer => write!(f, "observer"),
            Self::Counterparty => write!(f, "counterparty"),
        }
    }
}

/// Role of a split node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeRole {
    ObserverClaim,
    CounterpartyClaim,
    ObserverFact,
    CounterpartyFact,
}

impl NodeRole {
    pub const ALL: [NodeRole; 4] = [
        Self::ObserverClaim,
        Self::CounterpartyClaim,
        Self::ObserverFact,
        Self::CounterpartyFact,
    ];

    pub fn of(node: ArgumentId) -> Self {
        match node % 4 {
            0 => Self::ObserverClaim,
            1 => Self::CounterpartyClaim,
            2 => Self::ObserverFact,
            _ => Self::CounterpartyFact,
        }
    }

    fn offset(self) -> ArgumentId {
        match self {
            Self::ObserverClaim => 0,
            Self::CounterpartyClaim => 1,
            Self::ObserverFact => 2,
            Self::CounterpartyFact => 3,
        }
    }

    pub fn side(self) -> Side {
        match self {
            Self::ObserverClaim | Self::ObserverFact => Side::Observer,
            Self::CounterpartyClaim | Self::CounterpartyFact => Side::Counterparty,
        }
    }

    pub fn is_claim(self) -> bool {
        matches!(self, Self::ObserverClaim | Self::CounterpartyClaim)
    }

    /// Split node id of this role for base argument `base`.
    ///
    /// `base` must not exceed [`MAX_BASE_ID`]; use [`NodeRole::checked_node`]
    /// for unvalidated ids.
    pub fn node(self, base: ArgumentId) -> ArgumentId {
        base * 4 + self.offset()
    }

    /// Like [`NodeRole::node`], `None` when the id does not fit.
    pub fn checked_node(self, base: ArgumentId) -> Option<ArgumentId> {
        base.checked_mul(4)?.checked_add(self.offset())
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ObserverClaim => write!(f, "observer-claim"),
            Self::CounterpartyClaim => write!(f, "counterparty-claim"),
            Self::ObserverFact => write!(f, "observer-fact"),
            Self::CounterpartyFact => write!(f, "counterparty-fact"),
        }
    }
}

/// Base argument a split node was derived from.
pub fn base_of(node: ArgumentId) -> ArgumentId {
    node / 4
}

/// Derived framework in which each side argues from its own perspective.
#[derive(Debug, Clone)]
pub struct PerspectiveSplitFramework {
    framework: ArgumentationFramework,
}

impl PerspectiveSplitFramework {
    /// Derive the split framework from a populated base framework.
    pub fn build(base: &ArgumentationFramework) -> Result<Self, FrameworkError> {
        if !base.contains(MOTION) {
            return Err(FrameworkError::MissingMotion);
        }
        if let Some(id) = base.ids().find(|&id| id > MAX_BASE_ID) {
            return Err(FrameworkError::IdOutOfRange(id));
        }

        let mut framework = ArgumentationFramework::new();
        for argument in base.arguments() {
            let k = argument.id();
            for role in NodeRole::ALL {
                let text = if role.is_claim() {
                    argument.text()
                } else {
                    argument.fact_text()
                };
                framework.add_argument(argument.relabel(role.node(k), text));
            }

            let oc = NodeRole::ObserverClaim.node(k);
            let cc = NodeRole::CounterpartyClaim.node(k);
            let of = NodeRole::ObserverFact.node(k);
            let cf = NodeRole::CounterpartyFact.node(k);
            for (a, b) in [(oc, cc), (cc, oc), (of, cf), (cf, of), (of, cc), (cf, oc)] {
                framework.add_attack(a, b)?;
            }
        }

        for (a, b) in base.attacks() {
            let oc_a = NodeRole::ObserverClaim.node(a);
            let cc_a = NodeRole::CounterpartyClaim.node(a);
            framework.add_attack(oc_a, NodeRole::CounterpartyClaim.node(b))?;
            framework.add_attack(oc_a, NodeRole::CounterpartyFact.node(b))?;
            framework.add_attack(cc_a, NodeRole::ObserverClaim.node(b))?;
            framework.add_attack(cc_a, NodeRole::ObserverFact.node(b))?;
        }

        debug!(
            base_arguments = base.len(),
            base_attacks = base.attack_count(),
            nodes = framework.len(),
            attacks = framework.attack_count(),
            "built perspective-split framework"
        );
        Ok(Self { framework })
    }

    pub fn framework(&self) -> &ArgumentationFramework {
        &self.framework
    }

    pub fn len(&self) -> usize {
        self.framework.len()
    }

    pub fn is_empty(&self) -> bool {
        self.framework.is_empty()
    }

    /// The challenger's opening play.
    pub fn motion_claim(&self) -> ArgumentId {
        NodeRole::CounterpartyClaim.node(MOTION)
    }

    pub fn role_of(&self, node: ArgumentId) -> NodeRole {
        NodeRole::of(node)
    }

    pub fn side_of(&self, node: ArgumentId) -> Side {
        Side::of(node)
    }

    pub fn base_of(&self, node: ArgumentId) -> ArgumentId {
        base_of(node)
    }

    pub fn node_id(&self, base: ArgumentId, role: NodeRole) -> ArgumentId {
        role.node(base)
    }

    /// Evaluate the predicate bound to `node` for a concrete pair of agents.
    ///
    /// Observer-coloured nodes see `(observer, counterparty)`; counterparty
    /// nodes see the pair swapped.
    pub fn holds(
        &self,
        node: ArgumentId,
        observer: &PropertySet,
        counterparty: &PropertySet,
    ) -> Result<bool, FrameworkError> {
        let argument = self.framework.argument(node)?;
        Ok(bound_predicate(argument, observer, counterparty))
    }

    /// Copy with the motion's support removed: observer claim, observer fact
    /// and counterparty fact of argument 0. Only the challenger's motion claim
    /// survives.
    pub fn without_motion_support(&self) -> Self {
        let mut framework = self.framework.clone();
        for role in [
            NodeRole::ObserverClaim,
            NodeRole::ObserverFact,
            NodeRole::CounterpartyFact,
        ] {
            let _ = framework.remove_argument(role.node(MOTION));
        }
        Self { framework }
    }

    /// Copy specialised to one (observer, counterparty) binding: the motion
    /// support strip plus every fact node whose predicate does not hold.
    pub fn prune_for_pair(&self, observer: &PropertySet, counterparty: &PropertySet) -> Self {
        let mut pruned = self.without_motion_support();
        let false_facts: Vec<ArgumentId> = pruned
            .framework
            .arguments()
            .filter(|arg| !NodeRole::of(arg.id()).is_claim())
            .filter(|arg| !bound_predicate(arg, observer, counterparty))
            .map(Argument::id)
            .collect();
        for id in false_facts {
            let _ = pruned.framework.remove_argument(id);
        }
        pruned
    }

    /// Whether any of the motion's support nodes is still present.
    pub fn has_motion_support(&self) -> bool {
        [
            NodeRole::ObserverClaim,
            NodeRole::ObserverFact,
            NodeRole::CounterpartyFact,
        ]
        .into_iter()
        .any(|role| self.framework.contains(role.node(MOTION)))
    }

    /// Whether any node other than the motion's carries a privacy cost.
    pub fn has_private_arguments(&self) -> bool {
        self.framework
            .arguments()
            .any(|arg| base_of(arg.id()) != MOTION && arg.privacy_cost() > 0)
    }
}

fn bound_predicate(argument: &Argument, observer: &PropertySet, counterparty: &PropertySet) -> bool {
    let role = NodeRole::of(argument.id());
    let (speaker, listener) = match role.side() {
        Side::Observer => (observer, counterparty),
        Side::Counterparty => (counterparty, observer),
    };
    if role.is_claim() {
        argument.claim_holds(speaker, listener)
    } else {
        argument.fact_holds(speaker, listener)
    }
}
