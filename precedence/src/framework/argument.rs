//! Arguments and the verifier capability they carry.
//!
//! An [`Argument`] never looks at agent properties itself. It holds two
//! [`Verifier`]s supplied by a culture: a *claim* verifier (can this side
//! plausibly assert the argument at all?) and a *fact* verifier (does the
//! assertion actually hold between the two agents?). Both default to
//! always-true.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Identifier of an argument (or of a node in a split framework).
pub type ArgumentId = u32;

/// Culture-supplied property snapshot of an agent.
///
/// Keys absent from the set read as `0`, so verifiers can compare agents
/// from cultures that only populate a subset of properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertySet(BTreeMap<String, i64>);

impl PropertySet {
    /// Create an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: i64) -> Self {
        self.set(key, value);
        self
    }

    /// Insert or overwrite a property.
    pub fn set(&mut self, key: impl Into<String>, value: i64) {
        self.0.insert(key.into(), value);
    }

    /// Value of a property, `0` when absent.
    pub fn get(&self, key: &str) -> i64 {
        self.0.get(key).copied().unwrap_or(0)
    }

    /// Whether the property is explicitly set.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, i64)> for PropertySet {
    fn from_iter<I: IntoIterator<Item = (K, i64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Predicate over an (observer, counterparty) pair of property snapshots.
///
/// Cultures implement this (or pass a closure); the dialogue engine only
/// ever calls [`Verifier::verify`].
pub trait Verifier: Send + Sync {
    fn verify(&self, observer: &PropertySet, counterparty: &PropertySet) -> bool;
}

impl<F> Verifier for F
where
    F: Fn(&PropertySet, &PropertySet) -> bool + Send + Sync,
{
    fn verify(&self, observer: &PropertySet, counterparty: &PropertySet) -> bool {
        self(observer, counterparty)
    }
}

/// Verifier that accepts every pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysTrue;

impl Verifier for AlwaysTrue {
    fn verify(&self, _observer: &PropertySet, _counterparty: &PropertySet) -> bool {
        true
    }
}

/// A single argument of a framework.
#[derive(Clone)]
pub struct Argument {
    id: ArgumentId,
    privacy_cost: u32,
    text: String,
    fact_text: Option<String>,
    claim: Arc<dyn Verifier>,
    fact: Arc<dyn Verifier>,
}

impl Argument {
    /// Create a free argument whose claim and fact always hold.
    pub fn new(id: ArgumentId, text: impl Into<String>) -> Self {
        Self {
            id,
            privacy_cost: 0,
            text: text.into(),
            fact_text: None,
            claim: Arc::new(AlwaysTrue),
            fact: Arc::new(AlwaysTrue),
        }
    }

    /// Set the privacy cost of revealing this argument.
    pub fn with_cost(mut self, privacy_cost: u32) -> Self {
        self.privacy_cost = privacy_cost;
        self
    }

    /// Text used for the fact variant of the argument.
    pub fn with_fact_text(mut self, text: impl Into<String>) -> Self {
        self.fact_text = Some(text.into());
        self
    }

    /// Claim predicate from a closure.
    pub fn with_claim<F>(self, claim: F) -> Self
    where
        F: Fn(&PropertySet, &PropertySet) -> bool + Send + Sync + 'static,
    {
        self.with_claim_verifier(Arc::new(claim))
    }

    /// Fact predicate from a closure.
    pub fn with_fact<F>(self, fact: F) -> Self
    where
        F: Fn(&PropertySet, &PropertySet) -> bool + Send + Sync + 'static,
    {
        self.with_fact_verifier(Arc::new(fact))
    }

    pub fn with_claim_verifier(mut self, verifier: Arc<dyn Verifier>) -> Self {
        self.claim = verifier;
        self
    }

    pub fn with_fact_verifier(mut self, verifier: Arc<dyn Verifier>) -> Self {
        self.fact = verifier;
        self
    }

    pub fn id(&self) -> ArgumentId {
        self.id
    }

    pub fn privacy_cost(&self) -> u32 {
        self.privacy_cost
    }

    /// Diagnostic text of the claim.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Diagnostic text of the fact, falling back to the claim text.
    pub fn fact_text(&self) -> &str {
        self.fact_text.as_deref().unwrap_or(&self.text)
    }

    pub fn claim_holds(&self, observer: &PropertySet, counterparty: &PropertySet) -> bool {
        self.claim.verify(observer, counterparty)
    }

    pub fn fact_holds(&self, observer: &PropertySet, counterparty: &PropertySet) -> bool {
        self.fact.verify(observer, counterparty)
    }

    /// Copy of this argument under a new id and text, sharing the verifiers.
    pub(crate) fn relabel(&self, id: ArgumentId, text: &str) -> Self {
        Self {
            id,
            privacy_cost: self.privacy_cost,
            text: text.to_string(),
            fact_text: self.fact_text.clone(),
            claim: Arc::clone(&self.claim),
            fact: Arc::clone(&self.fact),
        }
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argument")
            .field("id", &self.id)
            .field("privacy_cost", &self.privacy_cost)
            .field("text", &self.text)
            .field("fact_text", &self.fact_text)
            .finish_non_exhaustive()
    }
}
