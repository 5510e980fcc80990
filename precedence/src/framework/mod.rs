//! Argumentation frameworks: the base attack graph and its perspective split.

pub mod argument;
pub mod graph;
pub mod split;

pub use argument::{AlwaysTrue, Argument, ArgumentId, PropertySet, Verifier};
pub use graph::{ArgumentationFramework, FrameworkError};
pub use split::{base_of, NodeRole, PerspectiveSplitFramework, Side, MAX_BASE_ID, MOTION};
