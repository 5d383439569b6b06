//! Content classification and comparison dispatch for docdelta.
//!
//! Each file pair is classified once into a closed [`ContentClass`] and
//! routed to exactly one strategy: line-level text diff, page visual diff,
//! or a schema-specific structured comparator. Every strategy result is
//! normalized into a [`DispatchOutcome`].
//!
//! [`TreeComparison`] ties scanning, tree comparison, and per-file dispatch
//! together for whole directory trees.

pub mod classify;
pub mod dispatcher;
pub mod error;
pub mod structured;
pub mod tree;

pub use classify::{sniff_schema, Classifier, ContentClass, Schema};
pub use dispatcher::{Artifact, DispatchOutcome, Dispatcher};
pub use error::{DispatchError, DispatchResult};
pub use structured::{CategoryDiff, Entity, IpXactComparator, StructuredComparator, StructuredDiff};
pub use tree::{TreeComparison, TreeReport};
