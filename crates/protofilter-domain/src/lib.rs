//! Pure policy evaluation and schema pruning (no IO).
//!
//! Input: a schema tree constructed elsewhere plus the active term set.
//! Output: the same tree, mutated in place, and a record of what was removed.

#![forbid(unsafe_code)]

pub mod model;
pub mod node;
pub mod policy;
pub mod references;
pub mod validate;

mod engine;

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod test_support;

pub use engine::{FileOutcome, PruneError, Pruner, RemovedNode, prune, prune_file};
pub use node::{NodeKind, NodeMut};
pub use policy::{ActiveTerms, Policy, Verdict, decide, evaluate};
pub use references::{DanglingReference, declared_types, find_dangling_references};
pub use validate::{ValidationError, validate_file};
