//! Ownership graph module: typed relation graph, owns-only traversal view
//! and the indirect ownership pass.
//!
//! The relation graph keeps one edge per (source, target, type); the
//! ownership view is rebuilt from it on demand and is the only input to
//! indirect ownership computation.

mod relations;
mod traversal;
pub mod indirect;

pub use indirect::{compute_indirect_ownership, IndirectOptions, IndirectOutcome};
pub use relations::{EdgeAttrs, RelationGraph};
pub use traversal::OwnershipGraph;
