//! The revision DAG for one content item.
//!
//! Every change to a blob's metadata is a new [`Revision`](crate::revision::Revision)
//! naming the revisions it was derived from. Replicas that edit concurrently
//! produce several heads; [`RevisionTree::merge`] folds them back into one.
//!
//! # Tree properties
//!
//! - **Idempotent insertion**: revisions are keyed by their own hash, so
//!   adding a revision that is already present returns an equal tree.
//! - **Partial histories**: a revision's parents need not be present. Absent
//!   parents are reported by [`RevisionTree::unknown_parents`] so a replica
//!   can fetch them.
//! - **Persistent**: `add` and `merge` return new trees that share structure
//!   with the receiver, which is never modified.
//!
//! # Sub-modules
//!
//! - [`tree`]: the tree container, its builder, and structural queries.
//!   ([`RevisionTree`], [`RevisionTreeBuilder`])
//! - [`lca`]: lowest common ancestor discovery, including criss-cross
//!   histories with several merge bases.
//!   ([`lowest_common_ancestors`], [`common_ancestors`])
//! - [`merge`]: recursive three-way metadata merge.
//!   ([`MergeOutcome`])
//! - `graph`: arena-indexed adjacency used by `lca` and `merge`.

mod graph;
pub mod lca;
pub mod merge;
pub mod tree;

pub use lca::{common_ancestors, lowest_common_ancestors};
pub use merge::MergeOutcome;
pub use tree::{RevisionTree, RevisionTreeBuilder, TreeError};
