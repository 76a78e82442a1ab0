//! Recursive three-way merge of divergent heads.
//!
//! # Overview
//!
//! A tree with several heads is folded into one head, two revisions at a
//! time. Heads are taken in ascending hash order, so the outcome depends only
//! on the set of revisions in the tree and never on how they arrived.
//!
//! Each pairwise step finds the lowest common ancestors of the two sides:
//!
//! - none: the histories are disjoint and merge against an empty base;
//! - one: that ancestor is the base;
//! - several (criss-cross): the ancestors are themselves merged, in
//!   ascending order, into a *virtual base*. Virtual bases live only in the
//!   merge's scratch graph and never reach the returned tree.
//!
//! Every metadata key and the `deleted` flag are then resolved with the
//! classic three-way rule. Absence counts as a value, so a key both sides
//! removed stays removed. When both sides changed a field to different values
//! the [`ConflictPolicy`] picks the winner.
//!
//! # Aborts
//!
//! The merge is abandoned, and the input tree returned, when a revision
//! reachable from exactly one side names a parent missing from the tree, or
//! when criss-cross bases nest deeper than
//! [`MergeConfig::max_virtual_base_depth`].

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::config::{ConflictPolicy, MergeConfig};
use crate::hash::Hash;
use crate::revision::{Metadata, Revision};
use crate::value::Value;

use super::graph::Graph;
use super::lca::Ancestry;
use super::tree::RevisionTree;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// What a call to [`RevisionTree::merge_outcome`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MergeOutcome {
    /// The tree had at most one head. Nothing was created.
    AlreadyConverged,
    /// A revision between `left` and `right` references a parent that is not
    /// in the tree. Nothing was created.
    IncompleteAncestry { left: Hash, right: Hash },
    /// Resolving the criss-cross bases of `left` and `right` needed more than
    /// `depth` levels of virtual bases. Nothing was created.
    DepthExceeded {
        left: Hash,
        right: Hash,
        depth: usize,
    },
    /// The heads were folded into `head`.
    Merged {
        /// The heads of the input tree.
        merged_heads: BTreeSet<Hash>,
        /// The single head of the returned tree.
        head: Hash,
        /// Every revision added to the tree, in creation order. The last one
        /// is `head`.
        created: Vec<Hash>,
    },
}

impl MergeOutcome {
    /// Returns `true` if the merge created revisions.
    #[must_use]
    pub const fn is_merged(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }
}

impl fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyConverged => f.write_str("already converged"),
            Self::IncompleteAncestry { left, right } => write!(
                f,
                "incomplete ancestry between {} and {}",
                left.short(12),
                right.short(12)
            ),
            Self::DepthExceeded { left, right, depth } => write!(
                f,
                "virtual base depth {depth} exceeded merging {} and {}",
                left.short(12),
                right.short(12)
            ),
            Self::Merged {
                merged_heads,
                head,
                created,
            } => write!(
                f,
                "merged {} heads into {} ({} new revisions)",
                merged_heads.len(),
                head.short(12),
                created.len()
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub(crate) fn merge_tree(tree: &RevisionTree, config: &MergeConfig) -> (RevisionTree, MergeOutcome) {
    let heads = tree.heads();
    if heads.len() <= 1 {
        debug!(heads = heads.len(), "merge skipped: already converged");
        return (tree.clone(), MergeOutcome::AlreadyConverged);
    }

    let mut merger = Merger {
        graph: Graph::from_tree(tree),
        config,
    };
    let mut created: Vec<Arc<Revision>> = Vec::with_capacity(heads.len() - 1);

    let indices: Vec<usize> = heads
        .iter()
        .filter_map(|h| merger.graph.index_of(h))
        .collect();
    let Some((&first, rest)) = indices.split_first() else {
        return (tree.clone(), MergeOutcome::AlreadyConverged);
    };
    let mut acc = first;
    for &next in rest {
        match merger.merge_pair(acc, next, 0) {
            Ok(idx) => {
                created.push(Arc::clone(merger.graph.revision(idx)));
                acc = idx;
            }
            Err(abort) => {
                let outcome = MergeOutcome::from(abort);
                debug!(%outcome, "merge abandoned");
                return (tree.clone(), outcome);
            }
        }
    }

    let head = merger.graph.hash(acc);
    let created_hashes: Vec<Hash> = created.iter().map(|r| r.revision()).collect();
    let merged = tree.with_revisions(created);
    let outcome = MergeOutcome::Merged {
        merged_heads: heads,
        head,
        created: created_hashes,
    };
    debug!(%outcome, "merge complete");
    (merged, outcome)
}

// ---------------------------------------------------------------------------
// Pairwise merge
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Abort {
    Incomplete { left: Hash, right: Hash },
    Depth { left: Hash, right: Hash, depth: usize },
}

impl From<Abort> for MergeOutcome {
    fn from(abort: Abort) -> Self {
        match abort {
            Abort::Incomplete { left, right } => Self::IncompleteAncestry { left, right },
            Abort::Depth { left, right, depth } => Self::DepthExceeded { left, right, depth },
        }
    }
}

struct Merger<'a> {
    graph: Graph,
    config: &'a MergeConfig,
}

impl Merger<'_> {
    /// Merge two nodes of the scratch graph and return the index of the
    /// synthesized revision.
    fn merge_pair(&mut self, left: usize, right: usize, depth: usize) -> Result<usize, Abort> {
        let left_rev = Arc::clone(self.graph.revision(left));
        let right_rev = Arc::clone(self.graph.revision(right));

        let base = self.base(left, right, depth)?;
        let base_rev = base.map(|idx| Arc::clone(self.graph.revision(idx)));
        debug!(
            left = %left_rev.revision().short(12),
            right = %right_rev.revision().short(12),
            base = ?base_rev.as_ref().map(|b| b.revision().short(12)),
            depth,
            "merging revisions"
        );

        let merged = self.three_way(base_rev.as_deref(), &left_rev, &right_rev);
        Ok(self.graph.push(Arc::new(merged)))
    }

    /// The index of the merge base, synthesizing a virtual base for
    /// criss-cross histories. `None` means the histories are disjoint.
    fn base(&mut self, left: usize, right: usize, depth: usize) -> Result<Option<usize>, Abort> {
        let ancestry = Ancestry::compute(&self.graph, left, right);
        if ancestry.divergent().any(|idx| self.graph.is_incomplete(idx)) {
            return Err(Abort::Incomplete {
                left: self.graph.hash(left),
                right: self.graph.hash(right),
            });
        }

        let lowest = ancestry.lowest(&self.graph);
        match lowest.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            [first, rest @ ..] => {
                if depth >= self.config.max_virtual_base_depth {
                    return Err(Abort::Depth {
                        left: self.graph.hash(left),
                        right: self.graph.hash(right),
                        depth,
                    });
                }
                debug!(bases = lowest.len(), depth, "building virtual base");
                let mut acc = *first;
                for &next in rest {
                    acc = self.merge_pair(acc, next, depth + 1)?;
                }
                Ok(Some(acc))
            }
        }
    }

    fn three_way(&self, base: Option<&Revision>, left: &Revision, right: &Revision) -> Revision {
        let left_wins = match self.config.conflict_policy {
            ConflictPolicy::PreferGreaterRevision => left.revision() > right.revision(),
            ConflictPolicy::PreferLesserRevision => left.revision() < right.revision(),
        };

        let empty = Metadata::new();
        let (base_deleted, base_meta) = base.map_or((false, &empty), |b| (b.is_deleted(), b.metadata()));

        let keys: BTreeSet<&str> = base_meta
            .keys()
            .chain(left.metadata().keys())
            .chain(right.metadata().keys())
            .map(String::as_str)
            .collect();

        let mut metadata = Metadata::new();
        for key in keys {
            let (value, resolution) = resolve(
                base_meta.get(key),
                left.metadata().get(key),
                right.metadata().get(key),
                left_wins,
            );
            trace!(key, ?resolution, "resolved field");
            if resolution == Resolution::Conflict {
                warn!(
                    key,
                    left = %left.revision().short(12),
                    right = %right.revision().short(12),
                    policy = %self.config.conflict_policy,
                    "conflicting field resolved by policy"
                );
            }
            if let Some(value) = value {
                metadata.insert(key.to_string(), Value::clone(value));
            }
        }

        let (deleted, resolution) =
            resolve(base_deleted, left.is_deleted(), right.is_deleted(), left_wins);
        trace!(deleted, ?resolution, "resolved deleted flag");

        let (content, length) = if left.content() == right.content() && left.length() == right.length() {
            (left.content(), left.length())
        } else {
            let winner = if left_wins { left } else { right };
            warn!(
                left = %left.content().short(12),
                right = %right.content().short(12),
                "merging revisions with different content"
            );
            (winner.content(), winner.length())
        };

        Revision::new(
            content,
            length,
            [left.revision(), right.revision()],
            deleted,
            metadata,
        )
    }
}

// ---------------------------------------------------------------------------
// Three-way field rule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    /// Both sides hold the same value.
    Agreed,
    /// Only the left side changed the field.
    Left,
    /// Only the right side changed the field.
    Right,
    /// Both sides changed the field differently.
    Conflict,
}

/// Resolve one field. `left_wins` settles conflicts.
fn resolve<T: PartialEq + Copy>(base: T, left: T, right: T, left_wins: bool) -> (T, Resolution) {
    if left == right {
        (left, Resolution::Agreed)
    } else if left == base {
        (right, Resolution::Right)
    } else if right == base {
        (left, Resolution::Left)
    } else if left_wins {
        (left, Resolution::Conflict)
    } else {
        (right, Resolution::Conflict)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
