//! The [`RevisionTree`] container and its structural queries.
//!
//! Revisions live in a persistent ordered map keyed by revision hash, with a
//! reverse index from each parent hash to the revisions naming it. Both maps
//! are `im` structures, so cloning a tree is O(1) and every `add` copies only
//! the touched paths.
//!
//! # Construction
//!
//! Trees are usually assembled with [`RevisionTreeBuilder`], which accepts
//! revisions in any order and computes the topological listing once in
//! [`RevisionTreeBuilder::build`]. Trees derived through [`RevisionTree::add`]
//! compute their listing lazily, the first time it is asked for.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, OnceLock};

use im::{OrdMap, OrdSet};
use tracing::debug;

use crate::config::MergeConfig;
use crate::error::ErrorCode;
use crate::hash::Hash;
use crate::revision::Revision;

use super::merge::{self, MergeOutcome};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from tree lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The requested revision is not in the tree.
    #[error("revision not found in tree: {0}")]
    NotFound(Hash),
}

impl TreeError {
    /// Return the machine-readable error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::RevisionNotFound,
        }
    }
}

// ---------------------------------------------------------------------------
// RevisionTree
// ---------------------------------------------------------------------------

/// An immutable DAG of the known revisions of one content item.
#[derive(Clone, Default)]
pub struct RevisionTree {
    /// All revisions, keyed by revision hash.
    revisions: OrdMap<Hash, Arc<Revision>>,
    /// Parent hash to the hashes of revisions that list it. Keys include
    /// parents that are absent from the tree.
    children: OrdMap<Hash, OrdSet<Hash>>,
    /// Topological listing, filled on first use.
    order: Arc<OnceLock<Vec<Hash>>>,
}

impl RevisionTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a builder.
    #[must_use]
    pub fn builder() -> RevisionTreeBuilder {
        RevisionTreeBuilder::new()
    }

    /// Number of revisions in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    /// Returns `true` if the tree has no revisions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    /// Content hash shared by the tree's revisions, if it has any.
    #[must_use]
    pub fn content(&self) -> Option<Hash> {
        self.revisions.values().next().map(|r| r.content())
    }

    /// Look up one revision.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotFound`] if `hash` is not in the tree.
    pub fn get(&self, hash: &Hash) -> Result<&Revision, TreeError> {
        self.revisions
            .get(hash)
            .map(Arc::as_ref)
            .ok_or(TreeError::NotFound(*hash))
    }

    /// Look up several revisions, returned in the order requested.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotFound`] for the first hash not in the tree.
    pub fn get_many<'a>(
        &self,
        hashes: impl IntoIterator<Item = &'a Hash>,
    ) -> Result<Vec<&Revision>, TreeError> {
        hashes.into_iter().map(|hash| self.get(hash)).collect()
    }

    /// Returns `true` if the tree holds `hash`.
    #[must_use]
    pub fn contains(&self, hash: &Hash) -> bool {
        self.revisions.contains_key(hash)
    }

    /// Every revision, parents before children.
    ///
    /// Unrelated revisions are ordered by ascending hash, so the listing is
    /// stable for a given set of revisions.
    #[must_use]
    pub fn list(&self) -> Vec<&Revision> {
        self.ordered_arcs().map(Arc::as_ref).collect()
    }

    /// Iterate revisions in hash order.
    pub fn revisions(&self) -> impl Iterator<Item = &Revision> {
        self.revisions.values().map(Arc::as_ref)
    }

    /// Hashes of revisions that no other revision in the tree names as a
    /// parent.
    #[must_use]
    pub fn heads(&self) -> BTreeSet<Hash> {
        self.revisions
            .keys()
            .filter(|hash| self.children.get(*hash).is_none_or(OrdSet::is_empty))
            .copied()
            .collect()
    }

    /// Hashes of roots of the known sub-graph: revisions with no parents, or
    /// with at least one parent absent from the tree.
    #[must_use]
    pub fn tails(&self) -> BTreeSet<Hash> {
        self.revisions
            .values()
            .filter(|rev| rev.is_root() || rev.parents().iter().any(|p| !self.contains(p)))
            .map(|rev| rev.revision())
            .collect()
    }

    /// Parent hashes referenced in the tree but absent from it.
    #[must_use]
    pub fn unknown_parents(&self) -> BTreeSet<Hash> {
        self.children
            .keys()
            .filter(|hash| !self.contains(hash))
            .copied()
            .collect()
    }

    /// Hashes of revisions in the tree that list `hash` as a parent.
    #[must_use]
    pub fn children(&self, hash: &Hash) -> BTreeSet<Hash> {
        self.children
            .get(hash)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Transitive parents of `hash` that are present in the tree, excluding
    /// `hash` itself.
    #[must_use]
    pub fn ancestors(&self, hash: &Hash) -> BTreeSet<Hash> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<Hash> = match self.revisions.get(hash) {
            Some(rev) => rev.parents().iter().copied().collect(),
            None => return seen,
        };
        while let Some(current) = stack.pop() {
            if let Some(rev) = self.revisions.get(&current) {
                if seen.insert(current) {
                    stack.extend(rev.parents().iter().copied());
                }
            }
        }
        seen
    }

    /// Returns `true` if `a` is a strict ancestor of `b` within the tree.
    #[must_use]
    pub fn is_ancestor(&self, a: &Hash, b: &Hash) -> bool {
        a != b && self.ancestors(b).contains(a)
    }

    /// Return a tree that also holds `revision`.
    ///
    /// Adding a revision that is already present returns an equal tree.
    #[must_use]
    pub fn add(&self, revision: Revision) -> Self {
        if self.contains(&revision.revision()) {
            return self.clone();
        }
        let mut tree = self.clone();
        tree.insert(Arc::new(revision));
        tree.order = Arc::default();
        tree
    }

    /// Return the union of this tree and `other`.
    #[must_use]
    pub fn add_tree(&self, other: &Self) -> Self {
        self.with_revisions(other.revisions.values().cloned())
    }

    /// Merge all heads into one using the default [`MergeConfig`].
    ///
    /// Returns the receiver unchanged when it already has a single head or
    /// when the history between its heads is incomplete.
    #[must_use]
    pub fn merge(&self) -> Self {
        self.merge_with(&MergeConfig::default())
    }

    /// Merge all heads into one using an explicit policy.
    #[must_use]
    pub fn merge_with(&self, config: &MergeConfig) -> Self {
        self.merge_outcome(config).0
    }

    /// Merge all heads and report what happened.
    #[must_use]
    pub fn merge_outcome(&self, config: &MergeConfig) -> (Self, MergeOutcome) {
        merge::merge_tree(self, config)
    }

    // -----------------------------------------------------------------------
    // Crate-internal helpers
    // -----------------------------------------------------------------------

    /// Revisions in topological order, as shared handles.
    pub(crate) fn ordered_arcs(&self) -> impl Iterator<Item = &Arc<Revision>> {
        self.order()
            .iter()
            .filter_map(|hash| self.revisions.get(hash))
    }

    /// Return a tree that also holds every revision in `revisions`.
    pub(crate) fn with_revisions(&self, revisions: impl IntoIterator<Item = Arc<Revision>>) -> Self {
        let mut tree = self.clone();
        let mut added = 0usize;
        for revision in revisions {
            if tree.insert(revision) {
                added += 1;
            }
        }
        if added > 0 {
            tree.order = Arc::default();
            debug!(added, total = tree.len(), "extended revision tree");
        }
        tree
    }

    /// Insert in place. Returns `false` if the revision was already present.
    fn insert(&mut self, revision: Arc<Revision>) -> bool {
        let hash = revision.revision();
        if self.revisions.contains_key(&hash) {
            return false;
        }
        for parent in revision.parents() {
            let mut set = self.children.get(parent).cloned().unwrap_or_default();
            set.insert(hash);
            self.children.insert(*parent, set);
        }
        self.revisions.insert(hash, revision);
        true
    }

    fn order(&self) -> &[Hash] {
        self.order.get_or_init(|| self.topological_order())
    }

    /// Kahn's algorithm over present parents. Ready revisions are taken in
    /// ascending hash order.
    fn topological_order(&self) -> Vec<Hash> {
        let mut pending: HashMap<Hash, usize> = HashMap::new();
        let mut ready: BTreeSet<Hash> = BTreeSet::new();
        for (hash, rev) in self.revisions.iter() {
            let present = rev.parents().iter().filter(|p| self.contains(p)).count();
            if present == 0 {
                ready.insert(*hash);
            } else {
                pending.insert(*hash, present);
            }
        }

        let mut order = Vec::with_capacity(self.revisions.len());
        while let Some(current) = ready.pop_first() {
            order.push(current);
            if let Some(children) = self.children.get(&current) {
                for child in children {
                    if let Some(count) = pending.get_mut(child) {
                        *count -= 1;
                        if *count == 0 {
                            pending.remove(child);
                            ready.insert(*child);
                        }
                    }
                }
            }
        }
        order
    }
}

impl PartialEq for RevisionTree {
    fn eq(&self, other: &Self) -> bool {
        self.revisions.len() == other.revisions.len()
            && self.revisions.keys().eq(other.revisions.keys())
    }
}

impl Eq for RevisionTree {}

impl fmt::Debug for RevisionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevisionTree")
            .field("revisions", &self.revisions.len())
            .field(
                "heads",
                &self.heads().iter().map(|h| h.short(12)).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl FromIterator<Revision> for RevisionTree {
    fn from_iter<I: IntoIterator<Item = Revision>>(iter: I) -> Self {
        let mut builder = RevisionTreeBuilder::new();
        builder.extend(iter);
        builder.build()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects revisions in any order and builds a [`RevisionTree`].
#[derive(Debug, Default)]
pub struct RevisionTreeBuilder {
    revisions: Vec<Revision>,
    seen: HashSet<Hash>,
}

impl RevisionTreeBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one revision. Duplicates are ignored.
    pub fn add(&mut self, revision: Revision) -> &mut Self {
        if self.seen.insert(revision.revision()) {
            self.revisions.push(revision);
        }
        self
    }

    /// Queue every revision from `revisions`.
    pub fn extend(&mut self, revisions: impl IntoIterator<Item = Revision>) -> &mut Self {
        for revision in revisions {
            self.add(revision);
        }
        self
    }

    /// Number of distinct revisions queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    /// Build the tree and compute its topological listing.
    #[must_use]
    pub fn build(self) -> RevisionTree {
        let mut tree = RevisionTree::new();
        for revision in self.revisions {
            tree.insert(Arc::new(revision));
        }
        let order = tree.topological_order();
        tree.order = Arc::new(OnceLock::from(order));
        tree
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
