//! Revision storage and the repository write path.
//!
//! A [`RevisionStore`] keeps one [`RevisionTree`] snapshot per content hash
//! and replaces it only through compare-and-swap. [`Repository`] layers the
//! write path on top: every write loads the current tree, adds to it, merges
//! any heads that appeared, and swaps the result in. A lost race reloads and
//! retries, up to [`StoreConfig::cas_retries`](crate::config::StoreConfig)
//! attempts.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::config::RevtreeConfig;
use crate::dag::{MergeOutcome, RevisionTree};
use crate::error::ErrorCode;
use crate::hash::Hash;
use crate::revision::{Metadata, Revision};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("parent {parent} is not a known revision of {content}")]
    UnknownParent { content: Hash, parent: Hash },

    #[error("an update must name at least one parent revision")]
    NoParents,

    #[error("write to {content} lost {attempts} compare-and-swap attempts")]
    Conflict { content: Hash, attempts: usize },

    #[error("revisions of {found} cannot be stored under {expected}")]
    ContentMismatch { expected: Hash, found: Hash },

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Return the machine-readable error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownParent { .. } | Self::NoParents => ErrorCode::UnknownParent,
            Self::Conflict { .. } => ErrorCode::WriteConflict,
            Self::ContentMismatch { .. } => ErrorCode::ContentMismatch,
            Self::Backend(_) => ErrorCode::InternalUnexpected,
        }
    }
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Persistent home of revision trees, one per content hash.
pub trait RevisionStore: Send + Sync {
    /// The stored tree for `content`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the backend cannot be read.
    fn load(&self, content: &Hash) -> Result<Option<RevisionTree>, StoreError>;

    /// Replace the tree for `content` with `new` if the stored tree still
    /// equals `expected` (`None` meaning nothing is stored). Returns whether
    /// the swap happened.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the backend cannot be written.
    fn compare_and_swap(
        &self,
        content: &Hash,
        expected: Option<&RevisionTree>,
        new: RevisionTree,
    ) -> Result<bool, StoreError>;
}

/// A [`RevisionStore`] held in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    trees: Mutex<HashMap<Hash, RevisionTree>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of content items stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the lock is poisoned.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Hash, RevisionTree>>, StoreError> {
        self.trees
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

impl RevisionStore for MemoryStore {
    fn load(&self, content: &Hash) -> Result<Option<RevisionTree>, StoreError> {
        Ok(self.lock()?.get(content).cloned())
    }

    fn compare_and_swap(
        &self,
        content: &Hash,
        expected: Option<&RevisionTree>,
        new: RevisionTree,
    ) -> Result<bool, StoreError> {
        let mut trees = self.lock()?;
        if trees.get(content) != expected {
            return Ok(false);
        }
        trees.insert(*content, new);
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// The result of a successful repository write.
#[derive(Debug, Clone)]
pub struct Commit {
    /// The revision the caller asked to write, if the write created one.
    pub revision: Option<Hash>,
    /// The tree now stored.
    pub tree: RevisionTree,
    /// How the stored tree's heads were reconciled.
    pub outcome: MergeOutcome,
}

impl Commit {
    /// The stored tree's head, if it has exactly one.
    #[must_use]
    pub fn head(&self) -> Option<Hash> {
        let heads = self.tree.heads();
        if heads.len() == 1 {
            heads.first().copied()
        } else {
            None
        }
    }
}

/// Write path over a [`RevisionStore`].
#[derive(Debug)]
pub struct Repository<S> {
    store: S,
    config: RevtreeConfig,
}

impl<S: RevisionStore> Repository<S> {
    pub const fn new(store: S, config: RevtreeConfig) -> Self {
        Self { store, config }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn config(&self) -> &RevtreeConfig {
        &self.config
    }

    /// Record a new root revision for `content`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if every attempt lost its race, or a
    /// backend error.
    pub fn create(
        &self,
        content: Hash,
        length: u64,
        metadata: Metadata,
    ) -> Result<Commit, StoreError> {
        let revision = Revision::root(content, length, metadata);
        let hash = revision.revision();
        let mut commit = self.commit(content, |tree| Ok(tree.add(revision.clone())))?;
        commit.revision = Some(hash);
        Ok(commit)
    }

    /// Record a change derived from `parents`.
    ///
    /// Every parent must already be stored for `content`. The blob length is
    /// taken from the first parent.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NoParents`] if `parents` is empty.
    /// - [`StoreError::UnknownParent`] if a parent is not stored.
    /// - [`StoreError::Conflict`] if every attempt lost its race.
    pub fn update(
        &self,
        content: Hash,
        parents: &BTreeSet<Hash>,
        metadata: Metadata,
        deleted: bool,
    ) -> Result<Commit, StoreError> {
        if parents.is_empty() {
            return Err(StoreError::NoParents);
        }
        let mut written = None;
        let mut commit = self.commit(content, |tree| {
            let known = tree
                .get_many(parents)
                .map_err(|err| match err {
                    crate::dag::TreeError::NotFound(parent) => {
                        StoreError::UnknownParent { content, parent }
                    }
                })?;
            let length = known.first().map_or(0, |r| r.length());
            let revision = Revision::new(
                content,
                length,
                parents.iter().copied(),
                deleted,
                metadata.clone(),
            );
            written = Some(revision.revision());
            Ok(tree.add(revision))
        })?;
        commit.revision = written;
        Ok(commit)
    }

    /// Fold revisions received from a peer into the stored tree.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ContentMismatch`] if `incoming` describes other
    /// content, or [`StoreError::Conflict`] if every attempt lost its race.
    pub fn ingest(&self, content: Hash, incoming: &RevisionTree) -> Result<Commit, StoreError> {
        if let Some(found) = incoming.content().filter(|found| *found != content) {
            return Err(StoreError::ContentMismatch {
                expected: content,
                found,
            });
        }
        self.commit(content, |tree| Ok(tree.add_tree(incoming)))
    }

    /// Parents referenced by the stored tree but absent from it.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the store cannot be read.
    pub fn missing(&self, content: &Hash) -> Result<BTreeSet<Hash>, StoreError> {
        Ok(self
            .store
            .load(content)?
            .map(|tree| tree.unknown_parents())
            .unwrap_or_default())
    }

    /// The stored tree for `content`.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the store cannot be read.
    pub fn tree(&self, content: &Hash) -> Result<Option<RevisionTree>, StoreError> {
        self.store.load(content)
    }

    /// Load, apply, merge, and swap until the swap wins.
    fn commit(
        &self,
        content: Hash,
        mut apply: impl FnMut(&RevisionTree) -> Result<RevisionTree, StoreError>,
    ) -> Result<Commit, StoreError> {
        let attempts = self.config.store.cas_retries.max(1);
        for attempt in 1..=attempts {
            let current = self.store.load(&content)?;
            let next = apply(current.as_ref().unwrap_or(&RevisionTree::new()))?;
            let (merged, outcome) = next.merge_outcome(&self.config.merge);
            if self
                .store
                .compare_and_swap(&content, current.as_ref(), merged.clone())?
            {
                debug!(
                    content = %content.short(12),
                    revisions = merged.len(),
                    %outcome,
                    attempt,
                    "committed revision tree"
                );
                return Ok(Commit {
                    revision: None,
                    tree: merged,
                    outcome,
                });
            }
            warn!(content = %content.short(12), attempt, "compare-and-swap lost, retrying");
        }
        Err(StoreError::Conflict { content, attempts })
    }
}
