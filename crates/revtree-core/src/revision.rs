//! Immutable, content-addressed revisions.
//!
//! A [`Revision`] records one state of the metadata attached to a blob: the
//! blob's content hash and length, the revisions it was derived from, a
//! tombstone flag, and a metadata map. Its identity is a digest of all of
//! those fields, computed once in [`Revision::new`], so two revisions with
//! the same logical content always share a hash and inserting one twice is a
//! no-op.
//!
//! # Hash input
//!
//! ```text
//! "revtree/revision/v1\0"
//! u64 parent count, parent digests ascending
//! content digest
//! u64 length
//! u8 deleted
//! u64 entry count, (u64 key len, key, value) ascending by key
//! ```
//!
//! All integers are big-endian. Values use the canonical form from
//! [`Value::write_canonical`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::hash::Hash;
use crate::value::{Value, write_canonical_entries, write_len};

/// Metadata attached to a revision, in canonical key order.
pub type Metadata = BTreeMap<String, Value>;

const HASH_DOMAIN: &[u8] = b"revtree/revision/v1\0";

/// One immutable node of a revision DAG.
#[derive(Clone)]
pub struct Revision {
    revision: Hash,
    content: Hash,
    length: u64,
    parents: BTreeSet<Hash>,
    deleted: bool,
    metadata: Metadata,
}

impl Revision {
    /// Build a revision and compute its hash.
    #[must_use]
    pub fn new(
        content: Hash,
        length: u64,
        parents: impl IntoIterator<Item = Hash>,
        deleted: bool,
        metadata: Metadata,
    ) -> Self {
        let parents: BTreeSet<Hash> = parents.into_iter().collect();
        let revision = compute_revision_hash(content, length, &parents, deleted, &metadata);
        Self {
            revision,
            content,
            length,
            parents,
            deleted,
            metadata,
        }
    }

    /// Build a parentless revision.
    #[must_use]
    pub fn root(content: Hash, length: u64, metadata: Metadata) -> Self {
        Self::new(content, length, std::iter::empty(), false, metadata)
    }

    /// Build a successor of this revision carrying `metadata`.
    #[must_use]
    pub fn child(&self, metadata: Metadata) -> Self {
        Self::new(self.content, self.length, [self.revision], false, metadata)
    }

    /// Build a tombstone succeeding this revision.
    #[must_use]
    pub fn tombstone(&self) -> Self {
        Self::new(
            self.content,
            self.length,
            [self.revision],
            true,
            Metadata::new(),
        )
    }

    /// The revision's own hash.
    #[must_use]
    pub const fn revision(&self) -> Hash {
        self.revision
    }

    /// Hash of the blob this revision describes.
    #[must_use]
    pub const fn content(&self) -> Hash {
        self.content
    }

    /// Byte length of the blob.
    #[must_use]
    pub const fn length(&self) -> u64 {
        self.length
    }

    /// Parent revision hashes, ascending.
    #[must_use]
    pub const fn parents(&self) -> &BTreeSet<Hash> {
        &self.parents
    }

    /// Returns `true` if this revision is a tombstone.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Metadata fields.
    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Returns `true` if the revision has no parents.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Convert into the serializable record form.
    #[must_use]
    pub fn to_stored(&self) -> StoredRevision {
        StoredRevision {
            revision: Some(self.revision),
            content: self.content,
            length: self.length,
            parents: self.parents.iter().copied().collect(),
            deleted: self.deleted,
            metadata: self.metadata.clone(),
        }
    }
}

/// Compute the revision hash for the given fields.
#[must_use]
pub fn compute_revision_hash(
    content: Hash,
    length: u64,
    parents: &BTreeSet<Hash>,
    deleted: bool,
    metadata: &Metadata,
) -> Hash {
    let mut buf = Vec::with_capacity(128);
    buf.extend_from_slice(HASH_DOMAIN);
    write_len(&mut buf, parents.len());
    for parent in parents {
        buf.extend_from_slice(parent.as_bytes());
    }
    buf.extend_from_slice(content.as_bytes());
    buf.extend_from_slice(&length.to_be_bytes());
    buf.push(u8::from(deleted));
    write_canonical_entries(&mut buf, metadata.iter().map(|(k, v)| (k.as_str(), v)));
    Hash::digest(&buf)
}

impl PartialEq for Revision {
    fn eq(&self, other: &Self) -> bool {
        self.revision == other.revision
    }
}

impl Eq for Revision {}

impl PartialOrd for Revision {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Revision {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.revision.cmp(&other.revision)
    }
}

impl std::hash::Hash for Revision {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.revision.hash(state);
    }
}

impl fmt::Debug for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Revision")
            .field("revision", &self.revision.short(12))
            .field("parents", &self.parents.iter().map(|p| p.short(12)).collect::<Vec<_>>())
            .field("deleted", &self.deleted)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.revision)
    }
}

// ---------------------------------------------------------------------------
// Stored form
// ---------------------------------------------------------------------------

/// Raised when a stored revision's recorded hash disagrees with its fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("revision hash mismatch: stored={stored} expected={expected}")]
pub struct RevisionMismatch {
    /// The hash recorded alongside the fields.
    pub stored: Hash,
    /// The hash recomputed from the fields.
    pub expected: Hash,
}

/// A revision as it appears on disk or on the wire.
///
/// `revision` is optional on input: when present it must match the hash
/// recomputed from the other fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRevision {
    /// Recorded revision hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<Hash>,
    /// Blob hash.
    pub content: Hash,
    /// Blob length.
    pub length: u64,
    /// Parent revision hashes.
    #[serde(default)]
    pub parents: Vec<Hash>,
    /// Tombstone flag.
    #[serde(default)]
    pub deleted: bool,
    /// Metadata fields.
    #[serde(default)]
    pub metadata: Metadata,
}

impl StoredRevision {
    /// Rebuild the revision, checking the recorded hash if there is one.
    ///
    /// # Errors
    ///
    /// Returns [`RevisionMismatch`] if the recorded hash differs from the
    /// recomputed one.
    pub fn into_revision(self) -> Result<Revision, RevisionMismatch> {
        let stored = self.revision;
        let revision = Revision::new(
            self.content,
            self.length,
            self.parents,
            self.deleted,
            self.metadata,
        );
        match stored {
            Some(stored) if stored != revision.revision => Err(RevisionMismatch {
                stored,
                expected: revision.revision,
            }),
            _ => Ok(revision),
        }
    }
}

/// Returns `true` if a stored record's hash matches its fields.
///
/// Records without a recorded hash verify trivially.
#[must_use]
pub fn verify_revision(stored: &StoredRevision) -> bool {
    stored.revision.is_none_or(|recorded| {
        let parents: BTreeSet<Hash> = stored.parents.iter().copied().collect();
        recorded
            == compute_revision_hash(
                stored.content,
                stored.length,
                &parents,
                stored.deleted,
                &stored.metadata,
            )
    })
}

impl Serialize for Revision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_stored().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Revision {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        StoredRevision::deserialize(deserializer)?
            .into_revision()
            .map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn content() -> Hash {
        Hash::digest(b"blob")
    }

    fn meta(pairs: &[(&str, Value)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn identical_fields_give_identical_hash() {
        let a = Revision::root(content(), 4, meta(&[("name", "a.txt".into())]));
        let b = Revision::root(content(), 4, meta(&[("name", "a.txt".into())]));
        assert_eq!(a.revision(), b.revision());
        assert_eq!(a, b);
    }

    #[test]
    fn every_field_contributes_to_hash() {
        let base = Revision::root(content(), 4, meta(&[("name", "a".into())]));
        let variants = [
            Revision::root(Hash::digest(b"other"), 4, meta(&[("name", "a".into())])),
            Revision::root(content(), 5, meta(&[("name", "a".into())])),
            Revision::new(content(), 4, std::iter::empty(), true, meta(&[("name", "a".into())])),
            Revision::root(content(), 4, meta(&[("name", "b".into())])),
            Revision::new(
                content(),
                4,
                [Hash::ZERO],
                false,
                meta(&[("name", "a".into())]),
            ),
        ];
        for variant in &variants {
            assert_ne!(variant.revision(), base.revision(), "{variant:?}");
        }
    }

    #[test]
    fn parent_order_does_not_matter() {
        let p1 = Hash::digest(b"p1");
        let p2 = Hash::digest(b"p2");
        let a = Revision::new(content(), 1, [p1, p2], false, Metadata::new());
        let b = Revision::new(content(), 1, [p2, p1], false, Metadata::new());
        assert_eq!(a.revision(), b.revision());
        assert_eq!(a.parents().iter().copied().collect::<Vec<_>>(), vec![
            p1.min(p2),
            p1.max(p2)
        ]);
    }

    #[test]
    fn child_and_tombstone_link_to_parent() {
        let root = Revision::root(content(), 3, meta(&[("k", 1.into())]));
        let child = root.child(meta(&[("k", 2.into())]));
        assert_eq!(child.parents().len(), 1);
        assert!(child.parents().contains(&root.revision()));
        assert_eq!(child.content(), root.content());
        assert_eq!(child.length(), root.length());
        assert!(!child.is_deleted());

        let gone = child.tombstone();
        assert!(gone.is_deleted());
        assert!(gone.metadata().is_empty());
        assert!(gone.parents().contains(&child.revision()));
    }

    #[test]
    fn stored_round_trip_verifies() {
        let root = Revision::root(content(), 3, meta(&[("k", "v".into())]));
        let json = serde_json::to_string(&root).unwrap();
        let back: Revision = serde_json::from_str(&json).unwrap();
        assert_eq!(back, root);
        assert_eq!(back.metadata(), root.metadata());
    }

    #[test]
    fn equal_hash_means_equal_dated_metadata() {
        let fine = chrono::DateTime::from_timestamp(1_700_000_000, 123_456_789).unwrap();
        let a = Revision::root(content(), 3, meta(&[("at", Value::date(fine))]));
        let b = Revision::root(
            content(),
            3,
            meta(&[("at", Value::date_millis(1_700_000_000_123).unwrap())]),
        );
        assert_eq!(a.revision(), b.revision());
        assert_eq!(a.metadata(), b.metadata());

        let json = serde_json::to_string(&a).unwrap();
        let back: Revision = serde_json::from_str(&json).unwrap();
        assert_eq!(back.metadata(), a.metadata());

        let later = Revision::root(
            content(),
            3,
            meta(&[("at", Value::date_millis(1_700_000_000_124).unwrap())]),
        );
        assert_ne!(later.revision(), a.revision());
    }

    #[test]
    fn tampered_record_is_rejected() {
        let root = Revision::root(content(), 3, meta(&[("k", "v".into())]));
        let mut stored = root.to_stored();
        assert!(verify_revision(&stored));

        stored.metadata.insert("k".into(), "tampered".into());
        assert!(!verify_revision(&stored));
        let err = stored.into_revision().unwrap_err();
        assert_eq!(err.stored, root.revision());
    }

    #[test]
    fn record_without_hash_is_accepted() {
        let mut stored = Revision::root(content(), 3, Metadata::new()).to_stored();
        stored.revision = None;
        assert!(verify_revision(&stored));
        assert!(stored.into_revision().is_ok());
    }
}
