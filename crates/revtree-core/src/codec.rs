//! JSON snapshots of a whole [`RevisionTree`].
//!
//! A snapshot is the unit of storage and transfer: one document holding
//! every revision of one content item, parents before children.
//!
//! ```json
//! {
//!   "version": 1,
//!   "content": "<40 hex chars or null>",
//!   "revisions": [ { "revision": "...", "content": "...", ... }, ... ]
//! }
//! ```
//!
//! Decoding is strict: every recorded revision hash is recomputed and every
//! revision must describe the same content as the header.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dag::RevisionTree;
use crate::error::ErrorCode;
use crate::hash::Hash;
use crate::revision::{RevisionMismatch, StoredRevision, verify_revision};

/// Snapshot format version written by [`encode_snapshot`].
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors from snapshot encoding and decoding.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("revision {index}: {source}")]
    HashMismatch {
        index: usize,
        #[source]
        source: RevisionMismatch,
    },

    #[error("revision {index} has content {found}, snapshot content is {expected}")]
    ContentMismatch {
        index: usize,
        expected: Hash,
        found: Hash,
    },

    #[error("unsupported snapshot version {found} (supported: {SNAPSHOT_VERSION})")]
    UnsupportedVersion { found: u32 },
}

impl CodecError {
    /// Return the machine-readable error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Json(_) => ErrorCode::SnapshotDecodeFailed,
            Self::HashMismatch { .. } => ErrorCode::RevisionHashMismatch,
            Self::ContentMismatch { .. } => ErrorCode::ContentMismatch,
            Self::UnsupportedVersion { .. } => ErrorCode::UnsupportedSnapshotVersion,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    #[serde(default)]
    content: Option<Hash>,
    #[serde(default)]
    revisions: Vec<StoredRevision>,
}

/// Serialize a tree as a JSON snapshot, revisions in topological order.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if serialization fails.
pub fn encode_snapshot(tree: &RevisionTree) -> Result<String, CodecError> {
    let snapshot = Snapshot {
        version: SNAPSHOT_VERSION,
        content: tree.content(),
        revisions: tree.list().into_iter().map(|r| r.to_stored()).collect(),
    };
    Ok(serde_json::to_string_pretty(&snapshot)?)
}

/// Parse and verify a JSON snapshot.
///
/// # Errors
///
/// - [`CodecError::Json`] if the text is not a snapshot document.
/// - [`CodecError::UnsupportedVersion`] for any version other than
///   [`SNAPSHOT_VERSION`].
/// - [`CodecError::HashMismatch`] if a recorded revision hash is wrong.
/// - [`CodecError::ContentMismatch`] if revisions describe different content.
pub fn decode_snapshot(text: &str) -> Result<RevisionTree, CodecError> {
    let snapshot: Snapshot = serde_json::from_str(text)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(CodecError::UnsupportedVersion {
            found: snapshot.version,
        });
    }

    let mut expected = snapshot.content;
    let mut builder = RevisionTree::builder();
    for (index, stored) in snapshot.revisions.into_iter().enumerate() {
        let revision = stored
            .into_revision()
            .map_err(|source| CodecError::HashMismatch { index, source })?;
        match expected {
            Some(content) if content != revision.content() => {
                return Err(CodecError::ContentMismatch {
                    index,
                    expected: content,
                    found: revision.content(),
                });
            }
            Some(_) => {}
            None => expected = Some(revision.content()),
        }
        builder.add(revision);
    }

    let tree = builder.build();
    debug!(revisions = tree.len(), "decoded snapshot");
    Ok(tree)
}

/// Result of checking one record of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordCheck {
    /// Position in the snapshot's `revisions` array.
    pub index: usize,
    /// The recorded hash, if the record carries one.
    pub revision: Option<Hash>,
    pub content: Hash,
    /// Recorded hash matches the fields and content matches the first record.
    pub ok: bool,
}

/// Check every record of a snapshot without stopping at the first failure.
///
/// # Errors
///
/// Returns [`CodecError::Json`] or [`CodecError::UnsupportedVersion`] if the
/// document itself cannot be read.
pub fn check_snapshot(text: &str) -> Result<Vec<RecordCheck>, CodecError> {
    let snapshot: Snapshot = serde_json::from_str(text)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(CodecError::UnsupportedVersion {
            found: snapshot.version,
        });
    }
    let expected = snapshot
        .content
        .or_else(|| snapshot.revisions.first().map(|r| r.content));
    Ok(snapshot
        .revisions
        .iter()
        .enumerate()
        .map(|(index, stored)| RecordCheck {
            index,
            revision: stored.revision,
            content: stored.content,
            ok: verify_revision(stored) && expected.is_none_or(|c| c == stored.content),
        })
        .collect())
}
