//! revtree-core: content-addressed metadata revisions and their merge engine.
//!
//! Every blob in a revtree repository carries a DAG of metadata revisions.
//! Replicas edit concurrently, exchange revisions, and reconcile divergent
//! heads with a recursive three-way merge.
//!
//! # Modules
//!
//! - [`hash`]: the 20-byte [`Hash`] used for content and revision identity.
//! - [`value`]: the [`Value`] union stored in metadata fields.
//! - [`revision`]: immutable, self-identifying [`Revision`] nodes.
//! - [`dag`]: the [`RevisionTree`] container, LCA discovery, and merging.
//! - [`codec`]: JSON snapshots of whole trees.
//! - [`store`]: compare-and-swap storage and the repository write path.
//! - [`config`]: TOML configuration for merge policy and store retries.
//! - [`error`]: stable machine-readable error codes.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums per module, each exposing
//!   `code() -> ErrorCode`. Configuration loading uses `anyhow::Result`.
//! - **Logging**: `tracing` macros (`debug!`, `trace!`, `warn!`). The core
//!   never installs a subscriber.

pub mod codec;
pub mod config;
pub mod dag;
pub mod error;
pub mod hash;
pub mod revision;
pub mod store;
pub mod value;

pub use codec::{CodecError, RecordCheck, check_snapshot, decode_snapshot, encode_snapshot};
pub use config::{ConflictPolicy, MergeConfig, RevtreeConfig, StoreConfig};
pub use dag::{MergeOutcome, RevisionTree, RevisionTreeBuilder, TreeError};
pub use error::ErrorCode;
pub use hash::Hash;
pub use revision::{Metadata, Revision, StoredRevision, verify_revision};
pub use store::{Commit, MemoryStore, Repository, RevisionStore, StoreError};
pub use value::{Decimal, Timestamp, Value, ValueMap};
