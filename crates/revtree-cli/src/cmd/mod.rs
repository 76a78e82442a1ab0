pub mod frontier;
pub mod get;
pub mod list;
pub mod merge;
pub mod verify;

use anyhow::{Context, Result};
use clap::Args;
use revtree_core::RevisionTree;
use std::path::{Path, PathBuf};

/// Arguments shared by commands that read one snapshot.
#[derive(Args, Debug, Clone)]
pub struct SnapshotArgs {
    /// Path to a revtree JSON snapshot.
    pub file: PathBuf,
}

/// Read and decode a snapshot file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid snapshot.
pub fn load_snapshot(path: &Path) -> Result<RevisionTree> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    revtree_core::decode_snapshot(&text).with_context(|| {
        format!("Failed to decode snapshot {}", path.display())
    })
}
