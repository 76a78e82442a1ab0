//! `rvt get`: show one revision.

use crate::cmd::load_snapshot;
use crate::output::{OutputMode, kv, render};
use anyhow::{Context, Result};
use clap::Args;
use revtree_core::Hash;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Path to a revtree JSON snapshot.
    pub file: PathBuf,

    /// Full 40-character revision hash.
    pub revision: String,
}

/// # Errors
///
/// Returns an error if the hash is malformed, the snapshot cannot be loaded,
/// or the revision is not in it.
pub fn run_get(args: &GetArgs, output: OutputMode) -> Result<()> {
    let hash: Hash = args
        .revision
        .parse()
        .with_context(|| format!("'{}' is not a revision hash", args.revision))?;
    let tree = load_snapshot(&args.file)?;
    let revision = tree.get(&hash).with_context(|| {
        format!("{} ({})", hash, revtree_core::ErrorCode::RevisionNotFound.message())
    })?;
    let stored = revision.to_stored();

    render(output, &stored, |stored, w| {
        kv(w, "revision", hash.to_string())?;
        kv(w, "content", stored.content.to_string())?;
        kv(w, "length", stored.length.to_string())?;
        for parent in &stored.parents {
            kv(w, "parent", parent.to_string())?;
        }
        kv(w, "deleted", stored.deleted.to_string())?;
        for (key, value) in &stored.metadata {
            writeln!(w, "  {key} = {value} ({})", value.type_name())?;
        }
        Ok(())
    })
}
