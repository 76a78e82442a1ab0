//! `rvt heads`, `rvt tails`, `rvt missing`: the edges of a snapshot's DAG.

use crate::cmd::{SnapshotArgs, load_snapshot};
use crate::output::{OutputMode, render};
use anyhow::Result;
use revtree_core::{Hash, RevisionTree};
use std::collections::BTreeSet;
use std::io::Write;

#[derive(Debug, Clone, Copy)]
pub enum Frontier {
    Heads,
    Tails,
    Missing,
}

impl Frontier {
    fn select(self, tree: &RevisionTree) -> BTreeSet<Hash> {
        match self {
            Self::Heads => tree.heads(),
            Self::Tails => tree.tails(),
            Self::Missing => tree.unknown_parents(),
        }
    }
}

/// Print one hash per line, or a JSON array.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded.
pub fn run_frontier(args: &SnapshotArgs, which: Frontier, output: OutputMode) -> Result<()> {
    let tree = load_snapshot(&args.file)?;
    let hashes: Vec<Hash> = which.select(&tree).into_iter().collect();
    tracing::debug!(?which, count = hashes.len(), "selected frontier");
    render(output, &hashes, |hashes, w| {
        for hash in hashes {
            writeln!(w, "{hash}")?;
        }
        Ok(())
    })
}
