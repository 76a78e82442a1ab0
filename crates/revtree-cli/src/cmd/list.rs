//! `rvt list`: every revision, parents before children.

use crate::cmd::{SnapshotArgs, load_snapshot};
use crate::output::{OutputMode, render};
use anyhow::Result;
use revtree_core::Hash;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
pub struct ListRow {
    pub revision: Hash,
    pub parents: Vec<Hash>,
    pub deleted: bool,
    pub head: bool,
    pub keys: Vec<String>,
}

/// # Errors
///
/// Returns an error if the snapshot cannot be loaded.
pub fn run_list(args: &SnapshotArgs, output: OutputMode) -> Result<()> {
    let tree = load_snapshot(&args.file)?;
    let heads = tree.heads();
    let rows: Vec<ListRow> = tree
        .list()
        .into_iter()
        .map(|rev| ListRow {
            revision: rev.revision(),
            parents: rev.parents().iter().copied().collect(),
            deleted: rev.is_deleted(),
            head: heads.contains(&rev.revision()),
            keys: rev.metadata().keys().cloned().collect(),
        })
        .collect();

    render(output, &rows, |rows, w| {
        for row in rows {
            let parents: Vec<String> = row.parents.iter().map(|p| p.short(12)).collect();
            let mut flags = String::new();
            if row.head {
                flags.push_str(" head");
            }
            if row.deleted {
                flags.push_str(" deleted");
            }
            writeln!(
                w,
                "{}  parents=[{}]  keys=[{}]{flags}",
                row.revision.short(12),
                parents.join(","),
                row.keys.join(","),
            )?;
        }
        Ok(())
    })
}
