//! `rvt merge`: fold a snapshot's heads into one and write the result.

use crate::output::{OutputMode, kv, render};
use anyhow::{Context, Result};
use clap::Args;
use revtree_core::{ConflictPolicy, MergeConfig, MergeOutcome};
use serde::Serialize;
use std::path::PathBuf;

use super::load_snapshot;

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Path to a revtree JSON snapshot.
    pub file: PathBuf,

    /// Where to write the merged snapshot. Defaults to rewriting `file`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override the configured conflict policy (`greater` or `lesser`).
    #[arg(long, value_parser = parse_policy)]
    pub policy: Option<ConflictPolicy>,

    /// Report what would happen without writing anything.
    #[arg(long)]
    pub dry_run: bool,
}

fn parse_policy(raw: &str) -> Result<ConflictPolicy, String> {
    ConflictPolicy::parse(raw).ok_or_else(|| format!("unknown conflict policy '{raw}'"))
}

#[derive(Debug, Serialize)]
struct MergeReport<'a> {
    #[serde(flatten)]
    outcome: &'a MergeOutcome,
    revisions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    written: Option<String>,
}

/// # Errors
///
/// Returns an error if the snapshot cannot be loaded or the result cannot be
/// written.
pub fn run_merge(args: &MergeArgs, config: &MergeConfig, output: OutputMode) -> Result<()> {
    let tree = load_snapshot(&args.file)?;
    let mut config = config.clone();
    if let Some(policy) = args.policy {
        config.conflict_policy = policy;
    }

    let (merged, outcome) = tree.merge_outcome(&config);
    tracing::info!(%outcome, policy = %config.conflict_policy, "merge finished");

    let target = args.output.clone().unwrap_or_else(|| args.file.clone());
    let written = if args.dry_run || (!outcome.is_merged() && args.output.is_none()) {
        None
    } else {
        let text = revtree_core::encode_snapshot(&merged)?;
        std::fs::write(&target, text)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        Some(target.display().to_string())
    };

    let report = MergeReport {
        outcome: &outcome,
        revisions: merged.len(),
        written,
    };
    render(output, &report, |report, w| {
        kv(w, "outcome", report.outcome.to_string())?;
        kv(w, "revisions", report.revisions.to_string())?;
        if let Some(path) = &report.written {
            kv(w, "written", path)?;
        }
        Ok(())
    })
}
