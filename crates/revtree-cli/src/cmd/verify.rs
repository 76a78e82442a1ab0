use crate::cmd::SnapshotArgs;
use crate::output::{OutputMode, render};
use anyhow::{Context, Result};
use revtree_core::RecordCheck;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct VerifyReport {
    ok: bool,
    records: Vec<RecordCheck>,
}

/// Check every record of a snapshot file.
///
/// # Errors
///
/// Returns an error when the file cannot be read or any record fails.
pub fn run_verify(args: &SnapshotArgs, output: OutputMode) -> Result<()> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let records = revtree_core::check_snapshot(&text)
        .with_context(|| format!("Failed to decode snapshot {}", args.file.display()))?;
    let report = VerifyReport {
        ok: records.iter().all(|r| r.ok),
        records,
    };

    render(output, &report, |report, w| {
        for record in &report.records {
            let label = record
                .revision
                .map_or_else(|| "(unrecorded)".to_string(), |h| h.short(12));
            let status = if record.ok { "OK  " } else { "FAIL" };
            writeln!(w, "{status} #{} {label}", record.index)?;
        }
        if report.ok {
            writeln!(w, "verify: success")?;
        }
        Ok(())
    })?;

    if report.ok {
        Ok(())
    } else {
        anyhow::bail!("verify: failed");
    }
}
