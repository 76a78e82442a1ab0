#![forbid(unsafe_code)]

mod cmd;
mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cmd::frontier::Frontier;
use output::OutputMode;
use revtree_core::ErrorCode;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "rvt",
    author,
    version,
    about = "rvt: inspect and merge revtree snapshots",
    long_about = None
)]
struct Cli {
    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// TOML config file with `[merge]` and `[store]` sections.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "List head revisions",
        long_about = "List revisions that no other revision in the snapshot names as a parent.",
        after_help = "EXAMPLES:\n    rvt heads blob.json\n    rvt heads blob.json --json"
    )]
    Heads(cmd::SnapshotArgs),

    #[command(
        about = "List tail revisions",
        long_about = "List roots of the known history: revisions with no parents or with a parent absent from the snapshot."
    )]
    Tails(cmd::SnapshotArgs),

    #[command(
        about = "List missing parents",
        long_about = "List parent hashes referenced in the snapshot but absent from it. Fetch these from a peer before merging."
    )]
    Missing(cmd::SnapshotArgs),

    #[command(about = "List every revision, parents first")]
    List(cmd::SnapshotArgs),

    #[command(
        about = "Merge all heads into one",
        long_about = "Fold every head into a single merged revision and write the resulting snapshot.",
        after_help = "EXAMPLES:\n    # Merge in place\n    rvt merge blob.json\n\n    # Write elsewhere with the lesser-hash conflict policy\n    rvt merge blob.json --output merged.json --policy lesser"
    )]
    Merge(cmd::merge::MergeArgs),

    #[command(
        about = "Verify revision hashes",
        long_about = "Recompute every revision hash in a snapshot and check that all revisions share one content hash."
    )]
    Verify(cmd::SnapshotArgs),

    #[command(about = "Show one revision")]
    Get(cmd::get::GetArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RVT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "rvt=debug,revtree_core=debug,info"
        } else {
            "warn"
        })
    });

    let format = env::var("RVT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let output = OutputMode::from_json_flag(cli.json);
    let config = revtree_core::config::resolve(cli.config.as_deref()).with_context(|| {
        let code = ErrorCode::ConfigParseError;
        format!("{code}: {}", code.hint().unwrap_or_else(|| code.message()))
    })?;

    match &cli.command {
        Commands::Heads(args) => cmd::frontier::run_frontier(args, Frontier::Heads, output),
        Commands::Tails(args) => cmd::frontier::run_frontier(args, Frontier::Tails, output),
        Commands::Missing(args) => cmd::frontier::run_frontier(args, Frontier::Missing, output),
        Commands::List(args) => cmd::list::run_list(args, output),
        Commands::Merge(args) => cmd::merge::run_merge(args, &config.merge, output),
        Commands::Verify(args) => cmd::verify::run_verify(args, output),
        Commands::Get(args) => cmd::get::run_get(args, output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["rvt", "heads", "x.json", "--json", "--config", "c.toml"])
            .unwrap();
        assert!(cli.json);
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
        assert!(matches!(cli.command, Commands::Heads(_)));
    }

    #[test]
    fn merge_accepts_policy_and_output() {
        let cli = Cli::try_parse_from([
            "rvt", "merge", "in.json", "--output", "out.json", "--policy", "lesser",
        ])
        .unwrap();
        match cli.command {
            Commands::Merge(args) => {
                assert_eq!(args.output, Some(PathBuf::from("out.json")));
                assert_eq!(
                    args.policy,
                    Some(revtree_core::ConflictPolicy::PreferLesserRevision)
                );
                assert!(!args.dry_run);
            }
            other => panic!("expected merge, got {other:?}"),
        }
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(Cli::try_parse_from(["rvt", "merge", "in.json", "--policy", "coin"]).is_err());
    }

    #[test]
    fn get_requires_hash() {
        assert!(Cli::try_parse_from(["rvt", "get", "in.json"]).is_err());
    }
}
