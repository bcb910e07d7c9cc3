use anyhow::Result;
use clap::Parser;

use covmerge::cli::{self, MergeArgs};

/// covmerge — Merge sharded LCOV coverage reports into one record per source file.
#[derive(Parser)]
#[command(name = "covmerge", version, about)]
struct Cli {
    #[command(flatten)]
    merge: MergeArgs,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    let summary = cli::cmd_merge(&cli.merge)?;
    // The merged report may be on stdout.
    eprint!("{}", summary);
    Ok(())
}
