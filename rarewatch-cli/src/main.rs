//! rarewatch — announce new SuperRare creations and sales to a chat channel.
//!
//! # Usage
//!
//! ```text
//! rarewatch run [--log-only]
//! rarewatch once [--dry-run] [--log-only] [--json]
//! rarewatch show [--state <path>] [--json]
//! rarewatch diff <snapshot.json> [--state <path>] [--strategy positional|transaction] [--json]
//! rarewatch check
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    check::CheckArgs, diff::DiffArgs, once::OnceArgs, run::RunArgs, show::ShowArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "rarewatch",
    version,
    about = "Watch a SuperRare artist profile and announce new activity",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Poll the artist profile in the foreground until ctrl-c.
    Run(RunArgs),

    /// Run a single update cycle.
    Once(OnceArgs),

    /// Print the stored snapshot.
    Show(ShowArgs),

    /// Show what a snapshot file would announce against the stored one.
    Diff(DiffArgs),

    /// Validate configuration from the environment.
    Check(CheckArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Once(args) => args.run(),
        Commands::Show(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Check(args) => args.run(),
    }
}
