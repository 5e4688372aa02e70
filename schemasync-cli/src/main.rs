//! schemasync: keep a downloaded GraphQL schema in sync via pull requests.
//!
//! # Usage
//!
//! ```text
//! schemasync sync [--dry-run] [--json] [--config <file>] [options]
//! schemasync branch-name [--at <RFC3339>]
//! schemasync config [--config <file>] [options]
//! ```
//!
//! Every option can also be given as `INPUT_<NAME>` in the environment, which
//! is how GitHub Actions passes `with:` inputs.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{branch_name::BranchNameArgs, config::ConfigArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "schemasync",
    version,
    about = "Open or update a pull request whenever a GraphQL schema changes",
    long_about = None,
)]
struct Cli {
    /// Log state transitions and every git command.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch the schema and reconcile it with the repository.
    Sync(SyncArgs),

    /// Print the sync branch name derived from the clock.
    BranchName(BranchNameArgs),

    /// Print the resolved configuration as JSON, secrets redacted.
    Config(ConfigArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::BranchName(args) => args.run(),
        Commands::Config(args) => args.run(),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
