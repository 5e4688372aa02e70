//! `schemasync sync`: fetch the schema and open or update the pull request.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use schemasync_core::ReconciliationOutcome;
use schemasync_engine::{Plan, Reconciler};
use schemasync_fetch::HttpFetcher;
use schemasync_git::GitCli;
use schemasync_remote::{GitHubClient, DEFAULT_GRAPHQL_URL};

use super::options::OptionsArgs;

/// Arguments for `schemasync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub options: OptionsArgs,

    /// Working copy to operate on.
    #[arg(long, env = "GITHUB_WORKSPACE", default_value = ".")]
    pub workdir: PathBuf,

    /// GitHub GraphQL API URL.
    #[arg(long, env = "GITHUB_GRAPHQL_URL", default_value = DEFAULT_GRAPHQL_URL)]
    pub github_graphql_url: String,

    /// Fetch and classify, then report what would happen without touching
    /// branches or pull requests.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit the outcome as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let config = self.options.resolve()?;
        tracing::debug!(
            "syncing {} into {} on {}",
            config.schema_path.display(),
            config.repository,
            config.branch
        );

        let vcs = GitCli::new(&self.workdir).with_identity(&config.identity);
        let fetcher = HttpFetcher::new();
        let github = GitHubClient::new(config.token.clone()).with_endpoint(self.github_graphql_url);
        let reconciler =
            Reconciler::new(&config, &self.workdir, &vcs, &fetcher, &github, &github);

        if self.dry_run {
            let plan = reconciler.plan().context("dry run failed")?;
            if self.json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print_plan(&plan);
            }
            return Ok(());
        }

        let outcome = reconciler.reconcile().context("schema sync failed")?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else {
            print_outcome(&outcome);
        }
        Ok(())
    }
}

fn print_outcome(outcome: &ReconciliationOutcome) {
    let mark = match outcome {
        ReconciliationOutcome::NoChange => "·".dimmed(),
        ReconciliationOutcome::Created { .. } => "✓".green().bold(),
        ReconciliationOutcome::Updated { .. } => "✎".yellow().bold(),
    };
    println!("{mark} {outcome}");
}

fn print_plan(plan: &Plan) {
    println!("[dry-run] {plan}");
}
