//! Configuration options shared by `sync` and `config`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Args};

use schemasync_core::{ConfigInput, SyncConfig, SystemClock};

/// Every option is also read from `INPUT_<NAME>`.
#[derive(Args, Debug)]
pub struct OptionsArgs {
    /// YAML file supplying any option below; flags and environment win.
    #[arg(long, env = "INPUT_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// GraphQL endpoint to introspect.
    #[arg(long, env = "INPUT_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Registry graph id (defaults to the one encoded in --key).
    #[arg(long, env = "INPUT_GRAPH")]
    pub graph: Option<String>,

    /// Registry API key.
    #[arg(long, env = "INPUT_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// Registry graph variant [default: current].
    #[arg(long, env = "INPUT_GRAPH_VARIANT")]
    pub graph_variant: Option<String>,

    /// Registry GraphQL URL; falls back to INPUT_REGISTRYURL.
    #[arg(long, env = "INPUT_REGISTRY_URL")]
    pub registry_url: Option<String>,

    /// Schema path inside the repository; `.json` writes introspection JSON.
    #[arg(long, env = "INPUT_SCHEMA", value_name = "PATH")]
    pub schema: Option<PathBuf>,

    /// Extra request headers as a JSON object.
    #[arg(long, env = "INPUT_HEADERS", value_name = "JSON")]
    pub headers: Option<String>,

    /// Skip TLS certificate verification when fetching.
    #[arg(long, env = "INPUT_INSECURE", action = ArgAction::SetTrue, value_parser = FalseyValueParser::new())]
    pub insecure: bool,

    /// Sync branch [default: update-schema-MM-DD_hh-mm].
    #[arg(long, env = "INPUT_BRANCH")]
    pub branch: Option<String>,

    /// Pull request base [default: the repository default branch].
    #[arg(long, env = "INPUT_BASE_BRANCH")]
    pub base_branch: Option<String>,

    #[arg(long, env = "INPUT_COMMIT_USER_NAME")]
    pub commit_user_name: Option<String>,

    #[arg(long, env = "INPUT_COMMIT_USER_EMAIL")]
    pub commit_user_email: Option<String>,

    /// Commit author, `Name <email>`.
    #[arg(long, env = "INPUT_COMMIT_AUTHOR")]
    pub commit_author: Option<String>,

    #[arg(long, env = "INPUT_COMMIT_MESSAGE")]
    pub commit_message: Option<String>,

    #[arg(long, env = "INPUT_PR_TITLE")]
    pub pr_title: Option<String>,

    #[arg(long, env = "INPUT_PR_BODY")]
    pub pr_body: Option<String>,

    /// Git remote to push to.
    #[arg(long, env = "INPUT_REMOTE")]
    pub remote: Option<String>,

    /// `owner/name`; falls back to GITHUB_REPOSITORY.
    #[arg(long, env = "INPUT_REPOSITORY")]
    pub repository: Option<String>,

    /// GitHub token for the GraphQL API.
    #[arg(long, env = "INPUT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

impl OptionsArgs {
    /// Merge flags, environment and the optional file into a [`SyncConfig`].
    pub fn resolve(self) -> Result<SyncConfig> {
        let file = match self.config.as_deref() {
            Some(path) => ConfigInput::load_file(path)
                .with_context(|| format!("failed to load config file {}", path.display()))?,
            None => ConfigInput::default(),
        };
        let ambient = ConfigInput {
            repository: std::env::var("GITHUB_REPOSITORY").ok(),
            registry_url: std::env::var("INPUT_REGISTRYURL").ok(),
            ..ConfigInput::default()
        };
        let input = self.into_input().merge(file).merge(ambient);
        SyncConfig::resolve(input, &SystemClock).context("invalid configuration")
    }

    fn into_input(self) -> ConfigInput {
        ConfigInput {
            endpoint: self.endpoint,
            graph: self.graph,
            key: self.key,
            graph_variant: self.graph_variant,
            registry_url: self.registry_url,
            schema: self.schema,
            headers: self.headers,
            insecure: self.insecure.then_some(true),
            branch: self.branch,
            base_branch: self.base_branch,
            commit_user_name: self.commit_user_name,
            commit_user_email: self.commit_user_email,
            commit_author: self.commit_author,
            commit_message: self.commit_message,
            pr_title: self.pr_title,
            pr_body: self.pr_body,
            remote: self.remote,
            repository: self.repository,
            token: self.token,
        }
    }
}
