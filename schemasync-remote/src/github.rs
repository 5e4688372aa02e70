//! GitHub GraphQL client implementing the locator and publisher.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use schemasync_core::{BranchName, ProposalRequest, RepoSlug, RepositoryDetails};

use crate::error::{Failure, RemoteError};
use crate::hosting::{ProposalLocator, ProposalPublisher};
use crate::model::{
    decode, CreatePullRequestData, CreatePullRequestInput, CreatePullRequestVariables,
    GraphQlRequest, RepositoryDetailsData, RepositoryDetailsVariables,
    CREATE_PULL_REQUEST_MUTATION, REPOSITORY_DETAILS_QUERY,
};

pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";

const USER_AGENT: &str = concat!("schemasync/", env!("CARGO_PKG_VERSION"));

/// Blocking GitHub GraphQL client.
pub struct GitHubClient {
    agent: ureq::Agent,
    endpoint: String,
    token: String,
}

impl GitHubClient {
    pub fn new(token: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            agent,
            endpoint: DEFAULT_GRAPHQL_URL.to_owned(),
            token: token.into(),
        }
    }

    /// Point at a different GraphQL endpoint (GitHub Enterprise, test stub).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn execute<V, T>(&self, query: &str, variables: V) -> Result<T, Failure>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let request = GraphQlRequest { query, variables };
        let response = self
            .agent
            .post(&self.endpoint)
            .set("Authorization", &format!("bearer {}", self.token))
            .set("User-Agent", USER_AGENT)
            .set("Accept", "application/json")
            .send_json(&request);

        match response {
            Ok(resp) => {
                let status = resp.status();
                let body = resp.into_string().map_err(|e| Failure {
                    status: Some(status),
                    body: format!("failed to read response body: {e}"),
                })?;
                decode(status, body)
            }
            Err(ureq::Error::Status(status, resp)) => {
                let body = resp
                    .into_string()
                    .unwrap_or_else(|e| format!("failed to read response body: {e}"));
                Err(Failure {
                    status: Some(status),
                    body,
                })
            }
            Err(ureq::Error::Transport(transport)) => Err(Failure {
                status: None,
                body: transport.to_string(),
            }),
        }
    }
}

impl ProposalLocator for GitHubClient {
    fn lookup(
        &self,
        repository: &RepoSlug,
        branch: &BranchName,
    ) -> Result<RepositoryDetails, RemoteError> {
        tracing::info!("looking up pull requests for {repository} head {branch}");
        let data: RepositoryDetailsData = self
            .execute(
                REPOSITORY_DETAILS_QUERY,
                RepositoryDetailsVariables {
                    owner: &repository.owner,
                    name: &repository.name,
                    head: branch.as_str(),
                },
            )
            .map_err(Failure::into_query)?;

        let missing = |what: &str| RemoteError::QueryFailed {
            status: Some(200),
            body: format!("{what} missing for {repository}"),
        };
        let repo = data.repository.ok_or_else(|| missing("repository"))?;
        let default_branch = repo
            .default_branch_ref
            .ok_or_else(|| missing("defaultBranchRef"))?
            .name;

        let details = RepositoryDetails {
            id: repo.id,
            default_branch,
            has_open_proposal: repo.pull_requests.any_open(),
        };
        tracing::debug!(?details, "repository details");
        Ok(details)
    }
}

impl ProposalPublisher for GitHubClient {
    fn create(&self, request: &ProposalRequest) -> Result<(), RemoteError> {
        let data: CreatePullRequestData = self
            .execute(
                CREATE_PULL_REQUEST_MUTATION,
                CreatePullRequestVariables {
                    input: CreatePullRequestInput {
                        repository_id: &request.repository_id,
                        base_ref_name: &request.base,
                        head_ref_name: request.head.as_str(),
                        title: &request.title,
                        body: &request.body,
                    },
                },
            )
            .map_err(Failure::into_mutation)?;

        match data.create_pull_request {
            Some(_) => Ok(()),
            None => Err(RemoteError::MutationFailed {
                status: Some(200),
                body: "createPullRequest returned null".to_owned(),
            }),
        }
    }
}
