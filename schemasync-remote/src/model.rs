//! Typed request/response model for the two GraphQL operations.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use schemasync_core::ProposalState;

use crate::error::Failure;

pub(crate) const REPOSITORY_DETAILS_QUERY: &str = r#"
query RepositoryDetails($owner: String!, $name: String!, $head: String!) {
  repository(owner: $owner, name: $name) {
    id
    defaultBranchRef {
      name
    }
    pullRequests(first: 100, headRefName: $head) {
      nodes {
        state
      }
    }
  }
}
"#;

pub(crate) const CREATE_PULL_REQUEST_MUTATION: &str = r#"
mutation CreatePullRequest($input: CreatePullRequestInput!) {
  createPullRequest(input: $input) {
    clientMutationId
  }
}
"#;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct GraphQlRequest<'a, V: Serialize> {
    pub query: &'a str,
    pub variables: V,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// Decode a 2xx body. GraphQL `errors`, missing `data`, or any shape mismatch
/// is a failure carrying the original body.
pub(crate) fn decode<T: DeserializeOwned>(status: u16, body: String) -> Result<T, Failure> {
    let parsed: GraphQlResponse<T> = match serde_json::from_str(&body) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!("unexpected response shape: {e}");
            return Err(Failure {
                status: Some(status),
                body,
            });
        }
    };
    if !parsed.errors.is_empty() {
        let messages: Vec<&str> = parsed.errors.iter().map(|e| e.message.as_str()).collect();
        tracing::debug!("graphql errors: {}", messages.join("; "));
        return Err(Failure {
            status: Some(status),
            body,
        });
    }
    parsed.data.ok_or(Failure {
        status: Some(status),
        body,
    })
}

// ---------------------------------------------------------------------------
// Repository lookup
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct RepositoryDetailsVariables<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub head: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepositoryDetailsData {
    pub repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RepositoryNode {
    pub id: String,
    /// `null` for an empty repository.
    pub default_branch_ref: Option<BranchRef>,
    pub pull_requests: PullRequestConnection,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BranchRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PullRequestConnection {
    pub nodes: Vec<PullRequestNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PullRequestNode {
    pub state: ProposalState,
}

impl PullRequestConnection {
    pub fn any_open(&self) -> bool {
        self.nodes.iter().any(|pr| pr.state == ProposalState::Open)
    }
}

// ---------------------------------------------------------------------------
// Pull request creation
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct CreatePullRequestVariables<'a> {
    pub input: CreatePullRequestInput<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatePullRequestInput<'a> {
    pub repository_id: &'a str,
    pub base_ref_name: &'a str,
    pub head_ref_name: &'a str,
    pub title: &'a str,
    pub body: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatePullRequestData {
    /// `null` when GitHub rejected the input without a top-level error.
    pub create_pull_request: Option<CreatePullRequestPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatePullRequestPayload {
    #[allow(dead_code)]
    pub client_mutation_id: Option<String>,
}
