//! Domain types shared by every schemasync crate.
//!
//! Newtypes wrap plain strings so branch names, repository slugs and commit
//! identities cannot be swapped by accident at call sites.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Name of the branch that carries the artifact update.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchName(pub String);

impl BranchName {
    /// Prefix used for timestamp-derived branch names.
    pub const PREFIX: &'static str = "update-schema";

    /// `update-schema-MM-DD_hh-mm` for the given instant.
    ///
    /// Minute resolution: two calls within the same UTC minute yield the same
    /// name, calls in different minutes yield different names.
    pub fn from_timestamp(at: DateTime<Utc>) -> Self {
        Self(format!("{}-{}", Self::PREFIX, at.format("%m-%d_%H-%M")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for BranchName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BranchName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// `owner/name` identifying a repository on the hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl RepoSlug {
    /// Parse `owner/name`. Anything else is reported against `key`.
    pub fn parse(key: &'static str, input: &str) -> Result<Self, ConfigError> {
        match input.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_owned(),
                    name: name.to_owned(),
                })
            }
            _ => Err(ConfigError::Invalid {
                key,
                reason: format!("expected `owner/name`, got '{input}'"),
            }),
        }
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Identity recorded on automated commits.
///
/// `user_name`/`user_email` become the committer, `author` is passed verbatim
/// to `--author` (usually `Name <email>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitIdentity {
    pub user_name: String,
    pub user_email: String,
    pub author: String,
}

// ---------------------------------------------------------------------------
// Remote state
// ---------------------------------------------------------------------------

/// Lifecycle state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProposalState {
    Open,
    Closed,
    Merged,
}

/// What the hosting service reports about the repository and the sync branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryDetails {
    /// Opaque node id used by the create mutation.
    pub id: String,
    pub default_branch: String,
    /// True iff at least one proposal with the sync branch as head is open.
    pub has_open_proposal: bool,
}

/// Everything needed to open a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalRequest {
    pub repository_id: String,
    pub base: String,
    pub head: BranchName,
    pub title: String,
    pub body: String,
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Terminal result of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconciliationOutcome {
    /// The artifact matched what version control already has.
    NoChange,
    /// A new branch was pushed and a pull request opened.
    Created { proposal: ProposalRequest },
    /// The branch of an already open pull request received a new commit.
    Updated { branch: BranchName },
}

impl fmt::Display for ReconciliationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconciliationOutcome::NoChange => write!(f, "schema did not change"),
            ReconciliationOutcome::Created { proposal } => write!(
                f,
                "opened pull request {} -> {}",
                proposal.head, proposal.base
            ),
            ReconciliationOutcome::Updated { branch } => {
                write!(f, "updated open pull request branch {branch}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn branch_name_uses_minute_resolution() {
        let a = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 59).unwrap();
        let c = Utc.with_ymd_and_hms(2024, 3, 7, 9, 6, 0).unwrap();

        assert_eq!(BranchName::from_timestamp(a).as_str(), "update-schema-03-07_09-05");
        assert_eq!(BranchName::from_timestamp(a), BranchName::from_timestamp(b));
        assert_ne!(BranchName::from_timestamp(b), BranchName::from_timestamp(c));
    }

    #[test]
    fn repo_slug_parses_owner_and_name() {
        let slug = RepoSlug::parse("repository", "acme/api").unwrap();
        assert_eq!(slug.owner, "acme");
        assert_eq!(slug.name, "api");
        assert_eq!(slug.to_string(), "acme/api");
    }

    #[test]
    fn repo_slug_rejects_missing_parts() {
        for bad in ["acme", "/api", "acme/", "a/b/c", ""] {
            let err = RepoSlug::parse("repository", bad).unwrap_err();
            assert!(err.to_string().contains("repository"), "{bad}: {err}");
        }
    }

    #[test]
    fn proposal_state_matches_graphql_casing() {
        let state: ProposalState = serde_json::from_str("\"MERGED\"").unwrap();
        assert_eq!(state, ProposalState::Merged);
    }

    #[test]
    fn outcome_json_is_tagged() {
        let json = serde_json::to_value(ReconciliationOutcome::Updated {
            branch: BranchName::from("update-schema-01-01_00-00"),
        })
        .unwrap();
        assert_eq!(json["outcome"], "updated");
        assert_eq!(json["branch"], "update-schema-01-01_00-00");
    }
}
