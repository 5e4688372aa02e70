//! Capabilities the engine needs from the hosting service.

use schemasync_core::{BranchName, ProposalRequest, RepoSlug, RepositoryDetails};

use crate::error::RemoteError;

/// Read side: repository identity and open pull requests for a head branch.
pub trait ProposalLocator {
    /// One read query. Closed and merged pull requests never count as open.
    fn lookup(
        &self,
        repository: &RepoSlug,
        branch: &BranchName,
    ) -> Result<RepositoryDetails, RemoteError>;
}

/// Write side: open a pull request.
///
/// Not idempotent; callers only invoke it after [`ProposalLocator::lookup`]
/// reported no open pull request for the head branch.
pub trait ProposalPublisher {
    fn create(&self, request: &ProposalRequest) -> Result<(), RemoteError>;
}
