//! The narrow version-control capability the engine depends on.

use std::path::Path;

use schemasync_core::{BranchName, CommitIdentity};

use crate::error::GitError;

/// Process-level version-control primitives.
///
/// Each method maps to one command; any failure is returned as-is and the
/// caller treats it as fatal. Implemented by [`crate::GitCli`] for real
/// checkouts and by in-memory fakes in tests.
pub trait VersionControl {
    /// Machine-readable status. Empty means the working tree is clean.
    fn status(&self) -> Result<String, GitError>;

    /// `checkout -b <name>` from the current HEAD.
    fn checkout_new_branch(&self, name: &BranchName) -> Result<(), GitError>;

    /// `checkout <name>`.
    fn checkout(&self, name: &BranchName) -> Result<(), GitError>;

    /// `add <path>`.
    fn add(&self, path: &Path) -> Result<(), GitError>;

    /// `commit -a -m <message> --author <author>` as the identity's committer.
    fn commit(&self, identity: &CommitIdentity, message: &str) -> Result<(), GitError>;

    /// `push <remote> <branch> [--force]`.
    fn push(&self, remote: &str, branch: &BranchName, force: bool) -> Result<(), GitError>;

    /// `fetch <remote> --depth 1 <branch>`.
    fn fetch_shallow(&self, remote: &str, branch: &BranchName) -> Result<(), GitError>;

    /// `stash`.
    fn stash(&self) -> Result<(), GitError>;

    /// `clean -fd`.
    fn clean(&self) -> Result<(), GitError>;
}
