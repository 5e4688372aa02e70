//! Working-copy controller.
//!
//! Sequences [`VersionControl`] primitives into the operations the
//! reconciliation engine needs. Every failure aborts; there is no retry.

use std::path::Path;

use schemasync_core::{BranchName, CommitIdentity};

use crate::error::GitError;
use crate::vcs::VersionControl;

/// Thin state machine over one checked-out repository.
pub struct WorkingCopy<'a, V: VersionControl + ?Sized> {
    vcs: &'a V,
}

impl<'a, V: VersionControl + ?Sized> WorkingCopy<'a, V> {
    pub fn new(vcs: &'a V) -> Self {
        Self { vcs }
    }

    /// True when version control reports any modification, staged or not,
    /// including untracked files.
    pub fn has_changes(&self) -> Result<bool, GitError> {
        let status = self.vcs.status()?;
        Ok(!status.trim().is_empty())
    }

    /// Create `name` from HEAD and switch to it. Fails if it exists locally.
    pub fn create_branch(&self, name: &BranchName) -> Result<(), GitError> {
        tracing::info!("creating branch {name}");
        self.vcs.checkout_new_branch(name)
    }

    /// Stage `artifact` (it may be untracked) and commit everything.
    pub fn commit_all(
        &self,
        identity: &CommitIdentity,
        message: &str,
        artifact: &Path,
    ) -> Result<(), GitError> {
        tracing::info!("committing {} as {}", artifact.display(), identity.author);
        self.vcs.add(artifact)?;
        self.vcs.commit(identity, message)
    }

    /// Push `name` to `remote`.
    ///
    /// The first push of a sync branch must be forced: a branch of the same
    /// name may survive on the remote from an abandoned earlier run.
    pub fn push_branch(&self, remote: &str, name: &BranchName, force: bool) -> Result<(), GitError> {
        if force {
            tracing::info!("force-pushing {name} to {remote}");
        } else {
            tracing::info!("pushing {name} to {remote}");
        }
        self.vcs.push(remote, name, force)
    }

    /// Move onto the remote's copy of `name`, carrying the artifact along.
    ///
    /// Order: stash local edits, remove untracked files that would block the
    /// checkout, shallow-fetch the branch, check it out, then call `restore`
    /// to write the preserved artifact back. The stash belongs to the previous
    /// branch and is never popped here.
    pub fn switch_to_existing_branch<E, F>(
        &self,
        remote: &str,
        name: &BranchName,
        restore: F,
    ) -> Result<(), E>
    where
        E: From<GitError>,
        F: FnOnce() -> Result<(), E>,
    {
        tracing::info!("switching to existing branch {name} from {remote}");
        self.vcs.stash()?;
        self.vcs.clean()?;
        self.vcs.fetch_shallow(remote, name)?;
        self.vcs.checkout(name)?;
        restore()
    }
}
