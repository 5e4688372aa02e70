//! Artifact store: the schema file inside the working copy.
//!
//! Change detection is delegated to version control, so anything `git`
//! reports (line endings included) counts as a change. The SHA-256 digest is
//! only used for log lines.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::TempDir;

use schemasync_core::FetchRequest;
use schemasync_fetch::{FetchError, Fetcher};
use schemasync_git::{GitError, VersionControl, WorkingCopy};

use crate::error::{io_err, ReconcileError};

/// The artifact at `<root>/<relative>`.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    relative: PathBuf,
}

/// A copy of the artifact held outside the working copy.
///
/// Dropping it removes the holding directory.
#[derive(Debug)]
pub struct Preserved {
    _dir: TempDir,
    copy: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            relative: relative.into(),
        }
    }

    /// Absolute location of the artifact.
    pub fn path(&self) -> PathBuf {
        self.root.join(&self.relative)
    }

    /// Location relative to the working copy root, as passed to `git add`.
    pub fn relative(&self) -> &Path {
        &self.relative
    }

    /// Overwrite the artifact with a fresh download.
    pub fn fetch(&self, fetcher: &dyn Fetcher, request: &FetchRequest) -> Result<(), FetchError> {
        fetcher.download(request, &self.path())
    }

    /// True when version control sees any uncommitted change.
    pub fn has_changes<V: VersionControl + ?Sized>(&self, vcs: &V) -> Result<bool, GitError> {
        WorkingCopy::new(vcs).has_changes()
    }

    pub fn read(&self) -> Result<Vec<u8>, ReconcileError> {
        let path = self.path();
        std::fs::read(&path).map_err(|e| io_err(&path, e))
    }

    /// Hex SHA-256 of the current content.
    pub fn digest(&self) -> Result<String, ReconcileError> {
        let mut hasher = Sha256::new();
        hasher.update(self.read()?);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Copy the current content into a fresh temporary directory.
    ///
    /// The holding area lives outside the working copy so `git clean` and
    /// branch switches cannot touch it.
    pub fn preserve(&self) -> Result<Preserved, ReconcileError> {
        let dir = tempfile::Builder::new()
            .prefix("schemasync-")
            .tempdir()
            .map_err(|e| io_err(std::env::temp_dir(), e))?;
        let name = self
            .relative
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("artifact"));
        let copy = dir.path().join(name);
        let source = self.path();
        std::fs::copy(&source, &copy).map_err(|e| io_err(&source, e))?;
        tracing::debug!("preserved {} in {}", source.display(), copy.display());
        Ok(Preserved { _dir: dir, copy })
    }

    /// Write preserved content back over the artifact, creating parents.
    pub fn restore(&self, preserved: &Preserved) -> Result<(), ReconcileError> {
        let target = self.path();
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        std::fs::copy(&preserved.copy, &target).map_err(|e| io_err(&target, e))?;
        tracing::debug!("restored {}", target.display());
        Ok(())
    }
}
