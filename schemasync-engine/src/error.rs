//! Error types for schemasync-engine.

use std::path::PathBuf;

use thiserror::Error;

use schemasync_fetch::FetchError;
use schemasync_git::GitError;
use schemasync_remote::RemoteError;

/// All errors that can abort a reconciliation. None are retried.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The schema could not be downloaded.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// A version-control command exited non-zero.
    #[error(transparent)]
    Git(#[from] GitError),

    /// The hosting service rejected a query or mutation.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`ReconcileError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ReconcileError {
    ReconcileError::Io {
        path: path.into(),
        source,
    }
}
