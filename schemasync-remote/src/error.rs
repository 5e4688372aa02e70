//! Error types for schemasync-remote.

use thiserror::Error;

/// All errors that can arise from talking to the hosting service.
///
/// `status` is `None` when no HTTP response was received (DNS, TLS, connection
/// reset). `body` is the response body verbatim, or the transport error text.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The repository/pull-request lookup failed or returned an unexpected shape.
    #[error("remote query failed ({}): {body}", display_status(.status))]
    QueryFailed { status: Option<u16>, body: String },

    /// The create-pull-request mutation failed or returned an unexpected shape.
    #[error("remote mutation failed ({}): {body}", display_status(.status))]
    MutationFailed { status: Option<u16>, body: String },
}

fn display_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {code}"),
        None => "no response".to_owned(),
    }
}

/// A failed GraphQL exchange before it is attributed to a query or mutation.
#[derive(Debug)]
pub(crate) struct Failure {
    pub status: Option<u16>,
    pub body: String,
}

impl Failure {
    pub(crate) fn into_query(self) -> RemoteError {
        RemoteError::QueryFailed {
            status: self.status,
            body: self.body,
        }
    }

    pub(crate) fn into_mutation(self) -> RemoteError {
        RemoteError::MutationFailed {
            status: self.status,
            body: self.body,
        }
    }
}
