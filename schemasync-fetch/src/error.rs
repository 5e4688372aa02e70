//! Error types for schemasync-fetch.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while downloading a schema.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No HTTP response was received.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// Non-2xx response; `body` is verbatim.
    #[error("request to {url} returned HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },

    /// 2xx response carrying GraphQL errors.
    #[error("{url} returned errors: {}", .messages.join("; "))]
    GraphQl { url: String, messages: Vec<String> },

    /// 2xx response that did not decode into the expected shape.
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    /// The registry has no published schema for the graph variant.
    #[error("no schema published for graph '{graph}' variant '{variant}'")]
    MissingSchema { graph: String, variant: String },

    /// No graph id was given and none could be derived from the key.
    #[error("cannot determine graph id; set 'graph' or use a key of the form service:<graph>:<secret>")]
    MissingGraph,

    /// The registry document could not be converted for a `.json` artifact.
    #[error("schema from {url} is not valid SDL: {message}")]
    InvalidSdl { url: String, message: String },

    /// TLS client configuration could not be built.
    #[error("TLS configuration error: {0}")]
    Tls(#[from] rustls::Error),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`FetchError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> FetchError {
    FetchError::Io {
        path: path.into(),
        source,
    }
}
