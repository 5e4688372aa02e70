//! # schemasync-fetch
//!
//! Schema fetcher collaborator.
//!
//! [`Fetcher`] is what the engine calls; [`HttpFetcher`] implements it by
//! introspecting a GraphQL endpoint or by downloading the active schema of a
//! registry graph variant. Either source is written as SDL, or as an
//! introspection result for `.json` paths.

use std::path::Path;

use schemasync_core::FetchRequest;

pub mod error;
pub mod http;
pub mod introspection;
pub mod output;
pub mod sdl;
mod tls;

pub use error::FetchError;
pub use http::HttpFetcher;
pub use output::write_atomic;
pub use sdl::introspect_sdl;

/// Downloads a schema and overwrites `output` with it.
pub trait Fetcher {
    fn download(&self, request: &FetchRequest, output: &Path) -> Result<(), FetchError>;
}
