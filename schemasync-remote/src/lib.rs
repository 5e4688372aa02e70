//! # schemasync-remote
//!
//! Remote proposal locator and publisher.
//!
//! [`ProposalLocator`] and [`ProposalPublisher`] are the seams the engine
//! depends on; [`GitHubClient`] implements both against the GitHub GraphQL
//! API using typed request and response models.

pub mod error;
pub mod github;
pub mod hosting;
mod model;

pub use error::RemoteError;
pub use github::{GitHubClient, DEFAULT_GRAPHQL_URL};
pub use hosting::{ProposalLocator, ProposalPublisher};
