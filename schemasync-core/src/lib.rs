//! schemasync core library: domain types, configuration, errors.
//!
//! - [`types`]: newtypes, remote state and the reconciliation outcome
//! - [`config`]: layered options resolved into a [`SyncConfig`]
//! - [`clock`]: injectable time source for branch naming
//! - [`error`]: [`ConfigError`]

pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigInput, FetchRequest, FetchSource, SyncConfig};
pub use error::ConfigError;
pub use types::{
    BranchName, CommitIdentity, ProposalRequest, ProposalState, ReconciliationOutcome,
    RepoSlug, RepositoryDetails,
};
