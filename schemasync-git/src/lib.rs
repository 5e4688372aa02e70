//! # schemasync-git
//!
//! Version-control capability and the working-copy controller built on it.
//!
//! [`VersionControl`] is the seam: [`GitCli`] shells out to `git`, tests
//! substitute fakes. [`WorkingCopy`] sequences the primitives into the
//! branch/commit/push/switch operations used during reconciliation.

pub mod cli;
pub mod controller;
pub mod error;
pub mod vcs;

pub use cli::GitCli;
pub use controller::WorkingCopy;
pub use error::GitError;
pub use vcs::VersionControl;
