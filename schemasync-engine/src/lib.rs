//! # schemasync-engine
//!
//! Reconciliation of a freshly fetched schema against the working copy and
//! the hosting service.
//!
//! Build a [`Reconciler`] over the collaborators and call
//! [`Reconciler::reconcile`]; [`Reconciler::plan`] classifies without
//! mutating branches or opening pull requests.

pub mod artifact;
pub mod engine;
pub mod error;

pub use artifact::{ArtifactStore, Preserved};
pub use engine::{Plan, Reconciler};
pub use error::ReconcileError;
