//! Reconciliation engine.
//!
//! One linear pass per invocation:
//!
//! ```text
//! Start -> Fetched -> NoChange
//!                  -> Classifying -> CreatingNew      -> Done
//!                                 -> UpdatingExisting -> Done | NoChange
//! ```
//!
//! The create/update decision depends only on whether the hosting service
//! reports an open pull request for the sync branch. Local branches are never
//! consulted.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use schemasync_core::{BranchName, ProposalRequest, ReconciliationOutcome, SyncConfig};
use schemasync_fetch::Fetcher;
use schemasync_git::{VersionControl, WorkingCopy};
use schemasync_remote::{ProposalLocator, ProposalPublisher};

use crate::artifact::ArtifactStore;
use crate::error::ReconcileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Fetched,
    Classifying,
    CreatingNew,
    UpdatingExisting,
    NoChange,
    Done,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Start => "start",
            State::Fetched => "fetched",
            State::Classifying => "classifying",
            State::CreatingNew => "creating-new",
            State::UpdatingExisting => "updating-existing",
            State::NoChange => "no-change",
            State::Done => "done",
        };
        f.write_str(name)
    }
}

/// What a run would do, computed without touching branches or the remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "plan", rename_all = "snake_case")]
pub enum Plan {
    NoChange,
    CreateNew { base: String, head: BranchName },
    UpdateExisting { branch: BranchName },
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plan::NoChange => write!(f, "schema did not change"),
            Plan::CreateNew { base, head } => {
                write!(f, "would push {head} and open a pull request against {base}")
            }
            Plan::UpdateExisting { branch } => {
                write!(f, "would commit onto open pull request branch {branch}")
            }
        }
    }
}

/// Drives one reconciliation over injected collaborators.
pub struct Reconciler<'a> {
    config: &'a SyncConfig,
    store: ArtifactStore,
    vcs: &'a dyn VersionControl,
    fetcher: &'a dyn Fetcher,
    locator: &'a dyn ProposalLocator,
    publisher: &'a dyn ProposalPublisher,
}

impl<'a> Reconciler<'a> {
    /// `workdir` is the working copy root the `vcs` operates on.
    pub fn new(
        config: &'a SyncConfig,
        workdir: &Path,
        vcs: &'a dyn VersionControl,
        fetcher: &'a dyn Fetcher,
        locator: &'a dyn ProposalLocator,
        publisher: &'a dyn ProposalPublisher,
    ) -> Self {
        Self {
            config,
            store: ArtifactStore::new(workdir, &config.schema_path),
            vcs,
            fetcher,
            locator,
            publisher,
        }
    }

    pub fn artifact(&self) -> &ArtifactStore {
        &self.store
    }

    /// Fetch, classify and converge. Every error aborts the run.
    pub fn reconcile(&self) -> Result<ReconciliationOutcome, ReconcileError> {
        let working_copy = WorkingCopy::new(self.vcs);
        let branch = &self.config.branch;

        if !self.fetch_changed()? {
            transition(State::Fetched, State::NoChange);
            return Ok(ReconciliationOutcome::NoChange);
        }

        transition(State::Fetched, State::Classifying);
        let details = self.locator.lookup(&self.config.repository, branch)?;

        if !details.has_open_proposal {
            transition(State::Classifying, State::CreatingNew);
            working_copy.create_branch(branch)?;
            working_copy.commit_all(
                &self.config.identity,
                &self.config.commit_message,
                self.store.relative(),
            )?;
            working_copy.push_branch(&self.config.remote, branch, true)?;

            let proposal = ProposalRequest {
                repository_id: details.id,
                base: self
                    .config
                    .base_branch
                    .clone()
                    .unwrap_or(details.default_branch),
                head: branch.clone(),
                title: self.config.pr_title.clone(),
                body: self.config.pr_body.clone(),
            };
            tracing::info!("opening pull request {} -> {}", proposal.head, proposal.base);
            self.publisher.create(&proposal)?;

            transition(State::CreatingNew, State::Done);
            return Ok(ReconciliationOutcome::Created { proposal });
        }

        transition(State::Classifying, State::UpdatingExisting);
        tracing::info!("pull request for {branch} is already open");
        let preserved = self.store.preserve()?;
        working_copy.switch_to_existing_branch(&self.config.remote, branch, || {
            self.store.restore(&preserved)
        })?;
        drop(preserved);

        if !self.store.has_changes(self.vcs)? {
            tracing::info!("{branch} already carries this schema");
            transition(State::UpdatingExisting, State::NoChange);
            return Ok(ReconciliationOutcome::NoChange);
        }

        working_copy.commit_all(
            &self.config.identity,
            &self.config.commit_message,
            self.store.relative(),
        )?;
        working_copy.push_branch(&self.config.remote, branch, false)?;

        transition(State::UpdatingExisting, State::Done);
        Ok(ReconciliationOutcome::Updated {
            branch: branch.clone(),
        })
    }

    /// Fetch and classify only. The artifact is rewritten; nothing else is.
    pub fn plan(&self) -> Result<Plan, ReconcileError> {
        let branch = &self.config.branch;
        if !self.fetch_changed()? {
            transition(State::Fetched, State::NoChange);
            return Ok(Plan::NoChange);
        }

        transition(State::Fetched, State::Classifying);
        let details = self.locator.lookup(&self.config.repository, branch)?;
        let plan = if details.has_open_proposal {
            Plan::UpdateExisting {
                branch: branch.clone(),
            }
        } else {
            Plan::CreateNew {
                base: self
                    .config
                    .base_branch
                    .clone()
                    .unwrap_or(details.default_branch),
                head: branch.clone(),
            }
        };
        Ok(plan)
    }

    fn fetch_changed(&self) -> Result<bool, ReconcileError> {
        self.store.fetch(self.fetcher, &self.config.fetch)?;
        transition(State::Start, State::Fetched);
        if !self.store.has_changes(self.vcs)? {
            tracing::info!("{} is unchanged", self.store.relative().display());
            return Ok(false);
        }
        tracing::info!(
            "{} changed (sha256 {})",
            self.store.relative().display(),
            self.store.digest()?
        );
        Ok(true)
    }
}

fn transition(from: State, to: State) {
    tracing::debug!("state: {from} -> {to}");
}
