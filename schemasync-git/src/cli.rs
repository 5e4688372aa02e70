//! [`VersionControl`] backed by the `git` executable.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use schemasync_core::{BranchName, CommitIdentity};

use crate::error::GitError;
use crate::vcs::VersionControl;

/// Runs `git` inside a working copy.
///
/// `config` pairs are passed as `-c key=value` on every invocation, so
/// commands that write objects (`stash`, `commit`) work on runners without a
/// global identity.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: OsString,
    workdir: PathBuf,
    config: Vec<(String, String)>,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            program: OsString::from("git"),
            workdir: workdir.into(),
            config: Vec::new(),
        }
    }

    /// Use a different executable (e.g. an absolute path to git).
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// Add a `-c key=value` override to every invocation.
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.push((key.into(), value.into()));
        self
    }

    /// Apply `identity` as `user.name`/`user.email` for every invocation.
    pub fn with_identity(self, identity: &CommitIdentity) -> Self {
        self.with_config("user.name", identity.user_name.clone())
            .with_config("user.email", identity.user_email.clone())
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Run `git <args>` and return stdout. Non-zero exit is an error carrying
    /// stdout and stderr.
    pub fn run<I, S>(&self, args: I) -> Result<String, GitError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let command = self.describe(&args);
        tracing::debug!("running: {command}");

        let mut cmd = Command::new(&self.program);
        for (key, value) in &self.config {
            cmd.arg("-c").arg(format!("{key}={value}"));
        }
        let output = cmd
            .args(&args)
            .current_dir(&self.workdir)
            .output()
            .map_err(|source| GitError::Spawn {
                command: command.clone(),
                workdir: self.workdir.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::CommandFailed {
                command,
                exit_code: output.status.code(),
                output: format!("{stdout}{stderr}"),
            });
        }
        Ok(stdout)
    }

    // `-c` overrides are left out: they may carry identities, never secrets,
    // but keep the log line matching what an operator would type.
    fn describe(&self, args: &[OsString]) -> String {
        let mut parts = vec![self.program.to_string_lossy().into_owned()];
        parts.extend(args.iter().map(|a| a.to_string_lossy().into_owned()));
        parts.join(" ")
    }
}

impl VersionControl for GitCli {
    fn status(&self) -> Result<String, GitError> {
        self.run(["status", "--porcelain"])
    }

    fn checkout_new_branch(&self, name: &BranchName) -> Result<(), GitError> {
        self.run(["checkout", "-b", name.as_str()]).map(drop)
    }

    fn checkout(&self, name: &BranchName) -> Result<(), GitError> {
        self.run(["checkout", name.as_str()]).map(drop)
    }

    fn add(&self, path: &Path) -> Result<(), GitError> {
        self.run([OsString::from("add"), OsString::from("--"), path.as_os_str().to_owned()])
            .map(drop)
    }

    fn commit(&self, identity: &CommitIdentity, message: &str) -> Result<(), GitError> {
        let user_name = format!("user.name={}", identity.user_name);
        let user_email = format!("user.email={}", identity.user_email);
        self.run([
            "-c",
            user_name.as_str(),
            "-c",
            user_email.as_str(),
            "commit",
            "-a",
            "-m",
            message,
            "--author",
            identity.author.as_str(),
        ])
        .map(drop)
    }

    fn push(&self, remote: &str, branch: &BranchName, force: bool) -> Result<(), GitError> {
        let mut args = vec!["push", remote, branch.as_str()];
        if force {
            args.push("--force");
        }
        self.run(args).map(drop)
    }

    fn fetch_shallow(&self, remote: &str, branch: &BranchName) -> Result<(), GitError> {
        self.run(["fetch", remote, "--depth", "1", branch.as_str()])
            .map(drop)
    }

    fn stash(&self) -> Result<(), GitError> {
        self.run(["stash"]).map(drop)
    }

    fn clean(&self) -> Result<(), GitError> {
        self.run(["clean", "-fd"]).map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_omits_config_overrides() {
        let git = GitCli::new("/tmp").with_config("user.name", "bot");
        let args = vec![OsString::from("push"), OsString::from("origin")];
        assert_eq!(git.describe(&args), "git push origin");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let git = GitCli::new(dir.path()).with_program("schemasync-no-such-git");
        let err = git.run(["status"]).unwrap_err();
        assert!(matches!(err, GitError::Spawn { .. }), "got: {err}");
    }

    #[test]
    fn failing_command_captures_output() {
        let dir = tempfile::TempDir::new().unwrap();
        // Not a repository: git status exits 128 with a message on stderr.
        let git = GitCli::new(dir.path()).with_config("safe.directory", "*");
        let err = git.status().unwrap_err();
        match err {
            GitError::CommandFailed {
                command,
                exit_code,
                output,
            } => {
                assert_eq!(command, "git status --porcelain");
                assert_ne!(exit_code, Some(0));
                assert!(output.to_lowercase().contains("not a git repository"), "{output}");
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }
}
