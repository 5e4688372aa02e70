//! Error types for schemasync-git.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from version-control operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The command ran and exited non-zero. `output` is stdout followed by
    /// stderr, verbatim.
    #[error("command `{command}` failed with exit code {}\noutput was: {output}", display_code(.exit_code))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        output: String,
    },

    /// The process could not be started at all.
    #[error("failed to run `{command}` in {workdir}: {source}")]
    Spawn {
        command: String,
        workdir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("'{code}'"),
        None => "(terminated by signal)".to_owned(),
    }
}
