//! Atomic artifact writes.
//!
//! Content goes to `<path>.schemasync.tmp` first and is renamed over `<path>`,
//! so a crash never leaves a half-written schema in the working copy.

use std::path::{Path, PathBuf};

use crate::error::{io_err, FetchError};

/// Write `content` to `path` atomically, creating parent directories.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), FetchError> {
    let tmp = PathBuf::from(format!("{}.schemasync.tmp", path.display()));

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    std::fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;

    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    tracing::debug!("wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// True when the output should be introspection JSON rather than SDL.
pub(crate) fn wants_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
