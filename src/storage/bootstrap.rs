//! File bootstrap
//!
//! Makes sure the backing path exists before the store maps it.

use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::error::Result;

/// Create an empty file at `path` if none exists
///
/// Parent directories are created as needed. Returns `true` if the file
/// was created by this call.
pub fn ensure_file(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;

    tracing::debug!("Created empty store file at {}", path.display());
    Ok(true)
}
