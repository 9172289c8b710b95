// src/lock.rs

//! Advisory store lock
//!
//! Write operations (install, uninstall, update, sync, doctor) hold an
//! exclusive flock on `pkgs/.lock` for their duration. Reads take no lock.
//! The lock is advisory: it serializes cooperating engine invocations but
//! does not defend against arbitrary external writers.

use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs::{self, File};
use std::path::Path;
use tracing::debug;

/// Exclusive lock over the store tree; released on drop.
pub struct StoreLock {
    // Held open for the lifetime of the lock.
    _file: File,
}

impl StoreLock {
    /// Acquire the lock, failing immediately if another invocation holds it.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        file.try_lock_exclusive().map_err(|_| {
            Error::Io(std::io::Error::other(
                "store is locked by another zoi invocation",
            ))
        })?;

        debug!("Acquired store lock at {}", path.display());
        Ok(Self { _file: file })
    }
}
