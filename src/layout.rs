// src/layout.rs

//! Canonical on-disk store layout
//!
//! ```text
//! <data-root>/pkgs/
//!   db/                    git clone of the recipe database
//!   store/<handle>/
//!     bin/<handle>[.exe]   installed binary
//!     code/                source tree (source builds)
//!     zoi.yaml             recipe snapshot
//!   bins/<handle>          symlink -> ../store/<handle>/bin/<handle>
//! ```
//!
//! A package is installed iff its store directory exists; the `bins/` link
//! is the activation record. Link updates are atomic: the new link is
//! created at a sibling temporary path and renamed over the old one, so the
//! activation record never points at a half-written target.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    /// Create a layout rooted at the configured data directory.
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            root: data_root.into(),
        }
    }

    pub fn pkgs_dir(&self) -> PathBuf {
        self.root.join("pkgs")
    }

    /// Local clone of the recipe database.
    pub fn db_dir(&self) -> PathBuf {
        self.pkgs_dir().join("db")
    }

    pub fn store_root(&self) -> PathBuf {
        self.pkgs_dir().join("store")
    }

    pub fn bins_dir(&self) -> PathBuf {
        self.pkgs_dir().join("bins")
    }

    /// Advisory lock guarding write operations on the tree.
    pub fn lock_path(&self) -> PathBuf {
        self.pkgs_dir().join(".lock")
    }

    pub fn store_dir(&self, handle: &str) -> PathBuf {
        self.store_root().join(handle)
    }

    pub fn bin_store_dir(&self, handle: &str) -> PathBuf {
        self.store_dir(handle).join("bin")
    }

    /// Final path of the installed binary inside the store.
    pub fn installed_binary(&self, handle: &str) -> PathBuf {
        let name = if cfg!(windows) {
            format!("{handle}.exe")
        } else {
            handle.to_string()
        };
        self.bin_store_dir(handle).join(name)
    }

    pub fn code_dir(&self, handle: &str) -> PathBuf {
        self.store_dir(handle).join("code")
    }

    /// Recipe snapshot written on successful install.
    pub fn snapshot_path(&self, handle: &str) -> PathBuf {
        self.store_dir(handle).join("zoi.yaml")
    }

    pub fn bin_link(&self, handle: &str) -> PathBuf {
        self.bins_dir().join(handle)
    }

    /// A package is installed iff its store directory exists.
    pub fn is_installed(&self, handle: &str) -> bool {
        self.store_dir(handle).exists()
    }

    /// Handles of every package present in the store.
    pub fn installed_handles(&self) -> Vec<String> {
        let mut handles = Vec::new();
        let entries = match fs::read_dir(self.store_root()) {
            Ok(entries) => entries,
            Err(_) => return handles,
        };
        for entry in entries.flatten() {
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                if let Ok(name) = entry.file_name().into_string() {
                    handles.push(name);
                }
            }
        }
        handles.sort();
        handles
    }

    /// Point `bins/<handle>` at an installed binary, atomically.
    ///
    /// The target must already exist; activating a missing binary would
    /// leave a dangling record.
    pub fn link_binary(&self, handle: &str, target: &Path) -> Result<()> {
        if !target.exists() {
            return Err(Error::InstallIncomplete(format!(
                "binary {} does not exist; refusing to activate",
                target.display()
            )));
        }

        fs::create_dir_all(self.bins_dir())?;

        let link = self.bin_link(handle);
        let staging = self.bins_dir().join(format!(".{handle}.tmp"));
        if staging.symlink_metadata().is_ok() {
            fs::remove_file(&staging)?;
        }

        match make_symlink(target, &staging) {
            Ok(()) => {
                fs::rename(&staging, &link)?;
                debug!("Linked {} -> {}", link.display(), target.display());
                Ok(())
            }
            Err(e) if cfg!(windows) => {
                // Symlinks need privilege or Developer Mode on Windows;
                // fall back to a launcher stub.
                warn!("Symlink creation failed ({}); writing launcher stub", e);
                self.write_launcher_stub(handle, target)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[cfg(windows)]
    fn write_launcher_stub(&self, handle: &str, target: &Path) -> Result<()> {
        let stub = self.bins_dir().join(format!("{handle}.cmd"));
        let staging = self.bins_dir().join(format!(".{handle}.cmd.tmp"));
        let body = format!("@echo off\r\n\"{}\" %*\r\n", target.display());
        fs::write(&staging, body)?;
        fs::rename(&staging, &stub)?;
        debug!("Wrote launcher stub {}", stub.display());
        Ok(())
    }

    #[cfg(not(windows))]
    fn write_launcher_stub(&self, _handle: &str, _target: &Path) -> Result<()> {
        unreachable!("launcher stubs are a Windows fallback")
    }

    /// Remove the activation record for a handle, if present.
    ///
    /// Covers both the symlink and the Windows launcher stub.
    pub fn remove_bin_link(&self, handle: &str) -> Result<()> {
        let link = self.bin_link(handle);
        if link.symlink_metadata().is_ok() {
            fs::remove_file(&link)?;
        }
        let stub = self.bins_dir().join(format!("{handle}.cmd"));
        if stub.exists() {
            fs::remove_file(&stub)?;
        }
        Ok(())
    }

    /// Remove a package: activation record first, then the store payload.
    pub fn remove_package(&self, handle: &str) -> Result<()> {
        self.remove_bin_link(handle)?;
        let store = self.store_dir(handle);
        if store.exists() {
            fs::remove_dir_all(&store)?;
        }
        Ok(())
    }
}

#[cfg(not(windows))]
fn make_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
