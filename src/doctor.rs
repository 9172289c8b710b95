// src/doctor.rs

//! Store health checks and cleanup
//!
//! Three scans over the tree: activation records whose target is gone,
//! store directories with no activation record, and leftover source trees
//! from cached builds. Nothing is removed without the user confirming each
//! category; a crash mid-install leaves exactly the kinds of debris these
//! scans find.

use crate::error::Result;
use crate::layout::Layout;
use std::fs;
use tracing::info;

#[derive(Debug, Default)]
pub struct DoctorReport {
    /// bins/ entries whose stat (following the link) fails
    pub broken_links: Vec<String>,
    /// store/ directories with no matching bins/ entry
    pub orphaned_stores: Vec<String>,
    /// handles with a store/<handle>/code/ tree still present
    pub leftover_code: Vec<String>,
}

impl DoctorReport {
    pub fn is_clean(&self) -> bool {
        self.broken_links.is_empty()
            && self.orphaned_stores.is_empty()
            && self.leftover_code.is_empty()
    }
}

/// Run all three scans without touching anything.
pub fn scan(layout: &Layout) -> Result<DoctorReport> {
    Ok(DoctorReport {
        broken_links: scan_broken_links(layout)?,
        orphaned_stores: scan_orphaned_stores(layout)?,
        leftover_code: scan_leftover_code(layout)?,
    })
}

fn scan_broken_links(layout: &Layout) -> Result<Vec<String>> {
    let bins = layout.bins_dir();
    let mut broken = Vec::new();

    if !bins.exists() {
        return Ok(broken);
    }

    for entry in fs::read_dir(&bins)?.flatten() {
        let path = entry.path();
        // stat follows the symlink; a dangling link fails here while
        // lstat would not.
        if fs::metadata(&path).is_err() {
            if let Ok(name) = entry.file_name().into_string() {
                broken.push(name);
            }
        }
    }
    broken.sort();
    Ok(broken)
}

fn scan_orphaned_stores(layout: &Layout) -> Result<Vec<String>> {
    let mut orphans = Vec::new();

    for handle in layout.installed_handles() {
        let link = layout.bin_link(&handle);
        let stub = layout.bins_dir().join(format!("{handle}.cmd"));
        if link.symlink_metadata().is_err() && !stub.exists() {
            orphans.push(handle);
        }
    }
    Ok(orphans)
}

fn scan_leftover_code(layout: &Layout) -> Result<Vec<String>> {
    let mut leftover = Vec::new();

    for handle in layout.installed_handles() {
        if layout.code_dir(&handle).exists() {
            leftover.push(handle);
        }
    }
    Ok(leftover)
}

/// Remove the broken activation records named by a report.
pub fn remove_broken_links(layout: &Layout, handles: &[String]) -> Result<()> {
    for handle in handles {
        let link = layout.bins_dir().join(handle);
        fs::remove_file(&link)?;
        info!("Removed broken link {}", link.display());
    }
    Ok(())
}

/// Remove orphaned store directories.
pub fn remove_orphaned_stores(layout: &Layout, handles: &[String]) -> Result<()> {
    for handle in handles {
        let store = layout.store_dir(handle);
        fs::remove_dir_all(&store)?;
        info!("Deleted orphaned store {}", store.display());
    }
    Ok(())
}

/// Remove leftover source trees.
pub fn remove_leftover_code(layout: &Layout, handles: &[String]) -> Result<()> {
    for handle in handles {
        let code = layout.code_dir(handle);
        fs::remove_dir_all(&code)?;
        info!("Cleaned source tree {}", code.display());
    }
    Ok(())
}
