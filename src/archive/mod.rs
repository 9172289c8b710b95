// src/archive/mod.rs

//! Streaming archive extraction
//!
//! Handles the three archive formats recipes ship binaries in: `.tar.gz`,
//! `.tar.xz`, and `.zip`. Input is consumed as a stream (zip is spooled to
//! a temporary file because the format requires a seekable reader).
//!
//! Every entry path is sanitized before any filesystem object is created:
//! the resolved destination must stay inside the extraction root, otherwise
//! extraction fails with [`Error::UnsafePath`]. In-archive symlinks are
//! created only when their target also resolves inside the root; escaping
//! links are skipped with a warning rather than failing the archive.

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Supported archive container/compression combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    TarXz,
    Zip,
}

impl ArchiveKind {
    /// Pick the archive kind from a file name or URL.
    pub fn from_name(name: &str) -> Result<Self> {
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Ok(Self::TarGz)
        } else if name.ends_with(".tar.xz") {
            Ok(Self::TarXz)
        } else if name.ends_with(".zip") {
            Ok(Self::Zip)
        } else {
            Err(Error::UnsupportedArchive(name.to_string()))
        }
    }
}

/// Outcome of an extraction.
#[derive(Debug)]
pub struct Extraction {
    /// First regular file written, in archive order.
    pub first_file: Option<PathBuf>,
    /// Number of regular files written.
    pub file_count: usize,
}

/// Extract an archive stream into `dest`, creating it if needed.
pub fn extract(reader: impl Read, dest: &Path, kind: ArchiveKind) -> Result<Extraction> {
    fs::create_dir_all(dest)?;

    match kind {
        ArchiveKind::TarGz => extract_tar(flate2::read::GzDecoder::new(reader), dest),
        ArchiveKind::TarXz => extract_tar(xz2::read::XzDecoder::new(reader), dest),
        ArchiveKind::Zip => extract_zip(reader, dest),
    }
}

/// Extract an archive expected to contain a single binary.
///
/// Returns the path of the first regular file; an archive with no regular
/// file at all is an [`Error::EmptyArchive`].
pub fn extract_single_binary(reader: impl Read, dest: &Path, kind: ArchiveKind) -> Result<PathBuf> {
    let outcome = extract(reader, dest, kind)?;
    outcome.first_file.ok_or(Error::EmptyArchive)
}

fn extract_tar(reader: impl Read, dest: &Path) -> Result<Extraction> {
    let mut archive = tar::Archive::new(reader);
    let mut outcome = Extraction {
        first_file: None,
        file_count: 0,
    };

    for entry in archive.entries()? {
        let mut entry = entry?;
        let raw_path = entry.path()?.into_owned();
        let rel = sanitize_entry_path(&raw_path)?;
        let target = dest.join(&rel);

        match entry.header().entry_type() {
            tar::EntryType::Directory => {
                fs::create_dir_all(&target)?;
            }
            tar::EntryType::Regular => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut out = File::create(&target)?;
                io::copy(&mut entry, &mut out)?;
                apply_mode(&target, entry.header().mode().ok())?;

                if outcome.first_file.is_none() {
                    outcome.first_file = Some(target.clone());
                }
                outcome.file_count += 1;
            }
            tar::EntryType::Symlink => {
                let link_target = entry
                    .link_name()?
                    .ok_or_else(|| Error::UnsafePath(rel.display().to_string()))?;
                create_symlink_entry(dest, &rel, &link_target, &target);
            }
            other => {
                debug!("Skipping unsupported tar entry type {:?}: {}", other, rel.display());
            }
        }
    }

    Ok(outcome)
}

fn extract_zip(reader: impl Read, dest: &Path) -> Result<Extraction> {
    // Zip central directories live at the end of the file, so spool the
    // stream to a temporary file to get a seekable reader.
    let mut spool = tempfile::tempfile()?;
    let mut reader = reader;
    io::copy(&mut reader, &mut spool)?;

    let mut archive = zip::ZipArchive::new(spool)
        .map_err(|e| Error::UnsupportedArchive(format!("zip: {e}")))?;

    let mut outcome = Extraction {
        first_file: None,
        file_count: 0,
    };

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| Error::UnsupportedArchive(format!("zip: {e}")))?;

        let raw = match entry.enclosed_name() {
            Some(name) => name.to_path_buf(),
            None => return Err(Error::UnsafePath(entry.name().to_string())),
        };
        let rel = sanitize_entry_path(&raw)?;
        let target = dest.join(&rel);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        apply_mode(&target, entry.unix_mode())?;

        if outcome.first_file.is_none() {
            outcome.first_file = Some(target.clone());
        }
        outcome.file_count += 1;
    }

    Ok(outcome)
}

/// Create an in-archive symlink if its target stays inside the root;
/// otherwise skip it with a warning.
fn create_symlink_entry(root: &Path, entry_rel: &Path, link_target: &Path, link_path: &Path) {
    let parent = entry_rel.parent().unwrap_or(Path::new(""));
    let resolved = if link_target.is_absolute() {
        None
    } else {
        lexical_normalize(&parent.join(link_target))
    };

    match resolved {
        Some(_) => {
            if let Some(dir) = link_path.parent() {
                let _ = fs::create_dir_all(dir);
            }
            if link_path.symlink_metadata().is_ok() {
                let _ = fs::remove_file(link_path);
            }
            if let Err(e) = platform_symlink(link_target, link_path) {
                warn!(
                    "Could not create archive symlink {}: {}",
                    link_path.display(),
                    e
                );
            }
        }
        None => {
            warn!(
                "Skipping archive symlink {} -> {} (escapes {})",
                entry_rel.display(),
                link_target.display(),
                root.display()
            );
        }
    }
}

#[cfg(not(windows))]
fn platform_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn platform_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

/// Normalize an untrusted entry path to a safe relative path.
///
/// Leading roots are stripped, `.` components dropped, and any `..` is a
/// traversal attempt rejected outright.
fn sanitize_entry_path(path: &Path) -> Result<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::UnsafePath(path.display().to_string()));
            }
            Component::Prefix(_) | Component::RootDir => {}
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(Error::UnsafePath(path.display().to_string()));
    }
    Ok(normalized)
}

/// Resolve `.` and `..` lexically; `None` if the path pops past its root.
fn lexical_normalize(path: &Path) -> Option<PathBuf> {
    let mut stack: Vec<std::ffi::OsString> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => stack.push(part.to_os_string()),
            Component::CurDir => {}
            Component::ParentDir => {
                stack.pop()?;
            }
            Component::Prefix(_) | Component::RootDir => return None,
        }
    }
    Some(stack.iter().collect())
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: Option<u32>) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    if let Some(mode) = mode {
        fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: Option<u32>) -> Result<()> {
    Ok(())
}
