// src/install/binary.rs

//! Binary strategy: download a pre-built archive and install its payload
//!
//! The recipe's `bin` template is expanded with the host facts
//! (`{version}`, `{os}`, `{arch}`, `{ext}`), downloaded as a stream, and
//! handed to the extractor. The single extracted file is the installed
//! binary; it is moved to `store/<handle>/bin/<handle>`.

use super::InstallContext;
use crate::archive::{self, ArchiveKind};
use crate::error::Result;
use crate::platform;
use crate::recipe::Recipe;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use tracing::info;

pub fn install(ctx: &InstallContext<'_>, recipe: &Recipe, handle: &str) -> Result<PathBuf> {
    let template = recipe.package.bin.as_deref().unwrap_or_default();
    let url = platform::expand_bin_template(template, &recipe.package.version);
    let kind = ArchiveKind::from_name(&url)?;

    info!("Downloading pre-built binary from {}", url);
    let (response, length) = ctx.client.get_stream(&url)?;
    let progress = download_bar(length, handle);
    let reader = progress.wrap_read(response);

    let dest = ctx.layout.bin_store_dir(handle);
    let extracted = archive::extract_single_binary(reader, &dest, kind)?;
    progress.finish_and_clear();

    let binary = ctx.layout.installed_binary(handle);
    if extracted != binary {
        if let Some(parent) = binary.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&extracted, &binary)?;
    }
    ensure_executable(&binary)?;

    info!("Installed binary at {}", binary.display());
    Ok(binary)
}

fn download_bar(length: Option<u64>, name: &str) -> ProgressBar {
    let bar = match length {
        Some(len) => {
            let bar = ProgressBar::new(len);
            bar.set_style(
                ProgressStyle::with_template(
                    "{msg} [{bar:30}] {bytes}/{total_bytes} ({bytes_per_sec})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        }
        None => ProgressBar::new_spinner(),
    };
    bar.set_message(name.to_string());
    bar
}

#[cfg(unix)]
fn ensure_executable(path: &std::path::Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    if perms.mode() & 0o111 == 0 {
        perms.set_mode(perms.mode() | 0o755);
        fs::set_permissions(path, perms)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_executable(_path: &std::path::Path) -> Result<()> {
    Ok(())
}
