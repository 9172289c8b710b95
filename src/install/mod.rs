// src/install/mod.rs

//! Installer strategies
//!
//! Three ways a recipe can install: a pre-built binary archive, a signed
//! installer script, or a build from source. Strategy selection follows the
//! recipe's (validated) install method; the shared post-install step writes
//! the recipe snapshot into the store and activates the binary.
//!
//! The store directory is populated before the bin link is touched, so the
//! activation record never points at something that does not exist yet.

pub mod binary;
pub mod script;
pub mod source;

use crate::client::HttpClient;
use crate::error::Result;
use crate::layout::Layout;
use crate::recipe::{InstallMethod, Recipe};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything a strategy needs, threaded explicitly through call sites.
pub struct InstallContext<'a> {
    pub layout: &'a Layout,
    pub client: &'a HttpClient,
    /// Remove source trees after a successful build
    pub no_cache: bool,
}

/// Run the strategy a recipe selects.
///
/// Returns the path of the installed binary for the binary and source
/// strategies; the installer strategy owns its own layout and returns
/// `None`.
pub fn run_strategy(
    ctx: &InstallContext<'_>,
    recipe: &Recipe,
    handle: &str,
) -> Result<Option<PathBuf>> {
    match recipe.install_method() {
        InstallMethod::Installer => {
            script::install(ctx, recipe)?;
            Ok(None)
        }
        InstallMethod::Binary => binary::install(ctx, recipe, handle).map(Some),
        InstallMethod::Source => source::install(ctx, recipe, handle).map(Some),
    }
}

/// Shared post-install: persist the recipe snapshot, then activate the
/// binary (when the strategy produced one).
pub fn post_install(
    layout: &Layout,
    recipe: &Recipe,
    handle: &str,
    installed_binary: Option<&Path>,
) -> Result<()> {
    fs::create_dir_all(layout.store_dir(handle))?;
    fs::write(layout.snapshot_path(handle), recipe.to_snapshot_yaml()?)?;
    debug!("Wrote recipe snapshot for '{}'", handle);

    if let Some(binary) = installed_binary {
        layout.link_binary(handle, binary)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn recipe() -> Recipe {
        Recipe::from_yaml(
            r#"
package:
  name: Tool
  handle: tool
  version: 1.0.0
  bin: https://ex.com/tool-{version}{ext}
"#,
        )
        .unwrap()
    }

    #[cfg(unix)]
    #[test]
    fn test_post_install_writes_snapshot_and_link() {
        let dir = TempDir::new().unwrap();
        let layout = Layout::new(dir.path());
        let recipe = recipe();

        let bin = layout.installed_binary("tool");
        fs::create_dir_all(bin.parent().unwrap()).unwrap();
        fs::write(&bin, b"binary").unwrap();

        post_install(&layout, &recipe, "tool", Some(&bin)).unwrap();

        let snapshot = fs::read_to_string(layout.snapshot_path("tool")).unwrap();
        assert_eq!(snapshot, recipe.to_snapshot_yaml().unwrap());
        assert_eq!(fs::read_link(layout.bin_link("tool")).unwrap(), bin);
    }

    #[test]
    fn test_post_install_without_binary_skips_link() {
        let dir = TempDir::new().unwrap();
        let layout = Layout::new(dir.path());

        post_install(&layout, &recipe(), "tool", None).unwrap();

        assert!(layout.snapshot_path("tool").exists());
        assert!(layout.bin_link("tool").symlink_metadata().is_err());
        // The snapshot alone marks the package installed.
        assert!(layout.is_installed("tool"));
    }
}
