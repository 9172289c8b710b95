// src/update.rs

//! Update engine
//!
//! Compares installed snapshots against the latest recipes in the synced
//! database. An update is a full reinstall: the old store and activation
//! record are removed, then the latest recipe goes through the normal
//! resolve-and-install path.

use crate::client::HttpClient;
use crate::db::RecipeDb;
use crate::error::Result;
use crate::layout::Layout;
use crate::resolver::Resolver;
use semver::Version;
use tracing::{info, warn};

/// Result of comparing installed vs latest versions for one handle.
#[derive(Debug, Clone)]
pub struct UpdateCheck {
    pub needs_update: bool,
    pub current: Version,
    pub latest: Version,
}

/// Compare the installed snapshot of `handle` against the latest recipe.
pub fn check(db: &RecipeDb, handle: &str) -> Result<UpdateCheck> {
    let current = db.load_installed_recipe(handle)?.version()?;
    let latest = db.load_recipe(handle)?.version()?;

    Ok(UpdateCheck {
        needs_update: latest > current,
        current,
        latest,
    })
}

/// Handles with an update available, in store order. Handles whose check
/// fails (never synced, corrupt snapshot) are skipped.
pub fn collect_updates(layout: &Layout, db: &RecipeDb) -> Vec<String> {
    layout
        .installed_handles()
        .into_iter()
        .filter(|handle| match check(db, handle) {
            Ok(check) => check.needs_update,
            Err(e) => {
                warn!("Skipping update check for '{}': {}", handle, e);
                false
            }
        })
        .collect()
}

/// Reinstall a package at its latest recipe.
///
/// The old store and activation record are removed first; on failure the
/// package is left uninstalled for doctor or a retry to deal with.
pub fn reinstall(
    layout: &Layout,
    db: &RecipeDb,
    client: &HttpClient,
    handle: &str,
    no_cache: bool,
) -> Result<()> {
    info!("Updating: {}", handle);

    let latest = db.load_recipe(handle)?;

    info!("Removing old version of '{}'", handle);
    layout.remove_package(handle)?;

    let mut resolver = Resolver::new(layout, db, client);
    resolver.resolve_and_install(&latest, handle, no_cache)
}
