// src/db.rs

//! Local recipe database
//!
//! The database is a plain Git clone under `pkgs/db/` containing the
//! `pkgs.json` index and the recipe files it references. `sync` clones on
//! first use and fast-forwards `origin` afterwards; everything else is
//! local file reading.

use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::recipe::index::PackageIndex;
use crate::recipe::Recipe;
use git2::build::CheckoutBuilder;
use git2::Repository;
use std::fs;
use tracing::{debug, info};

/// What `sync` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Cloned,
    Updated,
    UpToDate,
}

pub struct RecipeDb {
    layout: Layout,
}

impl RecipeDb {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    /// Clone the database on first use, fast-forward it afterwards.
    pub fn sync(&self, endpoint: &str) -> Result<SyncOutcome> {
        let db_dir = self.layout.db_dir();

        if !db_dir.exists() {
            info!("Cloning package database from {}", endpoint);
            fs::create_dir_all(self.layout.pkgs_dir())?;
            Repository::clone(endpoint, &db_dir)?;
            return Ok(SyncOutcome::Cloned);
        }

        info!("Package database exists; pulling updates");
        let repo = Repository::open(&db_dir)?;

        let branch = repo
            .head()?
            .shorthand()
            .ok_or_else(|| Error::GitError("database HEAD is not a branch".to_string()))?
            .to_string();

        let mut remote = repo.find_remote("origin")?;
        remote.fetch(&[branch.as_str()], None, None)?;

        let fetch_head = repo.find_reference("FETCH_HEAD")?;
        let fetch_commit = repo.reference_to_annotated_commit(&fetch_head)?;
        let (analysis, _) = repo.merge_analysis(&[&fetch_commit])?;

        if analysis.is_up_to_date() {
            debug!("Database already up to date");
            return Ok(SyncOutcome::UpToDate);
        }

        if analysis.is_fast_forward() {
            let refname = format!("refs/heads/{branch}");
            let mut reference = repo.find_reference(&refname)?;
            reference.set_target(fetch_commit.id(), "fast-forward")?;
            repo.set_head(&refname)?;
            repo.checkout_head(Some(CheckoutBuilder::default().force()))?;
            info!("Database fast-forwarded");
            return Ok(SyncOutcome::Updated);
        }

        Err(Error::GitError(format!(
            "database history diverged from {endpoint}; remove {} and sync again",
            db_dir.display()
        )))
    }

    /// Load and parse `pkgs.json`.
    pub fn load_index(&self) -> Result<PackageIndex> {
        let index_path = self.layout.db_dir().join("pkgs.json");
        let data = fs::read(&index_path).map_err(|_| {
            Error::IndexError("could not read the package database; run 'zoi pkg sync' first".to_string())
        })?;
        PackageIndex::from_json(&data)
    }

    /// Raw bytes of a recipe file referenced by the index.
    pub fn load_recipe_bytes(&self, handle: &str) -> Result<Vec<u8>> {
        let index = self.load_index()?;
        let entry = index.get(handle)?;
        let recipe_path = self.layout.db_dir().join(&entry.pkg_file);
        fs::read(&recipe_path).map_err(|e| {
            Error::IndexError(format!(
                "could not read recipe at {}: {e}",
                recipe_path.display()
            ))
        })
    }

    /// Load and validate the recipe for a handle.
    pub fn load_recipe(&self, handle: &str) -> Result<Recipe> {
        let data = self.load_recipe_bytes(handle)?;
        Recipe::from_yaml(&String::from_utf8_lossy(&data))
    }

    /// Load the snapshot of an installed package.
    pub fn load_installed_recipe(&self, handle: &str) -> Result<Recipe> {
        let path = self.layout.snapshot_path(handle);
        let data = fs::read_to_string(&path).map_err(|_| {
            Error::InvalidRecipe(format!(
                "could not read the installed recipe for '{handle}'; \
                 the package may be corrupted or predate this engine"
            ))
        })?;
        Recipe::from_yaml_unchecked(&data)
    }
}
