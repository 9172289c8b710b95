// src/resolver.rs

//! Dependency resolution
//!
//! Depth-first, post-order: a dependency finishes its post-install before
//! its dependent begins. A handle set guards against cycles and
//! duplicates; handles are entered into the set when resolution starts so
//! a cyclic recipe graph terminates with every member installed once.
//!
//! A dependency delegating to a host package manager is installed through
//! that manager when it matches the detected one, and skipped with a log
//! line otherwise: recipe authors provide one entry per supported host.

use crate::client::HttpClient;
use crate::db::RecipeDb;
use crate::error::{Error, Result};
use crate::install::{self, InstallContext};
use crate::layout::Layout;
use crate::platform;
use crate::recipe::{Dependency, InstallMethod, Recipe};
use std::collections::HashSet;
use tracing::{debug, info};

pub struct Resolver<'a> {
    layout: &'a Layout,
    db: &'a RecipeDb,
    client: &'a HttpClient,
    host_pm: Option<String>,
    processed: HashSet<String>,
}

impl<'a> Resolver<'a> {
    pub fn new(layout: &'a Layout, db: &'a RecipeDb, client: &'a HttpClient) -> Self {
        Self::with_host_pm(layout, db, client, platform::detect_host_package_manager())
    }

    /// Construct with an explicit host package manager. Lets tests pin the
    /// delegation behavior.
    pub fn with_host_pm(
        layout: &'a Layout,
        db: &'a RecipeDb,
        client: &'a HttpClient,
        host_pm: Option<String>,
    ) -> Self {
        Self {
            layout,
            db,
            client,
            host_pm,
            processed: HashSet::new(),
        }
    }

    /// Resolve a recipe's dependency closure and install it.
    pub fn resolve_and_install(
        &mut self,
        recipe: &Recipe,
        handle: &str,
        no_cache: bool,
    ) -> Result<()> {
        if self.processed.contains(handle) {
            return Ok(());
        }

        info!("Resolving: {}", handle);

        if self.layout.is_installed(handle) {
            info!("Package '{}' is already installed; skipping", handle);
            self.processed.insert(handle.to_string());
            return Ok(());
        }

        // Mark before recursing so dependency cycles terminate.
        self.processed.insert(handle.to_string());

        if recipe.install_method() == InstallMethod::Source {
            debug!("Source build; resolving build dependencies first");
            self.resolve_dependency_list(&recipe.build.depends, no_cache)?;
        }

        self.resolve_dependency_list(&recipe.depends, no_cache)?;

        info!("Installing: {}", handle);
        let ctx = InstallContext {
            layout: self.layout,
            client: self.client,
            no_cache,
        };
        let binary = install::run_strategy(&ctx, recipe, handle)?;
        install::post_install(self.layout, recipe, handle, binary.as_deref())?;

        match &binary {
            Some(path) => info!("Binary for '{}' linked at {}", handle, path.display()),
            None => info!("Package '{}' installed via its installer script", handle),
        }
        Ok(())
    }

    fn resolve_dependency_list(&mut self, deps: &[Dependency], no_cache: bool) -> Result<()> {
        for dep in deps {
            if dep.is_engine_managed() {
                debug!(
                    "Engine dependency '{}' (minimum version {})",
                    dep.handle, dep.version
                );
                let recipe = self.db.load_recipe(&dep.handle).map_err(|e| match e {
                    Error::UnknownPackage(_) => Error::UnknownPackage(dep.handle.clone()),
                    other => other,
                })?;
                self.resolve_and_install(&recipe, &dep.handle, no_cache)?;
                continue;
            }

            let pm = &dep.install.pm;
            match &self.host_pm {
                Some(host) if host == pm => {
                    info!("System dependency '{}' via {}", dep.target_handle(), pm);
                    platform::host_pm_install(pm, dep.target_handle())?;
                }
                Some(host) => {
                    info!(
                        "Skipping dependency {} (for {}); not applicable to {}",
                        dep.handle, pm, host
                    );
                }
                None => {
                    info!(
                        "Skipping dependency {} (for {}); no host package manager detected",
                        dep.handle, pm
                    );
                }
            }
        }
        Ok(())
    }
}
