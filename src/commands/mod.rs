// src/commands/mod.rs

//! Command implementations
//!
//! Thin straight-line compositions of the core components; no business
//! logic lives here. Each function backs one CLI subcommand, prints its
//! user-facing output, and bubbles errors to `main` for the single final
//! error line.

use crate::client::HttpClient;
use crate::config::Config;
use crate::db::{RecipeDb, SyncOutcome};
use crate::doctor;
use crate::error::{Error, Result};
use crate::forge::{self, Provider};
use crate::install::{source, InstallContext};
use crate::layout::Layout;
use crate::lock::StoreLock;
use crate::platform;
use crate::recipe::{InstallMethod, Recipe};
use crate::resolver::Resolver;
use crate::update;
use crate::verify;
use dialoguer::Confirm;
use tracing::warn;

/// Shared per-command environment.
struct Env {
    config: Config,
    layout: Layout,
}

impl Env {
    fn load() -> Result<Self> {
        let config = Config::load()?;
        let layout = Layout::new(config.data_root()?);
        Ok(Self { config, layout })
    }

    fn db(&self) -> RecipeDb {
        RecipeDb::new(self.layout.clone())
    }

    fn lock(&self) -> Result<StoreLock> {
        StoreLock::acquire(&self.layout.lock_path())
    }
}

/// Load a recipe for an install-like command: a Git URL fetches the
/// repository's own `zoi.yaml`, anything else is a database handle.
fn get_recipe(env: &Env, target: &str, provider: Option<Provider>) -> Result<(Recipe, String)> {
    if target.starts_with("http://") || target.starts_with("https://") {
        let client = HttpClient::new()?;
        let hint = provider.or(env.config.provider_hint);
        let recipe = forge::fetch_recipe(&client, target, hint)?;
        recipe.validate()?;
        let handle = recipe.package.handle.clone();
        Ok((recipe, handle))
    } else {
        let recipe = env.db().load_recipe(target)?;
        Ok((recipe, target.to_string()))
    }
}

fn confirm(prompt: &str) -> bool {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// sync
// ---------------------------------------------------------------------------

pub fn cmd_sync() -> Result<()> {
    let env = Env::load()?;
    let _lock = env.lock()?;

    let endpoint = env.config.endpoint().to_string();
    println!("Syncing package database from {endpoint}");

    match env.db().sync(&endpoint)? {
        SyncOutcome::Cloned => println!("Package database synced successfully."),
        SyncOutcome::Updated => println!("Package database updated."),
        SyncOutcome::UpToDate => println!("Package database is up to date."),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// install / uninstall
// ---------------------------------------------------------------------------

pub fn cmd_install(target: &str, no_cache: bool, provider: Option<Provider>) -> Result<()> {
    let env = Env::load()?;
    let _lock = env.lock()?;

    let (recipe, handle) = get_recipe(&env, target, provider)?;
    println!(
        "Starting installation for: {} ({})",
        recipe.package.name, recipe.package.version
    );

    let db = env.db();
    let client = HttpClient::new()?;
    let mut resolver = Resolver::new(&env.layout, &db, &client);
    resolver.resolve_and_install(&recipe, &handle, no_cache)?;

    println!("Installation of '{}' complete.", recipe.package.name);
    Ok(())
}

pub fn cmd_uninstall(handle: &str) -> Result<()> {
    let env = Env::load()?;
    let _lock = env.lock()?;

    if !env.layout.is_installed(handle) {
        println!("Package '{handle}' is not installed.");
        return Err(Error::UnknownPackage(handle.to_string()));
    }

    println!("Removing binary link for '{handle}'");
    env.layout.remove_package(handle)?;
    println!("Successfully uninstalled '{handle}'.");
    Ok(())
}

// ---------------------------------------------------------------------------
// update
// ---------------------------------------------------------------------------

pub fn cmd_update(handle: Option<&str>, no_cache: bool) -> Result<()> {
    let env = Env::load()?;
    let _lock = env.lock()?;
    let db = env.db();
    let client = HttpClient::new()?;

    if let Some(handle) = handle {
        let check = update::check(&db, handle)?;
        if !check.needs_update {
            println!(
                "Package '{handle}' is already up to date (version {}).",
                check.current
            );
            return Ok(());
        }
        println!(
            "Update available for {handle}: {} -> {}",
            check.current, check.latest
        );
        return update::reinstall(&env.layout, &db, &client, handle, no_cache);
    }

    println!("Checking for updates for all installed packages...");
    let handles = env.layout.installed_handles();
    if handles.is_empty() {
        println!("No packages are currently installed.");
        return Ok(());
    }

    let updates = update::collect_updates(&env.layout, &db);
    if updates.is_empty() {
        println!("All installed packages are up to date.");
        return Ok(());
    }

    println!("Found updates for the following packages:");
    for handle in &updates {
        println!("- {handle}");
    }

    if !confirm("Do you want to apply these updates?") {
        println!("Update cancelled.");
        return Ok(());
    }

    for handle in &updates {
        if let Err(e) = update::reinstall(&env.layout, &db, &client, handle, no_cache) {
            println!("Update for '{handle}' failed: {e}");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// list / search
// ---------------------------------------------------------------------------

pub fn cmd_list(installed_only: bool) -> Result<()> {
    let env = Env::load()?;
    let index = env.db().load_index()?;

    let installed: std::collections::HashSet<String> =
        env.layout.installed_handles().into_iter().collect();
    let rows: Vec<_> = index
        .packages
        .iter()
        .filter(|(handle, _)| !installed_only || installed.contains(handle.as_str()))
        .collect();

    print_package_table(&rows);
    Ok(())
}

pub fn cmd_search(keyword: &str) -> Result<()> {
    let env = Env::load()?;
    let index = env.db().load_index()?;

    let matches = index.search(keyword);
    if matches.is_empty() {
        println!("No packages found matching '{keyword}'.");
        return Ok(());
    }

    print_package_table(&matches);
    Ok(())
}

fn print_package_table(rows: &[(&String, &crate::recipe::index::IndexEntry)]) {
    println!("{:<24} {:<12} {}", "HANDLE", "VERSION", "DESCRIPTION");
    println!("{:<24} {:<12} {}", "------", "-------", "-----------");
    for (handle, entry) in rows {
        println!("{:<24} {:<12} {}", handle, entry.version, entry.desc);
    }
}

// ---------------------------------------------------------------------------
// view
// ---------------------------------------------------------------------------

pub fn cmd_view(
    target: &str,
    endpoint: Option<&str>,
    raw: bool,
    provider: Option<Provider>,
) -> Result<()> {
    let env = Env::load()?;
    let hint = provider.or(env.config.provider_hint);

    let content: Vec<u8> = match endpoint {
        Some(endpoint) => {
            println!("Fetching recipe for '{target}' from remote database {endpoint}...");
            let client = HttpClient::new()?;
            let content =
                forge::fetch_raw_recipe_from_remote_db(&client, target, endpoint, hint)?;

            println!("Verifying recipe signature...");
            match verify_remote_recipe(&client, &content, target, endpoint, hint) {
                Ok(signer) => println!("Recipe signature verified by: {signer}"),
                // Failure warns but the command still succeeds: the user
                // is reading the recipe, not executing it.
                Err(e) => println!("SECURITY WARNING: recipe signature verification failed: {e}"),
            }
            content
        }
        None if target.starts_with("http://") || target.starts_with("https://") => {
            println!("Fetching remote recipe from root of {target}...");
            let client = HttpClient::new()?;
            forge::fetch_raw_recipe(&client, target, hint)?
        }
        None => env.db().load_recipe_bytes(target)?,
    };

    if raw {
        print!("{}", String::from_utf8_lossy(&content));
        return Ok(());
    }

    let recipe = Recipe::from_yaml_unchecked(&String::from_utf8_lossy(&content))?;
    print_formatted_recipe(&recipe);
    Ok(())
}

fn verify_remote_recipe(
    client: &HttpClient,
    content: &[u8],
    handle: &str,
    endpoint: &str,
    hint: Option<Provider>,
) -> Result<String> {
    let signature = forge::fetch_recipe_signature(client, handle, endpoint, hint)?;
    let signer = verify::verify_detached(content, &signature)?;
    Ok(signer.name)
}

fn print_formatted_recipe(recipe: &Recipe) {
    let pkg = &recipe.package;

    println!();
    println!("{} - {} - {}", pkg.name, pkg.handle, pkg.desc);
    println!();
    println!("  {:<12} {}", "Version:", pkg.version);
    println!("  {:<12} {}", "Website:", pkg.website);
    println!("  {:<12} {}", "Repository:", pkg.repo);
    let method = match recipe.install_method() {
        InstallMethod::Binary => "Pre-compiled Binary",
        InstallMethod::Installer => "Installer Script",
        InstallMethod::Source => "From Source",
    };
    println!("  {:<12} {}", "Install:", method);

    if !recipe.depends.is_empty() {
        println!();
        println!("Runtime Dependencies:");
        for dep in &recipe.depends {
            println!("  - {}: minimum {}", dep.handle, dep.version);
        }
    }

    if !recipe.build.depends.is_empty() {
        println!();
        println!("Build Dependencies:");
        for dep in &recipe.build.depends {
            println!("  - {}: minimum {}", dep.handle, dep.version);
        }
    }
    println!();
}

// ---------------------------------------------------------------------------
// trust
// ---------------------------------------------------------------------------

pub fn cmd_trust() -> Result<()> {
    println!("Importing the official package signing key...");
    if !platform::command_exists("gpg") {
        return Err(Error::Io(std::io::Error::other(
            "gpg command not found; install GnuPG to use signature verification",
        )));
    }
    verify::import_official_key()?;
    println!("Official signing key imported. You can now verify signed packages.");
    Ok(())
}

// ---------------------------------------------------------------------------
// doctor
// ---------------------------------------------------------------------------

pub fn cmd_doctor() -> Result<()> {
    let env = Env::load()?;
    let _lock = env.lock()?;

    println!("--- Package Doctor ---");

    println!("\n1. Checking for broken links...");
    let report = doctor::scan(&env.layout)?;
    match report.broken_links.len() {
        0 => println!("   No broken links found."),
        n => println!("   Found {n} broken links."),
    }

    println!("\n2. Checking for orphaned package data...");
    match report.orphaned_stores.len() {
        0 => println!("   No orphaned package data found."),
        n => println!("   Found {n} orphaned packages (data exists but not activated)."),
    }

    println!("\n3. Checking for leftover source code...");
    match report.leftover_code.len() {
        0 => println!("   No leftover source code found."),
        n => println!("   Found {n} packages with leftover build source code."),
    }

    if report.is_clean() {
        println!("\nNo issues found. Your installation looks healthy.");
        return Ok(());
    }

    if !report.broken_links.is_empty()
        && confirm(&format!(
            "Remove the {} broken links?",
            report.broken_links.len()
        ))
    {
        doctor::remove_broken_links(&env.layout, &report.broken_links)?;
        println!("Broken links removed.");
    }

    if !report.orphaned_stores.is_empty()
        && confirm(&format!(
            "Delete the {} orphaned package data directories?",
            report.orphaned_stores.len()
        ))
    {
        doctor::remove_orphaned_stores(&env.layout, &report.orphaned_stores)?;
        println!("Orphaned package data deleted.");
    }

    if !report.leftover_code.is_empty()
        && confirm(&format!(
            "Clean up the {} leftover source code directories?",
            report.leftover_code.len()
        ))
    {
        doctor::remove_leftover_code(&env.layout, &report.leftover_code)?;
        println!("Source code cleaned up.");
    }

    println!("\nDoctor check complete.");
    Ok(())
}

// ---------------------------------------------------------------------------
// clone / build
// ---------------------------------------------------------------------------

pub fn cmd_clone(target: &str, provider: Option<Provider>) -> Result<()> {
    let env = Env::load()?;
    let _lock = env.lock()?;

    let (recipe, handle) = get_recipe(&env, target, provider)?;
    println!("Found recipe for package: {}", recipe.package.name);

    let code = source::clone_into(&env.layout, &recipe, &handle)?;
    println!("Successfully cloned repository.");
    println!("Source code is available at: {}", code.display());
    Ok(())
}

pub fn cmd_build(target: &str, no_cache: bool, provider: Option<Provider>) -> Result<()> {
    let env = Env::load()?;
    let _lock = env.lock()?;

    let (recipe, handle) = get_recipe(&env, target, provider)?;
    println!(
        "Found recipe for package: {} ({})",
        recipe.package.name, recipe.package.version
    );

    if recipe.install_method() != InstallMethod::Source {
        warn!("Recipe '{}' is not a source build; building anyway", handle);
    }
    if recipe.build.cmd.is_empty() {
        return Err(Error::InvalidRecipe(format!(
            "'{handle}' has no build command"
        )));
    }

    let client = HttpClient::new()?;
    let ctx = InstallContext {
        layout: &env.layout,
        client: &client,
        no_cache,
    };
    let built = source::build_only(&ctx, &recipe, &handle)?;
    println!("Build complete. Binary available at: {}", built.display());
    Ok(())
}
