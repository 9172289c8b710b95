// src/install/source.rs

//! Source strategy: clone, build, install
//!
//! Clones the recipe's repository into `store/<handle>/code/`, runs the
//! build command through the platform shell with the clone as working
//! directory, and moves the produced binary into the store. The source
//! tree is kept for later rebuilds unless `no_cache` is set.

use super::InstallContext;
use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::platform;
use crate::recipe::Recipe;
use git2::Repository;
use std::fs;
use std::path::PathBuf;
use tracing::info;

pub fn install(ctx: &InstallContext<'_>, recipe: &Recipe, handle: &str) -> Result<PathBuf> {
    let code = fresh_clone(ctx.layout, recipe, handle)?;
    let built = build_in(&code, recipe)?;

    let binary = ctx.layout.installed_binary(handle);
    if let Some(parent) = binary.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::rename(&built, &binary).map_err(|e| {
        Error::BuildFailed(format!(
            "failed to move built binary {} into the store: {e}",
            built.display()
        ))
    })?;

    if ctx.no_cache {
        info!("Removing source tree (--no-cache)");
        fs::remove_dir_all(&code)?;
    }

    Ok(binary)
}

/// Build without installing: clone, run the build, report the binary path.
/// Used by the `build` command.
pub fn build_only(ctx: &InstallContext<'_>, recipe: &Recipe, handle: &str) -> Result<PathBuf> {
    let code = fresh_clone(ctx.layout, recipe, handle)?;
    let built = build_in(&code, recipe)?;

    if ctx.no_cache {
        info!("Removing source tree (--no-cache)");
        fs::remove_dir_all(&code)?;
    }
    Ok(built)
}

/// Clone a recipe's repository into `code/`, refusing to overwrite an
/// existing tree. Used by the `clone` command.
pub fn clone_into(layout: &Layout, recipe: &Recipe, handle: &str) -> Result<PathBuf> {
    let code = layout.code_dir(handle);
    if code.exists() {
        return Err(Error::AlreadyExists(code));
    }

    info!("Cloning {} into {}", recipe.package.repo, code.display());
    Repository::clone(&recipe.package.repo, &code)?;
    Ok(code)
}

/// Clone into `code/`, replacing any previous tree.
fn fresh_clone(layout: &Layout, recipe: &Recipe, handle: &str) -> Result<PathBuf> {
    let code = layout.code_dir(handle);
    if code.exists() {
        fs::remove_dir_all(&code)?;
    }

    info!("Cloning source code from {}", recipe.package.repo);
    Repository::clone(&recipe.package.repo, &code)?;
    Ok(code)
}

/// Run the build command with the clone as working directory and return
/// the path of the binary it must produce.
fn build_in(code: &std::path::Path, recipe: &Recipe) -> Result<PathBuf> {
    let command = platform::expand_shell_ext(&recipe.build.cmd);
    info!("Executing build command: {}", command);
    platform::run_command_in(&command, Some(code))?;

    let built = code.join(&recipe.build.bin);
    if !built.exists() {
        return Err(Error::BuildFailed(format!(
            "build succeeded but did not produce {}",
            built.display()
        )));
    }
    Ok(built)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HttpClient;
    use crate::install::InstallContext;
    use tempfile::TempDir;

    fn source_recipe(repo: &str) -> Recipe {
        Recipe::from_yaml(&format!(
            r#"
package:
  name: App
  handle: app
  repo: "{repo}"
  version: 0.1.0
build:
  cmd: "sh build.sh"
  bin: out/app
"#
        ))
        .unwrap()
    }

    fn fixture_source_repo(dir: &std::path::Path) {
        let repo = Repository::init(dir).unwrap();
        fs::write(
            dir.join("build.sh"),
            "#!/bin/sh\nmkdir -p out\nprintf built > out/app\n",
        )
        .unwrap();
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = git2::Signature::now("Test", "test@example.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])
            .unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_source_install_builds_and_moves_binary() {
        let upstream = TempDir::new().unwrap();
        fixture_source_repo(upstream.path());

        let data = TempDir::new().unwrap();
        let layout = Layout::new(data.path());
        let client = HttpClient::new().unwrap();
        let ctx = InstallContext {
            layout: &layout,
            client: &client,
            no_cache: false,
        };

        let recipe = source_recipe(upstream.path().to_str().unwrap());
        let binary = install(&ctx, &recipe, "app").unwrap();

        assert_eq!(binary, layout.installed_binary("app"));
        assert_eq!(fs::read(&binary).unwrap(), b"built");
        // Source tree kept by default.
        assert!(layout.code_dir("app").exists());
        assert!(!layout.code_dir("app").join("out/app").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_source_install_no_cache_removes_code() {
        let upstream = TempDir::new().unwrap();
        fixture_source_repo(upstream.path());

        let data = TempDir::new().unwrap();
        let layout = Layout::new(data.path());
        let client = HttpClient::new().unwrap();
        let ctx = InstallContext {
            layout: &layout,
            client: &client,
            no_cache: true,
        };

        let recipe = source_recipe(upstream.path().to_str().unwrap());
        install(&ctx, &recipe, "app").unwrap();
        assert!(!layout.code_dir("app").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_build_reported() {
        let upstream = TempDir::new().unwrap();
        fixture_source_repo(upstream.path());

        let data = TempDir::new().unwrap();
        let layout = Layout::new(data.path());
        let client = HttpClient::new().unwrap();
        let ctx = InstallContext {
            layout: &layout,
            client: &client,
            no_cache: false,
        };

        let mut recipe = source_recipe(upstream.path().to_str().unwrap());
        recipe.build.cmd = "exit 2".to_string();

        let err = install(&ctx, &recipe, "app").unwrap_err();
        assert!(matches!(err, Error::BuildFailed(_)));
    }

    #[test]
    fn test_clone_into_refuses_existing_code() {
        let upstream = TempDir::new().unwrap();
        fixture_source_repo(upstream.path());

        let data = TempDir::new().unwrap();
        let layout = Layout::new(data.path());
        let recipe = source_recipe(upstream.path().to_str().unwrap());

        fs::create_dir_all(layout.code_dir("app")).unwrap();
        let err = clone_into(&layout, &recipe, "app").unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[test]
    fn test_clone_into_fresh_destination() {
        let upstream = TempDir::new().unwrap();
        fixture_source_repo(upstream.path());

        let data = TempDir::new().unwrap();
        let layout = Layout::new(data.path());
        let recipe = source_recipe(upstream.path().to_str().unwrap());

        let code = clone_into(&layout, &recipe, "app").unwrap();
        assert!(code.join("build.sh").exists());
    }
}
