// tests/update_flow.rs

//! Update engine: version comparison and full reinstall.

mod common;

use common::{commit_all, fixture_source_repo, source_recipe_yaml, test_layout, write_db};
use std::fs;
use zoi::client::HttpClient;
use zoi::{update, RecipeDb};

#[cfg(unix)]
#[test]
fn update_promotes_to_latest_version() {
    let (_dir, layout) = test_layout();

    let repo = tempfile::tempdir().unwrap();
    fixture_source_repo(repo.path(), "tool", "v2-payload");

    // Installed snapshot says 1.0.0; the database carries 1.1.0.
    let installed_yaml = source_recipe_yaml("tool", "1.0.0", repo.path(), &[]);
    let latest_yaml = source_recipe_yaml("tool", "1.1.0", repo.path(), &[]);
    write_db(&layout, &[("tool", "1.1.0", &latest_yaml)]);

    fs::create_dir_all(layout.store_dir("tool")).unwrap();
    fs::write(layout.snapshot_path("tool"), &installed_yaml).unwrap();

    let db = RecipeDb::new(layout.clone());
    let check = update::check(&db, "tool").unwrap();
    assert!(check.needs_update);
    assert_eq!(check.current.to_string(), "1.0.0");
    assert_eq!(check.latest.to_string(), "1.1.0");

    let client = HttpClient::new().unwrap();
    update::reinstall(&layout, &db, &client, "tool", false).unwrap();

    // The reinstalled snapshot is the latest recipe; the binary is the
    // fresh build.
    let snapshot = fs::read_to_string(layout.snapshot_path("tool")).unwrap();
    assert!(snapshot.contains("version: 1.1.0"));
    assert_eq!(
        fs::read(layout.installed_binary("tool")).unwrap(),
        b"v2-payload"
    );
    assert!(layout.bin_link("tool").symlink_metadata().is_ok());
}

#[cfg(unix)]
#[test]
fn reinstall_failure_leaves_package_uninstalled() {
    let (_dir, layout) = test_layout();

    // The latest recipe points at a repository that does not exist.
    let latest_yaml = r#"package:
  name: tool
  handle: tool
  repo: /nonexistent/repo/path
  version: 1.1.0
build:
  cmd: "sh build.sh"
  bin: out/tool
"#;
    write_db(&layout, &[("tool", "1.1.0", latest_yaml)]);

    common::install_stub(&layout, "tool", "1.0.0");

    let db = RecipeDb::new(layout.clone());
    let client = HttpClient::new().unwrap();
    assert!(update::reinstall(&layout, &db, &client, "tool", false).is_err());

    // Old version was removed before the failed install.
    assert!(!layout.is_installed("tool"));
    assert!(layout.bin_link("tool").symlink_metadata().is_err());
}

#[cfg(unix)]
#[test]
fn collect_updates_only_reports_outdated_packages() {
    let (_dir, layout) = test_layout();

    let repo = tempfile::tempdir().unwrap();
    fixture_source_repo(repo.path(), "old", "payload");
    commit_all(&git2::Repository::open(repo.path()).unwrap(), "noop");

    let old_installed = source_recipe_yaml("old", "1.0.0", repo.path(), &[]);
    let old_latest = source_recipe_yaml("old", "2.0.0", repo.path(), &[]);
    let fresh_yaml = source_recipe_yaml("fresh", "1.0.0", repo.path(), &[]);
    write_db(
        &layout,
        &[("old", "2.0.0", &old_latest), ("fresh", "1.0.0", &fresh_yaml)],
    );

    for (handle, yaml) in [("old", &old_installed), ("fresh", &fresh_yaml)] {
        fs::create_dir_all(layout.store_dir(handle)).unwrap();
        fs::write(layout.snapshot_path(handle), yaml).unwrap();
    }

    let db = RecipeDb::new(layout.clone());
    assert_eq!(update::collect_updates(&layout, &db), vec!["old"]);
}
