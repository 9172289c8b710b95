// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use zoi::Layout;

/// Fresh data root + layout. Keep the TempDir alive to prevent cleanup.
pub fn test_layout() -> (TempDir, Layout) {
    let dir = tempfile::tempdir().unwrap();
    let layout = Layout::new(dir.path());
    (dir, layout)
}

/// Write a local recipe database (index + recipe files) directly into
/// `pkgs/db/`, bypassing git sync.
pub fn write_db(layout: &Layout, recipes: &[(&str, &str, &str)]) {
    let db_dir = layout.db_dir();
    fs::create_dir_all(db_dir.join("pkgs")).unwrap();

    let mut entries = Vec::new();
    for (handle, version, yaml) in recipes {
        fs::write(db_dir.join(format!("pkgs/{handle}.yaml")), yaml).unwrap();
        entries.push(format!(
            r#""{handle}": {{"name": "{handle}", "desc": "test package {handle}", "pkgFile": "pkgs/{handle}.yaml", "version": "{version}"}}"#
        ));
    }

    let index = format!(
        r#"{{"endpoint": "local", "revision": "1", "packages": {{{}}}}}"#,
        entries.join(",")
    );
    fs::write(db_dir.join("pkgs.json"), index).unwrap();
}

/// Initialize a git repository containing a trivial shell build that
/// writes `content` to `out/<name>`.
pub fn fixture_source_repo(dir: &Path, name: &str, content: &str) {
    let repo = git2::Repository::init(dir).unwrap();
    fs::write(
        dir.join("build.sh"),
        format!("#!/bin/sh\nmkdir -p out\nprintf '{content}' > out/{name}\n"),
    )
    .unwrap();
    commit_all(&repo, "initial source");
}

/// Stage everything and commit, with or without a parent.
pub fn commit_all(repo: &git2::Repository, message: &str) {
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = git2::Signature::now("Test", "test@example.com").unwrap();
    let parents = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().unwrap()],
        Err(_) => vec![],
    };
    let parent_refs: Vec<_> = parents.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
        .unwrap();
}

/// YAML for a source-strategy recipe building from a local fixture repo.
pub fn source_recipe_yaml(handle: &str, version: &str, repo: &Path, deps: &[&str]) -> String {
    let depends = if deps.is_empty() {
        String::new()
    } else {
        let mut block = String::from("depends:\n");
        for dep in deps {
            block.push_str(&format!(
                "  - handle: {dep}\n    version: 0.1.0\n    install:\n      pm: zoi\n"
            ));
        }
        block
    };

    format!(
        r#"package:
  name: {handle}
  desc: test package {handle}
  handle: {handle}
  repo: "{}"
  version: {version}
build:
  cmd: "sh build.sh"
  bin: out/{handle}
{depends}"#,
        repo.display()
    )
}

/// Mark a handle installed by hand: store dir, binary, snapshot, link.
pub fn install_stub(layout: &Layout, handle: &str, version: &str) {
    let bin = layout.installed_binary(handle);
    fs::create_dir_all(bin.parent().unwrap()).unwrap();
    fs::write(&bin, b"#!/bin/sh\n").unwrap();

    fs::write(
        layout.snapshot_path(handle),
        format!(
            "package:\n  name: {handle}\n  handle: {handle}\n  version: {version}\n  bin: https://ex.com/{handle}{{ext}}\n"
        ),
    )
    .unwrap();

    layout.link_binary(handle, &bin).unwrap();
}
