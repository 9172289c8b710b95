// tests/store_lifecycle.rs

//! Store layout lifecycle: activation, idempotence, and uninstall.

mod common;

use common::{install_stub, test_layout};
use std::fs;

#[cfg(unix)]
#[test]
fn uninstall_reverses_install() {
    let (_dir, layout) = test_layout();
    install_stub(&layout, "tool", "1.0.0");

    assert!(layout.is_installed("tool"));
    assert!(layout.bin_link("tool").symlink_metadata().is_ok());

    layout.remove_package("tool").unwrap();

    assert!(!layout.store_dir("tool").exists());
    assert!(layout.bin_link("tool").symlink_metadata().is_err());
}

#[cfg(unix)]
#[test]
fn activation_never_dangles() {
    let (_dir, layout) = test_layout();

    // Linking before the binary exists is refused outright.
    let missing = layout.installed_binary("tool");
    assert!(layout.link_binary("tool", &missing).is_err());
    assert!(layout.bin_link("tool").symlink_metadata().is_err());

    // After the payload lands, activation succeeds and resolves.
    install_stub(&layout, "tool", "1.0.0");
    let resolved = fs::canonicalize(layout.bin_link("tool")).unwrap();
    assert_eq!(resolved, fs::canonicalize(layout.installed_binary("tool")).unwrap());
}

#[cfg(unix)]
#[test]
fn relink_swaps_atomically_over_old_link() {
    let (_dir, layout) = test_layout();
    install_stub(&layout, "tool", "1.0.0");

    let replacement = layout.bin_store_dir("tool").join("tool-new");
    fs::write(&replacement, b"#!/bin/sh\nnew\n").unwrap();
    layout.link_binary("tool", &replacement).unwrap();

    assert_eq!(fs::read_link(layout.bin_link("tool")).unwrap(), replacement);
    // The staging path used for the swap does not linger.
    assert!(!layout.bins_dir().join(".tool.tmp").exists());
}

#[cfg(unix)]
#[test]
fn repeated_install_stub_is_idempotent() {
    let (_dir, layout) = test_layout();
    install_stub(&layout, "tool", "1.0.0");
    let snapshot_before = fs::read_to_string(layout.snapshot_path("tool")).unwrap();

    install_stub(&layout, "tool", "1.0.0");
    let snapshot_after = fs::read_to_string(layout.snapshot_path("tool")).unwrap();

    assert_eq!(snapshot_before, snapshot_after);
    assert_eq!(layout.installed_handles(), vec!["tool"]);
}

#[test]
fn installed_handles_ignores_files_in_store_root() {
    let (_dir, layout) = test_layout();
    fs::create_dir_all(layout.store_root()).unwrap();
    fs::write(layout.store_root().join("stray-file"), b"junk").unwrap();
    fs::create_dir_all(layout.store_dir("real")).unwrap();

    assert_eq!(layout.installed_handles(), vec!["real"]);
}
