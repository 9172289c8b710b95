// tests/doctor_workflow.rs

//! Doctor scans over healthy and damaged stores.

mod common;

use common::{install_stub, test_layout};
use std::fs;
use zoi::doctor;

#[cfg(unix)]
#[test]
fn healthy_store_reports_clean() {
    let (_dir, layout) = test_layout();
    install_stub(&layout, "tool", "1.0.0");
    install_stub(&layout, "other", "2.0.0");

    let report = doctor::scan(&layout).unwrap();
    assert!(report.is_clean());
}

#[cfg(unix)]
#[test]
fn manually_deleted_link_shows_store_as_orphan() {
    let (_dir, layout) = test_layout();
    install_stub(&layout, "tool", "1.0.0");

    // Operator removes bins/tool by hand.
    fs::remove_file(layout.bin_link("tool")).unwrap();

    let report = doctor::scan(&layout).unwrap();
    assert_eq!(report.orphaned_stores, vec!["tool"]);
    assert!(report.broken_links.is_empty());

    // Confirmed cleanup removes the store payload.
    doctor::remove_orphaned_stores(&layout, &report.orphaned_stores).unwrap();
    assert!(!layout.store_dir("tool").exists());
}

#[cfg(unix)]
#[test]
fn crash_debris_is_fully_recoverable() {
    let (_dir, layout) = test_layout();

    // One healthy package, one dangling link, one leftover build tree.
    install_stub(&layout, "healthy", "1.0.0");

    install_stub(&layout, "broken", "1.0.0");
    fs::remove_dir_all(layout.store_dir("broken")).unwrap();

    install_stub(&layout, "cached", "1.0.0");
    fs::create_dir_all(layout.code_dir("cached")).unwrap();

    let report = doctor::scan(&layout).unwrap();
    assert_eq!(report.broken_links, vec!["broken"]);
    assert_eq!(report.leftover_code, vec!["cached"]);
    assert!(report.orphaned_stores.is_empty());

    doctor::remove_broken_links(&layout, &report.broken_links).unwrap();
    doctor::remove_leftover_code(&layout, &report.leftover_code).unwrap();

    let after = doctor::scan(&layout).unwrap();
    assert!(after.is_clean());
    // The healthy package is untouched.
    assert!(layout.is_installed("healthy"));
    assert!(layout.bin_link("healthy").symlink_metadata().is_ok());
}
