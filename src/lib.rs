// src/lib.rs

//! Zoi Package Engine
//!
//! Core of a cross-platform package manager driven by YAML recipes hosted
//! in Git-backed recipe databases.
//!
//! # Architecture
//!
//! - Recipes: immutable YAML declarations of a package version, fetched
//!   from a synced database clone or straight off a Git forge
//! - Store: one directory per installed package, activated by an atomic
//!   symlink in `bins/`
//! - Strategies: pre-built binary, signed installer script, or
//!   build-from-source, unified behind one post-install step
//! - Resolver: depth-first dependency resolution, delegating system
//!   dependencies to the host package manager

pub mod archive;
pub mod client;
pub mod commands;
pub mod config;
pub mod db;
pub mod doctor;
mod error;
pub mod forge;
pub mod install;
pub mod layout;
pub mod lock;
pub mod platform;
pub mod recipe;
pub mod resolver;
pub mod update;
pub mod verify;

pub use config::Config;
pub use db::{RecipeDb, SyncOutcome};
pub use error::{Error, Result};
pub use layout::Layout;
pub use recipe::{Dependency, InstallMethod, Recipe};
pub use resolver::Resolver;
