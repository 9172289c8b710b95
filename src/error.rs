// src/error.rs

//! Crate-wide error types
//!
//! Every fallible core operation returns [`Result`]. Variants follow the
//! failure surface of the engine: recipe lookup, signature verification,
//! archive extraction, network and Git transport, subprocess execution,
//! and store-layout invariants.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Handle not present in the package index (or, for operations on
    /// installed packages, not in the store)
    #[error("package '{0}' not found")]
    UnknownPackage(String),

    /// No recipe file at any candidate raw URL
    #[error("could not find zoi.yaml in 'main' or 'master' branch at {0}")]
    RecipeNotFound(String),

    /// Recipe failed to parse or violates a model invariant
    #[error("invalid recipe: {0}")]
    InvalidRecipe(String),

    /// pkgs.json missing or malformed
    #[error("package index error: {0}")]
    IndexError(String),

    /// No GPG keyring on this system
    #[error("GPG keyring not found; run 'zoi pkg trust' or ensure GnuPG is set up")]
    NoKeyring,

    /// Detached signature did not verify against the payload
    #[error("invalid signature: {0}")]
    SignatureInvalid(String),

    /// Signature parsed but no key in the keyring vouches for it
    #[error("no trusted key in the keyring verifies this signature")]
    UntrustedSigner,

    /// Archive entry would escape the extraction root
    #[error("archive entry escapes extraction root: {0}")]
    UnsafePath(String),

    /// Archive contained no regular file
    #[error("no regular file found in the archive")]
    EmptyArchive,

    /// Archive format not recognized or not supported on this platform
    #[error("unsupported archive format: {0}")]
    UnsupportedArchive(String),

    /// HTTP failure or timeout
    #[error("network error: {0}")]
    NetworkError(String),

    /// Git clone or pull failure
    #[error("git error: {0}")]
    GitError(String),

    /// Source build subprocess exited non-zero
    #[error("build failed: {0}")]
    BuildFailed(String),

    /// Host package manager exited non-zero
    #[error("host package manager '{pm}' failed to install '{package}'")]
    HostPmFailed { pm: String, package: String },

    /// Post-install invariants not met
    #[error("install incomplete: {0}")]
    InstallIncomplete(String),

    /// Refusing to overwrite an existing path
    #[error("destination already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// Underlying I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Attach URL/path context to a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::NetworkError(msg.into())
    }
}

impl From<git2::Error> for Error {
    fn from(e: git2::Error) -> Self {
        Self::GitError(e.message().to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::IndexError(e.to_string())
    }
}
