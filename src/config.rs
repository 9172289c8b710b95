// src/config.rs

//! Persisted engine configuration
//!
//! A small YAML file at `<config-root>/config.yaml`. Every field is
//! optional on disk; accessors fill in the defaults. A missing file is a
//! valid (all-defaults) configuration.

use crate::error::{Error, Result};
use crate::forge::Provider;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Canonical remote of the recipe database, used when no endpoint is
/// configured.
pub const DEFAULT_ENDPOINT: &str = "https://gitlab.com/Zusty/Zoi-Pkgs.git";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Git URL of the recipe database
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Default forge provider for raw-URL construction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_hint: Option<Provider>,

    /// Filesystem prefix for the store; defaults to `~/.zoi`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_root: Option<PathBuf>,
}

impl Config {
    /// Load the configuration, treating a missing file as defaults.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        match fs::read_to_string(&path) {
            Ok(data) => serde_yaml::from_str(&data).map_err(|e| {
                Error::InvalidRecipe(format!("malformed config at {}: {}", path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist the configuration, creating the config directory if needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_yaml::to_string(self)
            .map_err(|e| Error::InvalidRecipe(format!("failed to serialize config: {}", e)))?;
        fs::write(&path, data)?;
        Ok(())
    }

    /// Path of the config file: `<config-root>/zoi/config.yaml`.
    pub fn path() -> Result<PathBuf> {
        let base = dirs::config_dir().ok_or_else(|| {
            Error::Io(std::io::Error::other("could not determine config directory"))
        })?;
        Ok(base.join("zoi").join("config.yaml"))
    }

    /// The configured endpoint, or the canonical default.
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    /// Root of the on-disk store tree (`<data_root>/pkgs/...`).
    pub fn data_root(&self) -> Result<PathBuf> {
        if let Some(root) = &self.data_root {
            return Ok(root.clone());
        }
        let home = dirs::home_dir().ok_or_else(|| {
            Error::Io(std::io::Error::other("could not determine home directory"))
        })?;
        Ok(home.join(".zoi"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let cfg = Config::default();
        assert_eq!(cfg.endpoint(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_explicit_endpoint_wins() {
        let cfg = Config {
            endpoint: Some("https://example.com/pkgs.git".to_string()),
            ..Default::default()
        };
        assert_eq!(cfg.endpoint(), "https://example.com/pkgs.git");
    }

    #[test]
    fn test_config_roundtrip_yaml() {
        let cfg = Config {
            endpoint: Some("https://example.com/db.git".to_string()),
            provider_hint: Some(Provider::GitLab),
            data_root: Some(PathBuf::from("/tmp/zoi-root")),
        };
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let back: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.endpoint(), "https://example.com/db.git");
        assert_eq!(back.provider_hint, Some(Provider::GitLab));
        assert_eq!(back.data_root, Some(PathBuf::from("/tmp/zoi-root")));
    }

    #[test]
    fn test_empty_yaml_is_defaults() {
        let cfg: Config = serde_yaml::from_str("{}").unwrap();
        assert!(cfg.endpoint.is_none());
        assert!(cfg.provider_hint.is_none());
    }
}
