// src/recipe/index.rs

//! Package index (`pkgs.json`)
//!
//! The recipe database carries a single JSON index mapping handles to
//! recipe files. Keys are camelCase on the wire (`pkgFile`, `sigFile`).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageIndex {
    /// Canonical endpoint this index was generated from
    #[serde(default)]
    pub endpoint: String,
    /// Database revision identifier
    #[serde(default)]
    pub revision: String,
    #[serde(default)]
    pub packages: BTreeMap<String, IndexEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub name: String,
    #[serde(default)]
    pub desc: String,
    /// Recipe file path, relative to the database root
    pub pkg_file: String,
    #[serde(default)]
    pub version: String,
    /// Detached signature for the recipe file, if published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig_file: Option<String>,
}

impl PackageIndex {
    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data)
            .map_err(|e| Error::IndexError(format!("malformed pkgs.json: {e}")))
    }

    /// Look a handle up, mapping absence to `UnknownPackage`.
    pub fn get(&self, handle: &str) -> Result<&IndexEntry> {
        self.packages
            .get(handle)
            .ok_or_else(|| Error::UnknownPackage(handle.to_string()))
    }

    /// Case-insensitive substring search over handle and description.
    pub fn search(&self, keyword: &str) -> Vec<(&String, &IndexEntry)> {
        let keyword = keyword.to_lowercase();
        self.packages
            .iter()
            .filter(|(handle, entry)| {
                handle.to_lowercase().contains(&keyword)
                    || entry.desc.to_lowercase().contains(&keyword)
            })
            .collect()
    }
}
