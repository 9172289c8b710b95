// src/recipe/mod.rs

//! Recipe model
//!
//! A recipe is the immutable YAML declaration of one package version.
//! Parsing is permissive (unknown fields are ignored); `validate` then
//! enforces the model invariants before a recipe is allowed anywhere near
//! the installer. On successful install the recipe is re-serialized
//! verbatim into the store as `zoi.yaml`, the snapshot updates compare
//! against later.

pub mod index;

use crate::error::{Error, Result};
use semver::Version;
use serde::{Deserialize, Serialize};

/// How a validated recipe installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMethod {
    /// Pre-built archive downloaded from `package.bin`
    Binary,
    /// Signed installer script at `package.installer`
    Installer,
    /// Clone `package.repo` and run `build.cmd`
    Source,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub package: PackageMeta,
    #[serde(default, skip_serializing_if = "BuildSpec::is_empty")]
    pub build: BuildSpec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends: Vec<Dependency>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMeta {
    pub name: String,
    #[serde(default)]
    pub desc: String,
    pub handle: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub repo: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installer_sig: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildSpec {
    #[serde(default)]
    pub cmd: String,
    #[serde(default)]
    pub bin: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends: Vec<Dependency>,
}

impl BuildSpec {
    pub fn is_empty(&self) -> bool {
        self.cmd.is_empty() && self.bin.is_empty() && self.depends.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    pub handle: String,
    /// Declared minimum version (advisory at resolve time)
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub install: InstallSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallSpec {
    /// Package manager to delegate to; empty or "zoi" means engine-managed
    #[serde(default)]
    pub pm: String,
    /// Name to pass to the host package manager; falls back to the outer
    /// handle when empty
    #[serde(default)]
    pub handle: String,
}

impl Dependency {
    /// Whether this dependency is resolved by the engine itself.
    pub fn is_engine_managed(&self) -> bool {
        self.install.pm.is_empty() || self.install.pm == "zoi"
    }

    /// The name handed to the host package manager.
    pub fn target_handle(&self) -> &str {
        if self.install.handle.is_empty() {
            &self.handle
        } else {
            &self.install.handle
        }
    }
}

impl Recipe {
    /// Parse a recipe from YAML and validate it.
    pub fn from_yaml(data: &str) -> Result<Self> {
        let recipe = Self::from_yaml_unchecked(data)?;
        recipe.validate()?;
        Ok(recipe)
    }

    /// Parse without validation. Used by `view`, which displays rather
    /// than installs.
    pub fn from_yaml_unchecked(data: &str) -> Result<Self> {
        serde_yaml::from_str(data)
            .map_err(|e| Error::InvalidRecipe(format!("YAML parse error: {e}")))
    }

    /// Enforce the model invariants.
    ///
    /// 1. Exactly one install method (`bin` XOR `installer` XOR source).
    /// 2. `handle` matches `[a-z0-9][a-z0-9._-]*`.
    /// 3. `version` parses as SemVer.
    /// 4. Source builds declare both `build.cmd` and `build.bin`.
    /// 5. `installer` requires `installer_sig`.
    pub fn validate(&self) -> Result<()> {
        let pkg = &self.package;
        let handle = &pkg.handle;

        if !is_valid_handle(handle) {
            return Err(Error::InvalidRecipe(format!(
                "handle '{handle}' must match [a-z0-9][a-z0-9._-]*"
            )));
        }

        Version::parse(&pkg.version).map_err(|e| {
            Error::InvalidRecipe(format!(
                "version '{}' of '{handle}' is not valid SemVer: {e}",
                pkg.version
            ))
        })?;

        if pkg.bin.is_some() && pkg.installer.is_some() {
            return Err(Error::InvalidRecipe(format!(
                "'{handle}' declares both a 'bin' url and an 'installer' url"
            )));
        }

        if pkg.bin.is_none() && pkg.installer.is_none() {
            if self.build.cmd.is_empty() {
                return Err(Error::InvalidRecipe(format!(
                    "'{handle}' must declare a 'bin' url, an 'installer' url, or a 'build' command"
                )));
            }
            if self.build.bin.is_empty() {
                return Err(Error::InvalidRecipe(format!(
                    "source build of '{handle}' must declare 'build.bin'"
                )));
            }
        }

        if pkg.installer.is_some() && pkg.installer_sig.is_none() {
            return Err(Error::InvalidRecipe(format!(
                "'{handle}' has an 'installer' url but no 'installer_sig'"
            )));
        }

        Ok(())
    }

    /// Which installer strategy this recipe selects. Meaningful on
    /// validated recipes.
    pub fn install_method(&self) -> InstallMethod {
        if self.package.installer.is_some() {
            InstallMethod::Installer
        } else if self.package.bin.is_some() {
            InstallMethod::Binary
        } else {
            InstallMethod::Source
        }
    }

    /// Parsed package version.
    pub fn version(&self) -> Result<Version> {
        Version::parse(&self.package.version).map_err(|e| {
            Error::InvalidRecipe(format!(
                "version '{}' is not valid SemVer: {e}",
                self.package.version
            ))
        })
    }

    /// Serialize the snapshot written into the store on install.
    pub fn to_snapshot_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| Error::InvalidRecipe(format!("failed to serialize recipe: {e}")))
    }
}

/// `[a-z0-9][a-z0-9._-]*`
fn is_valid_handle(handle: &str) -> bool {
    let mut chars = handle.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_lowercase() || first.is_ascii_digit()) {
        return false;
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
}
