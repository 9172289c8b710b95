// src/forge.rs

//! Git-forge raw-file URL mapping
//!
//! Recipes and indexes live in plain Git repositories on heterogeneous
//! forges. Given a repository URL and a file path, this module constructs
//! the provider-specific raw-file URL and fetches it, trying the `main`
//! branch first and falling back to `master`.

use crate::client::HttpClient;
use crate::error::{Error, Result};
use crate::recipe::index::PackageIndex;
use crate::recipe::Recipe;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

/// Known forge flavors, distinguished by their raw-file URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    GitHub,
    GitLab,
    Gitea,
    Forgejo,
}

impl Provider {
    /// Auto-detect the provider from a repository host.
    pub fn detect(host: &str) -> Option<Self> {
        if host.contains("github.com") {
            Some(Self::GitHub)
        } else if host.contains("gitlab.com") {
            Some(Self::GitLab)
        } else if host.contains("codeberg.org") {
            Some(Self::Gitea)
        } else {
            None
        }
    }
}

/// A repository located on a known forge.
#[derive(Debug, Clone)]
pub struct ForgeRepo {
    provider: Provider,
    host: String,
    /// URL path of the repository, without a `.git` suffix.
    path: String,
}

impl ForgeRepo {
    /// Parse a repository URL, using `hint` when the host is not a known
    /// public forge.
    pub fn parse(repo_url: &str, hint: Option<Provider>) -> Result<Self> {
        let parsed = Url::parse(repo_url)
            .map_err(|e| Error::network(format!("invalid repository URL '{repo_url}': {e}")))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| Error::network(format!("repository URL '{repo_url}' has no host")))?
            .to_string();

        let provider = hint.or_else(|| Provider::detect(&host)).ok_or_else(|| {
            Error::network(format!(
                "unsupported Git provider for '{repo_url}'; \
                 specify one with --github, --gitlab, --gitea, or --forgejo"
            ))
        })?;

        let path = parsed.path().trim_end_matches(".git").to_string();

        Ok(Self {
            provider,
            host,
            path,
        })
    }

    /// Raw-file URL for `file` on `branch`, per the provider's scheme.
    pub fn raw_url(&self, branch: &str, file: &str) -> String {
        let Self { host, path, .. } = self;
        match self.provider {
            Provider::GitHub => {
                format!("https://raw.githubusercontent.com{path}/{branch}/{file}")
            }
            Provider::GitLab => format!("https://{host}{path}/-/raw/{branch}/{file}"),
            Provider::Gitea | Provider::Forgejo => {
                format!("https://{host}{path}/raw/branch/{branch}/{file}")
            }
        }
    }

    /// Location string for error messages.
    pub fn location(&self) -> String {
        format!("{}{}", self.host, self.path)
    }

    /// Fetch a repository file, trying `main` then `master`.
    pub fn fetch_file(&self, client: &HttpClient, file: &str) -> Result<Vec<u8>> {
        for branch in ["main", "master"] {
            let url = self.raw_url(branch, file);
            debug!("Trying {}", url);
            match client.get_bytes(&url) {
                Ok(bytes) => return Ok(bytes),
                Err(e) => info!("No {} on '{}' branch: {}", file, branch, e),
            }
        }
        Err(Error::network(format!(
            "could not download {} from {}",
            file,
            self.location()
        )))
    }
}

/// Fetch the raw `zoi.yaml` at the root of a repository.
pub fn fetch_raw_recipe(
    client: &HttpClient,
    repo_url: &str,
    hint: Option<Provider>,
) -> Result<Vec<u8>> {
    let repo = ForgeRepo::parse(repo_url, hint)?;
    repo.fetch_file(client, "zoi.yaml")
        .map_err(|_| Error::RecipeNotFound(repo.location()))
}

/// Fetch and parse the `zoi.yaml` at the root of a repository.
pub fn fetch_recipe(client: &HttpClient, repo_url: &str, hint: Option<Provider>) -> Result<Recipe> {
    let body = fetch_raw_recipe(client, repo_url, hint)?;
    let recipe: Recipe = serde_yaml::from_str(&String::from_utf8_lossy(&body))
        .map_err(|e| Error::InvalidRecipe(format!("failed to parse remote zoi.yaml: {e}")))?;
    Ok(recipe)
}

/// Fetch the `pkgs.json` index of a remote recipe database.
pub fn fetch_remote_index(
    client: &HttpClient,
    repo_url: &str,
    hint: Option<Provider>,
) -> Result<PackageIndex> {
    let repo = ForgeRepo::parse(repo_url, hint)?;
    let body = repo
        .fetch_file(client, "pkgs.json")
        .map_err(|_| Error::IndexError(format!("no pkgs.json in remote database at {repo_url}")))?;
    PackageIndex::from_json(&body)
}

/// Fetch a recipe's raw bytes through a remote database index.
pub fn fetch_raw_recipe_from_remote_db(
    client: &HttpClient,
    handle: &str,
    repo_url: &str,
    hint: Option<Provider>,
) -> Result<Vec<u8>> {
    let repo = ForgeRepo::parse(repo_url, hint)?;
    let index = fetch_remote_index(client, repo_url, hint)?;
    let entry = index
        .packages
        .get(handle)
        .ok_or_else(|| Error::UnknownPackage(handle.to_string()))?;

    repo.fetch_file(client, &entry.pkg_file).map_err(|_| {
        Error::network(format!(
            "found '{}' in the remote database, but failed to fetch its recipe file {}",
            handle, entry.pkg_file
        ))
    })
}

/// Fetch the detached signature named by a remote index entry.
pub fn fetch_recipe_signature(
    client: &HttpClient,
    handle: &str,
    repo_url: &str,
    hint: Option<Provider>,
) -> Result<Vec<u8>> {
    let repo = ForgeRepo::parse(repo_url, hint)?;
    let index = fetch_remote_index(client, repo_url, hint)?;
    let entry = index
        .packages
        .get(handle)
        .ok_or_else(|| Error::UnknownPackage(handle.to_string()))?;

    let sig_file = entry.sig_file.as_deref().ok_or_else(|| {
        Error::SignatureInvalid(format!("no signature file listed for recipe '{handle}'"))
    })?;

    repo.fetch_file(client, sig_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_provider() {
        assert_eq!(Provider::detect("github.com"), Some(Provider::GitHub));
        assert_eq!(Provider::detect("gitlab.com"), Some(Provider::GitLab));
        assert_eq!(Provider::detect("codeberg.org"), Some(Provider::Gitea));
        assert_eq!(Provider::detect("git.example.com"), None);
    }

    #[test]
    fn test_github_raw_url() {
        let repo = ForgeRepo::parse("https://github.com/acme/tool.git", None).unwrap();
        assert_eq!(
            repo.raw_url("main", "zoi.yaml"),
            "https://raw.githubusercontent.com/acme/tool/main/zoi.yaml"
        );
    }

    #[test]
    fn test_gitlab_raw_url() {
        let repo = ForgeRepo::parse("https://gitlab.com/acme/tool", None).unwrap();
        assert_eq!(
            repo.raw_url("master", "pkgs.json"),
            "https://gitlab.com/acme/tool/-/raw/master/pkgs.json"
        );
    }

    #[test]
    fn test_gitea_raw_url() {
        let repo = ForgeRepo::parse("https://codeberg.org/acme/tool.git", None).unwrap();
        assert_eq!(
            repo.raw_url("main", "zoi.yaml"),
            "https://codeberg.org/acme/tool/raw/branch/main/zoi.yaml"
        );
    }

    #[test]
    fn test_hint_overrides_unknown_host() {
        let repo =
            ForgeRepo::parse("https://forge.internal/acme/tool", Some(Provider::Forgejo)).unwrap();
        assert_eq!(
            repo.raw_url("main", "zoi.yaml"),
            "https://forge.internal/acme/tool/raw/branch/main/zoi.yaml"
        );
    }

    #[test]
    fn test_unknown_host_without_hint_fails() {
        let err = ForgeRepo::parse("https://forge.internal/acme/tool", None).unwrap_err();
        assert!(matches!(err, Error::NetworkError(_)));
    }

    #[test]
    fn test_provider_serde_lowercase() {
        assert_eq!(
            serde_yaml::to_string(&Provider::GitHub).unwrap().trim(),
            "github"
        );
        let p: Provider = serde_yaml::from_str("forgejo").unwrap();
        assert_eq!(p, Provider::Forgejo);
    }
}
