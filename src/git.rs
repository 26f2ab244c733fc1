//! Utilities for identifying the GitHub repository that `envcheck` inspects.

use crate::{
    constants::GITHUB_HTML_URL,
    errors::{EnvCheckError, EnvCheckResult},
};
use git2::Repository;
use std::{env, fmt::Display, str::FromStr};

/// Returns the repository for the current working directory, and [None] if
/// the current working directory is not within a git repository or an error
/// occurs.
pub fn active_repository() -> Option<Repository> {
    Repository::discover(env::current_dir().ok()?).ok()
}

/// The `owner/name` identity of a GitHub repository.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct RepositoryId {
    /// The user or organization owning the repository.
    pub owner: String,
    /// The name of the repository.
    pub name: String,
}

impl RepositoryId {
    /// Creates a new [RepositoryId].
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parses a [RepositoryId] out of a git remote URL.
    ///
    /// ## Takes
    /// - `url` - The remote URL, in `https://`, `ssh://` or scp-like (`git@host:owner/name`) form.
    ///
    /// ## Returns
    /// - `Ok(RepositoryId)` - The owner and name of the remote repository.
    /// - `Err(_)` - If the URL does not end with an `owner/name` path.
    pub fn from_remote_url(url: &str) -> EnvCheckResult<Self> {
        let trimmed = url.trim().trim_end_matches('/');
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

        let path = match trimmed.split_once("://") {
            Some((_, rest)) => rest.split_once('/').map(|(_, path)| path),
            None => trimmed.split_once(':').map(|(_, path)| path),
        }
        .ok_or_else(|| EnvCheckError::InvalidRepository(url.to_string()))?;

        let mut segments = path.rsplit('/').filter(|s| !s.is_empty());
        match (segments.next(), segments.next()) {
            (Some(name), Some(owner)) => Ok(Self::new(owner, name)),
            _ => Err(EnvCheckError::InvalidRepository(url.to_string())),
        }
    }

    /// Returns the web URL of the repository.
    pub fn html_url(&self) -> String {
        format!("{}/{}/{}", GITHUB_HTML_URL, self.owner, self.name)
    }

    /// Returns the web URL of a commit.
    pub fn commit_url(&self, sha: &str) -> String {
        format!("{}/commit/{}", self.html_url(), sha)
    }

    /// Returns the web URL comparing `base` to `head`.
    pub fn compare_url(&self, base: &str, head: &str) -> String {
        format!("{}/compare/{}...{}", self.html_url(), base, head)
    }

    /// Returns the web URL of a pull request.
    pub fn pull_url(&self, number: &str) -> String {
        format!("{}/pull/{}", self.html_url(), number)
    }
}

impl FromStr for RepositoryId {
    type Err = EnvCheckError;

    /// Parses `owner/name`, as found in `GITHUB_REPOSITORY`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(EnvCheckError::InvalidRepository(s.to_string())),
        }
    }
}

impl Display for RepositoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Extension trait for the [Repository] type to expose helpers related to the GitHub remote.
pub trait RepositoryExt {
    /// Returns the [RepositoryId] of the `origin` remote.
    ///
    /// ## Returns
    /// - `Result<RepositoryId>` - The owner and name of `origin`, or an error.
    fn origin_repository(&self) -> EnvCheckResult<RepositoryId>;
}

impl RepositoryExt for Repository {
    fn origin_repository(&self) -> EnvCheckResult<RepositoryId> {
        let remote = self.find_remote("origin")?;
        let url = remote
            .url()
            .ok_or_else(|| EnvCheckError::InvalidRepository("origin".to_string()))?;
        RepositoryId::from_remote_url(url)
    }
}
