//! The transport seam between the deployment engine and the GitHub API.

use crate::{errors::EnvCheckResult, git::RepositoryId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

mod github;
pub use github::GitHubTransport;

#[cfg(test)]
pub(crate) mod memory;

/// Read-only access to the deployment history and commit graph of a single repository.
#[async_trait]
pub trait DeploymentTransport: Send + Sync {
    /// The repository this transport talks to.
    fn repository(&self) -> &RepositoryId;

    /// Lists up to `limit` of the most recent deployments to `environment`.
    async fn list_deployments(
        &self,
        environment: &str,
        limit: usize,
    ) -> EnvCheckResult<Vec<DeploymentRecord>>;

    /// Lists up to `limit` statuses of the deployment with the given id.
    async fn list_deployment_statuses(
        &self,
        deployment_id: u64,
        limit: usize,
    ) -> EnvCheckResult<Vec<DeploymentStatus>>;

    /// Returns the SHA of the head commit of `branch`.
    async fn branch_head(&self, branch: &str) -> EnvCheckResult<String>;

    /// Compares `base...head`.
    async fn compare_commits(&self, base: &str, head: &str) -> EnvCheckResult<CommitComparison>;

    /// Looks up the release tagged `tag`. [None] if no such release exists.
    async fn release_by_tag(&self, tag: &str) -> EnvCheckResult<Option<Release>>;
}

/// A single deployment attempt.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct DeploymentRecord {
    pub id: u64,
    pub sha: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub environment: String,
    pub created_at: DateTime<Utc>,
}

/// The state of a [DeploymentStatus].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentState {
    Error,
    Failure,
    Inactive,
    InProgress,
    Queued,
    Pending,
    Success,
    #[serde(other)]
    Unknown,
}

/// A status event posted against a deployment.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct DeploymentStatus {
    pub state: DeploymentState,
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default)]
    pub log_url: Option<String>,
}

/// The result of a `base...head` comparison, as reported by the transport.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CommitComparison {
    /// Commits on `head` that are not on `base`.
    pub ahead_by: u64,
    /// Commits on `base` that are not on `head`.
    pub behind_by: u64,
    pub commits: Vec<CommitSummary>,
    pub html_url: String,
}

/// A commit within a comparison.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CommitSummary {
    pub sha: String,
    /// The GitHub login of the author, or their git name if they have no account.
    pub author: String,
    /// The first line of the commit message.
    pub headline: String,
}

/// A published release.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct Release {
    pub html_url: String,
}
