//! In-memory [DeploymentTransport] used by the unit tests.

use super::{
    CommitComparison, CommitSummary, DeploymentRecord, DeploymentState, DeploymentStatus,
    DeploymentTransport, Release,
};
use crate::{errors::EnvCheckResult, git::RepositoryId};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::{
    collections::{HashMap, HashSet},
    io::{Error, ErrorKind},
    sync::Mutex,
};

/// A scripted [DeploymentTransport] that records every call it receives.
#[derive(Debug)]
pub(crate) struct MemoryTransport {
    repository: RepositoryId,
    deployments: HashMap<String, Vec<DeploymentRecord>>,
    statuses: HashMap<u64, Vec<DeploymentStatus>>,
    branches: HashMap<String, String>,
    comparisons: HashMap<(String, String), CommitComparison>,
    releases: HashMap<String, Release>,
    failing_environments: HashSet<String>,
    failing_comparisons: bool,
    calls: Mutex<Vec<String>>,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self {
            repository: RepositoryId::new("acme", "widgets"),
            deployments: HashMap::new(),
            statuses: HashMap::new(),
            branches: HashMap::new(),
            comparisons: HashMap::new(),
            releases: HashMap::new(),
            failing_environments: HashSet::new(),
            failing_comparisons: false,
            calls: Mutex::new(Vec::new()),
        }
    }
}

/// Returns a deterministic timestamp `minutes` after a fixed epoch.
pub(crate) fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
}

/// Returns a status with the given state and target URL.
pub(crate) fn status(state: DeploymentState, target_url: &str) -> DeploymentStatus {
    DeploymentStatus {
        state,
        target_url: Some(target_url.to_string()),
        log_url: None,
    }
}

impl MemoryTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a deployment of `sha` to `environment`, with the given statuses.
    pub(crate) fn with_deployment(
        mut self,
        environment: &str,
        id: u64,
        sha: &str,
        git_ref: &str,
        created_at: DateTime<Utc>,
        statuses: Vec<DeploymentStatus>,
    ) -> Self {
        self.deployments
            .entry(environment.to_string())
            .or_default()
            .push(DeploymentRecord {
                id,
                sha: sha.to_string(),
                git_ref: git_ref.to_string(),
                environment: environment.to_string(),
                created_at,
            });
        self.statuses.insert(id, statuses);
        self
    }

    /// Registers a deployment with a single `success` status.
    pub(crate) fn with_successful_deployment(
        self,
        environment: &str,
        id: u64,
        sha: &str,
        created_at: DateTime<Utc>,
    ) -> Self {
        let target_url = format!("https://ci.example.com/{}/runs/{}", environment, id);
        self.with_deployment(
            environment,
            id,
            sha,
            "main",
            created_at,
            vec![status(DeploymentState::Success, &target_url)],
        )
    }

    pub(crate) fn with_branch(mut self, branch: &str, sha: &str) -> Self {
        self.branches.insert(branch.to_string(), sha.to_string());
        self
    }

    pub(crate) fn with_comparison(
        mut self,
        base: &str,
        head: &str,
        ahead_by: u64,
        behind_by: u64,
        commits: Vec<CommitSummary>,
    ) -> Self {
        let html_url = self.repository.compare_url(base, head);
        self.comparisons.insert(
            (base.to_string(), head.to_string()),
            CommitComparison {
                ahead_by,
                behind_by,
                commits,
                html_url,
            },
        );
        self
    }

    pub(crate) fn with_release(mut self, tag: &str, html_url: &str) -> Self {
        self.releases.insert(
            tag.to_string(),
            Release {
                html_url: html_url.to_string(),
            },
        );
        self
    }

    /// Makes every deployment listing for `environment` fail.
    pub(crate) fn failing_environment(mut self, environment: &str) -> Self {
        self.failing_environments.insert(environment.to_string());
        self
    }

    /// Makes every comparison fail.
    pub(crate) fn failing_comparisons(mut self) -> Self {
        self.failing_comparisons = true;
        self
    }

    /// Returns the calls received so far, in order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DeploymentTransport for MemoryTransport {
    fn repository(&self) -> &RepositoryId {
        &self.repository
    }

    async fn list_deployments(
        &self,
        environment: &str,
        limit: usize,
    ) -> EnvCheckResult<Vec<DeploymentRecord>> {
        self.record(format!("deployments:{}", environment));
        if self.failing_environments.contains(environment) {
            return Err(Error::new(ErrorKind::ConnectionReset, "connection reset").into());
        }

        // Returned in registration order, so callers must not rely on the transport sorting.
        let mut deployments = self.deployments.get(environment).cloned().unwrap_or_default();
        deployments.truncate(limit);
        Ok(deployments)
    }

    async fn list_deployment_statuses(
        &self,
        deployment_id: u64,
        limit: usize,
    ) -> EnvCheckResult<Vec<DeploymentStatus>> {
        self.record(format!("statuses:{}", deployment_id));
        let mut statuses = self.statuses.get(&deployment_id).cloned().unwrap_or_default();
        statuses.truncate(limit);
        Ok(statuses)
    }

    async fn branch_head(&self, branch: &str) -> EnvCheckResult<String> {
        self.record(format!("branch:{}", branch));
        self.branches
            .get(branch)
            .cloned()
            .ok_or_else(|| {
                Error::new(ErrorKind::NotFound, format!("branch {} not found", branch)).into()
            })
    }

    async fn compare_commits(&self, base: &str, head: &str) -> EnvCheckResult<CommitComparison> {
        self.record(format!("compare:{}...{}", base, head));
        if self.failing_comparisons {
            return Err(Error::new(ErrorKind::ConnectionAborted, "bad gateway").into());
        }
        self.comparisons
            .get(&(base.to_string(), head.to_string()))
            .cloned()
            .ok_or_else(|| {
                Error::new(ErrorKind::NotFound, format!("no comparison {}...{}", base, head)).into()
            })
    }

    async fn release_by_tag(&self, tag: &str) -> EnvCheckResult<Option<Release>> {
        self.record(format!("release:{}", tag));
        Ok(self.releases.get(tag).cloned())
    }
}
