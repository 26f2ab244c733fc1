//! Resolution of the last successful deployment of an environment.

use super::Deployment;
use crate::{
    constants::{DEFAULT_HISTORY_LIMIT, DEFAULT_STATUS_LIMIT},
    errors::EnvCheckResult,
    transport::{DeploymentState, DeploymentStatus, DeploymentTransport},
};
use tracing::{info, warn};

/// Bounds on how much deployment history is scanned per environment.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ResolveOptions {
    /// The number of most-recent deployments considered.
    pub history_limit: usize,
    /// The number of statuses fetched per deployment.
    pub status_limit: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            status_limit: DEFAULT_STATUS_LIMIT,
        }
    }
}

/// Finds the most recent successful deployment of an environment.
#[derive(Debug)]
pub struct DeploymentResolver<'a, T: ?Sized> {
    transport: &'a T,
    trunk: &'a str,
    options: ResolveOptions,
}

impl<'a, T: DeploymentTransport + ?Sized> DeploymentResolver<'a, T> {
    /// Creates a new [DeploymentResolver].
    ///
    /// ## Takes
    /// - `transport` - The transport to query deployments through.
    /// - `trunk` - The name of the trunk branch.
    /// - `options` - The history bounds of the scan.
    pub fn new(transport: &'a T, trunk: &'a str, options: ResolveOptions) -> Self {
        Self {
            transport,
            trunk,
            options,
        }
    }

    /// Resolves the last successful deployment of `environment`.
    ///
    /// Deployments are visited newest first, and the scan stops at the first one that carries a
    /// `success` status. Older deployments are never queried once a match is found.
    ///
    /// ## Returns
    /// - `Ok(Some(_))` - The most recent deployment with a `success` status.
    /// - `Ok(None)` - None of the scanned deployments succeeded.
    /// - `Err(_)` - The transport failed.
    pub async fn resolve_last_successful(
        &self,
        environment: &str,
    ) -> EnvCheckResult<Option<Deployment>> {
        info!("Finding last successful deployment for {}...", environment);

        let history_limit = self.options.history_limit.max(1);
        let mut candidates = self
            .transport
            .list_deployments(environment, history_limit)
            .await?;

        // Stable sort, so ties keep the transport's order.
        candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        candidates.truncate(history_limit);
        info!(
            "Found {} deployments for {} environment",
            candidates.len(),
            environment
        );

        for candidate in candidates {
            let statuses = self
                .transport
                .list_deployment_statuses(candidate.id, self.options.status_limit.max(1))
                .await?;
            info!(
                "Found {} statuses for deployment {}",
                statuses.len(),
                candidate.id
            );

            let Some(success) = statuses
                .iter()
                .find(|s| s.state == DeploymentState::Success)
            else {
                continue;
            };

            let target_url = job_url(success);
            info!(
                "Found last successful {} deployment: {}",
                environment,
                target_url.as_deref().unwrap_or("<no target url>")
            );
            let release_url = self.release_url(&candidate.git_ref).await;

            return Ok(Some(Deployment {
                target_url,
                deployment_id: Some(candidate.id),
                release_url,
                git_ref: Some(candidate.git_ref),
                ..Deployment::new(environment, candidate.sha)
            }));
        }

        Ok(None)
    }

    /// Resolves the head commit of the trunk branch. Transport failures are logged and yield
    /// [None].
    pub async fn resolve_trunk_head(&self) -> Option<String> {
        match self.transport.branch_head(self.trunk).await {
            Ok(sha) => {
                info!("Using {} branch SHA: {}", self.trunk, sha);
                Some(sha)
            }
            Err(err) => {
                warn!("Unable to get {} branch SHA: {}", self.trunk, err);
                None
            }
        }
    }

    /// Looks up the release published for `git_ref`. Deployments of the trunk branch have none.
    async fn release_url(&self, git_ref: &str) -> Option<String> {
        if git_ref == self.trunk {
            return None;
        }

        match self.transport.release_by_tag(git_ref).await {
            Ok(Some(release)) => {
                info!("Found release URL for {}: {}", git_ref, release.html_url);
                Some(release.html_url)
            }
            Ok(None) => None,
            Err(err) => {
                warn!("Unable to get release URL for {}: {}", git_ref, err);
                None
            }
        }
    }
}

/// Returns the URL of the job behind a deployment status.
///
/// The log URL is preferred over the target URL, and anything from the first `/job/` segment
/// onwards is dropped so the link points at the workflow run.
fn job_url(status: &DeploymentStatus) -> Option<String> {
    [status.log_url.as_deref(), status.target_url.as_deref()]
        .into_iter()
        .flatten()
        .find(|url| !url.is_empty())
        .map(|url| url.split("/job/").next().unwrap_or(url).to_string())
}
