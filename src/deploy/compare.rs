//! Comparison of an environment's deployed commit against its upstream.

use crate::transport::{CommitSummary, DeploymentTransport};
use tracing::{info, warn};

/// How far apart two deployed commits are.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ComparisonResult {
    /// Commits on the upstream that have not reached this environment.
    pub ahead: u64,
    /// Commits on this environment that are not on the upstream.
    pub behind: u64,
    /// The commits between the two, in the order reported by GitHub.
    pub commits: Vec<CommitSummary>,
    /// Link to the comparison on GitHub.
    pub compare_url: String,
}

/// A [ComparisonResult], tagged with whether it was actually fetched.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Comparison {
    /// The comparison was computed by GitHub.
    Fetched(ComparisonResult),
    /// The comparison could not be fetched. Counts are zero, there are no commits, and the URL is
    /// synthesized from the two SHAs.
    Degraded(ComparisonResult),
}

impl Comparison {
    /// Returns the inner [ComparisonResult], regardless of how it was obtained.
    pub fn result(&self) -> &ComparisonResult {
        match self {
            Self::Fetched(result) | Self::Degraded(result) => result,
        }
    }

    /// Returns `true` if the comparison could not be fetched.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }
}

/// Diffs pairs of commits through a [DeploymentTransport].
#[derive(Debug)]
pub struct ComparisonEngine<'a, T: ?Sized> {
    transport: &'a T,
}

impl<'a, T: DeploymentTransport + ?Sized> ComparisonEngine<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    /// Compares `base...head`. `ahead` counts the commits on `head` missing from `base`.
    ///
    /// Never fails: if the transport does, a [Comparison::Degraded] result is returned so that a
    /// missing diff never prevents reporting on the deployments themselves.
    pub async fn compare(&self, base: &str, head: &str) -> Comparison {
        info!("Comparing deployments {}...{}", base, head);

        match self.transport.compare_commits(base, head).await {
            Ok(comparison) => Comparison::Fetched(ComparisonResult {
                ahead: comparison.ahead_by,
                behind: comparison.behind_by,
                commits: comparison.commits,
                compare_url: comparison.html_url,
            }),
            Err(err) => {
                warn!("Error comparing deployments {}...{}: {}", base, head, err);
                Comparison::Degraded(ComparisonResult {
                    compare_url: self.transport.repository().compare_url(base, head),
                    ..Default::default()
                })
            }
        }
    }
}
