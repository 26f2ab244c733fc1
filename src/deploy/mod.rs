//! Resolution and comparison of the deployments along a chain of environments.
//!
//! The pipeline runs in fixed stages, each consuming the output of the previous one:
//!
//! 1. [EnvironmentHierarchy] - who is upstream of whom.
//! 2. [DeploymentResolver] - the last successful deployment of every environment.
//! 3. [ComparisonEngine] - each environment diffed against its upstream.
//! 4. [SummaryAssembler] - all of the above folded into one [DeploymentSummary].

mod compare;
pub use compare::{Comparison, ComparisonEngine};
#[cfg(test)]
pub(crate) use compare::ComparisonResult;

mod hierarchy;
pub use hierarchy::EnvironmentHierarchy;

mod resolver;
pub use resolver::{DeploymentResolver, ResolveOptions};

mod summary;
pub use summary::SummaryAssembler;

/// The last successful deployment of a single environment.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Deployment {
    /// The environment that was deployed to.
    pub environment: String,
    /// The deployed commit.
    pub sha: String,
    /// Link to the job that performed the deployment.
    pub target_url: Option<String>,
    /// The GitHub id of the deployment.
    pub deployment_id: Option<u64>,
    /// The ref (branch or tag) that was deployed.
    pub git_ref: Option<String>,
    /// Link to the release matching [Deployment::git_ref], if one exists.
    pub release_url: Option<String>,
    /// How this environment compares to its upstream. Attached once by the [SummaryAssembler].
    comparison: Option<Comparison>,
}

impl Deployment {
    /// Creates a new [Deployment] of `sha` to `environment`, with no metadata.
    pub fn new(environment: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            sha: sha.into(),
            target_url: None,
            deployment_id: None,
            git_ref: None,
            release_url: None,
            comparison: None,
        }
    }

    /// Returns the comparison against the upstream environment, if one could be made.
    pub fn comparison(&self) -> Option<&Comparison> {
        self.comparison.as_ref()
    }

    /// Attaches the comparison against the upstream environment.
    ///
    /// ## Panics
    /// - In debug builds, if a comparison was already attached.
    pub(crate) fn attach_comparison(&mut self, comparison: Comparison) {
        debug_assert!(
            self.comparison.is_none(),
            "comparison for `{}` attached twice",
            self.environment
        );
        self.comparison = Some(comparison);
    }
}

/// The result of one run over a chain of environments.
///
/// Environments without a resolvable deployment keep their slot in the hierarchy, but are absent
/// from the deployment list.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct DeploymentSummary {
    hierarchy: EnvironmentHierarchy,
    deployments: Vec<Deployment>,
}

impl DeploymentSummary {
    pub(crate) fn new(hierarchy: EnvironmentHierarchy, deployments: Vec<Deployment>) -> Self {
        Self {
            hierarchy,
            deployments,
        }
    }

    /// The upstream chain of the requested environments.
    pub fn hierarchy(&self) -> &EnvironmentHierarchy {
        &self.hierarchy
    }

    /// The resolved deployments, in chain order.
    pub fn deployments(&self) -> &[Deployment] {
        &self.deployments
    }

    /// Returns the deployment of `environment`, if it was resolved.
    pub fn deployment(&self, environment: &str) -> Option<&Deployment> {
        self.deployments
            .iter()
            .find(|d| d.environment == environment)
    }
}
