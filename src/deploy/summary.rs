//! Assembly of a [DeploymentSummary] from a list of environments.

use super::{
    Comparison, ComparisonEngine, Deployment, DeploymentResolver, DeploymentSummary,
    EnvironmentHierarchy, ResolveOptions,
};
use crate::{constants::TRUNK_BRANCH, transport::DeploymentTransport};
use tracing::{debug, info, warn};

/// Runs the hierarchy, resolution and comparison stages over a chain of environments.
#[derive(Debug)]
pub struct SummaryAssembler<'a, T: ?Sized> {
    transport: &'a T,
    trunk: String,
    options: ResolveOptions,
}

/// The output of the resolution stage.
#[derive(Debug)]
struct Resolutions {
    hierarchy: EnvironmentHierarchy,
    /// Resolved deployments, in chain order.
    deployments: Vec<Deployment>,
    /// The head of the trunk branch, if any environment needs it as its upstream.
    trunk_head: Option<String>,
}

impl Resolutions {
    /// Returns the known commit of `name`, which is either an environment or the trunk.
    fn sha(&self, name: &str) -> Option<&str> {
        self.deployments
            .iter()
            .find(|d| d.environment == name)
            .map(|d| d.sha.as_str())
            .or_else(|| {
                (name == self.hierarchy.trunk())
                    .then_some(self.trunk_head.as_deref())
                    .flatten()
            })
    }
}

impl<'a, T: DeploymentTransport + ?Sized> SummaryAssembler<'a, T> {
    /// Creates a new [SummaryAssembler] rooted at the `main` branch, with default history bounds.
    pub fn new(transport: &'a T) -> Self {
        Self {
            transport,
            trunk: TRUNK_BRANCH.to_string(),
            options: ResolveOptions::default(),
        }
    }

    /// Roots the chain at `trunk` instead of `main`.
    pub fn with_trunk(mut self, trunk: impl Into<String>) -> Self {
        self.trunk = trunk.into();
        self
    }

    /// Overrides the history bounds used when resolving deployments.
    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the [DeploymentSummary] for `environments`, in chain order.
    ///
    /// Never fails. Environments that cannot be resolved are left out of the deployment list, and
    /// pairs that cannot be compared are left without a comparison.
    pub async fn assemble<S: AsRef<str>>(&self, environments: &[S]) -> DeploymentSummary {
        let hierarchy = EnvironmentHierarchy::build_with_trunk(environments, &self.trunk);
        if hierarchy.is_empty() {
            debug!("No environments to check");
            return DeploymentSummary::new(hierarchy, Vec::new());
        }
        debug!("Built hierarchy of {} environments", hierarchy.len());

        let resolutions = self.resolve(hierarchy).await;
        debug!(
            "Resolved {} of {} environments",
            resolutions.deployments.len(),
            resolutions.hierarchy.len()
        );

        let summary = self.compare(resolutions).await;
        debug!("Assembled deployment summary");
        summary
    }

    /// Resolves the last successful deployment of every environment, plus the trunk head when the
    /// chain needs it.
    async fn resolve(&self, hierarchy: EnvironmentHierarchy) -> Resolutions {
        let resolver = DeploymentResolver::new(self.transport, &self.trunk, self.options);

        let mut deployments = Vec::with_capacity(hierarchy.len());
        for environment in hierarchy.environments() {
            info!("Checking deployment for environment: {}", environment);
            match resolver.resolve_last_successful(environment).await {
                Ok(Some(deployment)) => {
                    info!("Found deployment SHA for {}: {}", environment, deployment.sha);
                    deployments.push(deployment);
                }
                Ok(None) => warn!("No successful deployment found for {}", environment),
                Err(err) => warn!(
                    "Failed to resolve deployments for {}: {}",
                    environment, err
                ),
            }
        }

        let needs_trunk = hierarchy.iter().any(|(_, upstream)| upstream == self.trunk)
            && !deployments.iter().any(|d| d.environment == self.trunk);
        let trunk_head = if needs_trunk {
            resolver.resolve_trunk_head().await
        } else {
            None
        };

        Resolutions {
            hierarchy,
            deployments,
            trunk_head,
        }
    }

    /// Compares every environment against its upstream, wherever both commits are known.
    async fn compare(&self, resolutions: Resolutions) -> DeploymentSummary {
        let engine = ComparisonEngine::new(self.transport);

        let mut comparisons: Vec<(usize, Comparison)> = Vec::new();
        for (environment, upstream) in resolutions.hierarchy.iter() {
            let (Some(sha), Some(upstream_sha)) =
                (resolutions.sha(environment), resolutions.sha(upstream))
            else {
                warn!(
                    "Cannot compare {} to {} - missing deployment SHA",
                    environment, upstream
                );
                continue;
            };

            let Some(index) = resolutions
                .deployments
                .iter()
                .position(|d| d.environment == environment)
            else {
                continue;
            };

            // Upstream commits missing from the environment are the ones `head` is ahead by.
            comparisons.push((index, engine.compare(sha, upstream_sha).await));
        }

        let Resolutions {
            hierarchy,
            mut deployments,
            ..
        } = resolutions;
        for (index, comparison) in comparisons {
            deployments[index].attach_comparison(comparison);
        }

        DeploymentSummary::new(hierarchy, deployments)
    }
}

#[cfg(test)]
mod test {
    use super::SummaryAssembler;
    use crate::{
        deploy::ResolveOptions,
        transport::memory::{at, MemoryTransport},
    };

    fn chain() -> MemoryTransport {
        MemoryTransport::new()
            .with_branch("main", "m1")
            .with_successful_deployment("dev", 1, "d1", at(30))
            .with_successful_deployment("staging", 2, "s1", at(20))
            .with_successful_deployment("prod", 3, "p1", at(10))
    }

    #[tokio::test]
    async fn full_chain_is_compared() {
        let transport = chain()
            .with_comparison("d1", "m1", 1, 0, vec![])
            .with_comparison("s1", "d1", 3, 0, vec![])
            .with_comparison("p1", "s1", 5, 1, vec![]);

        let summary = SummaryAssembler::new(&transport)
            .assemble(&["dev", "staging", "prod"])
            .await;

        assert_eq!(
            summary.hierarchy().iter().collect::<Vec<_>>(),
            vec![("dev", "main"), ("staging", "dev"), ("prod", "staging")]
        );
        assert_eq!(
            summary
                .deployments()
                .iter()
                .map(|d| d.environment.as_str())
                .collect::<Vec<_>>(),
            vec!["dev", "staging", "prod"]
        );

        let ahead = |env: &str| {
            let comparison = summary.deployment(env).unwrap().comparison().unwrap();
            assert!(!comparison.is_degraded());
            comparison.result().ahead
        };
        assert_eq!(ahead("dev"), 1);
        assert_eq!(ahead("staging"), 3);
        assert_eq!(ahead("prod"), 5);
        assert_eq!(
            summary
                .deployment("prod")
                .unwrap()
                .comparison()
                .unwrap()
                .result()
                .behind,
            1
        );
    }

    #[tokio::test]
    async fn unresolved_environment_keeps_hierarchy_slot() {
        let transport = MemoryTransport::new()
            .with_branch("main", "m1")
            .with_successful_deployment("dev", 1, "d1", at(30))
            .with_successful_deployment("prod", 3, "p1", at(10))
            .with_comparison("d1", "m1", 0, 0, vec![]);

        let summary = SummaryAssembler::new(&transport)
            .assemble(&["dev", "staging", "prod"])
            .await;

        assert_eq!(summary.hierarchy().len(), 3);
        assert_eq!(summary.hierarchy().upstream("staging"), Some("dev"));
        assert_eq!(summary.deployments().len(), 2);
        assert!(summary.deployment("staging").is_none());
        assert!(summary.deployment("dev").unwrap().comparison().is_some());
        assert!(summary.deployment("prod").unwrap().comparison().is_none());
        assert!(!transport
            .calls()
            .iter()
            .any(|c| c.starts_with("compare:p1")));
    }

    #[tokio::test]
    async fn failed_comparison_degrades_entry() {
        let transport = chain().failing_comparisons();

        let summary = SummaryAssembler::new(&transport).assemble(&["dev"]).await;

        let dev = summary.deployment("dev").unwrap();
        let comparison = dev.comparison().unwrap();
        assert!(comparison.is_degraded());
        assert_eq!(comparison.result().ahead, 0);
        assert_eq!(comparison.result().behind, 0);
        assert!(comparison.result().commits.is_empty());
        assert_eq!(
            comparison.result().compare_url,
            "https://github.com/acme/widgets/compare/d1...m1"
        );
    }

    #[tokio::test]
    async fn single_environment() {
        let transport = chain().with_comparison("p1", "m1", 9, 0, vec![]);

        let summary = SummaryAssembler::new(&transport).assemble(&["prod"]).await;

        assert_eq!(
            summary.hierarchy().iter().collect::<Vec<_>>(),
            vec![("prod", "main")]
        );
        assert_eq!(summary.deployments().len(), 1);
        assert_eq!(
            summary
                .deployment("prod")
                .unwrap()
                .comparison()
                .unwrap()
                .result()
                .ahead,
            9
        );
    }

    #[tokio::test]
    async fn resolution_failure_is_contained() {
        let transport = chain()
            .failing_environment("dev")
            .with_comparison("p1", "s1", 0, 0, vec![]);

        let summary = SummaryAssembler::new(&transport)
            .assemble(&["dev", "staging", "prod"])
            .await;

        assert_eq!(summary.deployments().len(), 2);
        assert!(summary.deployment("dev").is_none());
        assert!(summary.deployment("staging").unwrap().comparison().is_none());
        assert!(summary.deployment("prod").unwrap().comparison().is_some());
    }

    #[tokio::test]
    async fn missing_trunk_head_skips_first_comparison() {
        let transport = MemoryTransport::new()
            .with_successful_deployment("dev", 1, "d1", at(30))
            .with_successful_deployment("staging", 2, "s1", at(20))
            .with_comparison("s1", "d1", 2, 0, vec![]);

        let summary = SummaryAssembler::new(&transport)
            .assemble(&["dev", "staging"])
            .await;

        assert!(summary.deployment("dev").unwrap().comparison().is_none());
        assert!(summary.deployment("staging").unwrap().comparison().is_some());
        assert_eq!(
            transport
                .calls()
                .iter()
                .filter(|c| c.starts_with("branch:"))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn no_environments_is_empty_summary() {
        let transport = MemoryTransport::new();

        let summary = SummaryAssembler::new(&transport)
            .assemble::<&str>(&[])
            .await;

        assert!(summary.hierarchy().is_empty());
        assert!(summary.deployments().is_empty());
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn custom_trunk_and_limits() {
        let transport = MemoryTransport::new()
            .with_branch("trunk", "t1")
            .with_successful_deployment("dev", 1, "d1", at(30))
            .with_comparison("d1", "t1", 4, 0, vec![]);

        let summary = SummaryAssembler::new(&transport)
            .with_trunk("trunk")
            .with_options(ResolveOptions {
                history_limit: 3,
                status_limit: 2,
            })
            .assemble(&["dev"])
            .await;

        assert_eq!(summary.hierarchy().upstream("dev"), Some("trunk"));
        assert_eq!(
            summary
                .deployment("dev")
                .unwrap()
                .comparison()
                .unwrap()
                .result()
                .ahead,
            4
        );
    }
}
