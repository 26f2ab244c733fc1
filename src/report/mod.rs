//! Renderers for a [DeploymentSummary].
//!
//! [DeploymentSummary]: crate::deploy::DeploymentSummary

mod markdown;
pub use markdown::MarkdownReport;

mod terminal;
pub use terminal::write_chain;

use crate::{constants::SHORT_SHA_LEN, deploy::DeploymentSummary};
use std::fmt::Write;

/// Returns the abbreviated form of a commit SHA.
pub(crate) fn short_sha(sha: &str) -> &str {
    sha.get(..SHORT_SHA_LEN).unwrap_or(sha)
}

/// Writes one `last_successful_deployment_sha_<environment>=<sha>` line per resolved environment,
/// in the format expected by `GITHUB_OUTPUT`.
pub fn write_outputs<W: Write>(w: &mut W, summary: &DeploymentSummary) -> std::fmt::Result {
    summary.deployments().iter().try_for_each(|deployment| {
        writeln!(
            w,
            "last_successful_deployment_sha_{}={}",
            deployment.environment, deployment.sha
        )
    })
}
