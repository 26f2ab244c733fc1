//! The subcommands for the `envcheck` application.

use crate::{config::Settings, deploy::DeploymentSummary, errors::EnvCheckResult};
use clap::Subcommand;

mod report;
pub use report::ReportCmd;

mod status;
pub use status::StatusCmd;

#[derive(Debug, Clone, Eq, PartialEq, Subcommand)]
pub enum Subcommands {
    /// Print the chain of environments and how far each one lags its upstream.
    #[clap(aliases = ["s", "st"])]
    Status(StatusCmd),
    /// Render a Markdown deployment report, optionally appending it to the GitHub job summary.
    #[clap(alias = "r")]
    Report(ReportCmd),
}

impl Default for Subcommands {
    fn default() -> Self {
        Self::Status(StatusCmd)
    }
}

impl Subcommands {
    /// Run the subcommand with the assembled [DeploymentSummary].
    pub fn run(self, settings: &Settings, summary: &DeploymentSummary) -> EnvCheckResult<()> {
        match self {
            Self::Status(args) => args.run(summary),
            Self::Report(args) => args.run(settings, summary),
        }
    }
}
