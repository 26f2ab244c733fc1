//! `status` subcommand.

use crate::{deploy::DeploymentSummary, errors::EnvCheckResult, report::write_chain};
use clap::Args;

/// CLI arguments for the `status` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct StatusCmd;

impl StatusCmd {
    /// Run the `status` subcommand.
    pub fn run(self, summary: &DeploymentSummary) -> EnvCheckResult<()> {
        let mut buf = String::new();
        write_chain(&mut buf, summary)?;
        print!("{}", buf);
        Ok(())
    }
}
