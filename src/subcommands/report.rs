//! `report` subcommand.

use crate::{
    config::Settings,
    deploy::DeploymentSummary,
    errors::EnvCheckResult,
    report::{write_outputs, MarkdownReport},
};
use clap::Args;
use std::{fs::OpenOptions, io::Write, path::Path, path::PathBuf};
use tracing::info;

/// CLI arguments for the `report` subcommand.
#[derive(Debug, Clone, Default, Eq, PartialEq, Args)]
pub struct ReportCmd {
    /// Also append the report to this file. Set to the job summary when run in GitHub Actions.
    #[arg(long, env = "GITHUB_STEP_SUMMARY")]
    pub summary_file: Option<PathBuf>,
    /// Append the deployed SHA of every environment to this file, as step outputs.
    #[arg(long, env = "GITHUB_OUTPUT")]
    pub output_file: Option<PathBuf>,
}

impl ReportCmd {
    /// Run the `report` subcommand.
    pub fn run(self, settings: &Settings, summary: &DeploymentSummary) -> EnvCheckResult<()> {
        info!("Generating final summary...");
        let report = MarkdownReport::new(&settings.repository).render(summary)?;
        print!("{}", report);

        if let Some(path) = &self.summary_file {
            append(path, &report)?;
            info!("Wrote job summary to {}", path.display());
        }

        if let Some(path) = &self.output_file {
            let mut outputs = String::new();
            write_outputs(&mut outputs, summary)?;
            append(path, &outputs)?;
        }

        Ok(())
    }
}

/// Appends `contents` to the file at `path`, creating it if needed.
fn append(path: &Path, contents: &str) -> std::io::Result<()> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?
        .write_all(contents.as_bytes())
}
