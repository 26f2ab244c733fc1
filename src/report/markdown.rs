//! Markdown rendering of a [DeploymentSummary], in the layout of a GitHub job summary.

use super::short_sha;
use crate::{
    deploy::{Deployment, DeploymentSummary},
    git::RepositoryId,
    transport::CommitSummary,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write;

/// `Merge pull request #12 from acme/feature`
static MERGE_PULL_REQUEST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Merge pull request #(\d+) from (.*)$").unwrap());

/// `Add widgets (#12)`
static INLINE_PULL_REQUEST: Lazy<Regex> = Lazy::new(|| Regex::new(r".*\(#(\d+)\)").unwrap());

/// Renders a [DeploymentSummary] as Markdown.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownReport<'a> {
    repository: &'a RepositoryId,
}

impl<'a> MarkdownReport<'a> {
    pub fn new(repository: &'a RepositoryId) -> Self {
        Self { repository }
    }

    /// Renders the report into a new [String].
    pub fn render(&self, summary: &DeploymentSummary) -> Result<String, std::fmt::Error> {
        let mut buf = String::new();
        self.write_report(&mut buf, summary)?;
        Ok(buf)
    }

    /// Writes the report to the given [Write]r.
    ///
    /// Environments are listed furthest downstream first, i.e. `prod` before `dev`.
    pub fn write_report<W: Write>(&self, w: &mut W, summary: &DeploymentSummary) -> std::fmt::Result {
        writeln!(w, "## Environments\n")?;
        if summary.deployments().is_empty() {
            return writeln!(w, "No successful deployments found.");
        }

        writeln!(w, "| Environment | Status | Details |")?;
        writeln!(w, "| --- | --- | --- |")?;
        for deployment in summary.deployments().iter().rev() {
            self.write_table_row(w, summary, deployment)?;
        }
        writeln!(w)?;

        for deployment in summary.deployments().iter().rev() {
            self.write_environment_section(w, summary, deployment)?;
        }
        Ok(())
    }

    fn write_table_row<W: Write>(
        &self,
        w: &mut W,
        summary: &DeploymentSummary,
        deployment: &Deployment,
    ) -> std::fmt::Result {
        let upstream = summary
            .hierarchy()
            .upstream(&deployment.environment)
            .unwrap_or_default();

        let status = match (&deployment.target_url, deployment.deployment_id) {
            (Some(url), Some(id)) => format!("✅ Deployed from [#{}]({})", id, url),
            (Some(url), None) => format!("✅ Deployed from [job]({})", url),
            (None, _) => "✅ Deployed".to_string(),
        };

        let mut details = format!(
            "SHA: [{}]({})",
            short_sha(&deployment.sha),
            self.repository.commit_url(&deployment.sha)
        );
        if let Some(comparison) = deployment.comparison() {
            let result = comparison.result();
            if result.ahead > 0 {
                write!(
                    details,
                    " \\| {} is {} commits ahead",
                    escape_cell(upstream),
                    result.ahead
                )?;
            }
            if result.behind > 0 {
                write!(
                    details,
                    " \\| {} is {} commits behind",
                    escape_cell(upstream),
                    result.behind
                )?;
            }
        }

        writeln!(
            w,
            "| {} | {} | {} |",
            escape_cell(&deployment.environment),
            status,
            details
        )
    }

    fn write_environment_section<W: Write>(
        &self,
        w: &mut W,
        summary: &DeploymentSummary,
        deployment: &Deployment,
    ) -> std::fmt::Result {
        let environment = &deployment.environment;
        let upstream = summary.hierarchy().upstream(environment);

        writeln!(w, "## {} SUMMARY\n", environment.to_uppercase())?;

        write!(
            w,
            "Last deployed to {}: [{}]({})",
            environment,
            short_sha(&deployment.sha),
            self.repository.commit_url(&deployment.sha)
        )?;
        if let Some(url) = &deployment.target_url {
            write!(w, " from [job]({})", url)?;
        }
        if let Some(url) = &deployment.release_url {
            let name = deployment.git_ref.as_deref().unwrap_or("release");
            write!(w, " via [{}]({})", name, url)?;
        }
        writeln!(w, "\n")?;

        let (Some(upstream), Some(comparison)) = (upstream, deployment.comparison()) else {
            return Ok(());
        };
        let result = comparison.result();

        writeln!(w, "[Compare to {}]({})\n", upstream, result.compare_url)?;
        if comparison.is_degraded() {
            writeln!(w, "_Comparison with {} is unavailable._\n", upstream)?;
            return Ok(());
        }
        if result.commits.is_empty() {
            return Ok(());
        }

        writeln!(w, "#### Commits in {}\n", upstream)?;
        for commit in &result.commits {
            self.write_commit(w, commit)?;
        }
        if let (Some(id), Some(url)) = (deployment.deployment_id, &deployment.target_url) {
            writeln!(w, "\nNot yet deployed to {} since [#{}]({})", environment, id, url)?;
        }
        writeln!(w)
    }

    /// Writes a commit as a list item, linking its pull request if the message names one.
    fn write_commit<W: Write>(&self, w: &mut W, commit: &CommitSummary) -> std::fmt::Result {
        match pull_request(&commit.headline) {
            Some((number, message)) => writeln!(
                w,
                "- {} by @{} in [#{}]({})",
                message,
                commit.author,
                number,
                self.repository.pull_url(number)
            ),
            None => writeln!(
                w,
                "- {} by @{} in [{}]({})",
                commit.headline,
                commit.author,
                short_sha(&commit.sha),
                self.repository.commit_url(&commit.sha)
            ),
        }
    }
}

/// Escapes the column separator within table cell text.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Extracts the pull request number from a commit headline, along with the headline stripped of
/// the reference.
fn pull_request(headline: &str) -> Option<(&str, String)> {
    if let Some(captures) = MERGE_PULL_REQUEST.captures(headline) {
        let number = captures.get(1)?.as_str();
        let rest = captures.get(2).map_or("", |m| m.as_str());
        return Some((number, rest.to_string()));
    }

    let number = INLINE_PULL_REQUEST.captures(headline)?.get(1)?.as_str();
    let message = headline
        .replacen(&format!("(#{})", number), "", 1)
        .trim()
        .to_string();
    Some((number, message))
}
