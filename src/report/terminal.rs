//! Terminal rendering of a [DeploymentSummary] as a chain rooted at the trunk branch.

use super::short_sha;
use crate::{
    constants::{BOTTOM_LEFT_BOX, COLORS, EMPTY_CIRCLE, FILLED_CIRCLE, HORIZONTAL_BOX},
    deploy::{Deployment, DeploymentSummary},
};
use itertools::Itertools;
use nu_ansi_term::Color;
use std::fmt::Write;

/// Writes the chain of environments contained within the [DeploymentSummary] to the given
/// [Write]r, one line per environment.
///
/// Resolved environments are drawn with a filled circle, unresolved ones with an empty circle.
pub fn write_chain<W: Write>(w: &mut W, summary: &DeploymentSummary) -> std::fmt::Result {
    let trunk = summary.hierarchy().trunk();
    writeln!(w, "{}", COLORS[0].paint(format!("{} {}", EMPTY_CIRCLE, trunk)))?;

    for (depth, environment) in summary.hierarchy().environments().enumerate() {
        let prefix = "  ".repeat(depth);
        let connection = format!("{}{}", BOTTOM_LEFT_BOX, HORIZONTAL_BOX);
        let color = COLORS[(depth + 1) % COLORS.len()];

        let (icon, metadata) = match summary.deployment(environment) {
            Some(deployment) => (FILLED_CIRCLE, deployment_metadata(deployment)),
            None => (
                EMPTY_CIRCLE,
                Color::Red.paint("no successful deployment").to_string(),
            ),
        };

        writeln!(
            w,
            "{}{} {}",
            prefix,
            color.paint(format!("{}{} {}", connection, icon, environment)),
            metadata
        )?;
    }

    Ok(())
}

/// Renders the short SHA and upstream delta of a resolved environment.
fn deployment_metadata(deployment: &Deployment) -> String {
    let sha = Color::Yellow.paint(short_sha(&deployment.sha)).to_string();

    let delta = match deployment.comparison() {
        Some(comparison) if comparison.is_degraded() => {
            Some(Color::Red.italic().paint("(comparison unavailable)").to_string())
        }
        Some(comparison) => {
            let result = comparison.result();
            match (result.ahead, result.behind) {
                (0, 0) => Some(Color::Green.paint("(up to date)").to_string()),
                (ahead, behind) => Some(format!(
                    "(upstream {} ahead, {} behind)",
                    Color::Cyan.paint(ahead.to_string()),
                    Color::Cyan.paint(behind.to_string())
                )),
            }
        }
        None => None,
    };

    [Some(sha), delta].into_iter().flatten().join(" ")
}
