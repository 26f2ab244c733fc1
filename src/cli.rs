//! The CLI for `envcheck`.

use crate::{
    config::{origin_repository, ConfigFile, Overrides, Settings},
    deploy::SummaryAssembler,
    subcommands::Subcommands,
    transport::GitHubTransport,
};
use anyhow::{anyhow, Result};
use clap::{
    builder::styling::{AnsiColor, Color, Style},
    ArgAction, Parser,
};
use std::path::PathBuf;
use tracing::Level;

const ABOUT: &str =
    "envcheck reports the last successful deployment of each environment in a chain, and how far each one lags its upstream.";

/// The CLI application for `envcheck`.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
#[command(about = ABOUT, version, styles = cli_styles())]
pub struct Cli {
    /// Verbosity level (0-4)
    #[arg(short, action = ArgAction::Count, global = true)]
    pub v: u8,
    /// Path to the config file. Defaults to `.envcheck.toml` at the root of the repository.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// The repository to inspect, as `owner/name`. Defaults to the `origin` remote.
    #[arg(long, env = "GITHUB_REPOSITORY", global = true)]
    pub repo: Option<String>,
    /// The GitHub token used to query deployments.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,
    /// The environments to check, upstream first (e.g. `dev,staging,prod`).
    #[arg(
        short,
        long,
        env = "ENVIRONMENTS_TO_CHECK",
        value_delimiter = ',',
        global = true
    )]
    pub environments: Vec<String>,
    /// The trunk branch the first environment is compared against. Defaults to `main`.
    #[arg(long, global = true)]
    pub trunk: Option<String>,
    /// The number of recent deployments scanned per environment. Defaults to 15.
    #[arg(long, global = true)]
    pub history_limit: Option<usize>,
    /// The number of statuses fetched per deployment. Defaults to 5.
    #[arg(long, global = true)]
    pub status_limit: Option<usize>,
    /// The subcommand to run. Defaults to `status`.
    #[clap(subcommand)]
    pub subcommand: Option<Subcommands>,
}

impl Cli {
    /// Run the CLI application with the given arguments.
    pub async fn run(self) -> Result<()> {
        let cli = self.init_tracing_subscriber()?;

        let file = ConfigFile::load_or_default(cli.config.as_deref())?;
        let settings = Settings::resolve(cli.overrides(), file, origin_repository)?;

        let transport = GitHubTransport::new(settings.repository.clone(), settings.token.clone())?;
        let summary = SummaryAssembler::new(&transport)
            .with_trunk(settings.trunk.as_str())
            .with_options(settings.options)
            .assemble(settings.environments.as_slice())
            .await;

        cli.subcommand
            .unwrap_or_default()
            .run(&settings, &summary)
            .map_err(Into::into)
    }

    /// Collects the settings passed on the command line.
    fn overrides(&self) -> Overrides {
        Overrides {
            repo: self.repo.clone(),
            token: self.token.clone(),
            environments: self.environments.clone(),
            trunk: self.trunk.clone(),
            history_limit: self.history_limit,
            status_limit: self.status_limit,
        }
    }

    /// Initializes the tracing subscriber. Logs go to stderr, leaving stdout to the report.
    ///
    /// # Returns
    /// - `Result<()>` - Ok if successful, Err otherwise.
    pub(crate) fn init_tracing_subscriber(self) -> Result<Self> {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_max_level(self.max_level())
            .finish();

        tracing::subscriber::set_global_default(subscriber).map_err(|e| anyhow!(e))?;

        Ok(self)
    }

    /// The most verbose level logged. `report` runs show warnings by default, so environments
    /// that could not be resolved or compared are visible in CI logs.
    fn max_level(&self) -> Level {
        match self.v {
            0 if matches!(self.subcommand, Some(Subcommands::Report(_))) => Level::WARN,
            0 => Level::ERROR,
            1 => Level::WARN,
            2 => Level::INFO,
            3 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

/// Styles for the CLI application.
const fn cli_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .usage(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
        )
        .header(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
        )
        .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
        .invalid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .error(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .valid(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::White))))
}
