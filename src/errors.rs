//! Error types for the `envcheck` application.

use nu_ansi_term::Color;
use thiserror::Error;

/// The error type for the `envcheck` application.
#[derive(Error, Debug)]
pub enum EnvCheckError {
    /// No repository identity could be determined.
    #[error("Repository not configured. Pass `--repo owner/name`, set `GITHUB_REPOSITORY`, or run inside a clone with an `origin` remote.")]
    RepositoryNotConfigured,
    /// A repository identity was malformed.
    #[error("Invalid repository `{}`. Expected `owner/name`.", Color::Blue.paint(.0))]
    InvalidRepository(String),
    /// No environments were passed.
    #[error("No environments to check. Pass `--environments dev,staging,prod` or set `environments` in the config file.")]
    NoEnvironments,
    /// No GitHub token was passed.
    #[error("A GitHub token is required. Pass `--token` or set `GITHUB_TOKEN`.")]
    MissingToken,
    /// A configuration value was out of range.
    #[error("Invalid configuration: {}", .0)]
    InvalidConfig(String),
    /// An [octocrab::Error] occurred.
    #[error("GitHub API error: {}", .0)]
    GitHub(#[from] octocrab::Error),
    /// A [toml::de::Error] occurred.
    #[error("Failed to parse config file: {}", .0)]
    Toml(#[from] toml::de::Error),
    /// A [git2::Error] occurred.
    #[error("libgit2 error: {}", .0)]
    Git2(#[from] git2::Error),
    /// A [std::fmt::Error] occurred while rendering a report.
    #[error("Failed to render report: {}", .0)]
    Fmt(#[from] std::fmt::Error),
    /// A [std::io::Error] occurred.
    #[error("I/O error: {}", .0)]
    Io(#[from] std::io::Error),
}

/// A result type for the `envcheck` application.
pub type EnvCheckResult<T> = Result<T, EnvCheckError>;
