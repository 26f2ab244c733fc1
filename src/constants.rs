//! Constants for the `envcheck` application.

use nu_ansi_term::Color;

/// The trunk branch anchoring the first environment in the chain.
pub(crate) const TRUNK_BRANCH: &str = "main";

/// The number of most-recent deployments scanned per environment.
pub(crate) const DEFAULT_HISTORY_LIMIT: usize = 15;

/// The number of statuses fetched per deployment. Deployments rarely accrue many.
pub(crate) const DEFAULT_STATUS_LIMIT: usize = 5;

pub(crate) const CONFIG_FILE_NAME: &str = ".envcheck.toml";

pub(crate) const GITHUB_HTML_URL: &str = "https://github.com";

/// Number of characters of a commit SHA shown in reports.
pub(crate) const SHORT_SHA_LEN: usize = 7;

pub(crate) const COLORS: [Color; 6] = [
    Color::Blue,
    Color::Cyan,
    Color::Green,
    Color::Red,
    Color::Yellow,
    Color::Purple,
];

pub(crate) const FILLED_CIRCLE: char = '●';
pub(crate) const EMPTY_CIRCLE: char = '○';
pub(crate) const BOTTOM_LEFT_BOX: char = '└';
pub(crate) const HORIZONTAL_BOX: char = '─';
