//! Configuration for an `envcheck` run, merged from CLI flags, the config file and defaults.

use crate::{
    constants::{CONFIG_FILE_NAME, TRUNK_BRANCH},
    deploy::ResolveOptions,
    errors::{EnvCheckError, EnvCheckResult},
    git::{active_repository, RepositoryExt, RepositoryId},
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The on-disk `.envcheck.toml` configuration file. Every key is optional.
#[derive(Default, Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigFile {
    /// The repository to inspect, as `owner/name`.
    pub repo: Option<String>,
    /// The environments to check, upstream first.
    #[serde(default)]
    pub environments: Vec<String>,
    /// The trunk branch the first environment is compared against.
    pub trunk: Option<String>,
    /// The number of recent deployments scanned per environment.
    pub history_limit: Option<usize>,
    /// The number of statuses fetched per deployment.
    pub status_limit: Option<usize>,
}

impl ConfigFile {
    /// Loads the [ConfigFile] at `path`.
    pub fn load(path: &Path) -> EnvCheckResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Loads the config file at `explicit`, or the default one if it exists.
    ///
    /// The default file is `.envcheck.toml` at the root of the enclosing git working tree, or in
    /// the current directory outside of one. A missing default file yields an empty config, a
    /// missing explicit one is an error.
    pub fn load_or_default(explicit: Option<&Path>) -> EnvCheckResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match default_path() {
            Some(path) if path.exists() => {
                debug!("Loading config from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}

/// Returns the path of the default config file.
fn default_path() -> Option<PathBuf> {
    match active_repository().and_then(|r| r.workdir().map(Path::to_path_buf)) {
        Some(workdir) => Some(workdir.join(CONFIG_FILE_NAME)),
        None => std::env::current_dir()
            .ok()
            .map(|dir| dir.join(CONFIG_FILE_NAME)),
    }
}

/// Settings passed on the command line. These take precedence over the [ConfigFile].
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct Overrides {
    pub repo: Option<String>,
    pub token: Option<String>,
    pub environments: Vec<String>,
    pub trunk: Option<String>,
    pub history_limit: Option<usize>,
    pub status_limit: Option<usize>,
}

/// The fully resolved settings of a run.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Settings {
    pub repository: RepositoryId,
    pub token: String,
    /// The environments to check, upstream first.
    pub environments: Vec<String>,
    pub trunk: String,
    pub options: ResolveOptions,
}

impl Settings {
    /// Merges `overrides`, `file` and the defaults into [Settings].
    ///
    /// ## Takes
    /// - `overrides` - Settings from the command line.
    /// - `file` - Settings from the config file.
    /// - `origin` - Lazily discovers the repository from the local clone, used as a last resort.
    ///
    /// ## Returns
    /// - `Ok(Settings)` - The merged settings.
    /// - `Err(_)` - If a required setting is missing or invalid.
    pub fn resolve(
        overrides: Overrides,
        file: ConfigFile,
        origin: impl FnOnce() -> Option<RepositoryId>,
    ) -> EnvCheckResult<Self> {
        let repository = match overrides.repo.or(file.repo) {
            Some(repo) => repo.parse::<RepositoryId>()?,
            None => origin().ok_or(EnvCheckError::RepositoryNotConfigured)?,
        };

        let token = overrides
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or(EnvCheckError::MissingToken)?;

        let environments = if overrides.environments.is_empty() {
            file.environments
        } else {
            overrides.environments
        };
        let environments = normalize_environments(environments);
        if environments.is_empty() {
            return Err(EnvCheckError::NoEnvironments);
        }

        let defaults = ResolveOptions::default();
        let options = ResolveOptions {
            history_limit: overrides
                .history_limit
                .or(file.history_limit)
                .unwrap_or(defaults.history_limit),
            status_limit: overrides
                .status_limit
                .or(file.status_limit)
                .unwrap_or(defaults.status_limit),
        };
        if options.history_limit == 0 || options.status_limit == 0 {
            return Err(EnvCheckError::InvalidConfig(
                "history and status limits must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            repository,
            token,
            environments,
            trunk: overrides
                .trunk
                .or(file.trunk)
                .unwrap_or_else(|| TRUNK_BRANCH.to_string()),
            options,
        })
    }
}

/// Returns the repository of the `origin` remote of the enclosing git repository, if any.
pub fn origin_repository() -> Option<RepositoryId> {
    let repository = active_repository()?;
    match repository.origin_repository() {
        Ok(id) => Some(id),
        Err(err) => {
            debug!("Unable to infer repository from origin remote: {}", err);
            None
        }
    }
}

/// Trims environment names and drops empty ones, so `"dev, staging,"` reads as two environments.
fn normalize_environments(environments: Vec<String>) -> Vec<String> {
    environments
        .into_iter()
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .collect()
}

#[cfg(test)]
mod test {
    use super::{ConfigFile, Overrides, Settings};
    use crate::{errors::EnvCheckError, git::RepositoryId};
    use std::io::Write;

    fn overrides() -> Overrides {
        Overrides {
            token: Some("ghp_test".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn loads_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
repo = "acme/widgets"
environments = ["dev", "staging", "prod"]
trunk = "trunk"
history-limit = 20
"#
        )
        .unwrap();

        let config = ConfigFile::load_or_default(Some(file.path())).unwrap();

        assert_eq!(config.repo.as_deref(), Some("acme/widgets"));
        assert_eq!(config.environments, vec!["dev", "staging", "prod"]);
        assert_eq!(config.trunk.as_deref(), Some("trunk"));
        assert_eq!(config.history_limit, Some(20));
        assert_eq!(config.status_limit, None);
    }

    #[test]
    fn rejects_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "environmnets = [\"dev\"]\n").unwrap();
        assert!(matches!(
            ConfigFile::load(file.path()),
            Err(EnvCheckError::Toml(_))
        ));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(matches!(
            ConfigFile::load_or_default(Some(&path)),
            Err(EnvCheckError::Io(_))
        ));
    }

    #[test]
    fn overrides_take_precedence_over_file() {
        let file = ConfigFile {
            repo: Some("acme/old".to_string()),
            environments: vec!["qa".to_string()],
            trunk: Some("trunk".to_string()),
            history_limit: Some(30),
            status_limit: Some(10),
        };
        let overrides = Overrides {
            repo: Some("acme/widgets".to_string()),
            environments: vec!["dev".to_string(), " prod ".to_string(), "".to_string()],
            history_limit: Some(5),
            ..overrides()
        };

        let settings = Settings::resolve(overrides, file, || None).unwrap();

        assert_eq!(settings.repository, RepositoryId::new("acme", "widgets"));
        assert_eq!(settings.environments, vec!["dev", "prod"]);
        assert_eq!(settings.trunk, "trunk");
        assert_eq!(settings.options.history_limit, 5);
        assert_eq!(settings.options.status_limit, 10);
    }

    #[test]
    fn falls_back_to_defaults_and_origin() {
        let file = ConfigFile {
            environments: vec!["dev".to_string()],
            ..Default::default()
        };

        let settings = Settings::resolve(overrides(), file, || {
            Some(RepositoryId::new("acme", "origin"))
        })
        .unwrap();

        assert_eq!(settings.repository, RepositoryId::new("acme", "origin"));
        assert_eq!(settings.trunk, "main");
        assert_eq!(settings.options.history_limit, 15);
        assert_eq!(settings.options.status_limit, 5);
    }

    #[test]
    fn required_settings() {
        let file = || ConfigFile {
            repo: Some("acme/widgets".to_string()),
            environments: vec!["dev".to_string()],
            ..Default::default()
        };

        assert!(matches!(
            Settings::resolve(Overrides::default(), file(), || None),
            Err(EnvCheckError::MissingToken)
        ));
        assert!(matches!(
            Settings::resolve(overrides(), ConfigFile::default(), || None),
            Err(EnvCheckError::RepositoryNotConfigured)
        ));
        assert!(matches!(
            Settings::resolve(
                overrides(),
                ConfigFile {
                    environments: vec![" ".to_string()],
                    ..file()
                },
                || None
            ),
            Err(EnvCheckError::NoEnvironments)
        ));
        assert!(matches!(
            Settings::resolve(
                Overrides {
                    status_limit: Some(0),
                    ..overrides()
                },
                file(),
                || None
            ),
            Err(EnvCheckError::InvalidConfig(_))
        ));
    }
}
