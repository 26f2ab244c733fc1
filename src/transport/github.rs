//! [DeploymentTransport] implementation backed by the GitHub REST API.

use super::{
    CommitComparison, CommitSummary, DeploymentRecord, DeploymentStatus, DeploymentTransport,
    Release,
};
use crate::{
    errors::{EnvCheckError, EnvCheckResult},
    git::RepositoryId,
};
use async_trait::async_trait;
use octocrab::{service::middleware::retry::RetryConfig, Octocrab};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// GitHub caps `per_page` at 100.
const MAX_PAGE_SIZE: usize = 100;

/// Number of times a rate-limited request is retried.
const MAX_RATE_LIMIT_RETRIES: u32 = 1;

/// Initial wait before retrying a rate-limited request. Doubles per attempt.
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(2);

/// Characters escaped within a single path segment. Branch and tag names may contain `/`, `#`
/// and `?`, none of which may leak into the route.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A [DeploymentTransport] that talks to GitHub through [Octocrab].
#[derive(Clone)]
pub struct GitHubTransport {
    client: Octocrab,
    repository: RepositoryId,
    backoff: Duration,
}

impl GitHubTransport {
    /// Creates a new [GitHubTransport] for `repository`, authenticated with `token`.
    ///
    /// Octocrab's own retry layer is disabled, so rate limits go through the single bounded retry
    /// in `get`.
    pub fn new(repository: RepositoryId, token: String) -> EnvCheckResult<Self> {
        let client = Octocrab::builder()
            .personal_token(token)
            .add_retry_config(RetryConfig::None)
            .build()?;
        Ok(Self {
            client,
            repository,
            backoff: RATE_LIMIT_BACKOFF,
        })
    }

    /// Returns the API route within the repository made of `segments`, each percent-encoded.
    fn route(&self, segments: &[&str]) -> String {
        let mut route = String::from("/repos");
        for segment in [
            self.repository.owner.as_str(),
            self.repository.name.as_str(),
        ]
        .iter()
        .chain(segments)
        {
            route.push('/');
            route.extend(utf8_percent_encode(segment, PATH_SEGMENT));
        }
        route
    }

    /// Issues a `GET` request, retrying once with backoff if GitHub reports a rate limit.
    async fn get<R, P>(&self, route: &str, params: Option<&P>) -> EnvCheckResult<R>
    where
        R: DeserializeOwned + Send,
        P: Serialize + ?Sized + Sync,
    {
        let mut attempt = 0;
        loop {
            match self.client.get::<R, _, P>(route, params).await {
                Err(err) if attempt < MAX_RATE_LIMIT_RETRIES && is_rate_limited(&err) => {
                    let backoff = self.backoff * 2u32.pow(attempt);
                    warn!(
                        "Request quota exhausted for GET {}. Retrying after {}ms.",
                        route,
                        backoff.as_millis()
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                result => return result.map_err(Into::into),
            }
        }
    }
}

#[async_trait]
impl DeploymentTransport for GitHubTransport {
    fn repository(&self) -> &RepositoryId {
        &self.repository
    }

    async fn list_deployments(
        &self,
        environment: &str,
        limit: usize,
    ) -> EnvCheckResult<Vec<DeploymentRecord>> {
        let params = ListDeploymentsParams {
            environment,
            per_page: limit.min(MAX_PAGE_SIZE),
        };
        self.get(&self.route(&["deployments"]), Some(&params)).await
    }

    async fn list_deployment_statuses(
        &self,
        deployment_id: u64,
        limit: usize,
    ) -> EnvCheckResult<Vec<DeploymentStatus>> {
        let params = PageParams {
            per_page: limit.min(MAX_PAGE_SIZE),
        };
        let id = deployment_id.to_string();
        let route = self.route(&["deployments", id.as_str(), "statuses"]);
        self.get(&route, Some(&params)).await
    }

    async fn branch_head(&self, branch: &str) -> EnvCheckResult<String> {
        let route = self.route(&["branches", branch]);
        let branch: WireBranch = self.get(&route, None::<&()>).await?;
        Ok(branch.commit.sha)
    }

    async fn compare_commits(&self, base: &str, head: &str) -> EnvCheckResult<CommitComparison> {
        debug!("Comparing {}...{}", base, head);
        let route = self.route(&["compare", format!("{}...{}", base, head).as_str()]);
        let comparison: WireComparison = self.get(&route, None::<&()>).await?;
        Ok(comparison.into())
    }

    async fn release_by_tag(&self, tag: &str) -> EnvCheckResult<Option<Release>> {
        let route = self.route(&["releases", "tags", tag]);
        match self.get::<Release, ()>(&route, None).await {
            Ok(release) => Ok(Some(release)),
            Err(EnvCheckError::GitHub(octocrab::Error::GitHub { source, .. }))
                if source.status_code.as_u16() == 404 =>
            {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

/// Returns `true` if GitHub rejected the request because a rate limit was hit.
fn is_rate_limited(err: &octocrab::Error) -> bool {
    match err {
        octocrab::Error::GitHub { source, .. } => {
            matches!(source.status_code.as_u16(), 403 | 429)
                && source.message.to_lowercase().contains("rate limit")
        }
        _ => false,
    }
}

#[derive(Serialize)]
struct ListDeploymentsParams<'a> {
    environment: &'a str,
    per_page: usize,
}

#[derive(Serialize)]
struct PageParams {
    per_page: usize,
}

#[derive(Deserialize)]
struct WireBranch {
    commit: WireBranchCommit,
}

#[derive(Deserialize)]
struct WireBranchCommit {
    sha: String,
}

#[derive(Deserialize)]
struct WireComparison {
    html_url: String,
    ahead_by: u64,
    behind_by: u64,
    #[serde(default)]
    commits: Vec<WireCommit>,
}

#[derive(Deserialize)]
struct WireCommit {
    sha: String,
    author: Option<WireUser>,
    commit: WireCommitDetail,
}

#[derive(Deserialize)]
struct WireUser {
    login: String,
}

#[derive(Deserialize)]
struct WireCommitDetail {
    #[serde(default)]
    message: String,
    author: Option<WireGitAuthor>,
}

#[derive(Deserialize)]
struct WireGitAuthor {
    name: Option<String>,
}

impl From<WireComparison> for CommitComparison {
    fn from(wire: WireComparison) -> Self {
        Self {
            ahead_by: wire.ahead_by,
            behind_by: wire.behind_by,
            commits: wire.commits.into_iter().map(Into::into).collect(),
            html_url: wire.html_url,
        }
    }
}

impl From<WireCommit> for CommitSummary {
    fn from(wire: WireCommit) -> Self {
        let author = wire
            .author
            .map(|a| a.login)
            .or_else(|| wire.commit.author.and_then(|a| a.name))
            .unwrap_or_else(|| "Unknown author".to_string());
        let headline = wire
            .commit
            .message
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();

        Self {
            sha: wire.sha,
            author,
            headline,
        }
    }
}
