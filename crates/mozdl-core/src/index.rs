//! Build index resolution.
//!
//! Maps selectors to a concrete artifact URL through the Taskcluster index:
//! the namespace `{prefix}.{branch}.latest.{product}.{os}` names the most
//! recent task for those selectors, and the task's artifact listing holds
//! the archive.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use mozdl_schema::{ArtifactReference, BuildInfoError, Selectors, expected_suffix};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Taskcluster deployment used when none is configured.
pub const DEFAULT_ROOT_URL: &str = "https://firefox-ci-tc.services.mozilla.com";

/// Index namespace prefix used when none is configured.
pub const DEFAULT_NAMESPACE_PREFIX: &str = "gecko.v2";

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Build index unreachable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Build index returned {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Malformed build index response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No indexed task for namespace '{namespace}'")]
    TaskNotFound { namespace: String },

    #[error("No artifact ending in '{suffix}' in task {task_id}")]
    NoMatchingArtifact { suffix: String, task_id: String },

    #[error(transparent)]
    UnknownFiletype(#[from] BuildInfoError),
}

/// Where and how to query the build index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Root URL of the Taskcluster deployment
    pub root_url: String,
    /// First segments of every index namespace (e.g. "gecko.v2")
    pub namespace_prefix: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            root_url: DEFAULT_ROOT_URL.to_string(),
            namespace_prefix: DEFAULT_NAMESPACE_PREFIX.to_string(),
        }
    }
}

impl IndexConfig {
    /// Config pointing at a different deployment, keeping the default prefix.
    pub fn with_root_url(root_url: impl Into<String>) -> Self {
        Self {
            root_url: root_url.into(),
            ..Self::default()
        }
    }

    fn root(&self) -> &str {
        self.root_url.trim_end_matches('/')
    }
}

/// Index lookup result (`GET /api/index/v1/task/<namespace>`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexedTask {
    task_id: String,
}

/// One page of a task's artifact listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactPage {
    artifacts: Vec<QueueArtifact>,
    #[serde(default)]
    continuation_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueueArtifact {
    name: String,
    #[serde(default)]
    expires: Option<String>,
}

impl QueueArtifact {
    fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc))
    }
}

/// Resolves selectors to artifact URLs.
#[derive(Debug, Clone)]
pub struct IndexClient {
    client: reqwest::Client,
    config: IndexConfig,
}

impl IndexClient {
    pub fn new(client: reqwest::Client, config: IndexConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Index namespace for a set of selectors.
    ///
    /// # Example
    ///
    /// ```
    /// use mozdl_core::{IndexClient, IndexConfig};
    /// use mozdl_schema::{OsId, Product, Selectors};
    ///
    /// let index = IndexClient::new(reqwest::Client::new(), IndexConfig::default());
    /// let selectors = Selectors::new(Product::Firefox, OsId::new("linux-x86_64"), "/tmp/out");
    /// assert_eq!(
    ///     index.namespace(&selectors),
    ///     "gecko.v2.mozilla-central.latest.firefox.linux-x86_64"
    /// );
    /// ```
    pub fn namespace(&self, selectors: &Selectors) -> String {
        format!(
            "{}.{}.latest.{}.{}",
            self.config.namespace_prefix, selectors.branch, selectors.product, selectors.os
        )
    }

    /// Resolve selectors to the most recent matching artifact.
    ///
    /// The artifact name must end with [`expected_suffix`]; when several do,
    /// the most recently published one (latest expiry) wins.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnknownFiletype`] before any request if the
    /// platform has no known archive type, and otherwise fails on the first
    /// unsuccessful request or when no artifact matches. Nothing is retried.
    pub async fn resolve(&self, selectors: &Selectors) -> Result<ArtifactReference, ResolveError> {
        let suffix = expected_suffix(selectors)?;
        let namespace = self.namespace(selectors);

        let task_id = self.find_task(&namespace).await?;
        debug!(%namespace, %task_id, "found indexed task");

        let artifacts = self.list_artifacts(&task_id).await?;
        debug!(count = artifacts.len(), %task_id, "listed task artifacts");

        let artifact = pick_latest(&artifacts, &suffix).ok_or_else(|| {
            ResolveError::NoMatchingArtifact {
                suffix: suffix.clone(),
                task_id: task_id.clone(),
            }
        })?;

        let url = format!(
            "{}/api/queue/v1/task/{}/artifacts/{}",
            self.config.root(),
            task_id,
            artifact.name
        );
        info!(%url, artifact = %artifact.name, "resolved artifact");

        Ok(ArtifactReference {
            url,
            name: artifact.name.clone(),
            filetype: suffix,
        })
    }

    async fn find_task(&self, namespace: &str) -> Result<String, ResolveError> {
        let url = format!("{}/api/index/v1/task/{}", self.config.root(), namespace);
        let resp = self.client.get(&url).send().await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ResolveError::TaskNotFound {
                namespace: namespace.to_string(),
            });
        }
        if !resp.status().is_success() {
            return Err(ResolveError::Status {
                url,
                status: resp.status(),
            });
        }

        let task: IndexedTask = serde_json::from_slice(&resp.bytes().await?)?;
        Ok(task.task_id)
    }

    async fn list_artifacts(&self, task_id: &str) -> Result<Vec<QueueArtifact>, ResolveError> {
        let url = format!(
            "{}/api/queue/v1/task/{}/artifacts",
            self.config.root(),
            task_id
        );

        let mut artifacts = Vec::new();
        let mut token: Option<String> = None;
        let mut seen = HashSet::new();
        loop {
            let mut request = self.client.get(&url);
            if let Some(t) = &token {
                request = request.query(&[("continuationToken", t)]);
            }

            let resp = request.send().await?;
            if !resp.status().is_success() {
                return Err(ResolveError::Status {
                    url,
                    status: resp.status(),
                });
            }

            let page: ArtifactPage = serde_json::from_slice(&resp.bytes().await?)?;
            artifacts.extend(page.artifacts);

            match page.continuation_token {
                Some(next) if !next.is_empty() => {
                    if !seen.insert(next.clone()) {
                        warn!(
                            task_id,
                            token = %next,
                            "artifact listing repeated a continuation token"
                        );
                        break;
                    }
                    token = Some(next);
                }
                _ => break,
            }
        }

        Ok(artifacts)
    }
}

/// Most recently published artifact whose name ends with `suffix`.
///
/// A suffix without a leading dot gets one, so `zip` never matches `.gzip`.
/// Ties and unparsable timestamps fall back to listing order, later wins.
fn pick_latest<'a>(artifacts: &'a [QueueArtifact], suffix: &str) -> Option<&'a QueueArtifact> {
    let mut suffix = suffix.to_lowercase();
    if !suffix.starts_with('.') {
        suffix.insert(0, '.');
    }
    artifacts
        .iter()
        .enumerate()
        .filter(|(_, a)| a.name.to_lowercase().ends_with(&suffix))
        .max_by_key(|(position, a)| (a.expires_at(), *position))
        .map(|(_, a)| a)
}
