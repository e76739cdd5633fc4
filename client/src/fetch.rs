//! Document retrieval from remote and local repositories.
//!
//! Both repository kinds answer the same question (the text stored at a
//! repository-relative path) behind [`DocumentSource`]. Retry handling
//! lives here too: transient failures back off and try again, absent
//! documents and cancellations return immediately.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;
use url::Url;

/// Failure of a single document fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No document exists at the probed path.
    #[error("document not found")]
    NotFound,
    /// The repository answered with a non-success status.
    #[error("unexpected status {0}")]
    Status(StatusCode),
    /// The HTTP transport failed.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// Reading from the local filesystem failed.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The repository-relative path did not form a valid URL.
    #[error(transparent)]
    Url(#[from] url::ParseError),
    /// The cancellation token fired mid-fetch.
    #[error("fetch cancelled")]
    Cancelled,
}

impl FetchError {
    /// Transient failures are worth retrying; absent documents, unusable
    /// paths and cancellations are not.
    pub(crate) fn is_transient(&self) -> bool {
        matches!(self, Self::Status(_) | Self::Http(_) | Self::Io(_))
    }
}

/// A repository that can produce the text of the document stored at a
/// repository-relative path.
#[async_trait]
pub(crate) trait DocumentSource: Send + Sync {
    async fn fetch(&self, path: &str, cancel: &CancellationToken) -> Result<String, FetchError>;
}

/// Remote repository reached over HTTP(S).
pub(crate) struct HttpSource {
    http: reqwest::Client,
    base: Url,
}

impl HttpSource {
    pub(crate) fn new(http: reqwest::Client, mut base: Url) -> Self {
        // `Url::join` drops the final path segment unless the base ends in `/`.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self { http, base }
    }
}

#[async_trait]
impl DocumentSource for HttpSource {
    async fn fetch(&self, path: &str, cancel: &CancellationToken) -> Result<String, FetchError> {
        let url = self.base.join(path)?;
        debug!("GET {url}");
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            sent = self.http.get(url).send() => sent?,
        };
        match response.status() {
            StatusCode::NOT_FOUND => Err(FetchError::NotFound),
            status if status.is_success() => {
                let text = tokio::select! {
                    _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                    body = response.text() => body?,
                };
                Ok(text)
            }
            status => Err(FetchError::Status(status)),
        }
    }
}

/// Local repository rooted at a directory.
pub(crate) struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DocumentSource for FileSource {
    async fn fetch(&self, path: &str, cancel: &CancellationToken) -> Result<String, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        let file = self.root.join(path);
        debug!("reading {}", file.display());
        match tokio::fs::read_to_string(&file).await {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(FetchError::NotFound),
            Err(err) => Err(FetchError::Io(err)),
        }
    }
}

/// Retry schedule for transient fetch failures.
#[derive(Debug, Clone)]
pub(crate) struct RetryPolicy {
    /// Total tries per document, including the first.
    pub max_attempts: u32,
    /// Wait before the second try; later waits double.
    pub base_delay: Duration,
    /// Upper bound on a single wait.
    pub max_delay: Duration,
}

/// Fetches `path`, retrying transient failures with doubling backoff until
/// the attempt budget is spent. The wait between attempts races the
/// cancellation token.
pub(crate) async fn fetch_with_retry(
    source: &dyn DocumentSource,
    path: &str,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<String, FetchError> {
    let budget = policy.max_attempts.max(1);
    // The cap binds from the first wait; a base above it never applies.
    let mut delay = policy.base_delay.min(policy.max_delay);
    let mut attempt: u32 = 0;
    loop {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        attempt += 1;
        let err = match source.fetch(path, cancel).await {
            Ok(text) => return Ok(text),
            Err(err) => err,
        };
        if !err.is_transient() || attempt >= budget {
            return Err(err);
        }
        warn!("fetch of `{path}` failed (attempt {attempt}/{budget}): {err}; retry in {delay:?}");
        if wait_for_retry(cancel, delay).await.is_err() {
            return Err(FetchError::Cancelled);
        }
        delay = delay.saturating_mul(2).min(policy.max_delay);
    }
}

async fn wait_for_retry(cancel: &CancellationToken, delay: Duration) -> Result<(), ()> {
    if delay.is_zero() {
        return Ok(());
    }
    tokio::select! {
        _ = tokio::time::sleep(delay) => Ok(()),
        _ = cancel.cancelled() => Err(()),
    }
}
