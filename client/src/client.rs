//! Client facade over a single model repository.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use dmr_dtmi::Dtmi;
use tokio_util::sync::CancellationToken;

use crate::error::ResolverError;
use crate::error::Result;
use crate::fetch::DocumentSource;
use crate::fetch::FileSource;
use crate::fetch::HttpSource;
use crate::fetch::RetryPolicy;
use crate::location::RepositoryLocation;
use crate::metadata;
use crate::metadata::RepositoryFeatures;
use crate::metadata::RepositoryMetadata;
use crate::resolver;
use crate::resolver::TraversalPlan;

/// `User-Agent` advertised to remote repositories.
const USER_AGENT: &str = concat!("dmr-client/", env!("CARGO_PKG_VERSION"));

/// How a resolution call treats the references of fetched models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DependencyResolution {
    /// Fetch exactly the requested models.
    Disabled,
    /// Fetch the requested models and their full reference closure.
    #[default]
    Enabled,
    /// Like [`Enabled`](Self::Enabled), but prefer pre-assembled expanded
    /// documents when the repository advertises them.
    TryFromExpanded,
}

/// Tunables for a [`Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Treatment of model references.
    pub dependency_resolution: DependencyResolution,
    /// Total tries per document before a transient failure becomes fatal.
    pub max_fetch_attempts: u32,
    /// Wait before the second try of a document; later waits double.
    pub retry_base_delay: Duration,
    /// Upper bound on a single retry wait.
    pub max_retry_delay: Duration,
    /// Fetches in flight at once within one traversal level.
    pub max_parallel_fetches: usize,
    /// Per-request timeout for remote repositories.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            dependency_resolution: DependencyResolution::default(),
            max_fetch_attempts: 3,
            retry_base_delay: Duration::from_millis(100),
            max_retry_delay: Duration::from_secs(2),
            max_parallel_fetches: 4,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Entry point for model resolution against one repository.
///
/// A client is safe to share behind a reference across tasks: every call
/// carries its own traversal state, and the only thing calls share is the
/// transport and the once-discovered repository metadata.
pub struct Client {
    location: RepositoryLocation,
    config: ClientConfig,
    source: Box<dyn DocumentSource>,
    metadata: OnceLock<RepositoryMetadata>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("location", &self.location)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Client for `location` with the default configuration.
    pub fn new(location: RepositoryLocation) -> Result<Self> {
        Self::with_config(location, ClientConfig::default())
    }

    /// Client for `location` with an explicit configuration. Builds the
    /// HTTP transport for remote locations; performs no I/O.
    pub fn with_config(location: RepositoryLocation, config: ClientConfig) -> Result<Self> {
        let source: Box<dyn DocumentSource> = match &location {
            RepositoryLocation::Remote(base) => {
                let http = reqwest::Client::builder()
                    .user_agent(USER_AGENT)
                    .timeout(config.request_timeout)
                    .build()
                    .map_err(ResolverError::Transport)?;
                Box::new(HttpSource::new(http, base.clone()))
            }
            RepositoryLocation::Local(root) => Box::new(FileSource::new(root.clone())),
        };
        Ok(Self {
            location,
            config,
            source,
            metadata: OnceLock::new(),
        })
    }

    /// True when `dtmi` is a well-formed model identifier. No I/O.
    pub fn is_valid_dtmi(dtmi: &str) -> bool {
        Dtmi::is_valid(dtmi)
    }

    /// The repository this client resolves against.
    pub fn location(&self) -> &RepositoryLocation {
        &self.location
    }

    /// The configuration the client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Resolves `dtmi` and, per configuration, its reference closure.
    ///
    /// On success the map holds one entry per resolved identifier, keyed by
    /// the identifier and carrying the document text exactly as stored; the
    /// requested model is always among them. Any failure yields no entries
    /// at all.
    pub async fn resolve(&self, dtmi: &str) -> Result<BTreeMap<Dtmi, String>> {
        self.resolve_many_with_cancel(&[dtmi], &CancellationToken::new())
            .await
    }

    /// [`resolve`](Self::resolve), racing a caller-supplied token. A
    /// cancelled call returns [`ResolverError::Cancelled`] and never a
    /// partial map.
    pub async fn resolve_with_cancel(
        &self,
        dtmi: &str,
        cancel: &CancellationToken,
    ) -> Result<BTreeMap<Dtmi, String>> {
        self.resolve_many_with_cancel(&[dtmi], cancel).await
    }

    /// Resolves a set of models in one traversal. Duplicates collapse; the
    /// order of `dtmis` never affects which entries come back.
    pub async fn resolve_many<S>(&self, dtmis: &[S]) -> Result<BTreeMap<Dtmi, String>>
    where
        S: AsRef<str>,
    {
        self.resolve_many_with_cancel(dtmis, &CancellationToken::new())
            .await
    }

    /// [`resolve_many`](Self::resolve_many), racing a caller-supplied token.
    pub async fn resolve_many_with_cancel<S>(
        &self,
        dtmis: &[S],
        cancel: &CancellationToken,
    ) -> Result<BTreeMap<Dtmi, String>>
    where
        S: AsRef<str>,
    {
        // Every root must validate before the first fetch is issued.
        let mut roots = Vec::with_capacity(dtmis.len());
        for raw in dtmis {
            let raw = raw.as_ref();
            let dtmi = Dtmi::parse(raw).map_err(|source| ResolverError::InvalidModelId {
                input: raw.to_owned(),
                source,
            })?;
            roots.push(dtmi);
        }

        let mode = self.config.dependency_resolution;
        let prefer_expanded = match mode {
            DependencyResolution::TryFromExpanded => self.features(cancel).await?.expanded,
            DependencyResolution::Disabled | DependencyResolution::Enabled => false,
        };
        let plan = TraversalPlan {
            scan_references: mode != DependencyResolution::Disabled,
            prefer_expanded,
            max_parallel: self.config.max_parallel_fetches,
        };
        let policy = RetryPolicy {
            max_attempts: self.config.max_fetch_attempts,
            base_delay: self.config.retry_base_delay,
            max_delay: self.config.max_retry_delay,
        };
        resolver::resolve_closure(self.source.as_ref(), &policy, &plan, roots, cancel).await
    }

    /// Capabilities advertised by the repository, discovered at most once
    /// per client and cached.
    async fn features(&self, cancel: &CancellationToken) -> Result<RepositoryFeatures> {
        if let Some(metadata) = self.metadata.get() {
            return Ok(metadata.features);
        }
        let discovered = metadata::discover(self.source.as_ref(), cancel).await?;
        let features = discovered.features;
        // First writer wins; racing discoveries of the same repository
        // compute the same document.
        let _ = self.metadata.set(discovered);
        Ok(features)
    }
}
