//! Repository metadata discovery.
//!
//! A repository may publish a `metadata.json` document at its root
//! advertising optional capabilities. Discovery is best-effort by contract:
//! a repository without the document, or with an unreadable one, simply
//! advertises nothing; resolution must keep working either way.

use dmr_dtmi::METADATA_PATH;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::ResolverError;
use crate::fetch::DocumentSource;
use crate::fetch::FetchError;

/// Capabilities a repository advertises.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RepositoryFeatures {
    /// Expanded documents (pre-assembled closures) are published alongside
    /// standard ones.
    pub expanded: bool,
    /// A model index is published.
    pub index: bool,
}

/// The repository's published metadata document. Every field is optional;
/// an empty document is a valid one that advertises nothing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RepositoryMetadata {
    /// Source-control revision the repository was published from.
    pub commit_id: Option<String>,
    /// Publication timestamp, as the repository wrote it.
    pub publish_date_utc: Option<String>,
    /// Upstream repository the models were published from.
    pub source_repo: Option<String>,
    /// Number of models the repository holds.
    pub total_model_count: Option<u64>,
    /// Advertised capabilities.
    pub features: RepositoryFeatures,
}

/// Fetches repository metadata with a single attempt, degrading every
/// failure except cancellation to the default document. Cancellation is the
/// one failure a resolution call must see.
pub(crate) async fn discover(
    source: &dyn DocumentSource,
    cancel: &CancellationToken,
) -> Result<RepositoryMetadata, ResolverError> {
    match source.fetch(METADATA_PATH, cancel).await {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(metadata) => Ok(metadata),
            Err(err) => {
                debug!("repository metadata is unreadable: {err}");
                Ok(RepositoryMetadata::default())
            }
        },
        Err(FetchError::Cancelled) => Err(ResolverError::Cancelled),
        Err(err) => {
            debug!("repository metadata unavailable: {err}");
            Ok(RepositoryMetadata::default())
        }
    }
}
