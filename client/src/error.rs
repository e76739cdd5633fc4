//! Failure taxonomy for resolution calls.

use dmr_dtmi::Dtmi;
use dmr_dtmi::DtmiParseError;
use thiserror::Error;

use crate::fetch::FetchError;
use crate::scan::ScanError;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ResolverError>;

/// The single failure outcome of a resolution call. A failed call never
/// yields a partial model map.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// A requested identifier failed validation; reported before any fetch.
    #[error("invalid model identifier `{input}`: {source}")]
    InvalidModelId {
        input: String,
        #[source]
        source: DtmiParseError,
    },

    /// The repository location string matched no recognized form.
    #[error("invalid repository location `{input}`: {reason}")]
    InvalidLocation { input: String, reason: String },

    /// The HTTP transport could not be constructed.
    #[error("failed to build HTTP transport")]
    Transport(#[source] reqwest::Error),

    /// A required document (requested root or discovered dependency) is
    /// absent from the repository.
    #[error("model `{dtmi}` not found in repository (probed `{path}`)")]
    ModelNotFound { dtmi: Dtmi, path: String },

    /// Transient fetch failures outlasted the retry budget.
    #[error("fetching model `{dtmi}` failed after {attempts} attempts")]
    FetchFailed {
        dtmi: Dtmi,
        attempts: u32,
        #[source]
        source: FetchError,
    },

    /// A fetched document could not be scanned for references.
    #[error("model `{dtmi}` could not be scanned for references")]
    ScanFailed {
        dtmi: Dtmi,
        #[source]
        source: ScanError,
    },

    /// The caller's cancellation token fired before the call finished.
    #[error("resolution cancelled")]
    Cancelled,
}
