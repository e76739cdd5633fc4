//! Async client for device model repositories.
//!
//! A model repository stores one JSON interface document per model
//! identifier (`dtmi:com:example:Thermostat;1`) under a deterministic
//! directory layout, served over HTTP(S) or from a local directory. The
//! client fetches requested models, follows their references breadth-first
//! and returns the whole closure as one map. A failed call surfaces the
//! first error and never a partial result.
//!
//! ```no_run
//! use dmr_client::Client;
//! use dmr_client::RepositoryLocation;
//!
//! # async fn demo() -> dmr_client::Result<()> {
//! let client = Client::new(RepositoryLocation::public_models())?;
//! let models = client.resolve("dtmi:com:example:Thermostat;1").await?;
//! for (id, text) in &models {
//!     println!("{id}: {} bytes", text.len());
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod fetch;
mod location;
mod metadata;
mod resolver;
mod scan;

pub use client::Client;
pub use client::ClientConfig;
pub use client::DependencyResolution;
pub use dmr_dtmi::Dtmi;
pub use dmr_dtmi::DtmiParseError;
pub use dmr_dtmi::METADATA_PATH;
pub use dmr_dtmi::ModelForm;
pub use dmr_dtmi::model_repo_path;
pub use error::ResolverError;
pub use error::Result;
pub use fetch::FetchError;
pub use location::DEFAULT_REPOSITORY;
pub use location::RepositoryLocation;
pub use metadata::RepositoryFeatures;
pub use metadata::RepositoryMetadata;
pub use scan::ScanError;
pub use scan::extract_references;
