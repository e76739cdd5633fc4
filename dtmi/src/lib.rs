//! Identifier grammar and path conventions for device model repositories.
//!
//! A model repository stores one JSON interface document per model
//! identifier under a deterministic directory layout. This crate owns the
//! identifier type ([`Dtmi`]) and the mapping from identifiers to
//! repository-relative paths ([`model_repo_path`]); it performs no I/O.

mod convention;
mod id;

pub use convention::METADATA_PATH;
pub use convention::ModelForm;
pub use convention::model_repo_path;
pub use id::Dtmi;
pub use id::DtmiParseError;
pub use id::SCHEME;
