//! Reference scanning over model documents.
//!
//! Extraction is purely syntactic: the scanner reads the identifiers named
//! by `extends` and by the `schema` of component-typed `contents` entries,
//! and never interprets the model beyond that. Whether a referenced model
//! exists, or makes sense where it is referenced, is not this layer's
//! business.

use std::collections::BTreeSet;

use dmr_dtmi::Dtmi;
use dmr_dtmi::DtmiParseError;
use serde_json::Value;
use thiserror::Error;

const COMPONENT_TYPE: &str = "Component";

/// Failure to extract references from a document.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The document is not valid JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// The document root is neither an object nor an array.
    #[error("document root is not a model object or an array of model objects")]
    NotAModel,
    /// A reference-position value is not a well-formed identifier.
    #[error("malformed model reference `{input}`: {source}")]
    InvalidReference {
        input: String,
        #[source]
        source: DtmiParseError,
    },
}

/// Collects every model referenced by `doc`.
///
/// References are the identifiers named by `extends` (string or array form)
/// and by the `schema` of every `contents` entry whose `@type` includes
/// `Component`, when that schema is given by identifier rather than inline.
/// Duplicates collapse via the returned set; a document without references
/// yields an empty set. A string in reference position that does not parse
/// as an identifier fails the scan: a closure with a silently dropped edge
/// is not a closure.
pub fn extract_references(doc: &str) -> Result<BTreeSet<Dtmi>, ScanError> {
    let root: Value = serde_json::from_str(doc)?;
    let mut found = BTreeSet::new();
    match &root {
        Value::Object(_) => collect_from_model(&root, &mut found)?,
        Value::Array(models) => {
            for model in models {
                collect_from_model(model, &mut found)?;
            }
        }
        _ => return Err(ScanError::NotAModel),
    }
    Ok(found)
}

fn collect_from_model(model: &Value, found: &mut BTreeSet<Dtmi>) -> Result<(), ScanError> {
    let Some(model) = model.as_object() else {
        return Ok(());
    };
    if let Some(extends) = model.get("extends") {
        collect_identifiers(extends, found)?;
    }
    if let Some(contents) = model.get("contents").and_then(Value::as_array) {
        for entry in contents {
            if is_component(entry)
                && let Some(schema) = entry.get("schema").and_then(Value::as_str)
            {
                push_reference(schema, found)?;
            }
        }
    }
    Ok(())
}

/// `extends` names one supertype or a list of them.
fn collect_identifiers(value: &Value, found: &mut BTreeSet<Dtmi>) -> Result<(), ScanError> {
    match value {
        Value::String(reference) => push_reference(reference, found)?,
        Value::Array(references) => {
            for reference in references {
                if let Some(reference) = reference.as_str() {
                    push_reference(reference, found)?;
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn is_component(entry: &Value) -> bool {
    match entry.get("@type") {
        Some(Value::String(kind)) => kind == COMPONENT_TYPE,
        Some(Value::Array(kinds)) => kinds
            .iter()
            .any(|kind| kind.as_str() == Some(COMPONENT_TYPE)),
        _ => false,
    }
}

fn push_reference(input: &str, found: &mut BTreeSet<Dtmi>) -> Result<(), ScanError> {
    let dtmi = Dtmi::parse(input).map_err(|source| ScanError::InvalidReference {
        input: input.to_owned(),
        source,
    })?;
    found.insert(dtmi);
    Ok(())
}
