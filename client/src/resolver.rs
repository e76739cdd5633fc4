//! Breadth-first assembly of a model's dependency closure.
//!
//! The traversal keeps three pieces of state per call: the set of
//! identifiers ever claimed (`visited`), the identifiers waiting to be
//! fetched (`frontier`), and the buffered results. Claims happen in the
//! single coordinating loop before any fetch is issued, so each distinct
//! identifier is fetched at most once per call and revisiting an identifier
//! (shared dependency or cycle) is a no-op. Nothing is published until the
//! frontier drains: a failed call returns the error alone.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::collections::VecDeque;

use dmr_dtmi::Dtmi;
use dmr_dtmi::ModelForm;
use dmr_dtmi::model_repo_path;
use futures::StreamExt;
use futures::TryStreamExt;
use futures::stream;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;

use crate::error::ResolverError;
use crate::error::Result;
use crate::fetch::DocumentSource;
use crate::fetch::FetchError;
use crate::fetch::RetryPolicy;
use crate::fetch::fetch_with_retry;
use crate::scan::extract_references;

/// How the traversal treats each fetched document.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TraversalPlan {
    /// Scan fetched documents and follow their references.
    pub scan_references: bool,
    /// Probe the expanded form before the standard one.
    pub prefer_expanded: bool,
    /// Fetches in flight at once within one frontier level.
    pub max_parallel: usize,
}

/// A fetched document, tagged with the form it was found in.
enum Fetched {
    /// Authored form; eligible for reference scanning.
    Standard(String),
    /// Pre-assembled closure; stored as-is and never scanned.
    Expanded(String),
}

/// Resolves `roots` and, when the plan says so, everything they reference.
pub(crate) async fn resolve_closure(
    source: &dyn DocumentSource,
    policy: &RetryPolicy,
    plan: &TraversalPlan,
    roots: Vec<Dtmi>,
    cancel: &CancellationToken,
) -> Result<BTreeMap<Dtmi, String>> {
    let root_count = roots.len();
    let mut visited: HashSet<Dtmi> = HashSet::new();
    let mut frontier: VecDeque<Dtmi> = VecDeque::new();
    let mut resolved: BTreeMap<Dtmi, String> = BTreeMap::new();

    for root in roots {
        if visited.insert(root.clone()) {
            frontier.push_back(root);
        }
    }

    while !frontier.is_empty() {
        if cancel.is_cancelled() {
            return Err(ResolverError::Cancelled);
        }

        let batch: Vec<Dtmi> = frontier.drain(..).collect();
        let level: Vec<(Dtmi, Fetched)> = stream::iter(batch)
            .map(|dtmi| async move {
                let document =
                    fetch_document(source, policy, plan.prefer_expanded, &dtmi, cancel).await?;
                Ok::<(Dtmi, Fetched), ResolverError>((dtmi, document))
            })
            .buffered(plan.max_parallel.max(1))
            .try_collect()
            .await?;

        for (dtmi, document) in level {
            match document {
                Fetched::Expanded(text) => {
                    resolved.insert(dtmi, text);
                }
                Fetched::Standard(text) => {
                    if plan.scan_references {
                        let references = extract_references(&text).map_err(|source| {
                            ResolverError::ScanFailed {
                                dtmi: dtmi.clone(),
                                source,
                            }
                        })?;
                        for reference in references {
                            if visited.insert(reference.clone()) {
                                debug!("queued `{reference}` referenced by `{dtmi}`");
                                frontier.push_back(reference);
                            }
                        }
                    }
                    resolved.insert(dtmi, text);
                }
            }
        }
    }

    info!("resolved {} models from {root_count} requested", resolved.len());
    Ok(resolved)
}

/// Fetches one model, preferring the expanded form when asked to. An absent
/// expanded document quietly falls back to the standard form; an absent
/// standard document fails the call.
async fn fetch_document(
    source: &dyn DocumentSource,
    policy: &RetryPolicy,
    prefer_expanded: bool,
    dtmi: &Dtmi,
    cancel: &CancellationToken,
) -> Result<Fetched> {
    if prefer_expanded {
        let path = model_repo_path(dtmi, ModelForm::Expanded);
        match fetch_with_retry(source, &path, policy, cancel).await {
            Ok(text) => return Ok(Fetched::Expanded(text)),
            Err(FetchError::NotFound) => {
                debug!("no expanded document for `{dtmi}`, using standard form");
            }
            Err(err) => return Err(lift_fetch_error(dtmi, policy, err)),
        }
    }
    let path = model_repo_path(dtmi, ModelForm::Standard);
    match fetch_with_retry(source, &path, policy, cancel).await {
        Ok(text) => Ok(Fetched::Standard(text)),
        Err(FetchError::NotFound) => Err(ResolverError::ModelNotFound {
            dtmi: dtmi.clone(),
            path,
        }),
        Err(err) => Err(lift_fetch_error(dtmi, policy, err)),
    }
}

fn lift_fetch_error(dtmi: &Dtmi, policy: &RetryPolicy, err: FetchError) -> ResolverError {
    match err {
        FetchError::Cancelled => ResolverError::Cancelled,
        other => ResolverError::FetchFailed {
            dtmi: dtmi.clone(),
            attempts: policy.max_attempts.max(1),
            source: other,
        },
    }
}
