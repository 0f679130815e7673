//! Per-dialect policy translation into the canonical Cilium schema.

pub mod calico;
pub mod k8s;
pub mod rule;
pub mod selector;

use netpol_model::{CiliumNetworkPolicy, SourceKind, SourcePolicy};
use thiserror::Error;

/// Errors raised while translating one source document.
///
/// A translation error aborts only the document it belongs to; the batch
/// orchestrator records it and moves on.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// The document does not match the schema for its declared category.
    #[error("document does not match the {kind} policy schema: {source}")]
    Schema {
        kind: SourceKind,
        #[source]
        source: serde_yaml::Error,
    },
    /// A field the source schema requires was absent.
    #[error("missing required field {0}")]
    MissingField(&'static str),
}

/// Translate one loaded document into a canonical policy.
///
/// The document is first interpreted as the typed source schema for `kind`,
/// then mapped by the dialect's translator.
///
/// # Errors
///
/// Returns [`TranslateError::Schema`] when the document's structure does not
/// match the declared dialect, or [`TranslateError::MissingField`] when a
/// required field is absent.
pub fn translate(
    kind: SourceKind,
    value: serde_yaml::Value,
) -> Result<CiliumNetworkPolicy, TranslateError> {
    let policy =
        SourcePolicy::from_value(kind, value).map_err(|source| TranslateError::Schema {
            kind,
            source,
        })?;
    match policy {
        SourcePolicy::K8s(policy) => k8s::to_cilium(&policy),
        SourcePolicy::Calico(policy) => Ok(calico::to_cilium(&policy)),
    }
}

/// Record advisory annotations on the converted policy's metadata.
///
/// First write wins for a given key, so the document-level selector is the
/// one preserved when per-rule selections would collide with it.
pub(crate) fn note_annotations(
    policy: &mut CiliumNetworkPolicy,
    annotations: Vec<(String, String)>,
) {
    for (key, value) in annotations {
        policy.metadata.annotations.entry(key).or_insert(value);
    }
}
