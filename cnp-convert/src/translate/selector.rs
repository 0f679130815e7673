//! Endpoint selection translation.
//!
//! Maps one source-side endpoint selection onto the canonical selector
//! representation. Label selectors translate structurally; CIDR blocks
//! become CIDR fragments; opaque Calico selector expressions fall back to a
//! synthetic label carrying the raw string, with the original recorded in an
//! annotation so nothing is silently dropped.

use std::collections::BTreeMap;

use netpol_model::source::{IpBlock, LabelSelector};
use netpol_model::EndpointSelector;

/// Annotation key recording the original Calico selector expression.
pub const ORIGINAL_SELECTOR_ANNOTATION: &str = "original-calico-selector";
/// Annotation key carrying the manual-review advisory for lossy conversions.
pub const CONVERSION_WARNING_ANNOTATION: &str = "conversion-warning";
/// Synthetic label key embedding an opaque workload selector expression.
pub const WORKLOAD_EXPRESSION_KEY: &str = "calico-selector";
/// Synthetic label key embedding an opaque namespace selector expression.
pub const NAMESPACE_EXPRESSION_KEY: &str = "calico-namespace-selector";

/// Scope of an opaque selector expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionScope {
    Workload,
    Namespace,
}

/// One source-side endpoint selection, normalized across dialects.
#[derive(Debug, Clone, PartialEq)]
pub enum EndpointSelection {
    /// Pod-scope label selector.
    PodSelector(LabelSelector),
    /// Namespace-scope label selector. The canonical schema does not
    /// distinguish the scope structurally, so it folds into the same shape.
    NamespaceSelector(LabelSelector),
    /// CIDR block with optional carved-out exceptions.
    Cidr(IpBlock),
    /// Opaque selector expression, carried verbatim and never evaluated.
    Expression {
        scope: ExpressionScope,
        expression: String,
    },
}

/// Canonical fragment produced from one endpoint selection.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorFragment {
    Endpoint(EndpointSelector),
    Cidr {
        cidr: String,
        except: Option<Vec<String>>,
    },
}

/// Result of translating one endpoint selection.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedSelection {
    pub fragment: SelectorFragment,
    /// Advisory annotations to surface on the converted policy's metadata.
    pub annotations: Vec<(String, String)>,
}

/// Translate one endpoint selection. Total over the variant set.
pub fn translate_selection(selection: &EndpointSelection) -> TranslatedSelection {
    match selection {
        EndpointSelection::PodSelector(selector)
        | EndpointSelection::NamespaceSelector(selector) => TranslatedSelection {
            fragment: SelectorFragment::Endpoint(endpoint_from_labels(selector)),
            annotations: Vec::new(),
        },
        EndpointSelection::Cidr(block) => TranslatedSelection {
            fragment: SelectorFragment::Cidr {
                cidr: block.cidr.clone(),
                except: block.except.clone(),
            },
            annotations: Vec::new(),
        },
        EndpointSelection::Expression { scope, expression } => {
            let key = match scope {
                ExpressionScope::Workload => WORKLOAD_EXPRESSION_KEY,
                ExpressionScope::Namespace => NAMESPACE_EXPRESSION_KEY,
            };
            let mut labels = BTreeMap::new();
            labels.insert(key.to_string(), expression.clone());
            TranslatedSelection {
                fragment: SelectorFragment::Endpoint(EndpointSelector::from_labels(labels)),
                annotations: vec![(
                    ORIGINAL_SELECTOR_ANNOTATION.to_string(),
                    expression.clone(),
                )],
            }
        }
    }
}

/// Build a canonical endpoint selector from a source label selector.
///
/// Empty sub-fields are omitted entirely, never carried as present-but-empty
/// collections.
pub fn endpoint_from_labels(selector: &LabelSelector) -> EndpointSelector {
    EndpointSelector {
        match_labels: selector.match_labels.clone().filter(|m| !m.is_empty()),
        match_expressions: selector.match_expressions.clone().filter(|e| !e.is_empty()),
    }
}
