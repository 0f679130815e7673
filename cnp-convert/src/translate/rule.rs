//! Directional rule translation.
//!
//! Accumulates translated endpoint selections into one canonical rule and
//! normalizes its port list. Selector-based selections collect into the
//! rule's endpoint list; CIDR-bearing selections collect into the CIDR list
//! (and the CIDR-set list when exceptions are present). A rule that mixes
//! both kinds ends up with both lists.

use netpol_model::{CidrRule, EgressRule, EndpointSelector, IngressRule, PortProtocol, PortRule};

use super::selector::{translate_selection, EndpointSelection, SelectorFragment};

/// Default protocol when the source leaves it unspecified.
pub const DEFAULT_PROTOCOL: &str = "TCP";

/// One port as requested by the source rule, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRequest {
    /// String-encoded port. May carry Calico's `"start:end"` range syntax.
    pub value: String,
    /// Explicit range end, for dialects that model it as a separate field.
    pub end: Option<String>,
    pub protocol: Option<String>,
}

/// Accumulated canonical pieces of one directional rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleParts {
    pub endpoints: Vec<EndpointSelector>,
    pub cidrs: Vec<String>,
    pub cidr_sets: Vec<CidrRule>,
    pub ports: Vec<PortRule>,
    /// Advisory annotations collected from the rule's selections.
    pub annotations: Vec<(String, String)>,
}

/// Translate the selections and ports of one directional rule.
///
/// Output order follows input order exactly; translating the same input
/// twice yields the same parts.
pub fn translate_rule(selections: &[EndpointSelection], ports: &[PortRequest]) -> RuleParts {
    let mut parts = RuleParts::default();

    for selection in selections {
        let translated = translate_selection(selection);
        parts.annotations.extend(translated.annotations);
        match translated.fragment {
            SelectorFragment::Endpoint(endpoint) => parts.endpoints.push(endpoint),
            SelectorFragment::Cidr { cidr, except } => {
                parts.cidrs.push(cidr.clone());
                if let Some(except) = except {
                    parts.cidr_sets.push(CidrRule {
                        cidr,
                        except: Some(except),
                    });
                }
            }
        }
    }

    for request in ports {
        parts.ports.push(PortRule {
            ports: vec![normalize_port(request)],
        });
    }

    parts
}

impl RuleParts {
    /// Assemble an ingress rule, omitting every field its source contributed
    /// nothing to.
    pub fn into_ingress(self) -> IngressRule {
        IngressRule {
            from_endpoints: non_empty(self.endpoints),
            from_cidr: non_empty(self.cidrs),
            from_cidr_set: non_empty(self.cidr_sets),
            to_ports: non_empty(self.ports),
        }
    }

    /// Assemble an egress rule, mirrored on the destination side.
    pub fn into_egress(self) -> EgressRule {
        EgressRule {
            to_endpoints: non_empty(self.endpoints),
            to_cidr: non_empty(self.cidrs),
            to_cidr_set: non_empty(self.cidr_sets),
            to_ports: non_empty(self.ports),
        }
    }
}

/// Normalize one port request.
///
/// Range syntax splits lexically on the first colon; no numeric validation
/// happens here, range ordering included.
fn normalize_port(request: &PortRequest) -> PortProtocol {
    let protocol = request
        .protocol
        .clone()
        .unwrap_or_else(|| DEFAULT_PROTOCOL.to_string());

    if let Some(end) = &request.end {
        return PortProtocol {
            port: request.value.clone(),
            end_port: Some(end.clone()),
            protocol,
        };
    }

    match request.value.split_once(':') {
        Some((start, end)) => PortProtocol {
            port: start.to_string(),
            end_port: Some(end.to_string()),
            protocol,
        },
        None => PortProtocol {
            port: request.value.clone(),
            end_port: None,
            protocol,
        },
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
