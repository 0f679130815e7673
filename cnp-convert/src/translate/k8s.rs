//! Kubernetes NetworkPolicy translation.
//!
//! The Kubernetes schema maps almost one-to-one onto the canonical shape:
//! podSelector becomes the endpoint selector, peers become endpoint or CIDR
//! fragments, and policyTypes carry over verbatim.

use netpol_model::source::{K8sNetworkPolicy, K8sPeer, K8sPort, K8sRule};
use netpol_model::CiliumNetworkPolicy;

use super::rule::{translate_rule, PortRequest};
use super::selector::{endpoint_from_labels, EndpointSelection};
use super::{note_annotations, TranslateError};

/// Translate one Kubernetes NetworkPolicy into a canonical policy.
///
/// # Errors
///
/// Returns [`TranslateError::MissingField`] when the policy carries no
/// namespace; Kubernetes NetworkPolicies are namespace-scoped.
pub fn to_cilium(policy: &K8sNetworkPolicy) -> Result<CiliumNetworkPolicy, TranslateError> {
    let namespace = policy
        .metadata
        .namespace
        .as_deref()
        .ok_or(TranslateError::MissingField("metadata.namespace"))?;
    let mut out = CiliumNetworkPolicy::new(&policy.metadata.name, namespace);

    if let Some(labels) = &policy.metadata.labels {
        out.metadata.labels = labels.clone();
    }

    if let Some(pod_selector) = &policy.spec.pod_selector {
        out.spec.endpoint_selector = Some(endpoint_from_labels(pod_selector));
    }

    if let Some(rules) = &policy.spec.ingress {
        let mut ingress = Vec::with_capacity(rules.len());
        for rule in rules {
            let parts = translate_directional(rule, rule.from.as_deref());
            note_annotations(&mut out, parts.annotations.clone());
            ingress.push(parts.into_ingress());
        }
        out.spec.ingress = Some(ingress);
    }

    if let Some(rules) = &policy.spec.egress {
        let mut egress = Vec::with_capacity(rules.len());
        for rule in rules {
            let parts = translate_directional(rule, rule.to.as_deref());
            note_annotations(&mut out, parts.annotations.clone());
            egress.push(parts.into_egress());
        }
        out.spec.egress = Some(egress);
    }

    if let Some(types) = &policy.spec.policy_types {
        out.spec.policy_types = Some(types.clone());
    }

    Ok(out)
}

fn translate_directional(rule: &K8sRule, peers: Option<&[K8sPeer]>) -> super::rule::RuleParts {
    let selections: Vec<EndpointSelection> = peers
        .unwrap_or(&[])
        .iter()
        .filter_map(peer_selection)
        .collect();
    let ports: Vec<PortRequest> = rule
        .ports
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .map(port_request)
        .collect();
    translate_rule(&selections, &ports)
}

/// Map one peer to a selection. A peer carrying several constructs resolves
/// in podSelector, namespaceSelector, ipBlock order; one with none of them
/// contributes nothing.
fn peer_selection(peer: &K8sPeer) -> Option<EndpointSelection> {
    if let Some(selector) = &peer.pod_selector {
        return Some(EndpointSelection::PodSelector(selector.clone()));
    }
    if let Some(selector) = &peer.namespace_selector {
        return Some(EndpointSelection::NamespaceSelector(selector.clone()));
    }
    peer.ip_block
        .as_ref()
        .map(|block| EndpointSelection::Cidr(block.clone()))
}

fn port_request(port: &K8sPort) -> PortRequest {
    PortRequest {
        value: port
            .port
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        end: port.end_port.as_ref().map(ToString::to_string),
        protocol: port.protocol.clone(),
    }
}
