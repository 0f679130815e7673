//! Calico NetworkPolicy translation.
//!
//! Calico identifies endpoints with a selector expression grammar the
//! canonical schema cannot represent, so this translation is deliberately
//! lossy: expressions are embedded verbatim under synthetic label keys, the
//! original top-level selector is recorded in an annotation, and every
//! converted policy carries a manual-review advisory.

use netpol_model::source::{CalicoEntityRule, CalicoNetworkPolicy, CalicoRule};
use netpol_model::CiliumNetworkPolicy;

use super::rule::{translate_rule, PortRequest, RuleParts};
use super::selector::{
    EndpointSelection, ExpressionScope, SelectorFragment, CONVERSION_WARNING_ANNOTATION,
};
use super::{note_annotations, selector::translate_selection};

/// Advisory text attached to every converted Calico policy.
pub const CONVERSION_WARNING: &str =
    "This policy was automatically converted from Calico format. Please verify its correctness.";

/// Fallback namespace for cluster-scoped Calico policies.
const DEFAULT_NAMESPACE: &str = "default";

/// Translate one Calico NetworkPolicy into a canonical policy.
pub fn to_cilium(policy: &CalicoNetworkPolicy) -> CiliumNetworkPolicy {
    let namespace = policy
        .metadata
        .namespace
        .as_deref()
        .unwrap_or(DEFAULT_NAMESPACE);
    let mut out = CiliumNetworkPolicy::new(&policy.metadata.name, namespace);

    if let Some(labels) = &policy.metadata.labels {
        out.metadata.labels = labels.clone();
    }

    if let Some(expression) = &policy.spec.selector {
        let translated = translate_selection(&EndpointSelection::Expression {
            scope: ExpressionScope::Workload,
            expression: expression.clone(),
        });
        if let SelectorFragment::Endpoint(endpoint) = translated.fragment {
            out.spec.endpoint_selector = Some(endpoint);
        }
        note_annotations(&mut out, translated.annotations);
    }

    if let Some(rules) = &policy.spec.ingress {
        let mut ingress = Vec::with_capacity(rules.len());
        for rule in rules {
            let parts = translate_directional(rule, rule.source.as_ref());
            note_annotations(&mut out, parts.annotations.clone());
            ingress.push(parts.into_ingress());
        }
        out.spec.ingress = Some(ingress);
    }

    if let Some(rules) = &policy.spec.egress {
        let mut egress = Vec::with_capacity(rules.len());
        for rule in rules {
            let parts = translate_directional(rule, rule.destination.as_ref());
            note_annotations(&mut out, parts.annotations.clone());
            egress.push(parts.into_egress());
        }
        out.spec.egress = Some(egress);
    }

    if let Some(types) = &policy.spec.types {
        out.spec.policy_types = Some(types.clone());
    }

    out.metadata.annotations.insert(
        CONVERSION_WARNING_ANNOTATION.to_string(),
        CONVERSION_WARNING.to_string(),
    );

    out
}

/// Translate one directional Calico rule. Endpoint selections come from the
/// given entity (source for ingress, destination for egress); ports always
/// come from the destination entity, which is where Calico declares them.
fn translate_directional(rule: &CalicoRule, entity: Option<&CalicoEntityRule>) -> RuleParts {
    let mut selections = Vec::new();
    if let Some(entity) = entity {
        if let Some(expression) = &entity.selector {
            selections.push(EndpointSelection::Expression {
                scope: ExpressionScope::Workload,
                expression: expression.clone(),
            });
        }
        if let Some(expression) = &entity.namespace_selector {
            selections.push(EndpointSelection::Expression {
                scope: ExpressionScope::Namespace,
                expression: expression.clone(),
            });
        }
        for net in entity.nets.as_deref().unwrap_or(&[]) {
            selections.push(EndpointSelection::Cidr(netpol_model::source::IpBlock {
                cidr: net.clone(),
                except: None,
            }));
        }
    }

    let ports: Vec<PortRequest> = rule
        .destination
        .as_ref()
        .and_then(|d| d.ports.as_ref())
        .map(|ports| {
            ports
                .iter()
                .map(|port| PortRequest {
                    value: port.to_string(),
                    end: None,
                    protocol: rule.protocol.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    translate_rule(&selections, &ports)
}

#[cfg(test)]
mod tests {
    use netpol_model::{SourceKind, SourcePolicy};
    use pretty_assertions::assert_eq;

    use super::super::selector::ORIGINAL_SELECTOR_ANNOTATION;
    use super::{to_cilium, CONVERSION_WARNING};

    fn parse(yaml: &str) -> netpol_model::source::CalicoNetworkPolicy {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).expect("parse");
        match SourcePolicy::from_value(SourceKind::Calico, value).expect("interpret") {
            SourcePolicy::Calico(policy) => policy,
            SourcePolicy::K8s(_) => unreachable!(),
        }
    }

    #[test]
    fn opaque_selector_is_embedded_and_annotated() {
        let policy = parse(
            r#"
metadata:
  name: test-policy
spec:
  selector: app == "test"
"#,
        );
        let out = to_cilium(&policy);
        let selector = out.spec.endpoint_selector.expect("selector");
        assert_eq!(
            selector
                .match_labels
                .expect("labels")
                .get("calico-selector"),
            Some(&"app == \"test\"".to_string())
        );
        assert_eq!(
            out.metadata.annotations.get(ORIGINAL_SELECTOR_ANNOTATION),
            Some(&"app == \"test\"".to_string())
        );
    }

    #[test]
    fn every_converted_policy_carries_the_review_advisory() {
        let policy = parse("metadata:\n  name: bare\nspec: {}\n");
        let out = to_cilium(&policy);
        assert_eq!(
            out.metadata.annotations.get("conversion-warning"),
            Some(&CONVERSION_WARNING.to_string())
        );
    }

    #[test]
    fn missing_namespace_defaults() {
        let policy = parse("metadata:\n  name: cluster-wide\nspec: {}\n");
        assert_eq!(to_cilium(&policy).metadata.namespace, "default");
    }

    #[test]
    fn ingress_ports_come_from_the_destination_entity() {
        let policy = parse(
            r#"
metadata:
  name: web
  namespace: prod
spec:
  selector: app == "web"
  ingress:
    - action: Allow
      protocol: TCP
      source:
        selector: role == "client"
      destination:
        ports:
          - "8080:8090"
"#,
        );
        let out = to_cilium(&policy);
        let ingress = out.spec.ingress.expect("ingress");
        let rule = &ingress[0];
        let endpoints = rule.from_endpoints.as_ref().expect("endpoints");
        assert_eq!(
            endpoints[0]
                .match_labels
                .as_ref()
                .expect("labels")
                .get("calico-selector"),
            Some(&"role == \"client\"".to_string())
        );
        let spec = &rule.to_ports.as_ref().expect("ports")[0].ports[0];
        assert_eq!(spec.port, "8080");
        assert_eq!(spec.end_port.as_deref(), Some("8090"));
        assert_eq!(spec.protocol, "TCP");
    }

    #[test]
    fn nets_accumulate_into_the_cidr_list() {
        let policy = parse(
            r#"
metadata:
  name: db
  namespace: prod
spec:
  selector: app == "db"
  egress:
    - action: Allow
      destination:
        nets:
          - 10.1.0.0/16
          - 10.2.0.0/16
"#,
        );
        let out = to_cilium(&policy);
        let egress = out.spec.egress.expect("egress");
        let rule = &egress[0];
        assert_eq!(
            rule.to_cidr,
            Some(vec!["10.1.0.0/16".to_string(), "10.2.0.0/16".to_string()])
        );
        assert!(rule.to_cidr_set.is_none());
    }

    #[test]
    fn top_level_selector_annotation_survives_rule_selectors() {
        let policy = parse(
            r#"
metadata:
  name: layered
  namespace: prod
spec:
  selector: app == "api"
  ingress:
    - action: Allow
      source:
        selector: role == "client"
"#,
        );
        let out = to_cilium(&policy);
        assert_eq!(
            out.metadata.annotations.get(ORIGINAL_SELECTOR_ANNOTATION),
            Some(&"app == \"api\"".to_string())
        );
    }

    #[test]
    fn declared_types_map_to_policy_types() {
        let policy = parse(
            r#"
metadata:
  name: typed
  namespace: prod
spec:
  selector: all()
  types:
    - Ingress
"#,
        );
        let out = to_cilium(&policy);
        assert_eq!(out.spec.policy_types, Some(vec!["Ingress".to_string()]));
    }
}
