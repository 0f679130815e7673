//! Structural validation of converted policies.
//!
//! Checks a canonical policy for required fields and internally consistent
//! collections. Checks are independent; all applicable defects are collected
//! in one pass. Port numeric ranges and CIDR syntax are deliberately not
//! checked.

use netpol_model::{CiliumNetworkPolicy, PortRule, CILIUM_API_VERSION, CILIUM_KIND};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDefect {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub defects: Vec<ValidationDefect>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.defects.is_empty()
    }
}

/// Validate one canonical policy.
pub fn build_validation_report(policy: &CiliumNetworkPolicy) -> ValidationReport {
    let mut defects = Vec::new();

    if policy.api_version.is_empty() {
        defects.push(missing("missing apiVersion"));
    } else if policy.api_version != CILIUM_API_VERSION {
        defects.push(invalid(&format!(
            "invalid apiVersion: {}, expected: {CILIUM_API_VERSION}",
            policy.api_version
        )));
    }

    if policy.kind.is_empty() {
        defects.push(missing("missing kind"));
    } else if policy.kind != CILIUM_KIND {
        defects.push(invalid(&format!(
            "invalid kind: {}, expected: {CILIUM_KIND}",
            policy.kind
        )));
    }

    if policy.metadata.name.is_empty() {
        defects.push(missing("missing metadata.name"));
    }

    if policy.spec.endpoint_selector.is_none() {
        defects.push(missing("missing spec.endpointSelector"));
    }

    for (i, rule) in policy.spec.ingress.as_deref().unwrap_or(&[]).iter().enumerate() {
        if let Some(endpoints) = &rule.from_endpoints {
            if endpoints.is_empty() {
                defects.push(empty(&format!("empty fromEndpoints in ingress rule {i}")));
            }
        }
        defects.extend(port_defects(rule.to_ports.as_deref(), "ingress", i));
    }

    for (i, rule) in policy.spec.egress.as_deref().unwrap_or(&[]).iter().enumerate() {
        if let Some(endpoints) = &rule.to_endpoints {
            if endpoints.is_empty() {
                defects.push(empty(&format!("empty toEndpoints in egress rule {i}")));
            }
        }
        defects.extend(port_defects(rule.to_ports.as_deref(), "egress", i));
    }

    ValidationReport { defects }
}

/// Render a validation report for terminal output.
pub fn render_validation_text(report: &ValidationReport) -> String {
    let mut out = Vec::new();
    out.push(format!("result defects={}", report.defects.len()));
    out.push("defects".to_string());
    if report.defects.is_empty() {
        out.push("- none".to_string());
        return out.join("\n");
    }
    for defect in &report.defects {
        out.push(format!("- [{}] {}", defect.code, defect.message));
    }
    out.join("\n")
}

fn port_defects(to_ports: Option<&[PortRule]>, direction: &str, rule: usize) -> Vec<ValidationDefect> {
    let mut out = Vec::new();
    for (j, port_rule) in to_ports.unwrap_or(&[]).iter().enumerate() {
        if port_rule.ports.is_empty() {
            out.push(empty(&format!(
                "missing or empty ports in {direction} rule {rule}, toPorts {j}"
            )));
        }
    }
    out
}

fn missing(message: &str) -> ValidationDefect {
    defect("missing_field", message)
}

fn invalid(message: &str) -> ValidationDefect {
    defect("invalid_value", message)
}

fn empty(message: &str) -> ValidationDefect {
    defect("empty_collection", message)
}

fn defect(code: &str, message: &str) -> ValidationDefect {
    ValidationDefect {
        code: code.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use netpol_model::{
        CiliumNetworkPolicy, EgressRule, EndpointSelector, IngressRule, PortProtocol, PortRule,
    };
    use pretty_assertions::assert_eq;

    use super::*;

    fn port_rule(port: &str) -> PortRule {
        PortRule {
            ports: vec![PortProtocol {
                port: port.to_string(),
                end_port: None,
                protocol: "TCP".to_string(),
            }],
        }
    }

    #[test]
    fn well_formed_policy_validates_clean() {
        let mut policy = CiliumNetworkPolicy::new("frontend", "default");
        policy.spec.ingress = Some(vec![IngressRule {
            from_endpoints: Some(vec![EndpointSelector::default()]),
            to_ports: Some(vec![port_rule("8080")]),
            ..IngressRule::default()
        }]);
        let report = build_validation_report(&policy);
        assert!(report.is_valid(), "unexpected defects: {:?}", report.defects);
    }

    #[test]
    fn missing_endpoint_selector_is_reported() {
        let mut policy = CiliumNetworkPolicy::new("frontend", "default");
        policy.spec.endpoint_selector = None;
        let report = build_validation_report(&policy);
        assert!(!report.is_valid());
        assert!(report
            .defects
            .iter()
            .any(|d| d.message.contains("spec.endpointSelector")));
    }

    #[test]
    fn tag_mismatches_are_defects_not_aborts() {
        let mut policy = CiliumNetworkPolicy::new("", "default");
        policy.api_version = "cilium.io/v1".to_string();
        policy.kind = "NetworkPolicy".to_string();
        let report = build_validation_report(&policy);
        let codes: Vec<&str> = report.defects.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["invalid_value", "invalid_value", "missing_field"]);
        assert!(report.defects[0]
            .message
            .contains("expected: cilium.io/v2"));
    }

    #[test]
    fn empty_rule_collections_are_reported_per_rule() {
        let mut policy = CiliumNetworkPolicy::new("frontend", "default");
        policy.spec.ingress = Some(vec![
            IngressRule::default(),
            IngressRule {
                from_endpoints: Some(Vec::new()),
                to_ports: Some(vec![PortRule { ports: Vec::new() }]),
                ..IngressRule::default()
            },
        ]);
        policy.spec.egress = Some(vec![EgressRule {
            to_endpoints: Some(Vec::new()),
            ..EgressRule::default()
        }]);
        let report = build_validation_report(&policy);
        let messages: Vec<&str> = report.defects.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "empty fromEndpoints in ingress rule 1",
                "missing or empty ports in ingress rule 1, toPorts 0",
                "empty toEndpoints in egress rule 0",
            ]
        );
    }

    #[test]
    fn all_defects_collected_in_one_pass() {
        let policy = CiliumNetworkPolicy {
            api_version: String::new(),
            kind: String::new(),
            metadata: netpol_model::Metadata::default(),
            spec: netpol_model::PolicySpec::default(),
        };
        let report = build_validation_report(&policy);
        assert_eq!(report.defects.len(), 4);
    }

    #[test]
    fn render_lists_defects_with_codes() {
        let mut policy = CiliumNetworkPolicy::new("frontend", "default");
        policy.spec.endpoint_selector = None;
        let text = render_validation_text(&build_validation_report(&policy));
        assert!(text.contains("result defects=1"));
        assert!(text.contains("[missing_field] missing spec.endpointSelector"));
    }
}
