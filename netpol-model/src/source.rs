//! Typed source policy schemas.
//!
//! Two dialects are recognized: the Kubernetes NetworkPolicy schema and the
//! Calico NetworkPolicy schema with its string selector grammar. Both are
//! deserialized leniently; a field the schema marks optional is a true
//! `Option` here rather than a missing mapping key. Calico selector strings
//! are carried opaque and never evaluated.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::cilium::MatchExpression;

/// Which source dialect a batch of documents belongs to.
///
/// The category is supplied by the caller (one subdirectory per category);
/// this crate never sniffs document contents to guess it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    K8s,
    Calico,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::K8s => "k8s",
            SourceKind::Calico => "calico",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loaded source policy, tagged by dialect.
#[derive(Debug, Clone, PartialEq)]
pub enum SourcePolicy {
    K8s(K8sNetworkPolicy),
    Calico(CalicoNetworkPolicy),
}

impl SourcePolicy {
    /// Interpret a loaded YAML document according to its declared category.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error when the document's structure does
    /// not match the schema for `kind`.
    pub fn from_value(kind: SourceKind, value: serde_yaml::Value) -> Result<Self, serde_yaml::Error> {
        match kind {
            SourceKind::K8s => serde_yaml::from_value(value).map(SourcePolicy::K8s),
            SourceKind::Calico => serde_yaml::from_value(value).map(SourcePolicy::Calico),
        }
    }
}

/// Metadata block shared by both source dialects.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub annotations: Option<BTreeMap<String, String>>,
}

/// A port value as it appears in a source document: either a number or a
/// string (a named port, or Calico's `"start:end"` range syntax).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PortValue {
    Number(i64),
    Name(String),
}

impl fmt::Display for PortValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortValue::Number(n) => write!(f, "{n}"),
            PortValue::Name(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct K8sNetworkPolicy {
    pub metadata: ObjectMeta,
    pub spec: K8sPolicySpec,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct K8sPolicySpec {
    #[serde(default)]
    pub pod_selector: Option<LabelSelector>,
    #[serde(default)]
    pub ingress: Option<Vec<K8sRule>>,
    #[serde(default)]
    pub egress: Option<Vec<K8sRule>>,
    #[serde(default)]
    pub policy_types: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    #[serde(default)]
    pub match_labels: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub match_expressions: Option<Vec<MatchExpression>>,
}

/// One directional Kubernetes rule. Ingress rules populate `from`, egress
/// rules populate `to`; both share the same port list shape.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct K8sRule {
    #[serde(default)]
    pub from: Option<Vec<K8sPeer>>,
    #[serde(default)]
    pub to: Option<Vec<K8sPeer>>,
    #[serde(default)]
    pub ports: Option<Vec<K8sPort>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct K8sPeer {
    #[serde(default)]
    pub pod_selector: Option<LabelSelector>,
    #[serde(default)]
    pub namespace_selector: Option<LabelSelector>,
    #[serde(default)]
    pub ip_block: Option<IpBlock>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IpBlock {
    pub cidr: String,
    #[serde(default)]
    pub except: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct K8sPort {
    #[serde(default)]
    pub port: Option<PortValue>,
    #[serde(default)]
    pub end_port: Option<PortValue>,
    #[serde(default)]
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CalicoNetworkPolicy {
    pub metadata: ObjectMeta,
    pub spec: CalicoPolicySpec,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CalicoPolicySpec {
    /// Opaque Calico selector expression, e.g. `app == "frontend"`.
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub ingress: Option<Vec<CalicoRule>>,
    #[serde(default)]
    pub egress: Option<Vec<CalicoRule>>,
    #[serde(default)]
    pub types: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CalicoRule {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub source: Option<CalicoEntityRule>,
    #[serde(default)]
    pub destination: Option<CalicoEntityRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalicoEntityRule {
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub namespace_selector: Option<String>,
    #[serde(default)]
    pub nets: Option<Vec<String>>,
    #[serde(default)]
    pub ports: Option<Vec<PortValue>>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn k8s_policy_deserializes_with_optional_fields_absent() {
        let yaml = r#"
apiVersion: networking.k8s.io/v1
kind: NetworkPolicy
metadata:
  name: deny-all
  namespace: prod
spec:
  podSelector: {}
"#;
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).expect("parse");
        let policy = SourcePolicy::from_value(SourceKind::K8s, value).expect("interpret");
        let SourcePolicy::K8s(policy) = policy else {
            panic!("expected k8s variant");
        };
        assert_eq!(policy.metadata.name, "deny-all");
        assert_eq!(policy.metadata.namespace.as_deref(), Some("prod"));
        assert!(policy.spec.ingress.is_none());
        assert!(policy.spec.egress.is_none());
    }

    #[test]
    fn k8s_interpretation_fails_without_metadata_name() {
        let yaml = "metadata:\n  namespace: prod\nspec:\n  podSelector: {}\n";
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).expect("parse");
        assert!(SourcePolicy::from_value(SourceKind::K8s, value).is_err());
    }

    #[test]
    fn calico_ports_accept_numbers_and_range_strings() {
        let yaml = r#"
metadata:
  name: web
spec:
  selector: app == "web"
  ingress:
    - action: Allow
      protocol: TCP
      destination:
        ports:
          - 80
          - "8080:8090"
"#;
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).expect("parse");
        let policy = SourcePolicy::from_value(SourceKind::Calico, value).expect("interpret");
        let SourcePolicy::Calico(policy) = policy else {
            panic!("expected calico variant");
        };
        let rule = &policy.spec.ingress.as_ref().expect("ingress")[0];
        let ports = rule
            .destination
            .as_ref()
            .and_then(|d| d.ports.as_ref())
            .expect("ports");
        assert_eq!(ports[0].to_string(), "80");
        assert_eq!(ports[1].to_string(), "8080:8090");
    }
}
