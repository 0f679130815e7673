//! Typed network policy models and YAML document primitives used by higher-level tools.

pub mod cilium;
pub mod loader;
pub mod source;

pub use cilium::{
    CidrRule, CiliumNetworkPolicy, EgressRule, EndpointSelector, IngressRule, MatchExpression,
    Metadata, PolicySpec, PortProtocol, PortRule, CILIUM_API_VERSION, CILIUM_KIND,
};
pub use loader::{load, load_file, write, write_file, LoadError, WriteError};
pub use source::{SourceKind, SourcePolicy};
