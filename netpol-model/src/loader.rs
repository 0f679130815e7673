//! YAML document loading and writing.
//!
//! Loading stops at the generic [`serde_yaml::Value`] level on purpose: a
//! file that is not valid YAML is a load failure, while a well-formed
//! document whose shape does not match its declared schema is an
//! interpretation failure surfaced later by [`crate::source::SourcePolicy`].

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::cilium::CiliumNetworkPolicy;

/// Errors that can occur while loading a YAML document.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Input bytes were not a valid YAML document.
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Failed to read the input file.
    #[error("failed to read YAML file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while writing a canonical policy document.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Failed to serialize the policy to YAML.
    #[error("failed to serialize YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Failed to write the output file.
    #[error("failed to write YAML file: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse YAML text into a generic document value.
pub fn load(yaml: &str) -> Result<serde_yaml::Value, LoadError> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Read and parse one YAML document from `path`.
pub fn load_file(path: &Path) -> Result<serde_yaml::Value, LoadError> {
    let text = fs::read_to_string(path)?;
    load(&text)
}

/// Serialize a canonical policy into YAML text.
pub fn write(policy: &CiliumNetworkPolicy) -> Result<String, WriteError> {
    Ok(serde_yaml::to_string(policy)?)
}

/// Serialize a canonical policy and write it to `path`.
pub fn write_file(policy: &CiliumNetworkPolicy, path: &Path) -> Result<(), WriteError> {
    let text = write(policy)?;
    fs::write(path, text)?;
    Ok(())
}
