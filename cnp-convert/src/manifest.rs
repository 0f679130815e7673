//! Conversion manifest: per-document records and aggregate counters.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Converted,
    Failed,
}

/// Outcome of one document's pipeline. Finalized when the document leaves
/// the orchestrator; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRecord {
    pub source_type: String,
    pub filename: String,
    pub status: RecordStatus,
    /// `None` when validation was not run, otherwise whether it passed.
    pub validation: Option<bool>,
    pub applied: bool,
    pub errors: Vec<String>,
}

impl ConversionRecord {
    pub fn new(source_type: &str, filename: &str) -> Self {
        Self {
            source_type: source_type.to_string(),
            filename: filename.to_string(),
            status: RecordStatus::Failed,
            validation: None,
            applied: false,
            errors: Vec::new(),
        }
    }
}

/// Aggregate result of one batch conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionManifest {
    pub source_cni: String,
    pub converted_count: usize,
    pub failed_count: usize,
    pub validation_failed_count: usize,
    pub applied_count: usize,
    pub total_count: usize,
    pub policies: Vec<ConversionRecord>,
    pub timestamp: String,
}

impl ConversionManifest {
    /// Build the manifest from finalized records, computing every counter.
    pub fn build(source_cni: &str, policies: Vec<ConversionRecord>) -> Self {
        let converted_count = policies
            .iter()
            .filter(|p| p.status == RecordStatus::Converted)
            .count();
        let failed_count = policies
            .iter()
            .filter(|p| p.status == RecordStatus::Failed)
            .count();
        let validation_failed_count = policies
            .iter()
            .filter(|p| p.validation == Some(false))
            .count();
        let applied_count = policies.iter().filter(|p| p.applied).count();
        Self {
            source_cni: source_cni.to_string(),
            converted_count,
            failed_count,
            validation_failed_count,
            applied_count,
            total_count: converted_count + failed_count,
            policies,
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn counters_are_computed_from_records() {
        let mut converted = ConversionRecord::new("k8s", "a.yaml");
        converted.status = RecordStatus::Converted;
        converted.validation = Some(true);
        converted.applied = true;

        let mut invalid = ConversionRecord::new("k8s", "b.yaml");
        invalid.status = RecordStatus::Converted;
        invalid.validation = Some(false);

        let failed = ConversionRecord::new("calico", "c.yaml");

        let manifest = ConversionManifest::build("calico", vec![converted, invalid, failed]);
        assert_eq!(manifest.converted_count, 2);
        assert_eq!(manifest.failed_count, 1);
        assert_eq!(manifest.validation_failed_count, 1);
        assert_eq!(manifest.applied_count, 1);
        assert_eq!(manifest.total_count, 3);
    }

    #[test]
    fn record_serializes_with_tri_state_validation() {
        let record = ConversionRecord::new("k8s", "a.yaml");
        let json = serde_json::to_string(&record).expect("serialize");
        assert!(json.contains("\"validation\":null"));
        assert!(json.contains("\"status\":\"failed\""));
    }
}
