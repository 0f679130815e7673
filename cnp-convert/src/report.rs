//! Conversion report rendering.

use colored::Colorize;

use crate::manifest::{ConversionManifest, ConversionRecord, RecordStatus};

/// Render one-line summary counts for terminal output.
pub fn render_summary(manifest: &ConversionManifest) -> String {
    format!(
        "convert_summary total={} converted={} failed={} validation_failed={} applied={}",
        manifest.total_count,
        manifest.converted_count,
        manifest.failed_count,
        manifest.validation_failed_count,
        manifest.applied_count
    )
    .cyan()
    .to_string()
}

/// Render the human-readable markdown conversion report.
///
/// Always produced, even when every document failed; the tables degrade to
/// an explanatory line instead of disappearing.
pub fn render_markdown(manifest: &ConversionManifest, validate: bool, apply: bool) -> String {
    let mut out = Vec::new();
    out.push("# Network Policy Conversion Report".to_string());
    out.push(String::new());
    out.push(format!("**Source CNI:** {}", manifest.source_cni));
    out.push(format!("**Timestamp:** {}", manifest.timestamp));
    out.push(String::new());
    out.push("## Summary".to_string());
    out.push(String::new());
    out.push(format!("- Total policies: {}", manifest.total_count));
    out.push(format!(
        "- Successfully converted: {}",
        manifest.converted_count
    ));
    out.push(format!("- Failed to convert: {}", manifest.failed_count));
    if validate {
        out.push(format!(
            "- Failed validation: {}",
            manifest.validation_failed_count
        ));
    }
    if apply {
        out.push(format!("- Applied to cluster: {}", manifest.applied_count));
    }
    out.push(String::new());
    out.push("## Policy Details".to_string());
    out.push(String::new());

    let converted: Vec<&ConversionRecord> = manifest
        .policies
        .iter()
        .filter(|p| p.status == RecordStatus::Converted)
        .collect();
    let failed: Vec<&ConversionRecord> = manifest
        .policies
        .iter()
        .filter(|p| p.status == RecordStatus::Failed)
        .collect();

    out.push("### Successfully Converted Policies".to_string());
    out.push(String::new());
    if converted.is_empty() {
        out.push("No policies were successfully converted.".to_string());
    } else {
        out.push("| Source | Filename | Validation | Applied |".to_string());
        out.push("|--------|----------|------------|---------|".to_string());
        for record in converted {
            let validation = match record.validation {
                None => "n/a",
                Some(true) => "passed",
                Some(false) => "failed",
            };
            let applied = if record.applied { "yes" } else { "no" };
            out.push(format!(
                "| {} | {} | {} | {} |",
                record.source_type, record.filename, validation, applied
            ));
        }
    }

    out.push(String::new());
    out.push("### Failed Policies".to_string());
    out.push(String::new());
    if failed.is_empty() {
        out.push("No policies failed conversion.".to_string());
    } else {
        out.push("| Source | Filename | Errors |".to_string());
        out.push("|--------|----------|--------|".to_string());
        for record in failed {
            out.push(format!(
                "| {} | {} | {} |",
                record.source_type,
                record.filename,
                record.errors.join("<br>")
            ));
        }
    }
    out.push(String::new());

    out.join("\n")
}
