//! Batch conversion orchestration.
//!
//! Walks an input tree (one subdirectory per source category, one YAML
//! document per file), runs each document through the
//! load → translate → validate → persist → apply pipeline, and produces a
//! [`ConversionManifest`]. Per-document pipelines are independent: a load or
//! translation failure is recorded on that document's record and the batch
//! moves on. A validation failure is recorded separately and the converted
//! output is still written, for manual correction.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use netpol_model::{load_file, write_file, SourceKind};
use tracing::{info, warn};

use crate::apply::{apply_with_retry, ApplyOptions, ApplyOutcome, PolicyApplier};
use crate::manifest::{ConversionManifest, ConversionRecord, RecordStatus};
use crate::report::render_markdown;
use crate::translate::translate;
use crate::validate::build_validation_report;

/// Name of the machine-readable manifest file.
pub const MANIFEST_FILENAME: &str = "conversion_summary.json";
/// Name of the human-readable report file.
pub const REPORT_FILENAME: &str = "conversion_report.md";
/// Subdirectory holding per-document validation defect files.
pub const VALIDATION_DIRNAME: &str = "validation";

#[derive(Debug, Clone, Copy)]
pub struct ConvertOptions {
    /// Run the structural validator over each converted policy.
    pub validate: bool,
    /// Hand validated policies to the applier.
    pub apply: bool,
    pub apply_options: ApplyOptions,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            validate: true,
            apply: false,
            apply_options: ApplyOptions::default(),
        }
    }
}

/// Cooperative cancellation for a batch run.
///
/// Cancelling stops submission of new documents; the in-flight document
/// finishes so no output file is left half-written.
#[derive(Debug, Default)]
pub struct CancelFlag(AtomicBool);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Convert every policy document under `input_dir` into `output_dir`.
///
/// Documents are read from `<input_dir>/k8s/` and, for the Calico category,
/// `<input_dir>/calico/` as well; converted documents land at the mirrored
/// relative path. Filenames are processed in sorted order so the manifest's
/// record list is reproducible. The manifest and report files are written
/// even when every document fails.
///
/// # Errors
///
/// Returns an error only for batch-level failures (output directories or
/// the manifest/report files cannot be written). Per-document failures are
/// recorded in the manifest instead.
pub fn convert_policies(
    source: SourceKind,
    input_dir: &Path,
    output_dir: &Path,
    options: &ConvertOptions,
    applier: Option<&dyn PolicyApplier>,
    cancel: Option<&CancelFlag>,
) -> Result<ConversionManifest> {
    let mut categories = vec![SourceKind::K8s];
    if source == SourceKind::Calico {
        categories.push(SourceKind::Calico);
    }

    for category in &categories {
        let dir = output_dir.join(category.as_str());
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    }
    let validation_dir = output_dir.join(VALIDATION_DIRNAME);
    fs::create_dir_all(&validation_dir).with_context(|| {
        format!(
            "failed to create validation directory {}",
            validation_dir.display()
        )
    })?;

    let mut records = Vec::new();
    'categories: for category in categories {
        let category_dir = input_dir.join(category.as_str());
        if !category_dir.is_dir() {
            continue;
        }
        for filename in list_policy_files(&category_dir)? {
            if cancel.is_some_and(CancelFlag::is_cancelled) {
                warn!("conversion cancelled; stopping submission of new documents");
                break 'categories;
            }
            records.push(convert_one(
                category,
                &category_dir.join(&filename),
                &filename,
                output_dir,
                options,
                applier,
            ));
        }
    }

    let manifest = ConversionManifest::build(source.as_str(), records);

    let manifest_path = output_dir.join(MANIFEST_FILENAME);
    let json = serde_json::to_string_pretty(&manifest).context("failed to serialize manifest")?;
    fs::write(&manifest_path, json)
        .with_context(|| format!("failed to write {}", manifest_path.display()))?;

    let report_path = output_dir.join(REPORT_FILENAME);
    fs::write(
        &report_path,
        render_markdown(&manifest, options.validate, options.apply),
    )
    .with_context(|| format!("failed to write {}", report_path.display()))?;

    Ok(manifest)
}

/// Run one document through the pipeline, always yielding a finalized record.
fn convert_one(
    category: SourceKind,
    path: &Path,
    filename: &str,
    output_dir: &Path,
    options: &ConvertOptions,
    applier: Option<&dyn PolicyApplier>,
) -> ConversionRecord {
    let mut record = ConversionRecord::new(category.as_str(), filename);

    let value = match load_file(path) {
        Ok(value) => value,
        Err(err) => {
            warn!(%category, filename, "failed to load document: {err}");
            record.errors.push(format!("failed to load document: {err}"));
            return record;
        }
    };

    let policy = match translate(category, value) {
        Ok(policy) => policy,
        Err(err) => {
            warn!(%category, filename, "failed to translate policy: {err}");
            record
                .errors
                .push(format!("failed to translate policy: {err}"));
            return record;
        }
    };

    if options.validate {
        let report = build_validation_report(&policy);
        record.validation = Some(report.is_valid());
        if !report.is_valid() {
            warn!(
                %category,
                filename,
                defects = report.defects.len(),
                "validation failed for converted policy"
            );
            record
                .errors
                .extend(report.defects.iter().map(|d| d.message.clone()));
            let defect_path = output_dir
                .join(VALIDATION_DIRNAME)
                .join(format!("{category}-{filename}.errors"));
            let mut lines: Vec<&str> =
                report.defects.iter().map(|d| d.message.as_str()).collect();
            lines.push("");
            if let Err(err) = fs::write(&defect_path, lines.join("\n")) {
                record
                    .errors
                    .push(format!("failed to write defect file: {err}"));
            }
        }
    }

    let out_path = output_dir.join(category.as_str()).join(filename);
    if let Err(err) = write_file(&policy, &out_path) {
        record
            .errors
            .push(format!("failed to write converted policy: {err}"));
        return record;
    }
    record.status = RecordStatus::Converted;
    info!(%category, filename, "converted policy {}", policy.metadata.name);

    if options.apply && record.validation.unwrap_or(true) {
        if let Some(applier) = applier {
            match apply_with_retry(applier, &policy, options.apply_options) {
                ApplyOutcome::Applied => {
                    record.applied = true;
                    info!(%category, filename, "applied converted policy");
                }
                ApplyOutcome::AlreadyExists(message) => {
                    record
                        .errors
                        .push(format!("policy already exists: {message}"));
                }
                ApplyOutcome::Failed(message) => {
                    warn!(%category, filename, "failed to apply converted policy: {message}");
                    record
                        .errors
                        .push(format!("error applying policy: {message}"));
                }
            }
        }
    }

    record
}

/// List `.yaml`/`.yml` files in a category directory, sorted by name.
fn list_policy_files(dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("failed to read directory {}", dir.display()))?
    {
        let entry = entry.with_context(|| format!("failed to read directory {}", dir.display()))?;
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".yaml") || name.ends_with(".yml") {
            files.push(name);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Mutex;

    use netpol_model::CiliumNetworkPolicy;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use crate::apply::{ApplyError, PolicyApplier};

    use super::*;

    const K8S_POLICY: &str = r#"
metadata:
  name: frontend
  namespace: default
spec:
  podSelector:
    matchLabels:
      app: frontend
"#;

    fn seed(input: &Path, category: &str, filename: &str, content: &str) {
        let dir = input.join(category);
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join(filename), content).expect("write");
    }

    #[test]
    fn one_bad_document_never_aborts_the_batch() {
        let input = tempdir().expect("tempdir");
        let output = tempdir().expect("tempdir");
        seed(input.path(), "k8s", "a.yaml", K8S_POLICY);
        seed(input.path(), "k8s", "b.yaml", "metadata: [unclosed");
        seed(input.path(), "k8s", "c.yaml", K8S_POLICY);

        let manifest = convert_policies(
            SourceKind::K8s,
            input.path(),
            output.path(),
            &ConvertOptions::default(),
            None,
            None,
        )
        .expect("convert");

        assert_eq!(manifest.total_count, 3);
        assert_eq!(manifest.converted_count, 2);
        assert_eq!(manifest.failed_count, 1);
        assert!(output.path().join("k8s/a.yaml").is_file());
        assert!(!output.path().join("k8s/b.yaml").exists());
        assert!(output.path().join("k8s/c.yaml").is_file());
        assert!(output.path().join(MANIFEST_FILENAME).is_file());
        assert!(output.path().join(REPORT_FILENAME).is_file());
    }

    #[test]
    fn records_keep_sorted_filename_order() {
        let input = tempdir().expect("tempdir");
        let output = tempdir().expect("tempdir");
        seed(input.path(), "k8s", "zeta.yaml", K8S_POLICY);
        seed(input.path(), "k8s", "alpha.yaml", K8S_POLICY);
        seed(input.path(), "k8s", "notes.txt", "ignored");

        let manifest = convert_policies(
            SourceKind::K8s,
            input.path(),
            output.path(),
            &ConvertOptions::default(),
            None,
            None,
        )
        .expect("convert");

        let names: Vec<&str> = manifest
            .policies
            .iter()
            .map(|p| p.filename.as_str())
            .collect();
        assert_eq!(names, vec!["alpha.yaml", "zeta.yaml"]);
    }

    #[test]
    fn validation_failure_still_writes_output_and_defect_file() {
        let input = tempdir().expect("tempdir");
        let output = tempdir().expect("tempdir");
        // An empty name converts but fails structural validation.
        seed(
            input.path(),
            "k8s",
            "unnamed.yaml",
            "metadata:\n  name: \"\"\n  namespace: default\nspec:\n  podSelector: {}\n",
        );

        let manifest = convert_policies(
            SourceKind::K8s,
            input.path(),
            output.path(),
            &ConvertOptions::default(),
            None,
            None,
        )
        .expect("convert");

        assert_eq!(manifest.converted_count, 1);
        assert_eq!(manifest.validation_failed_count, 1);
        let record = &manifest.policies[0];
        assert_eq!(record.status, RecordStatus::Converted);
        assert_eq!(record.validation, Some(false));
        assert!(output.path().join("k8s/unnamed.yaml").is_file());

        let defects = fs::read_to_string(
            output
                .path()
                .join("validation")
                .join("k8s-unnamed.yaml.errors"),
        )
        .expect("defect file");
        assert!(defects.contains("missing metadata.name"));
    }

    struct RecordingApplier {
        seen: Mutex<Vec<String>>,
        conflict_on: Option<&'static str>,
    }

    impl PolicyApplier for RecordingApplier {
        fn apply(&self, policy: &CiliumNetworkPolicy) -> Result<(), ApplyError> {
            self.seen.lock().unwrap().push(policy.metadata.name.clone());
            if self.conflict_on == Some(policy.metadata.name.as_str()) {
                return Err(ApplyError::Conflict(policy.metadata.name.clone()));
            }
            Ok(())
        }
    }

    #[test]
    fn apply_conflict_is_recorded_without_failing_the_document() {
        let input = tempdir().expect("tempdir");
        let output = tempdir().expect("tempdir");
        seed(input.path(), "k8s", "a.yaml", K8S_POLICY);

        let applier = RecordingApplier {
            seen: Mutex::new(Vec::new()),
            conflict_on: Some("frontend"),
        };
        let options = ConvertOptions {
            apply: true,
            ..ConvertOptions::default()
        };
        let manifest = convert_policies(
            SourceKind::K8s,
            input.path(),
            output.path(),
            &options,
            Some(&applier),
            None,
        )
        .expect("convert");

        let record = &manifest.policies[0];
        assert_eq!(record.status, RecordStatus::Converted);
        assert!(!record.applied);
        assert_eq!(manifest.applied_count, 0);
        assert!(record.errors[0].contains("already exists"));
        assert_eq!(applier.seen.lock().unwrap().as_slice(), ["frontend"]);
    }

    #[test]
    fn cancellation_stops_submission_but_still_writes_the_manifest() {
        let input = tempdir().expect("tempdir");
        let output = tempdir().expect("tempdir");
        seed(input.path(), "k8s", "a.yaml", K8S_POLICY);

        let cancel = CancelFlag::default();
        cancel.cancel();
        let manifest = convert_policies(
            SourceKind::K8s,
            input.path(),
            output.path(),
            &ConvertOptions::default(),
            None,
            Some(&cancel),
        )
        .expect("convert");

        assert_eq!(manifest.total_count, 0);
        assert!(output.path().join(MANIFEST_FILENAME).is_file());
    }
}
