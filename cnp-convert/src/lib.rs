//! Network policy conversion from Kubernetes and Calico to Cilium format.
//!
//! This library translates network-access policies written in the Kubernetes
//! NetworkPolicy schema or the Calico NetworkPolicy schema into
//! CiliumNetworkPolicy documents, then checks the structural completeness of
//! the result. Translation is best-effort: constructs Cilium can represent
//! are mapped faithfully, and constructs it cannot (Calico selector
//! expressions) are embedded losslessly as opaque strings with advisory
//! annotations flagging the policy for manual review.
//!
//! # Architecture
//!
//! ## Translation
//!
//! - [`translate`] — Per-dialect policy translators
//!   - [`translate::selector`] — Endpoint selections to canonical fragments
//!   - [`translate::rule`] — Directional rules and port normalization
//!   - [`translate::k8s`] — Kubernetes NetworkPolicy translation
//!   - [`translate::calico`] — Calico NetworkPolicy translation
//!
//! ## Validation
//!
//! - [`validate`] — Structural completeness checks over converted policies
//!
//! ## Batch conversion
//!
//! - [`convert`] — Directory-tree conversion orchestration
//! - [`manifest`] — Per-document records and aggregate counters
//! - [`report`] — Markdown conversion report and console summary
//! - [`apply`] — Cluster-apply seam with retry and conflict handling
//!
//! # Workflow
//!
//! The typical batch conversion:
//!
//! 1. **Load** one YAML document per file from the input tree
//! 2. **Translate** each document according to its declared source dialect
//! 3. **Validate** the converted policy and record any defects
//! 4. **Persist** the converted policy to the mirrored output tree
//! 5. **Apply** to a cluster through an injected applier, when requested
//! 6. **Report** aggregate counts and per-document outcomes
//!
//! A failing document never aborts the batch: load and translation errors
//! are recorded on that document's manifest entry and processing continues.
//! Validation defects are recorded but the converted output is still
//! written, for manual correction.
//!
//! # Built on netpol-model
//!
//! This crate uses `netpol-model` for the typed source/target policy schemas
//! and YAML document IO. All conversion logic is contained here.

pub mod apply;
pub mod convert;
pub mod manifest;
pub mod report;
pub mod translate;
pub mod validate;
