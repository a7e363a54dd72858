//! shipyard-manifest — infrastructure manifest generation.
//!
//! Pure functions that turn a workload or service description into the
//! declarative document a cluster would consume. Manifests are always
//! regenerated from the current record, never patched in place.
//!
//! Rendering is byte-for-byte reproducible: every map in a manifest is a
//! `BTreeMap`, so identical input always serializes identically.

pub mod generator;
pub mod types;

pub use generator::{
    ServiceTemplate, WorkloadTemplate, env_entries, generate_deployment_manifest,
    generate_service_manifest,
};
pub use types::*;

/// Render a manifest as compact JSON.
pub fn render_json<T: serde::Serialize>(manifest: &T) -> serde_json::Result<String> {
    serde_json::to_string(manifest)
}

/// Render a manifest as indented JSON (for export to downstream tooling).
pub fn render_json_pretty<T: serde::Serialize>(manifest: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(manifest)
}
