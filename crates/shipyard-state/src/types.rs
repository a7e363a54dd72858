//! Domain types for the Shipyard state store.
//!
//! These types are the stored records for deployments and services, plus
//! the `Pod` projection synthesized from a deployment on read.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shipyard_manifest::{
    DeploymentManifest, ServiceManifest, ServiceType, WorkloadTemplate,
    generate_deployment_manifest,
};

/// Unique identifier for a deployment.
pub type DeploymentId = String;

/// Unique identifier for a service.
pub type ServiceId = String;

// ── Deployment ─────────────────────────────────────────────────────

/// A declarative workload record and its observed rollout progress.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deployment {
    pub id: DeploymentId,
    pub name: String,
    pub namespace: String,
    /// Container image reference (e.g. `nginx:latest`).
    pub image: String,
    /// Desired replica count.
    pub replicas: u32,
    /// Environment variables, kept sorted by name.
    pub env: BTreeMap<String, String>,
    /// Container port, if the workload listens on one.
    pub port: Option<u16>,
    pub cpu_limit: String,
    pub memory_limit: String,
    pub status: DeploymentStatus,
    /// Replicas reported ready by the current rollout.
    pub ready_replicas: u32,
    /// Bumped on every rollout-triggering change. Only the rollout started
    /// for the current generation may write progress.
    pub generation: u64,
    /// Unix timestamp (seconds) when this deployment was created.
    pub created_at: u64,
    /// Unix timestamp (seconds) when this deployment was last updated.
    pub updated_at: u64,
    pub manifest: DeploymentManifest,
}

/// Lifecycle status of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Pending,
    Running,
    Failed,
    Scaling,
    Updating,
}

impl DeploymentStatus {
    /// Whether a rollout is expected to be driving this deployment.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            DeploymentStatus::Pending | DeploymentStatus::Scaling | DeploymentStatus::Updating
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Pending => "pending",
            DeploymentStatus::Running => "running",
            DeploymentStatus::Failed => "failed",
            DeploymentStatus::Scaling => "scaling",
            DeploymentStatus::Updating => "updating",
        }
    }
}

impl Deployment {
    /// Borrowed view used to (re)generate the manifest.
    pub fn workload(&self) -> WorkloadTemplate<'_> {
        WorkloadTemplate {
            name: &self.name,
            namespace: &self.namespace,
            image: &self.image,
            replicas: self.replicas,
            port: self.port,
            env: &self.env,
            cpu_limit: &self.cpu_limit,
            memory_limit: &self.memory_limit,
        }
    }

    /// Recompute the embedded manifest from the current fields.
    pub fn regenerate_manifest(&mut self) {
        self.manifest = generate_deployment_manifest(&self.workload());
    }
}

// ── Service ───────────────────────────────────────────────────────

/// A network-exposure record bound to a deployment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    /// Owning deployment. Always resolves while the service exists.
    pub deployment_id: DeploymentId,
    pub port: u16,
    pub target_port: u16,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    /// Only set for `LoadBalancer` services.
    pub external_ip: Option<String>,
    /// Unix timestamp (seconds) when this service was created.
    pub created_at: u64,
    pub manifest: ServiceManifest,
}

// ── Pod ───────────────────────────────────────────────────────────

/// A pod projected from a deployment's ready replicas. Never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pod {
    pub name: String,
    pub status: PodPhase,
    pub ready: bool,
    pub restarts: u32,
    /// Human-readable age (`"42s"`, `"2m"`, `"3h"`, `"1d"`).
    pub age: String,
}

/// Phase of a projected pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PodPhase {
    Running,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&DeploymentStatus::Updating).unwrap();
        assert_eq!(json, "\"updating\"");
        assert_eq!(DeploymentStatus::Scaling.as_str(), "scaling");
    }

    #[test]
    fn in_progress_statuses() {
        assert!(DeploymentStatus::Pending.is_in_progress());
        assert!(DeploymentStatus::Scaling.is_in_progress());
        assert!(DeploymentStatus::Updating.is_in_progress());
        assert!(!DeploymentStatus::Running.is_in_progress());
        assert!(!DeploymentStatus::Failed.is_in_progress());
    }
}
