//! Manifest document types.
//!
//! Field names serialize in camelCase to match what cluster tooling expects
//! (`apiVersion`, `matchLabels`, `containerPort`, `targetPort`).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Label key used to bind pods, selectors, and services to a workload.
pub const APP_LABEL: &str = "app";

// ── Deployment ─────────────────────────────────────────────────────

/// A generated `apps/v1` Deployment document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentManifest {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: DeploymentSpec,
}

/// Object metadata. `namespace` is omitted for cluster-default objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    pub replicas: u32,
    pub selector: LabelSelector,
    pub template: PodTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    pub match_labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodTemplate {
    pub metadata: TemplateMeta,
    pub spec: PodSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateMeta {
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSpec {
    pub containers: Vec<Container>,
}

/// A single container in the pod template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    pub image: String,
    /// Empty unless the workload declared a port.
    pub ports: Vec<ContainerPort>,
    pub env: Vec<EnvVar>,
    pub resources: Resources,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    pub container_port: u16,
}

/// One `name`/`value` environment entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub limits: ResourceLimits,
}

/// CPU and memory limits, in cluster quantity notation (`500m`, `256Mi`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    pub cpu: String,
    pub memory: String,
}

impl DeploymentManifest {
    /// The (single) workload container.
    pub fn container(&self) -> Option<&Container> {
        self.spec.template.spec.containers.first()
    }

    /// Mutable access to the workload container.
    pub fn container_mut(&mut self) -> Option<&mut Container> {
        self.spec.template.spec.containers.first_mut()
    }
}

// ── Service ───────────────────────────────────────────────────────

/// How a service is exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ServiceType {
    #[default]
    ClusterIP,
    NodePort,
    LoadBalancer,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::ClusterIP => "ClusterIP",
            ServiceType::NodePort => "NodePort",
            ServiceType::LoadBalancer => "LoadBalancer",
        }
    }

    /// Whether this type is reachable from outside the cluster via an
    /// allocated external address.
    pub fn has_external_ip(&self) -> bool {
        matches!(self, ServiceType::LoadBalancer)
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated `v1` Service document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceManifest {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: ServiceSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub selector: BTreeMap<String, String>,
    pub ports: Vec<ServicePort>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    pub port: u16,
    pub target_port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_type_wire_names() {
        let json = serde_json::to_string(&ServiceType::LoadBalancer).unwrap();
        assert_eq!(json, "\"LoadBalancer\"");
        let back: ServiceType = serde_json::from_str("\"NodePort\"").unwrap();
        assert_eq!(back, ServiceType::NodePort);
        assert_eq!(ServiceType::default(), ServiceType::ClusterIP);
    }

    #[test]
    fn only_load_balancer_has_external_ip() {
        assert!(ServiceType::LoadBalancer.has_external_ip());
        assert!(!ServiceType::ClusterIP.has_external_ip());
        assert!(!ServiceType::NodePort.has_external_ip());
    }
}
