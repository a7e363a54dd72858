//! Manifest generation from workload and service descriptions.

use std::collections::BTreeMap;

use crate::types::*;

/// Everything needed to render a Deployment manifest.
///
/// Borrowed so callers can build it straight from a stored record.
#[derive(Debug, Clone, Copy)]
pub struct WorkloadTemplate<'a> {
    pub name: &'a str,
    pub namespace: &'a str,
    pub image: &'a str,
    pub replicas: u32,
    pub port: Option<u16>,
    pub env: &'a BTreeMap<String, String>,
    pub cpu_limit: &'a str,
    pub memory_limit: &'a str,
}

/// Everything needed to render a Service manifest.
#[derive(Debug, Clone, Copy)]
pub struct ServiceTemplate<'a> {
    pub name: &'a str,
    pub service_type: ServiceType,
    pub port: u16,
    pub target_port: u16,
}

/// Build the `apps/v1` Deployment manifest for a workload.
pub fn generate_deployment_manifest(workload: &WorkloadTemplate<'_>) -> DeploymentManifest {
    let labels = app_labels(workload.name);

    let container = Container {
        name: workload.name.to_string(),
        image: workload.image.to_string(),
        ports: workload
            .port
            .map(|container_port| vec![ContainerPort { container_port }])
            .unwrap_or_default(),
        env: env_entries(workload.env),
        resources: Resources {
            limits: ResourceLimits {
                cpu: workload.cpu_limit.to_string(),
                memory: workload.memory_limit.to_string(),
            },
        },
    };

    DeploymentManifest {
        api_version: "apps/v1".to_string(),
        kind: "Deployment".to_string(),
        metadata: ObjectMeta {
            name: workload.name.to_string(),
            namespace: Some(workload.namespace.to_string()),
            labels: labels.clone(),
        },
        spec: DeploymentSpec {
            replicas: workload.replicas,
            selector: LabelSelector {
                match_labels: labels.clone(),
            },
            template: PodTemplate {
                metadata: TemplateMeta { labels },
                spec: PodSpec {
                    containers: vec![container],
                },
            },
        },
    }
}

/// Build the `v1` Service manifest selecting the pods of `deployment_name`.
pub fn generate_service_manifest(
    service: &ServiceTemplate<'_>,
    deployment_name: &str,
) -> ServiceManifest {
    ServiceManifest {
        api_version: "v1".to_string(),
        kind: "Service".to_string(),
        metadata: ObjectMeta {
            name: service.name.to_string(),
            namespace: None,
            labels: BTreeMap::new(),
        },
        spec: ServiceSpec {
            service_type: service.service_type,
            selector: app_labels(deployment_name),
            ports: vec![ServicePort {
                port: service.port,
                target_port: service.target_port,
            }],
        },
    }
}

/// Environment entries in ascending key order.
pub fn env_entries(env: &BTreeMap<String, String>) -> Vec<EnvVar> {
    env.iter()
        .map(|(name, value)| EnvVar {
            name: name.clone(),
            value: value.clone(),
        })
        .collect()
}

fn app_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(APP_LABEL.to_string(), name.to_string())])
}
