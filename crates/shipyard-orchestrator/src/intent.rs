//! Caller intents and their field-level validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shipyard_manifest::{ServiceTemplate, ServiceType, WorkloadTemplate};

use crate::error::{OrchestratorError, OrchestratorResult};

/// Longest allowed deployment or service name.
pub const MAX_NAME_LEN: usize = 63;
/// Replica count bounds, inclusive.
pub const MIN_REPLICAS: u32 = 1;
pub const MAX_REPLICAS: u32 = 100;

pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_CPU_LIMIT: &str = "500m";
pub const DEFAULT_MEMORY_LIMIT: &str = "256Mi";

// ── Deployment ─────────────────────────────────────────────────────

/// Request to create a deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentIntent {
    pub name: String,
    pub image: String,
    #[serde(default = "default_replicas")]
    pub replicas: u32,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default = "default_cpu_limit")]
    pub cpu_limit: String,
    #[serde(default = "default_memory_limit")]
    pub memory_limit: String,
}

fn default_replicas() -> u32 {
    1
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_cpu_limit() -> String {
    DEFAULT_CPU_LIMIT.to_string()
}

fn default_memory_limit() -> String {
    DEFAULT_MEMORY_LIMIT.to_string()
}

impl DeploymentIntent {
    /// One replica in the default namespace, default limits, no port or env.
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            replicas: default_replicas(),
            namespace: default_namespace(),
            env: BTreeMap::new(),
            port: None,
            cpu_limit: default_cpu_limit(),
            memory_limit: default_memory_limit(),
        }
    }

    pub fn with_replicas(mut self, replicas: u32) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn validate(&self) -> OrchestratorResult<()> {
        validate_name("name", &self.name)?;
        validate_name("namespace", &self.namespace)?;
        validate_image(&self.image)?;
        validate_replicas(self.replicas)?;
        if let Some(port) = self.port {
            validate_port("port", port)?;
        }
        Ok(())
    }

    /// Borrowed view for manifest generation.
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
}

/// Partial update of a deployment. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentPatch {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub replicas: Option<u32>,
    /// Replaces the whole environment when present.
    #[serde(default)]
    pub env: Option<BTreeMap<String, String>>,
}

impl DeploymentPatch {
    pub fn image(image: impl Into<String>) -> Self {
        Self {
            image: Some(image.into()),
            ..Default::default()
        }
    }

    pub fn replicas(replicas: u32) -> Self {
        Self {
            replicas: Some(replicas),
            ..Default::default()
        }
    }

    pub fn env(env: BTreeMap<String, String>) -> Self {
        Self {
            env: Some(env),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> OrchestratorResult<()> {
        if let Some(image) = &self.image {
            validate_image(image)?;
        }
        if let Some(replicas) = self.replicas {
            validate_replicas(replicas)?;
        }
        Ok(())
    }
}

// ── Service ───────────────────────────────────────────────────────

/// Request to expose a deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceIntent {
    pub name: String,
    pub deployment_id: String,
    pub port: u16,
    pub target_port: u16,
    #[serde(rename = "type", default)]
    pub service_type: ServiceType,
}

impl ServiceIntent {
    pub fn new(
        name: impl Into<String>,
        deployment_id: impl Into<String>,
        port: u16,
        target_port: u16,
    ) -> Self {
        Self {
            name: name.into(),
            deployment_id: deployment_id.into(),
            port,
            target_port,
            service_type: ServiceType::default(),
        }
    }

    pub fn with_type(mut self, service_type: ServiceType) -> Self {
        self.service_type = service_type;
        self
    }

    pub fn validate(&self) -> OrchestratorResult<()> {
        validate_name("name", &self.name)?;
        validate_port("port", self.port)?;
        validate_port("target_port", self.target_port)?;
        Ok(())
    }

    /// Borrowed view for manifest generation.
    pub fn template(&self) -> ServiceTemplate<'_> {
        ServiceTemplate {
            name: &self.name,
            service_type: self.service_type,
            port: self.port,
            target_port: self.target_port,
        }
    }
}

// ── Field checks ───────────────────────────────────────────────────

fn validate_name(field: &str, value: &str) -> OrchestratorResult<()> {
    let len = value.chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(OrchestratorError::Validation(format!(
            "{field} must be 1-{MAX_NAME_LEN} characters, got {len}"
        )));
    }
    Ok(())
}

fn validate_image(image: &str) -> OrchestratorResult<()> {
    if image.trim().is_empty() {
        return Err(OrchestratorError::Validation(
            "image must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_replicas(replicas: u32) -> OrchestratorResult<()> {
    if !(MIN_REPLICAS..=MAX_REPLICAS).contains(&replicas) {
        return Err(OrchestratorError::Validation(format!(
            "replicas must be {MIN_REPLICAS}-{MAX_REPLICAS}, got {replicas}"
        )));
    }
    Ok(())
}

fn validate_port(field: &str, port: u16) -> OrchestratorResult<()> {
    if port == 0 {
        return Err(OrchestratorError::Validation(format!(
            "{field} must be 1-65535"
        )));
    }
    Ok(())
}
