//! shipyardd.toml configuration.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use shipyard_orchestrator::OrchestratorConfig;
use shipyard_orchestrator::config::DEFAULT_LOAD_BALANCER_IP;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// HTTP listen port.
    pub port: u16,
    /// Delay between rollout steps, in milliseconds.
    pub rollout_step_ms: u64,
    /// External IP handed to `LoadBalancer` services.
    pub load_balancer_ip: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            port: 8002,
            rollout_step_ms: 500,
            load_balancer_ip: DEFAULT_LOAD_BALANCER_IP.to_string(),
        }
    }
}

impl DaemonConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: DaemonConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// File values if a path is given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line flags on top of file values.
    pub fn with_overrides(mut self, port: Option<u16>, rollout_step_ms: Option<u64>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(ms) = rollout_step_ms {
            self.rollout_step_ms = ms;
        }
        self
    }

    pub fn rollout_step(&self) -> Duration {
        Duration::from_millis(self.rollout_step_ms)
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            load_balancer_ip: self.load_balancer_ip.clone(),
        }
    }
}
