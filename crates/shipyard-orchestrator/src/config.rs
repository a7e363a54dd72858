//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Placeholder address handed to `LoadBalancer` services.
pub const DEFAULT_LOAD_BALANCER_IP: &str = "192.168.1.100";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// External IP assigned to every `LoadBalancer` service.
    pub load_balancer_ip: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            load_balancer_ip: DEFAULT_LOAD_BALANCER_IP.to_string(),
        }
    }
}
