//! Cluster-wide summaries: namespaces and cluster info.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use shipyard_state::Deployment;

/// Namespaces that exist even with no deployments in them.
pub const BUILTIN_NAMESPACES: [&str; 4] = ["default", "kube-system", "staging", "production"];

/// Reported cluster version.
pub const CLUSTER_VERSION: &str = "v1.28.0";
/// Reported platform; nothing is actually scheduled.
pub const CLUSTER_PLATFORM: &str = "simulated";
/// Reported node count.
pub const CLUSTER_NODES: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub version: String,
    pub platform: String,
    pub nodes: u32,
    pub namespaces: usize,
    pub pods_running: u32,
    pub services: usize,
}

/// Built-in namespaces plus every namespace in use, sorted by name.
pub fn collect_namespaces(deployments: &[Deployment]) -> Vec<Namespace> {
    let names: BTreeSet<&str> = BUILTIN_NAMESPACES
        .into_iter()
        .chain(deployments.iter().map(|d| d.namespace.as_str()))
        .collect();
    names
        .into_iter()
        .map(|name| Namespace {
            name: name.to_string(),
            status: "Active".to_string(),
        })
        .collect()
}

impl ClusterInfo {
    pub fn summarize(deployments: &[Deployment], services: usize) -> Self {
        Self {
            version: CLUSTER_VERSION.to_string(),
            platform: CLUSTER_PLATFORM.to_string(),
            nodes: CLUSTER_NODES,
            namespaces: collect_namespaces(deployments).len(),
            pods_running: deployments.iter().map(|d| d.ready_replicas).sum(),
            services,
        }
    }
}
