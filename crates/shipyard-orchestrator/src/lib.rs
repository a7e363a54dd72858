//! shipyard-orchestrator — the operation surface of Shipyard.
//!
//! [`Orchestrator`] validates caller intents, generates manifests, persists
//! records through the [`StateStore`](shipyard_state::StateStore), and
//! hands rollout-triggering changes to the
//! [`RolloutDriver`](shipyard_rollout::RolloutDriver). Operations return as
//! soon as the new desired state is stored; convergence happens in the
//! background and is observed by reading the deployment again.
//!
//! Pods are a read-time projection of a deployment's ready replicas and
//! are never stored.

pub mod cluster;
pub mod config;
pub mod error;
pub mod intent;
pub mod orchestrator;
pub mod pods;

pub use cluster::{ClusterInfo, Namespace};
pub use config::OrchestratorConfig;
pub use error::{OrchestratorError, OrchestratorResult};
pub use intent::{DeploymentIntent, DeploymentPatch, ServiceIntent};
pub use orchestrator::Orchestrator;
