//! Orchestrator — validated operations over deployments and services.
//!
//! Every mutation is validated first, stored through a single store call,
//! and only then handed to the rollout driver. A caller therefore always
//! sees the new desired state (and its in-progress status) in the return
//! value, while `ready_replicas` converges in the background.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};
use uuid::Uuid;

use shipyard_manifest::{
    DeploymentManifest, generate_deployment_manifest, generate_service_manifest,
};
use shipyard_rollout::{Pacer, RolloutDriver, RolloutKind, RolloutPlan};
use shipyard_state::{
    Deployment, DeploymentStatus, Pod, Service, ServiceId, StateError, StateStore,
};

use crate::cluster::{ClusterInfo, Namespace, collect_namespaces};
use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::intent::{DeploymentIntent, DeploymentPatch, ServiceIntent};
use crate::pods::project_pods;

/// Front door for every deployment and service operation.
///
/// Cheap to clone; clones share the store and the rollout driver.
#[derive(Clone)]
pub struct Orchestrator {
    store: StateStore,
    driver: RolloutDriver,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(store: StateStore, pacer: Arc<dyn Pacer>, config: OrchestratorConfig) -> Self {
        let driver = RolloutDriver::new(store.clone(), pacer);
        Self {
            store,
            driver,
            config,
        }
    }

    /// Orchestrator over a fresh in-memory store.
    pub fn in_memory(pacer: Arc<dyn Pacer>, config: OrchestratorConfig) -> OrchestratorResult<Self> {
        let store = StateStore::open_in_memory()?;
        Ok(Self::new(store, pacer, config))
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn driver(&self) -> &RolloutDriver {
        &self.driver
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    // ── Deployments ────────────────────────────────────────────────

    /// Store a new deployment in `pending` and start its initial rollout.
    pub fn create_deployment(&self, intent: DeploymentIntent) -> OrchestratorResult<Deployment> {
        intent.validate()?;

        let manifest = generate_deployment_manifest(&intent.workload());
        let now = epoch_secs();
        let deployment = Deployment {
            id: Uuid::new_v4().to_string(),
            name: intent.name,
            namespace: intent.namespace,
            image: intent.image,
            replicas: intent.replicas,
            env: intent.env,
            port: intent.port,
            cpu_limit: intent.cpu_limit,
            memory_limit: intent.memory_limit,
            status: DeploymentStatus::Pending,
            ready_replicas: 0,
            generation: 1,
            created_at: now,
            updated_at: now,
            manifest,
        };

        self.store
            .insert_deployment(&deployment)
            .map_err(|e| match e {
                StateError::Conflict(key) => OrchestratorError::Conflict(key),
                other => OrchestratorError::State(other),
            })?;
        self.driver.start(RolloutPlan::initial(&deployment));

        info!(
            id = %deployment.id,
            name = %deployment.name,
            namespace = %deployment.namespace,
            replicas = deployment.replicas,
            "deployment created"
        );
        Ok(deployment)
    }

    pub fn get_deployment(&self, id: &str) -> OrchestratorResult<Deployment> {
        self.store
            .get_deployment(id)?
            .ok_or_else(|| OrchestratorError::DeploymentNotFound(id.to_string()))
    }

    /// All deployments, optionally restricted to one namespace.
    pub fn list_deployments(&self, namespace: Option<&str>) -> OrchestratorResult<Vec<Deployment>> {
        Ok(self.store.list_deployments(namespace)?)
    }

    /// Apply a partial update.
    ///
    /// An image change restarts the rollout from zero ready replicas under
    /// `updating`; a replica change continues from the current ready count
    /// under `scaling`. Either one bumps the generation, which retires any
    /// rollout still running for the deployment. An env-only change just
    /// regenerates the manifest.
    pub fn update_deployment(
        &self,
        id: &str,
        patch: DeploymentPatch,
    ) -> OrchestratorResult<Deployment> {
        patch.validate()?;

        let now = epoch_secs();
        let (deployment, plan) = self
            .store
            .modify_deployment(id, |deployment| apply_patch(deployment, &patch, now))?
            .ok_or_else(|| OrchestratorError::DeploymentNotFound(id.to_string()))?;

        match plan {
            Some(plan) => {
                info!(
                    id = %deployment.id,
                    generation = deployment.generation,
                    status = deployment.status.as_str(),
                    "deployment updated, rollout restarted"
                );
                self.driver.start(plan);
            }
            None => debug!(id = %deployment.id, "deployment updated"),
        }
        Ok(deployment)
    }

    /// Delete a deployment and every service that targets it. Returns the
    /// ids of the removed services.
    pub fn delete_deployment(&self, id: &str) -> OrchestratorResult<Vec<ServiceId>> {
        let removed = self
            .store
            .delete_deployment(id)?
            .ok_or_else(|| OrchestratorError::DeploymentNotFound(id.to_string()))?;
        self.driver.cancel(id);

        info!(id, services = removed.len(), "deployment deleted");
        Ok(removed)
    }

    /// Running pods projected from the deployment's ready replicas.
    pub fn list_pods(&self, deployment_id: &str) -> OrchestratorResult<Vec<Pod>> {
        let deployment = self.get_deployment(deployment_id)?;
        Ok(project_pods(&deployment, epoch_secs()))
    }

    /// The deployment's manifest as last regenerated.
    pub fn get_manifest(&self, deployment_id: &str) -> OrchestratorResult<DeploymentManifest> {
        Ok(self.get_deployment(deployment_id)?.manifest)
    }

    // ── Services ──────────────────────────────────────────────────

    /// Expose an existing deployment. Fails with `InvalidReference` if the
    /// deployment does not exist at the moment of storing.
    pub fn create_service(&self, intent: ServiceIntent) -> OrchestratorResult<Service> {
        intent.validate()?;

        let id = Uuid::new_v4().to_string();
        let now = epoch_secs();
        let external_ip = intent
            .service_type
            .has_external_ip()
            .then(|| self.config.load_balancer_ip.clone());

        let service = self
            .store
            .create_service(&intent.deployment_id, |owner| Service {
                id,
                name: intent.name.clone(),
                deployment_id: owner.id.clone(),
                port: intent.port,
                target_port: intent.target_port,
                service_type: intent.service_type,
                external_ip,
                created_at: now,
                manifest: generate_service_manifest(&intent.template(), &owner.name),
            })?
            .ok_or_else(|| OrchestratorError::InvalidReference(intent.deployment_id.clone()))?;

        info!(
            id = %service.id,
            name = %service.name,
            deployment = %service.deployment_id,
            service_type = %service.service_type,
            "service created"
        );
        Ok(service)
    }

    pub fn list_services(&self) -> OrchestratorResult<Vec<Service>> {
        Ok(self.store.list_services()?)
    }

    pub fn delete_service(&self, id: &str) -> OrchestratorResult<()> {
        if !self.store.delete_service(id)? {
            return Err(OrchestratorError::ServiceNotFound(id.to_string()));
        }
        info!(id, "service deleted");
        Ok(())
    }

    // ── Cluster ───────────────────────────────────────────────────

    pub fn list_namespaces(&self) -> OrchestratorResult<Vec<Namespace>> {
        let deployments = self.store.list_deployments(None)?;
        Ok(collect_namespaces(&deployments))
    }

    pub fn cluster_info(&self) -> OrchestratorResult<ClusterInfo> {
        let deployments = self.store.list_deployments(None)?;
        let services = self.store.list_services()?.len();
        Ok(ClusterInfo::summarize(&deployments, services))
    }

    /// Stop every in-flight rollout. Returns how many were running.
    pub fn shutdown(&self) -> usize {
        let stopped = self.driver.cancel_all();
        info!(stopped, "rollouts stopped");
        stopped
    }
}

/// Apply `patch` in place and plan the rollout it triggers, if any.
fn apply_patch(deployment: &mut Deployment, patch: &DeploymentPatch, now: u64) -> Option<RolloutPlan> {
    let mut trigger = None;

    if let Some(image) = &patch.image {
        deployment.image = image.clone();
        trigger = Some((RolloutKind::ImageUpdate, 0));
    }
    if let Some(replicas) = patch.replicas {
        deployment.replicas = replicas;
        deployment.ready_replicas = deployment.ready_replicas.min(replicas);
        let from = match trigger {
            Some(_) => 0,
            None => deployment.ready_replicas,
        };
        trigger = Some((RolloutKind::Scale, from));
    }
    if let Some(env) = &patch.env {
        deployment.env = env.clone();
    }

    deployment.updated_at = now;
    deployment.regenerate_manifest();

    let (kind, from) = trigger?;
    deployment.generation += 1;
    deployment.status = kind.status();
    Some(RolloutPlan::new(deployment, kind, from))
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
