//! Rollout driver — one background task per deployment.
//!
//! The driver keeps a slot per deployment holding the handle of its current
//! rollout task. Starting a rollout for a deployment that already has one
//! aborts the old task (cancel-and-replace). Independently of the abort,
//! every step is written through `StateStore::modify_deployment` and only
//! applies while the deployment still exists and still carries the
//! generation the rollout was planned for, so a stale task can never
//! overwrite newer progress or recreate a deleted record.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use shipyard_state::{DeploymentId, DeploymentStatus, StateResult, StateStore};

use crate::controller::{AbandonReason, Rollout, RolloutPhase};
use crate::pacer::Pacer;
use crate::plan::RolloutPlan;

/// Per-deployment rollout task.
struct RolloutSlot {
    generation: u64,
    handle: JoinHandle<()>,
}

type Slots = Arc<Mutex<HashMap<DeploymentId, RolloutSlot>>>;

/// Starts, supersedes, and cancels rollouts.
#[derive(Clone)]
pub struct RolloutDriver {
    store: StateStore,
    pacer: Arc<dyn Pacer>,
    /// Active rollouts: deployment_id → slot.
    slots: Slots,
}

impl RolloutDriver {
    /// Create a driver writing progress to `store`, paced by `pacer`.
    pub fn new(store: StateStore, pacer: Arc<dyn Pacer>) -> Self {
        Self {
            store,
            pacer,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Spawn the rollout described by `plan`, replacing any rollout already
    /// running for the same deployment.
    ///
    /// A plan older than the rollout in flight is dropped, so updates that
    /// reach the driver out of order still leave the newest generation in
    /// charge. Returns true if the plan was started.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, plan: RolloutPlan) -> bool {
        let deployment_id = plan.deployment_id.clone();
        let generation = plan.generation;

        // Held across spawn and insert: the task cannot clear its slot
        // before the slot exists.
        let mut active = lock(&self.slots);
        if let Some(current) = active
            .get(&deployment_id)
            .filter(|slot| slot.generation > generation)
        {
            debug!(
                deployment = %deployment_id,
                generation,
                current = current.generation,
                "dropped rollout older than the one in flight"
            );
            return false;
        }

        let store = self.store.clone();
        let pacer = Arc::clone(&self.pacer);
        let slots = Arc::clone(&self.slots);
        let task_deployment_id = deployment_id.clone();

        let handle = tokio::spawn(async move {
            let phase = run_rollout(&store, pacer.as_ref(), plan).await;
            let mut active = lock(&slots);
            if active
                .get(&task_deployment_id)
                .is_some_and(|slot| slot.generation == generation)
            {
                active.remove(&task_deployment_id);
            }
            drop(active);
            debug!(deployment = %task_deployment_id, generation, ?phase, "rollout task finished");
        });

        let previous = active.insert(
            deployment_id.clone(),
            RolloutSlot { generation, handle },
        );
        drop(active);
        if let Some(old) = previous {
            old.handle.abort();
            debug!(
                deployment = %deployment_id,
                superseded = old.generation,
                generation,
                "replaced in-flight rollout"
            );
        }
        true
    }

    /// Cancel the rollout of a deployment. Returns true if one was running.
    pub fn cancel(&self, deployment_id: &str) -> bool {
        match lock(&self.slots).remove(deployment_id) {
            Some(slot) => {
                let running = !slot.handle.is_finished();
                slot.handle.abort();
                debug!(deployment = %deployment_id, generation = slot.generation, "rollout cancelled");
                running
            }
            None => false,
        }
    }

    /// Cancel every rollout (for graceful shutdown). Returns how many were
    /// still running.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<RolloutSlot> = lock(&self.slots).drain().map(|(_, slot)| slot).collect();
        let mut running = 0;
        for slot in drained {
            if !slot.handle.is_finished() {
                running += 1;
            }
            slot.handle.abort();
        }
        running
    }

    /// Whether a rollout task is still running for the deployment.
    pub fn is_active(&self, deployment_id: &str) -> bool {
        lock(&self.slots)
            .get(deployment_id)
            .is_some_and(|slot| !slot.handle.is_finished())
    }

    /// Number of rollout tasks still running.
    pub fn active_rollouts(&self) -> usize {
        lock(&self.slots)
            .values()
            .filter(|slot| !slot.handle.is_finished())
            .count()
    }

    /// Slots held, including tasks that finished without clearing theirs.
    #[cfg(test)]
    fn tracked_slots(&self) -> usize {
        lock(&self.slots).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Outcome of writing one step to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepOutcome {
    Applied,
    Superseded,
    Gone,
}

/// Run a rollout to the end, waiting on `pacer` before every step.
///
/// Returns the final phase: `Completed`, or `Abandoned` if the deployment
/// was deleted, superseded, or progress could not be stored.
pub async fn run_rollout(store: &StateStore, pacer: &dyn Pacer, plan: RolloutPlan) -> RolloutPhase {
    let mut rollout = Rollout::new(plan);
    rollout.start();

    while let Some(ready) = rollout.next_step() {
        pacer.wait_step().await;
        match apply_step(store, &rollout.plan, ready) {
            Ok(StepOutcome::Applied) => rollout.record_step(ready),
            Ok(StepOutcome::Superseded) => rollout.abandon(AbandonReason::Superseded),
            Ok(StepOutcome::Gone) => rollout.abandon(AbandonReason::Deleted),
            Err(e) => {
                warn!(
                    deployment = %rollout.plan.deployment_id,
                    ready,
                    error = %e,
                    "rollout step could not be stored"
                );
                mark_failed(store, &rollout.plan);
                rollout.abandon(AbandonReason::Failed(e.to_string()));
            }
        }
    }

    rollout.phase
}

/// Report `ready` replicas if the plan is still the current one.
fn apply_step(store: &StateStore, plan: &RolloutPlan, ready: u32) -> StateResult<StepOutcome> {
    let outcome = store.modify_deployment(&plan.deployment_id, |deployment| {
        if deployment.generation != plan.generation
            || deployment.status == DeploymentStatus::Failed
        {
            return StepOutcome::Superseded;
        }
        deployment.ready_replicas = ready.min(deployment.replicas);
        if ready >= plan.target {
            deployment.status = DeploymentStatus::Running;
        }
        StepOutcome::Applied
    })?;
    Ok(outcome.map_or(StepOutcome::Gone, |(_, step)| step))
}

fn mark_failed(store: &StateStore, plan: &RolloutPlan) {
    let result = store.modify_deployment(&plan.deployment_id, |deployment| {
        if deployment.generation == plan.generation && deployment.status.is_in_progress() {
            deployment.status = DeploymentStatus::Failed;
        }
    });
    if let Err(e) = result {
        error!(deployment = %plan.deployment_id, error = %e, "could not mark deployment failed");
    }
}
