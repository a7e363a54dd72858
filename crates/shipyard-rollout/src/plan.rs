//! Rollout plans — what a single rollout is asked to do.

use shipyard_state::{Deployment, DeploymentId, DeploymentStatus};

/// Why a rollout was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloutKind {
    /// First rollout of a freshly created deployment.
    Initial,
    /// New image: every replica is replaced.
    ImageUpdate,
    /// Replica count changed.
    Scale,
}

impl RolloutKind {
    /// Status a deployment carries while this kind of rollout runs.
    pub fn status(&self) -> DeploymentStatus {
        match self {
            RolloutKind::Initial => DeploymentStatus::Pending,
            RolloutKind::ImageUpdate => DeploymentStatus::Updating,
            RolloutKind::Scale => DeploymentStatus::Scaling,
        }
    }
}

/// A rollout of one deployment generation from `from` to `target` ready
/// replicas, inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloutPlan {
    pub deployment_id: DeploymentId,
    /// Deployment generation this rollout was started for.
    pub generation: u64,
    pub kind: RolloutKind,
    pub from: u32,
    pub target: u32,
}

impl RolloutPlan {
    /// Plan a rollout of `deployment` as it is now, starting at `from`
    /// ready replicas. `from` is clamped to the target.
    pub fn new(deployment: &Deployment, kind: RolloutKind, from: u32) -> Self {
        Self {
            deployment_id: deployment.id.clone(),
            generation: deployment.generation,
            kind,
            from: from.min(deployment.replicas),
            target: deployment.replicas,
        }
    }

    /// Plan the initial rollout of a new deployment.
    pub fn initial(deployment: &Deployment) -> Self {
        Self::new(deployment, RolloutKind::Initial, 0)
    }

    /// Number of paced steps, counting the step that reports `from`.
    pub fn step_count(&self) -> u32 {
        self.target.saturating_sub(self.from) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_in_progress_statuses() {
        assert_eq!(RolloutKind::Initial.status(), DeploymentStatus::Pending);
        assert_eq!(RolloutKind::ImageUpdate.status(), DeploymentStatus::Updating);
        assert_eq!(RolloutKind::Scale.status(), DeploymentStatus::Scaling);
    }

    #[test]
    fn step_count_is_inclusive() {
        let plan = RolloutPlan {
            deployment_id: "d".to_string(),
            generation: 1,
            kind: RolloutKind::Initial,
            from: 0,
            target: 3,
        };
        assert_eq!(plan.step_count(), 4);

        let plan = RolloutPlan { from: 3, ..plan };
        assert_eq!(plan.step_count(), 1);
    }
}
