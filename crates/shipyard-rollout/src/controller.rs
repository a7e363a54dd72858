//! Rollout controller — the rollout state machine.
//!
//! A rollout walks `ready_replicas` from the plan's starting count up to the
//! target, one step at a time. The controller is pure: the driver decides
//! when a step happens and reports back whether the step was applied.

use tracing::{debug, info};

use crate::plan::RolloutPlan;

/// Current phase of a rollout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolloutPhase {
    /// Rollout not started.
    Pending,
    /// The next step will report `next` ready replicas.
    Progressing { next: u32 },
    /// All target replicas reported ready.
    Completed,
    /// Stopped before reaching the target.
    Abandoned { reason: AbandonReason },
}

/// Why a rollout stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbandonReason {
    /// A newer rollout for the same deployment took over.
    Superseded,
    /// The deployment was deleted.
    Deleted,
    /// Progress could not be recorded.
    Failed(String),
}

/// A rollout in progress.
#[derive(Debug, Clone)]
pub struct Rollout {
    pub plan: RolloutPlan,
    pub phase: RolloutPhase,
}

impl Rollout {
    pub fn new(plan: RolloutPlan) -> Self {
        Self {
            plan,
            phase: RolloutPhase::Pending,
        }
    }

    /// Start the rollout.
    pub fn start(&mut self) {
        if self.phase != RolloutPhase::Pending {
            return;
        }
        self.phase = RolloutPhase::Progressing {
            next: self.plan.from,
        };
        info!(
            deployment = %self.plan.deployment_id,
            generation = self.plan.generation,
            kind = ?self.plan.kind,
            from = self.plan.from,
            target = self.plan.target,
            "rollout started"
        );
    }

    /// Ready count the next step should report, or `None` once finished.
    pub fn next_step(&self) -> Option<u32> {
        match self.phase {
            RolloutPhase::Progressing { next } => Some(next),
            _ => None,
        }
    }

    /// Record that the step reporting `ready` replicas was applied.
    pub fn record_step(&mut self, ready: u32) {
        if self.next_step() != Some(ready) {
            return;
        }
        if ready >= self.plan.target {
            self.phase = RolloutPhase::Completed;
            info!(
                deployment = %self.plan.deployment_id,
                ready,
                "rollout completed"
            );
        } else {
            self.phase = RolloutPhase::Progressing { next: ready + 1 };
            debug!(
                deployment = %self.plan.deployment_id,
                ready,
                target = self.plan.target,
                "rollout step applied"
            );
        }
    }

    /// Stop the rollout without reaching the target.
    pub fn abandon(&mut self, reason: AbandonReason) {
        if self.is_finished() {
            return;
        }
        debug!(
            deployment = %self.plan.deployment_id,
            generation = self.plan.generation,
            ?reason,
            "rollout abandoned"
        );
        self.phase = RolloutPhase::Abandoned { reason };
    }

    /// Whether the rollout reached a final phase.
    pub fn is_finished(&self) -> bool {
        matches!(
            self.phase,
            RolloutPhase::Completed | RolloutPhase::Abandoned { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::RolloutKind;

    fn plan(from: u32, target: u32) -> RolloutPlan {
        RolloutPlan {
            deployment_id: "deploy-a".to_string(),
            generation: 1,
            kind: RolloutKind::Initial,
            from,
            target,
        }
    }

    #[test]
    fn steps_from_zero_to_target_inclusive() {
        let mut rollout = Rollout::new(plan(0, 3));
        assert_eq!(rollout.next_step(), None);

        rollout.start();
        let mut reported = Vec::new();
        while let Some(ready) = rollout.next_step() {
            reported.push(ready);
            rollout.record_step(ready);
        }

        assert_eq!(reported, [0, 1, 2, 3]);
        assert_eq!(rollout.phase, RolloutPhase::Completed);
    }

    #[test]
    fn scale_starts_from_current_ready_count() {
        let mut rollout = Rollout::new(plan(3, 5));
        rollout.start();
        assert_eq!(rollout.next_step(), Some(3));
        rollout.record_step(3);
        rollout.record_step(4);
        rollout.record_step(5);
        assert_eq!(rollout.phase, RolloutPhase::Completed);
    }

    #[test]
    fn out_of_order_step_is_ignored() {
        let mut rollout = Rollout::new(plan(0, 2));
        rollout.start();
        rollout.record_step(2);
        assert_eq!(rollout.next_step(), Some(0));
    }

    #[test]
    fn abandoned_rollout_stops_stepping() {
        let mut rollout = Rollout::new(plan(0, 3));
        rollout.start();
        rollout.record_step(0);
        rollout.abandon(AbandonReason::Superseded);

        assert_eq!(rollout.next_step(), None);
        assert!(rollout.is_finished());
        assert_eq!(
            rollout.phase,
            RolloutPhase::Abandoned {
                reason: AbandonReason::Superseded
            }
        );
    }

    #[test]
    fn completed_rollout_cannot_be_abandoned() {
        let mut rollout = Rollout::new(plan(1, 1));
        rollout.start();
        rollout.record_step(1);
        rollout.abandon(AbandonReason::Deleted);
        assert_eq!(rollout.phase, RolloutPhase::Completed);
    }

    #[test]
    fn start_is_idempotent() {
        let mut rollout = Rollout::new(plan(0, 2));
        rollout.start();
        rollout.record_step(0);
        rollout.start();
        assert_eq!(rollout.next_step(), Some(1));
    }
}
