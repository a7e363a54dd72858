//! Shipyard rollouts — drives deployments toward their desired replica count.
//!
//! Each create, image change, or scale of a deployment starts a rollout: a
//! background task that steps `ready_replicas` up to the target, one replica
//! per tick of a [`Pacer`], and marks the deployment `running` at the end.
//!
//! # Components
//!
//! - **`plan`** — what a rollout should do (kind, generation, start, target)
//! - **`controller`** — the rollout state machine (start, step, complete, abandon)
//! - **`pacer`** — step pacing (tokio timer, or manually released steps)
//! - **`driver`** — one task per deployment; a newer rollout replaces the old

pub mod controller;
pub mod driver;
pub mod pacer;
pub mod plan;

pub use controller::{AbandonReason, Rollout, RolloutPhase};
pub use driver::{RolloutDriver, run_rollout};
pub use pacer::{IntervalPacer, ManualPacer, Pacer};
pub use plan::{RolloutKind, RolloutPlan};
