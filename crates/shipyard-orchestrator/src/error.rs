//! Orchestrator error types.

use thiserror::Error;

/// Errors returned by orchestrator operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("deployment not found: {0}")]
    DeploymentNotFound(String),

    #[error("service not found: {0}")]
    ServiceNotFound(String),

    #[error("deployment {0} does not exist")]
    InvalidReference(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("deployment {0} already exists")]
    Conflict(String),

    #[error("state store error: {0}")]
    State(#[from] shipyard_state::StateError),
}

impl OrchestratorError {
    /// Whether the operation referenced an id absent from the store.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            OrchestratorError::DeploymentNotFound(_) | OrchestratorError::ServiceNotFound(_)
        )
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
