//! REST API handlers.
//!
//! Each handler calls one `Orchestrator` operation and wraps the outcome in
//! the `ApiResponse` envelope.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::warn;

use shipyard_orchestrator::{
    DeploymentIntent, DeploymentPatch, OrchestratorError, OrchestratorResult, ServiceIntent,
};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
        .into_response()
}

/// HTTP status for an orchestrator error.
pub fn status_for(err: &OrchestratorError) -> StatusCode {
    match err {
        OrchestratorError::DeploymentNotFound(_) | OrchestratorError::ServiceNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        OrchestratorError::InvalidReference(_) | OrchestratorError::Validation(_) => {
            StatusCode::BAD_REQUEST
        }
        OrchestratorError::Conflict(_) => StatusCode::CONFLICT,
        OrchestratorError::State(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond<T: Serialize>(result: OrchestratorResult<T>, status: StatusCode) -> Response {
    match result {
        Ok(data) => (status, ApiResponse::ok(data)).into_response(),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                warn!(error = %e, "request failed");
            }
            error_response(&e.to_string(), status)
        }
    }
}

fn rejected(rejection: JsonRejection) -> Response {
    error_response(&rejection.body_text(), StatusCode::BAD_REQUEST)
}

// ── Health ─────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: u64,
}

/// GET /
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "healthy",
        service: "shipyard",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
    })
}

// ── Deployments ────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub namespace: Option<String>,
}

/// GET /api/v1/deployments
pub async fn list_deployments(
    State(state): State<ApiState>,
    Query(params): Query<ListParams>,
) -> Response {
    respond(
        state
            .orchestrator
            .list_deployments(params.namespace.as_deref()),
        StatusCode::OK,
    )
}

/// POST /api/v1/deployments
pub async fn create_deployment(
    State(state): State<ApiState>,
    payload: Result<Json<DeploymentIntent>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(intent)) => respond(
            state.orchestrator.create_deployment(intent),
            StatusCode::CREATED,
        ),
        Err(rejection) => rejected(rejection),
    }
}

/// GET /api/v1/deployments/{id}
pub async fn get_deployment(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    respond(state.orchestrator.get_deployment(&id), StatusCode::OK)
}

/// PATCH /api/v1/deployments/{id}
pub async fn update_deployment(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    payload: Result<Json<DeploymentPatch>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(patch)) => respond(
            state.orchestrator.update_deployment(&id, patch),
            StatusCode::OK,
        ),
        Err(rejection) => rejected(rejection),
    }
}

#[derive(Serialize)]
pub struct Deleted {
    pub id: String,
    pub deleted_services: Vec<String>,
}

/// DELETE /api/v1/deployments/{id}
pub async fn delete_deployment(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Response {
    let result = state
        .orchestrator
        .delete_deployment(&id)
        .map(|deleted_services| Deleted {
            id,
            deleted_services,
        });
    respond(result, StatusCode::OK)
}

/// GET /api/v1/deployments/{id}/pods
pub async fn list_pods(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    respond(state.orchestrator.list_pods(&id), StatusCode::OK)
}

/// GET /api/v1/deployments/{id}/manifest
pub async fn get_manifest(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    respond(state.orchestrator.get_manifest(&id), StatusCode::OK)
}

// ── Services ───────────────────────────────────────────────────

/// GET /api/v1/services
pub async fn list_services(State(state): State<ApiState>) -> Response {
    respond(state.orchestrator.list_services(), StatusCode::OK)
}

/// POST /api/v1/services
pub async fn create_service(
    State(state): State<ApiState>,
    payload: Result<Json<ServiceIntent>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(intent)) => respond(
            state.orchestrator.create_service(intent),
            StatusCode::CREATED,
        ),
        Err(rejection) => rejected(rejection),
    }
}

/// DELETE /api/v1/services/{id}
pub async fn delete_service(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    let result = state.orchestrator.delete_service(&id).map(|()| "deleted");
    respond(result, StatusCode::OK)
}

// ── Cluster ────────────────────────────────────────────────────

/// GET /api/v1/namespaces
pub async fn list_namespaces(State(state): State<ApiState>) -> Response {
    respond(state.orchestrator.list_namespaces(), StatusCode::OK)
}

/// GET /api/v1/cluster/info
pub async fn cluster_info(State(state): State<ApiState>) -> Response {
    respond(state.orchestrator.cluster_info(), StatusCode::OK)
}
