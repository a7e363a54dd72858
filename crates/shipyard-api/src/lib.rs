//! shipyard-api — REST API for Shipyard.
//!
//! Thin axum handlers over the [`Orchestrator`]. Every response uses the
//! same `{ success, data, error }` envelope.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Health check |
//! | GET | `/api/v1/deployments` | List deployments (`?namespace=`) |
//! | POST | `/api/v1/deployments` | Create a deployment |
//! | GET | `/api/v1/deployments/{id}` | Get deployment details |
//! | PATCH | `/api/v1/deployments/{id}` | Update image, replicas or env |
//! | DELETE | `/api/v1/deployments/{id}` | Delete a deployment and its services |
//! | GET | `/api/v1/deployments/{id}/pods` | List projected pods |
//! | GET | `/api/v1/deployments/{id}/manifest` | Get the generated manifest |
//! | GET | `/api/v1/services` | List services |
//! | POST | `/api/v1/services` | Create a service |
//! | DELETE | `/api/v1/services/{id}` | Delete a service |
//! | GET | `/api/v1/namespaces` | List namespaces |
//! | GET | `/api/v1/cluster/info` | Cluster summary |

pub mod handlers;

use axum::Router;
use axum::routing::{delete, get};
use shipyard_orchestrator::Orchestrator;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Orchestrator,
}

/// Build the complete API router.
pub fn build_router(orchestrator: Orchestrator) -> Router {
    let state = ApiState { orchestrator };

    let api_routes = Router::new()
        .route(
            "/deployments",
            get(handlers::list_deployments).post(handlers::create_deployment),
        )
        .route(
            "/deployments/{id}",
            get(handlers::get_deployment)
                .patch(handlers::update_deployment)
                .delete(handlers::delete_deployment),
        )
        .route("/deployments/{id}/pods", get(handlers::list_pods))
        .route("/deployments/{id}/manifest", get(handlers::get_manifest))
        .route(
            "/services",
            get(handlers::list_services).post(handlers::create_service),
        )
        .route("/services/{id}", delete(handlers::delete_service))
        .route("/namespaces", get(handlers::list_namespaces))
        .route("/cluster/info", get(handlers::cluster_info))
        .with_state(state);

    Router::new()
        .route("/", get(handlers::health))
        .nest("/api/v1", api_routes)
}
