//! API regression tests.
//!
//! Drives the full router the daemon serves: deployments through their
//! rollout, services, cascade delete, manifests, and cluster summaries.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use shipyard_api::build_router;
use shipyard_orchestrator::{Orchestrator, OrchestratorConfig};
use shipyard_rollout::IntervalPacer;
use tower::ServiceExt;

fn test_router() -> Router {
    let orchestrator = Orchestrator::in_memory(
        Arc::new(IntervalPacer::new(Duration::from_millis(500))),
        OrchestratorConfig::default(),
    )
    .unwrap();
    build_router(orchestrator)
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn create_deployment(router: &Router, body: Value) -> String {
    let (status, json) = send(router, "POST", "/api/v1/deployments", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["data"]["id"].as_str().unwrap().to_string()
}

async fn wait_for_rollouts() {
    tokio::time::sleep(Duration::from_secs(60)).await;
}

#[tokio::test]
async fn health_check() {
    let router = test_router();
    let (status, json) = send(&router, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "shipyard");
}

#[tokio::test]
async fn list_deployments_empty() {
    let router = test_router();
    let (status, json) = send(&router, "GET", "/api/v1/deployments", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"], json!([]));
}

#[tokio::test(start_paused = true)]
async fn deployment_rolls_out_to_running() {
    let router = test_router();
    let (status, json) = send(
        &router,
        "POST",
        "/api/v1/deployments",
        Some(json!({"name": "my-app", "image": "nginx:latest", "replicas": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["ready_replicas"], 0);
    assert_eq!(json["data"]["namespace"], "default");
    let id = json["data"]["id"].as_str().unwrap().to_string();

    wait_for_rollouts().await;

    let (status, json) = send(&router, "GET", &format!("/api/v1/deployments/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "running");
    assert_eq!(json["data"]["ready_replicas"], 3);

    let (status, json) = send(&router, "GET", &format!("/api/v1/deployments/{id}/pods"), None).await;
    assert_eq!(status, StatusCode::OK);
    let pods = json["data"].as_array().unwrap();
    assert_eq!(pods.len(), 3);
    assert!(pods.iter().all(|p| p["status"] == "Running"));
}

#[tokio::test(start_paused = true)]
async fn image_update_rolls_out_new_image() {
    let router = test_router();
    let id = create_deployment(
        &router,
        json!({"name": "web", "image": "nginx:1.0", "replicas": 2}),
    )
    .await;
    wait_for_rollouts().await;

    let (status, json) = send(
        &router,
        "PATCH",
        &format!("/api/v1/deployments/{id}"),
        Some(json!({"image": "nginx:2.0"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "updating");

    wait_for_rollouts().await;

    let (_, json) = send(&router, "GET", &format!("/api/v1/deployments/{id}/manifest"), None).await;
    let container = &json["data"]["spec"]["template"]["spec"]["containers"][0];
    assert_eq!(container["image"], "nginx:2.0");

    let (_, json) = send(&router, "GET", &format!("/api/v1/deployments/{id}"), None).await;
    assert_eq!(json["data"]["status"], "running");
    assert_eq!(json["data"]["ready_replicas"], 2);
}

#[tokio::test]
async fn manifest_carries_port_and_env() {
    let router = test_router();
    let id = create_deployment(
        &router,
        json!({"name": "x", "image": "i", "replicas": 2, "port": 8080, "env": {"K": "V"}}),
    )
    .await;

    let (status, json) =
        send(&router, "GET", &format!("/api/v1/deployments/{id}/manifest"), None).await;
    assert_eq!(status, StatusCode::OK);

    let manifest = &json["data"];
    assert_eq!(manifest["apiVersion"], "apps/v1");
    assert_eq!(manifest["spec"]["replicas"], 2);
    let containers = manifest["spec"]["template"]["spec"]["containers"].as_array().unwrap();
    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0]["ports"], json!([{"containerPort": 8080}]));
    assert_eq!(containers[0]["env"], json!([{"name": "K", "value": "V"}]));

    let (_, again) = send(&router, "GET", &format!("/api/v1/deployments/{id}/manifest"), None).await;
    assert_eq!(json, again);
}

#[tokio::test]
async fn namespace_filter() {
    let router = test_router();
    create_deployment(&router, json!({"name": "a", "image": "i"})).await;
    create_deployment(&router, json!({"name": "b", "image": "i", "namespace": "staging"})).await;

    let (_, json) = send(&router, "GET", "/api/v1/deployments?namespace=staging", None).await;
    let items = json["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "b");

    let (_, json) = send(&router, "GET", "/api/v1/deployments", None).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn validation_errors_are_bad_request() {
    let router = test_router();
    let (status, json) = send(
        &router,
        "POST",
        "/api/v1/deployments",
        Some(json!({"name": "web", "image": "nginx", "replicas": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);

    let (status, _) = send(
        &router,
        "POST",
        "/api/v1/deployments",
        Some(json!({"name": "", "image": "nginx"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(&router, "POST", "/api/v1/deployments", Some(json!({"image": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn duplicate_name_is_conflict() {
    let router = test_router();
    create_deployment(&router, json!({"name": "web", "image": "nginx"})).await;
    let (status, _) = send(
        &router,
        "POST",
        "/api/v1/deployments",
        Some(json!({"name": "web", "image": "nginx"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn update_missing_deployment_is_not_found() {
    let router = test_router();
    let (status, _) = send(
        &router,
        "PATCH",
        "/api/v1/deployments/nope",
        Some(json!({"replicas": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, json) = send(&router, "GET", "/api/v1/deployments", None).await;
    assert_eq!(json["data"], json!([]));
}

#[tokio::test]
async fn services_and_cascade_delete() {
    let router = test_router();
    let web = create_deployment(&router, json!({"name": "web", "image": "nginx"})).await;
    let api = create_deployment(&router, json!({"name": "api", "image": "api:1"})).await;

    let (status, json) = send(
        &router,
        "POST",
        "/api/v1/services",
        Some(json!({"name": "web-lb", "deployment_id": web, "port": 80, "target_port": 8080, "type": "LoadBalancer"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["external_ip"], "192.168.1.100");
    assert_eq!(json["data"]["manifest"]["spec"]["selector"]["app"], "web");

    let (status, json) = send(
        &router,
        "POST",
        "/api/v1/services",
        Some(json!({"name": "api", "deployment_id": api, "port": 80, "target_port": 3000})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["type"], "ClusterIP");
    assert_eq!(json["data"]["external_ip"], Value::Null);
    let api_service = json["data"]["id"].as_str().unwrap().to_string();

    let (status, json) = send(&router, "DELETE", &format!("/api/v1/deployments/{web}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["deleted_services"].as_array().unwrap().len(), 1);

    let (status, _) = send(&router, "GET", &format!("/api/v1/deployments/{web}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, json) = send(&router, "GET", "/api/v1/services", None).await;
    let services = json["data"].as_array().unwrap();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0]["id"], api_service.as_str());

    let (status, _) = send(&router, "DELETE", &format!("/api/v1/services/{api_service}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&router, "DELETE", &format!("/api/v1/services/{api_service}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn service_for_missing_deployment_is_rejected() {
    let router = test_router();
    let (status, json) = send(
        &router,
        "POST",
        "/api/v1/services",
        Some(json!({"name": "web", "deployment_id": "nonexistent", "port": 80, "target_port": 8080})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);

    let (_, json) = send(&router, "GET", "/api/v1/services", None).await;
    assert_eq!(json["data"], json!([]));
}

#[tokio::test(start_paused = true)]
async fn namespaces_and_cluster_info() {
    let router = test_router();
    let web = create_deployment(&router, json!({"name": "web", "image": "nginx", "replicas": 2})).await;
    create_deployment(&router, json!({"name": "etl", "image": "etl:1", "namespace": "batch"})).await;
    send(
        &router,
        "POST",
        "/api/v1/services",
        Some(json!({"name": "web", "deployment_id": web, "port": 80, "target_port": 8080})),
    )
    .await;
    wait_for_rollouts().await;

    let (status, json) = send(&router, "GET", "/api/v1/namespaces", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|ns| ns["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["batch", "default", "kube-system", "production", "staging"]);
    assert_eq!(json["data"][0]["status"], "Active");

    let (status, json) = send(&router, "GET", "/api/v1/cluster/info", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["platform"], "simulated");
    assert_eq!(json["data"]["nodes"], 3);
    assert_eq!(json["data"]["namespaces"], 5);
    assert_eq!(json["data"]["pods_running"], 3);
    assert_eq!(json["data"]["services"], 1);
}
