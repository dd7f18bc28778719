#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use routersync_api::{create_router, AppState};
use routersync_core::Router;
use routersync_device::DeviceOptions;
use routersync_store::{ActivityEntry, ActivityStore, MemoryRepository, MirrorPolicy, RouterStore};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::MockServer;

pub fn device_options(allow_private_addresses: bool) -> DeviceOptions {
    DeviceOptions {
        request_timeout: Some(Duration::from_secs(2)),
        probe_timeout: Duration::from_secs(1),
        allow_private_addresses,
        accept_invalid_certs: true,
    }
}

pub fn app(repo: &MemoryRepository) -> axum::Router {
    app_with(repo, device_options(true), MirrorPolicy::default())
}

pub fn app_with(repo: &MemoryRepository, device: DeviceOptions, mirror: MirrorPolicy) -> axum::Router {
    routersync_logging::init_test();
    let state = AppState::new(Arc::new(repo.clone()), device, mirror);
    create_router(Arc::new(state))
}

/// Store a router pointing at the mock device
pub async fn add_router(repo: &MemoryRepository, server: &MockServer) -> Router {
    let router =
        Router::new("test-router", "127.0.0.1", "admin", "pw").with_port(server.address().port());
    repo.save_router(&router).await.unwrap();
    router
}

pub async fn send(app: &axum::Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

pub async fn operation(app: &axum::Router, name: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, &format!("/api/v1/operations/{}", name), Some(body)).await
}

/// Activity entries are written in the background; poll briefly for them
pub async fn wait_for_activity(repo: &MemoryRepository, router_id: Uuid, count: usize) -> Vec<ActivityEntry> {
    for _ in 0..50 {
        let entries = repo.recent(Some(router_id), 100).await.unwrap();
        if entries.len() >= count {
            return entries;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    repo.recent(Some(router_id), 100).await.unwrap()
}
