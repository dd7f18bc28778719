// Router CRUD, activity and mirror endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::*;
use routersync_core::ResourceKind;
use routersync_store::rows::IpPoolRow;
use routersync_store::{MemoryRepository, MirrorRow, MirrorStore};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_router_crud() {
    let repo = MemoryRepository::new();
    let app = app(&repo);

    // Test CREATE
    let (status, created) = send(
        &app,
        Method::POST,
        "/api/v1/routers",
        Some(json!({
            "name": "core-1",
            "address": "203.0.113.10",
            "port": 8443,
            "username": "admin",
            "password": "secret"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "core-1");
    assert_eq!(created["apiDialect"], "mikrotik_rest");
    assert_eq!(created["status"], "unknown");
    assert!(created.get("password").is_none(), "password must not be returned");
    let id = created["id"].as_str().unwrap().to_string();

    // Test READ
    let (status, fetched) = send(&app, Method::GET, &format!("/api/v1/routers/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["port"], 8443);

    // Test UPDATE keeps the stored password when none is sent
    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/routers/{}", id),
        Some(json!({
            "name": "core-1b",
            "address": "203.0.113.11",
            "username": "admin"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "core-1b");
    let stored = routersync_store::RouterStore::get_router(&repo, Uuid::parse_str(&id).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.password, "secret");
    assert_eq!(stored.port, None);

    // Test LIST
    let (_, list) = send(&app, Method::GET, "/api/v1/routers", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    // Test DELETE
    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/routers/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/routers/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_create_router_requires_fields() {
    let repo = MemoryRepository::new();
    let app = app(&repo);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/routers",
        Some(json!({ "name": "edge", "address": " ", "username": "admin", "password": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "address is required");

    let (status, _) = send(&app, Method::GET, "/api/v1/routers/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_activity_and_mirror_endpoints() {
    let repo = MemoryRepository::new();
    let app = app(&repo);

    let (_, created) = send(
        &app,
        Method::POST,
        "/api/v1/routers",
        Some(json!({
            "name": "branch",
            "address": "198.51.100.7",
            "username": "api",
            "password": "pw"
        })),
    )
    .await;
    let id = Uuid::parse_str(created["id"].as_str().unwrap()).unwrap();

    repo.upsert(&MirrorRow::IpPool(IpPoolRow {
        router_id: id,
        name: "lan-pool".to_string(),
        ranges: "192.168.88.10-192.168.88.254".to_string(),
        next_pool: None,
        comment: None,
        device_id: Some("*1".to_string()),
    }))
    .await
    .unwrap();

    let (status, rows) =
        send(&app, Method::GET, &format!("/api/v1/routers/{}/mirror/ip-pool", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows[0]["kind"], "ip-pool");
    assert_eq!(rows[0]["ranges"], "192.168.88.10-192.168.88.254");
    assert_eq!(repo.count(id, ResourceKind::IpPool).await, 1);

    let (status, _) =
        send(&app, Method::GET, &format!("/api/v1/routers/{}/mirror/routes", id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let entries = wait_for_activity(&repo, id, 1).await;
    assert_eq!(entries[0].action, "create-router");

    let (status, activity) =
        send(&app, Method::GET, &format!("/api/v1/routers/{}/activity?limit=5", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(activity[0]["message"], "Router branch added");
}

#[tokio::test]
async fn test_health() {
    let repo = MemoryRepository::new();
    let app = app(&repo);

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
