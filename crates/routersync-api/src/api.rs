use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json,
};
use chrono::Utc;
use routersync_core::validate::check_required;
use routersync_core::{ApiDialect, ResourceKind, Router, RouterStatus};
use routersync_store::{ActivityEntry, ActivityStore, MirrorStore, RouterStore};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::error::ApiError;
use crate::operations::{self, Operation, Outcome};
use crate::state::AppState;

const DEFAULT_ACTIVITY_LIMIT: i64 = 50;
const MAX_ACTIVITY_LIMIT: i64 = 500;

/// API Router
pub fn create_router(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route(
            "/api/v1/operations/:operation",
            post(run_operation).options(preflight),
        )
        .route("/api/v1/routers", get(list_routers).post(create_router_record))
        .route(
            "/api/v1/routers/:id",
            get(get_router).put(update_router).delete(delete_router),
        )
        .route("/api/v1/routers/:id/activity", get(list_activity))
        .route("/api/v1/routers/:id/mirror/:kind", get(list_mirror))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Success body of an operation
#[derive(Serialize)]
struct SuccessEnvelope {
    success: bool,
    #[serde(flatten)]
    outcome: Outcome,
}

// Handlers

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        routersync_metrics::gather_metrics(),
    )
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn run_operation(
    Path(operation): Path<String>,
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SuccessEnvelope>, ApiError> {
    let operation: Operation = operation.parse()?;
    let outcome = operations::dispatch(&state, operation, &body).await?;
    Ok(Json(SuccessEnvelope {
        success: true,
        outcome,
    }))
}

/// Router fields accepted on create and update
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterInput {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub username: String,
    /// Empty on update keeps the stored password
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub api_dialect: ApiDialect,
    #[serde(default)]
    pub api_endpoint: Option<String>,
    #[serde(default)]
    pub provider_id: Option<Uuid>,
}

impl RouterInput {
    fn parse(body: &[u8]) -> Result<Self, ApiError> {
        let input: RouterInput = serde_json::from_slice(body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid router body: {}", e)))?;
        check_required("name", &input.name)?;
        check_required("address", &input.address)?;
        check_required("username", &input.username)?;
        Ok(input)
    }

    fn apply(self, router: &mut Router) {
        router.name = self.name.trim().to_string();
        router.address = self.address.trim().to_string();
        router.port = self.port;
        router.username = self.username;
        if !self.password.is_empty() {
            router.password = self.password;
        }
        router.api_dialect = self.api_dialect;
        router.api_endpoint = self.api_endpoint.filter(|e| !e.trim().is_empty());
        router.provider_id = self.provider_id;
    }
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::BadRequest(format!("Invalid router id '{}'", id)))
}

async fn load_router(state: &AppState, id: Uuid) -> Result<Router, ApiError> {
    state
        .store
        .get_router(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Router not found".to_string()))
}

async fn list_routers(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let routers = state.store.list_routers().await?;
    Ok(Json(routers))
}

async fn create_router_record(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let input = RouterInput::parse(&body)?;
    check_required("password", &input.password)?;

    let mut router = Router::new("", "", "", "");
    input.apply(&mut router);
    router.status = RouterStatus::Unknown;
    router.created_at = Some(Utc::now());
    state.store.save_router(&router).await?;

    state.log_activity(ActivityEntry::new(
        Some(&router),
        "create-router",
        format!("Router {} added", router.name),
    ));
    Ok((StatusCode::CREATED, Json(router)))
}

async fn get_router(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let router = load_router(&state, parse_id(&id)?).await?;
    Ok(Json(router))
}

async fn update_router(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let mut router = load_router(&state, parse_id(&id)?).await?;
    let input = RouterInput::parse(&body)?;
    input.apply(&mut router);
    state.store.save_router(&router).await?;

    state.log_activity(ActivityEntry::new(
        Some(&router),
        "update-router",
        format!("Router {} updated", router.name),
    ));
    Ok(Json(router))
}

async fn delete_router(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    if state.store.delete_router(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Router not found".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ActivityQuery {
    limit: Option<i64>,
}

async fn list_activity(
    Path(id): Path<String>,
    Query(query): Query<ActivityQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let router = load_router(&state, parse_id(&id)?).await?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
        .clamp(1, MAX_ACTIVITY_LIMIT);
    let entries = state.store.recent(Some(router.id), limit).await?;
    Ok(Json(entries))
}

async fn list_mirror(
    Path((id, kind)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let kind: ResourceKind = kind.parse().map_err(ApiError::BadRequest)?;
    let router = load_router(&state, parse_id(&id)?).await?;
    let rows = state.store.list(router.id, kind).await?;
    Ok(Json(rows))
}
