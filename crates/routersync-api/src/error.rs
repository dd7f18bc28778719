use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use routersync_core::SyncError;
use routersync_store::StoreError;
use serde_json::json;
use thiserror::Error;

/// Handler error, rendered as `{"success": false, "error": ...}`.
///
/// Operation failures keep the status of the underlying [`SyncError`];
/// `NotFound` is only used by the router CRUD routes.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        ApiError::Sync(error.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Sync(e) => {
                StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Sync(e @ (SyncError::Store(_) | SyncError::Internal(_))) => {
                tracing::error!("Internal error: {}", e);
                e.to_string()
            }
            ApiError::Sync(e) => e.to_string(),
            ApiError::BadRequest(message) | ApiError::NotFound(message) => message.clone(),
        };

        let body = Json(json!({
            "success": false,
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_follows_error_kind() {
        let device: ApiError = SyncError::device(401, "unauthorized").into();
        assert_eq!(device.status(), StatusCode::BAD_REQUEST);

        let store: ApiError = SyncError::Store("pool timed out".into()).into();
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let missing: ApiError = SyncError::NotFound("Router not found".into()).into();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let route = ApiError::NotFound("Router not found".into());
        assert_eq!(route.status(), StatusCode::NOT_FOUND);
    }
}
