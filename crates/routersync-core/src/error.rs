use thiserror::Error;

use crate::router::ApiDialect;

/// Main error type for router sync operations
#[derive(Error, Debug)]
pub enum SyncError {
    // ========================================
    // Device Errors
    // ========================================
    #[error("Failed to connect to router: {0}")]
    Connection(String),

    #[error("Router returned HTTP {status}: {body}")]
    Device { status: u16, body: String },

    #[error("API dialect '{0}' is not supported")]
    UnsupportedDialect(ApiDialect),

    #[error("Unexpected router response: {0}")]
    Mapping(String),

    // ========================================
    // Request Errors
    // ========================================
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    // ========================================
    // System Errors
    // ========================================
    #[error("Storage error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Build a device error, truncating very long bodies.
    pub fn device(status: u16, body: impl Into<String>) -> Self {
        let mut body = body.into();
        if body.len() > 500 {
            let mut cut = 500;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Self::Device { status, body }
    }

    /// HTTP status used by the response envelope
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Store(_) | Self::Internal(_) => 500,
            _ => 400,
        }
    }

    /// Short label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Device { .. } => "device",
            Self::UnsupportedDialect(_) => "unsupported_dialect",
            Self::Mapping(_) => "mapping",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation",
            Self::Store(_) => "store",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_http_status() {
        assert_eq!(SyncError::Validation("bad".to_string()).http_status(), 400);
        assert_eq!(SyncError::NotFound("x".to_string()).http_status(), 400);
        assert_eq!(SyncError::device(401, "unauthorized").http_status(), 400);
        assert_eq!(SyncError::Store("down".to_string()).http_status(), 500);
    }

    #[test]
    fn test_device_error_message_contains_status() {
        let err = SyncError::device(401, "not authorized");
        assert_eq!(err.to_string(), "Router returned HTTP 401: not authorized");
    }

    #[test]
    fn test_device_body_truncated() {
        let err = SyncError::device(500, "x".repeat(2000));
        match err {
            SyncError::Device { body, .. } => assert_eq!(body.len(), 500),
            _ => panic!("Expected Device error"),
        }
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(SyncError::Connection("t".to_string()).kind(), "connection");
        assert_eq!(
            SyncError::UnsupportedDialect(ApiDialect::Snmp).kind(),
            "unsupported_dialect"
        );
    }
}
