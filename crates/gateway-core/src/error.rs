//! Error types for the gateway.
//!
//! A single enum spans request parsing, query building, session handling,
//! and the projection engine, each variant mapped to one of the error kinds
//! in the error-handling design: `BadFilter`, `Forbidden`, `NotFound`,
//! `AuthenticationFailed`, `SessionExpired`, `PoolExhausted`,
//! `CatalogueUnavailable`, `Internal`.

use http::StatusCode;
use thiserror::Error;

/// Result type used throughout the gateway.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the gateway.
#[derive(Error, Debug, Clone)]
pub enum Error {
    // ========================================================================
    // BadFilter (400) — C2/C4 rejects input
    // ========================================================================
    #[error("bad filter at {path}: {message}")]
    BadFilter { path: String, message: String },

    #[error("unknown top-level filter key: {0}")]
    UnknownFilterKey(String),

    // ========================================================================
    // Forbidden (403) — catalogue denies the operation
    // ========================================================================
    #[error("forbidden: {0}")]
    Forbidden(String),

    // ========================================================================
    // NotFound (404)
    // ========================================================================
    #[error("not found: {0}")]
    NotFound(String),

    // ========================================================================
    // AuthenticationFailed (401) — session cannot be obtained
    // ========================================================================
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    // ========================================================================
    // SessionExpired — internal, triggers one retry
    // ========================================================================
    #[error("session expired")]
    SessionExpired,

    // ========================================================================
    // PoolExhausted (503) — borrow timeout
    // ========================================================================
    #[error("session pool exhausted")]
    PoolExhausted,

    // ========================================================================
    // CatalogueUnavailable (503) — transport error
    // ========================================================================
    #[error("catalogue unavailable: {0}")]
    CatalogueUnavailable(String),

    // ========================================================================
    // Internal (500)
    // ========================================================================
    #[error("internal error: {0}")]
    Internal(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn bad_filter(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadFilter {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadFilter { .. } | Self::UnknownFilterKey(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PoolExhausted | Self::CatalogueUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            // SessionExpired is recovered locally by the orchestrator; if it
            // ever escapes unrecovered, treat it as internal rather than
            // inventing a public status for it.
            Self::SessionExpired | Self::Internal(_) | Self::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable error code for the `{status, message}` response body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadFilter { .. } => "GATEWAY_BAD_FILTER",
            Self::UnknownFilterKey(_) => "GATEWAY_UNKNOWN_FILTER_KEY",
            Self::Forbidden(_) => "GATEWAY_FORBIDDEN",
            Self::NotFound(_) => "GATEWAY_NOT_FOUND",
            Self::AuthenticationFailed(_) => "GATEWAY_AUTHENTICATION_FAILED",
            Self::SessionExpired => "GATEWAY_SESSION_EXPIRED",
            Self::PoolExhausted => "GATEWAY_POOL_EXHAUSTED",
            Self::CatalogueUnavailable(_) => "GATEWAY_CATALOGUE_UNAVAILABLE",
            Self::Internal(_) => "GATEWAY_INTERNAL",
            Self::Config(_) => "GATEWAY_CONFIG",
        }
    }

    /// Render the `{status, message}` error body described in the external
    /// interfaces section.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "status": self.status_code().as_u16(),
            "message": self.to_string(),
            "code": self.code(),
        })
    }
}

impl From<gateway_ql::QlError> for Error {
    fn from(e: gateway_ql::QlError) -> Self {
        Error::bad_filter("where", e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            Error::bad_filter("where.size", "bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::AuthenticationFailed("no session".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Error::Forbidden("denied".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(Error::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(Error::PoolExhausted.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            Error::CatalogueUnavailable("timeout".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(Error::Internal("oops".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_to_json() {
        let error = Error::bad_filter("where.size.between", "expected 2 elements");
        let json = error.to_json();
        assert_eq!(json["code"], "GATEWAY_BAD_FILTER");
        assert_eq!(json["status"], 400);
        assert!(json["message"].as_str().unwrap().contains("where.size.between"));
    }

    #[test]
    fn test_scenario_5_message_identifies_path() {
        // "Malformed filter {where:{size:{between:[5]}}} -> 400 BadFilter,
        // message identifies where.size.between"
        let error = Error::bad_filter("where.size.between", "between requires exactly two elements, got 1");
        assert!(error.to_string().contains("where.size.between"));
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }
}
