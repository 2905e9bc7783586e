//! C3's own narrow error type: one
//! enum for everything that can go wrong obtaining or holding a catalogue
//! session, each variant carrying its own HTTP status and code so the
//! orchestrator can surface it without reaching into transport details.
//! Bridges into [`gateway_core::Error`] at the C6 boundary.

use http::StatusCode;

/// Session pool / authentication error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("session pool exhausted")]
    PoolExhausted,

    #[error("session expired")]
    Expired,

    #[error("catalogue unavailable: {0}")]
    CatalogueUnavailable(String),
}

impl SessionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            Self::PoolExhausted | Self::CatalogueUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Expired => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed(_) => "GATEWAY_AUTHENTICATION_FAILED",
            Self::PoolExhausted => "GATEWAY_POOL_EXHAUSTED",
            Self::Expired => "GATEWAY_SESSION_EXPIRED",
            Self::CatalogueUnavailable(_) => "GATEWAY_CATALOGUE_UNAVAILABLE",
        }
    }
}

impl From<SessionError> for gateway_core::Error {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::AuthenticationFailed(m) => gateway_core::Error::AuthenticationFailed(m),
            SessionError::PoolExhausted => gateway_core::Error::PoolExhausted,
            SessionError::Expired => gateway_core::Error::SessionExpired,
            SessionError::CatalogueUnavailable(m) => gateway_core::Error::CatalogueUnavailable(m),
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
