//! The catalogue's login/refresh/logout calls, abstracted behind a trait so
//! the pool is testable against an in-process fake. The real implementation
//! posts to `catalogue_url` over HTTP, with TLS verification controlled by
//! `catalogue_check_cert`.

use crate::error::{Result, SessionError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A session newly issued or refreshed by the catalogue.
#[derive(Clone, Debug)]
pub struct IssuedSession {
    pub session_id: String,
    pub lifetime_secs: i64,
}

/// The three catalogue calls the pool needs. `Send + Sync` so a single
/// transport instance can be shared across the pool's tasks.
#[async_trait]
pub trait CatalogueTransport: Send + Sync {
    async fn login(&self, mechanism: &str, username: &str, password: &str) -> Result<IssuedSession>;
    async fn refresh(&self, session_id: &str) -> Result<IssuedSession>;
    async fn logout(&self, session_id: &str) -> Result<()>;
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    mechanism: &'a str,
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct SessionResponse {
    #[serde(rename = "sessionId")]
    session_id: String,
    #[serde(rename = "lifetimeSeconds")]
    lifetime_seconds: i64,
}

/// Real transport: a thin `reqwest::Client` posting JSON to the catalogue's
/// session endpoints.
pub struct ReqwestTransport {
    client: reqwest::Client,
    catalogue_url: String,
}

impl ReqwestTransport {
    pub fn new(catalogue_url: impl Into<String>, check_cert: bool, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!check_cert)
            .timeout(timeout)
            .build()
            .map_err(|e| SessionError::CatalogueUnavailable(e.to_string()))?;
        Ok(Self {
            client,
            catalogue_url: catalogue_url.into(),
        })
    }

    fn session_url(&self, session_id: &str) -> String {
        format!("{}/session/{}", self.catalogue_url, session_id)
    }
}

#[async_trait]
impl CatalogueTransport for ReqwestTransport {
    async fn login(&self, mechanism: &str, username: &str, password: &str) -> Result<IssuedSession> {
        let response = self
            .client
            .post(format!("{}/session", self.catalogue_url))
            .json(&LoginRequest {
                mechanism,
                username,
                password,
            })
            .send()
            .await
            .map_err(|e| SessionError::CatalogueUnavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(SessionError::AuthenticationFailed(format!(
                "catalogue rejected credentials for {username}"
            )));
        }
        if !response.status().is_success() {
            return Err(SessionError::CatalogueUnavailable(format!(
                "login returned {}",
                response.status()
            )));
        }

        let body: SessionResponse = response
            .json()
            .await
            .map_err(|e| SessionError::CatalogueUnavailable(e.to_string()))?;
        Ok(IssuedSession {
            session_id: body.session_id,
            lifetime_secs: body.lifetime_seconds,
        })
    }

    async fn refresh(&self, session_id: &str) -> Result<IssuedSession> {
        let response = self
            .client
            .put(self.session_url(session_id))
            .send()
            .await
            .map_err(|e| SessionError::CatalogueUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SessionError::Expired);
        }

        let body: SessionResponse = response
            .json()
            .await
            .map_err(|e| SessionError::CatalogueUnavailable(e.to_string()))?;
        Ok(IssuedSession {
            session_id: body.session_id,
            lifetime_secs: body.lifetime_seconds,
        })
    }

    async fn logout(&self, session_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.session_url(session_id))
            .send()
            .await
            .map_err(|e| SessionError::CatalogueUnavailable(e.to_string()))?;
        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(SessionError::CatalogueUnavailable(format!(
                "logout returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
