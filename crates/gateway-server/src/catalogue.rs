//! The catalogue's query-execution leg: posting a rendered catalogue query
//! string against an authenticated session and getting JSON rows back.
//!
//! This is deliberately separate from `gateway_session::CatalogueTransport`,
//! which only owns login/refresh/logout — the orchestrator borrows a
//! session from the pool, then hands its id to this client to actually run
//! the query C4 built, exactly as the pool and the query execution are two
//! independent legs of the same catalogue in the design.

use async_trait::async_trait;
use gateway_core::error::{Error, Result};
use serde_json::Value;
use std::time::Duration;

/// Executes rendered catalogue queries, and the DataGateway's direct
/// entity writes, against an authenticated session.
#[async_trait]
pub trait CatalogueClient: Send + Sync {
    async fn search(&self, session_id: &str, query: &str) -> Result<Vec<Value>>;
    async fn count(&self, session_id: &str, query: &str) -> Result<i64>;
    async fn create(&self, session_id: &str, entity: &str, payload: &Value) -> Result<Value>;
    async fn update(&self, session_id: &str, entity: &str, payload: &Value) -> Result<()>;
    async fn delete(&self, session_id: &str, entity: &str, id: &str) -> Result<()>;
}

/// The real transport: an HTTP client posting to the catalogue's
/// `search`/`search/count` endpoints, grounded on the same
/// `reqwest::Client`-wrapped-in-one-boundary shape as
/// `gateway_session::ReqwestTransport` and `kota-db`'s `EmbeddingProvider`.
pub struct ReqwestCatalogueClient {
    client: reqwest::Client,
    catalogue_url: String,
}

impl ReqwestCatalogueClient {
    pub fn new(catalogue_url: impl Into<String>, check_cert: bool, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!check_cert)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("building catalogue HTTP client: {e}")))?;
        Ok(Self {
            client,
            catalogue_url: catalogue_url.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.catalogue_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CatalogueClient for ReqwestCatalogueClient {
    async fn search(&self, session_id: &str, query: &str) -> Result<Vec<Value>> {
        let response = self
            .client
            .get(self.endpoint("search"))
            .query(&[("sessionId", session_id), ("query", query)])
            .send()
            .await
            .map_err(|e| Error::CatalogueUnavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::Forbidden("catalogue denied the query".into()));
        }
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::SessionExpired);
        }
        if !response.status().is_success() {
            return Err(Error::CatalogueUnavailable(format!(
                "search returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Internal(format!("decoding catalogue search response: {e}")))
    }

    async fn count(&self, session_id: &str, query: &str) -> Result<i64> {
        let response = self
            .client
            .get(self.endpoint("search/count"))
            .query(&[("sessionId", session_id), ("query", query)])
            .send()
            .await
            .map_err(|e| Error::CatalogueUnavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::SessionExpired);
        }
        if !response.status().is_success() {
            return Err(Error::CatalogueUnavailable(format!(
                "search/count returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Internal(format!("decoding catalogue count response: {e}")))
    }

    async fn create(&self, session_id: &str, entity: &str, payload: &Value) -> Result<Value> {
        let body = serde_json::json!({ "sessionId": session_id, "entity": entity, "payload": payload });
        let response = self
            .client
            .post(self.endpoint("entityManager"))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::CatalogueUnavailable(e.to_string()))?;
        self.check_write_status(&response)?;
        response
            .json()
            .await
            .map_err(|e| Error::Internal(format!("decoding catalogue create response: {e}")))
    }

    async fn update(&self, session_id: &str, entity: &str, payload: &Value) -> Result<()> {
        let body = serde_json::json!({ "sessionId": session_id, "entity": entity, "payload": payload });
        let response = self
            .client
            .put(self.endpoint("entityManager"))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::CatalogueUnavailable(e.to_string()))?;
        self.check_write_status(&response)
    }

    async fn delete(&self, session_id: &str, entity: &str, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.endpoint("entityManager"))
            .query(&[("sessionId", session_id), ("entity", entity), ("id", id)])
            .send()
            .await
            .map_err(|e| Error::CatalogueUnavailable(e.to_string()))?;
        self.check_write_status(&response)
    }
}

impl ReqwestCatalogueClient {
    fn check_write_status(&self, response: &reqwest::Response) -> Result<()> {
        match response.status() {
            s if s.is_success() => Ok(()),
            reqwest::StatusCode::FORBIDDEN => Err(Error::Forbidden("catalogue denied the write".into())),
            reqwest::StatusCode::UNAUTHORIZED => Err(Error::SessionExpired),
            reqwest::StatusCode::NOT_FOUND => Err(Error::NotFound("entity not found".into())),
            s => Err(Error::CatalogueUnavailable(format!("write returned {s}"))),
        }
    }
}
