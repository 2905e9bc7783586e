//! Shared application state: the session pool handle, the projection
//! mapping, and the config — no `RwLock` schema cache, since both the
//! entity descriptor and the projection mapping are process-wide
//! immutables loaded once at startup.

use crate::catalogue::CatalogueClient;
use gateway_core::AppConfig;
use gateway_projection::ProjectionMapping;
use gateway_session::SessionPool;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    /// Pooled, auto-refreshing catalogue sessions.
    pub pool: SessionPool,
    /// Executes rendered catalogue queries against a borrowed session.
    pub catalogue: Arc<dyn CatalogueClient>,
    /// The Search API's field mapping, loaded once at startup.
    pub mapping: ProjectionMapping,
    /// Application configuration.
    pub config: AppConfig,
}

impl AppState {
    pub fn extension(&self) -> &str {
        &self.config.extension
    }
}
