//! ICAT gateway HTTP server.
//!
//! A DataGateway CRUD surface plus a curated Search API view, both backed
//! by a single catalogue session pool.

use anyhow::{Context, Result};
use axum::{
    http::Method,
    routing::any,
    Router,
};
use gateway_core::AppConfig;
use gateway_projection::ProjectionMapping;
use gateway_server::catalogue::ReqwestCatalogueClient;
use gateway_server::custom::custom_router;
use gateway_server::{handle_request, AppState};
use gateway_session::{ReqwestTransport, SessionPool};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env();
    init_tracing(&config);

    info!("starting ICAT gateway");
    info!("catalogue: {}", config.catalogue_url);

    let mapping = ProjectionMapping::load_from_file(&config.search_api_mapping_path)
        .context("loading Search API field mapping")?;

    let transport = Arc::new(ReqwestTransport::new(
        config.catalogue_url.clone(),
        config.catalogue_check_cert,
        Duration::from_millis(config.request_timeout_ms),
    )?);
    let pool = SessionPool::new(transport, config.clone())
        .await
        .context("authenticating the catalogue session pool")?;
    info!("session pool ready ({} sessions)", config.client_pool_init_size);

    let catalogue = Arc::new(ReqwestCatalogueClient::new(
        config.catalogue_url.clone(),
        config.catalogue_check_cert,
        Duration::from_millis(config.request_timeout_ms),
    )?);

    let state = Arc::new(AppState {
        pool,
        catalogue,
        mapping,
        config: config.clone(),
    });

    let app = Router::new()
        .route("/", any(handle_request))
        .route("/{*path}", any(handle_request))
        .merge(custom_router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                    Method::HEAD,
                ])
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("listening on http://{addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize tracing at the configured level, writing to stdout unless
/// `log_location` names a file.
fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.to_tracing().to_string()));

    if config.log_location == "-" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    } else {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_location)
            .unwrap_or_else(|e| panic!("opening log file {}: {e}", config.log_location));
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(move || file.try_clone().expect("cloning log file handle")).with_ansi(false))
            .init();
    }
}
