//! HTTP boundary for the sentiment service.
//!
//! ```text
//! POST /api/analyze      -> analyze one text
//! GET  /api/health       -> health report (always 200)
//! GET  /api/model-info   -> model metadata
//! GET  /api/statistics   -> usage counters
//! ```

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use log::info;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::config::ServiceConfig;
use crate::service::AnalysisService;

pub mod dto;
pub mod error;
pub mod handlers;

pub use dto::{ErrorBody, SentimentRequest, SentimentResponse};
pub use error::ApiError;

/// CORS policy for the journal frontend: one origin, credentials allowed,
/// requested methods and headers mirrored back.
pub fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let origin: HeaderValue = origin
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid CORS origin {:?}: {}", origin, e))?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

/// Builds the `/api` router around a shared service.
pub fn create_router(service: Arc<AnalysisService>, cors_origin: &str) -> anyhow::Result<Router> {
    let api = Router::new()
        .route("/analyze", post(handlers::analyze_sentiment))
        .route("/health", get(handlers::health_check))
        .route("/model-info", get(handlers::get_model_info))
        .route("/statistics", get(handlers::get_statistics));

    Ok(Router::new()
        .nest("/api", api)
        .layer(cors_layer(cors_origin)?)
        .with_state(service))
}

/// Serves the API on `config`'s bind address until Ctrl-C.
pub async fn serve(service: Arc<AnalysisService>, config: &ServiceConfig) -> anyhow::Result<()> {
    let router = create_router(service, &config.cors_origin)?;
    let listener = TcpListener::bind(config.bind_address()?).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
