//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::assets::AssetLoader;
use crate::models::AppConfig;
use crate::services::{ImageLoader, Pipelines, SourceFetcher, SurfaceRegistry};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipelines: Arc<Pipelines>,
    pub surfaces: Arc<SurfaceRegistry>,
}

/// Create application state from an asset loader.
pub fn create_app_state(asset_loader: &AssetLoader) -> anyhow::Result<AppState> {
    let config = AppConfig::load_from_assets(asset_loader);
    let loader = ImageLoader::from_config(&config.fetch)
        .map_err(|e| anyhow::anyhow!("Failed to create image loader: {e}"))?;
    Ok(build_state(config, loader))
}

/// Create application state with a custom fetcher for remote sources.
pub fn create_app_state_with_fetcher(
    config: AppConfig,
    fetcher: Arc<dyn SourceFetcher>,
) -> AppState {
    let loader = ImageLoader::new(fetcher, config.fetch.max_bytes);
    build_state(config, loader)
}

fn build_state(config: AppConfig, loader: ImageLoader) -> AppState {
    let config = Arc::new(config);
    AppState {
        pipelines: Arc::new(Pipelines::new(loader, config.clone())),
        surfaces: Arc::new(SurfaceRegistry::with_limit(config.surfaces.max_count)),
        config,
    }
}

/// JSON envelope allowance on top of the encoded image
const BODY_OVERHEAD: usize = 64 * 1024;

/// Largest request body accepted: one `max_bytes` image as a base64 data URL
pub fn request_body_limit(max_bytes: usize) -> usize {
    max_bytes.div_ceil(3) * 4 + BODY_OVERHEAD
}

/// Build the API router with all endpoints and middleware.
///
/// This is the core router used by both production and tests.
pub fn build_router(state: AppState) -> Router {
    let body_limit = request_body_limit(state.config.fetch.max_bytes);

    Router::new()
        .route("/api/surfaces/:id", get(api::handle_status))
        .route("/api/surfaces/:id/transform", post(api::handle_transform))
        .route("/api/surfaces/:id/arithmetic", post(api::handle_arithmetic))
        .route("/api/surfaces/:id/output.png", get(api::handle_output_png))
        .route("/api/surfaces/:id/inputs/:file", get(api::handle_input_png))
        .route("/api/surfaces/:id/events", get(api::handle_events))
        .route("/api/transfer", get(api::handle_transfer))
        // Health check
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_limit_covers_base64() {
        let max_bytes = 20 * 1024 * 1024;
        let limit = request_body_limit(max_bytes);
        assert!(limit > 2 * 1024 * 1024);
        assert!(limit >= max_bytes * 4 / 3 + BODY_OVERHEAD);
        assert_eq!(request_body_limit(3), 4 + BODY_OVERHEAD);
    }
}
