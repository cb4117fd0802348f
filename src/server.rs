//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::assets::AssetLoader;
use crate::error::ApiError;
use crate::models::AppConfig;
use crate::rendering::{RasterEngine, RenderEngine};
use crate::services::{PosterPipeline, RenderExecutor, RenderQueue, TeraMarkup};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<PosterPipeline>,
}

/// Create application state with the production raster engine.
pub fn create_app_state(asset_loader: Arc<AssetLoader>) -> anyhow::Result<AppState> {
    let engine = Arc::new(RasterEngine::from_assets(&asset_loader));
    create_app_state_with_engine(asset_loader, engine)
}

/// Create application state with an injected engine.
///
/// Integration tests use this to run the full pipeline against a scripted
/// engine instead of the raster thread.
pub fn create_app_state_with_engine(
    asset_loader: Arc<AssetLoader>,
    engine: Arc<dyn RenderEngine>,
) -> anyhow::Result<AppState> {
    let config = Arc::new(AppConfig::load_from_assets(&asset_loader));
    config
        .layout
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid layout configuration: {e}"))?;

    let markup = Arc::new(TeraMarkup::new(asset_loader, config.clone()));
    let executor = Arc::new(RenderExecutor::new(
        engine,
        markup.clone(),
        config.render.settle(),
    ));
    let queue = Arc::new(RenderQueue::new(executor));
    let pipeline = Arc::new(PosterPipeline::new(config.clone(), markup, queue));

    Ok(AppState { config, pipeline })
}

/// Build the API router with all endpoints and middleware.
///
/// This is the core router used by both production and tests.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Poster API endpoints
        .route("/api/posters", post(handle_render_poster))
        .route("/api/posters/image", post(handle_poster_image))
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Add state and tracing
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// Wrapper handlers to extract state components for the underlying API handlers

async fn handle_render_poster(
    axum::extract::State(state): axum::extract::State<AppState>,
    body: axum::Json<api::PosterRequest>,
) -> Result<axum::Json<api::PosterResponse>, ApiError> {
    api::handle_render_poster(
        axum::extract::State(state.config),
        axum::extract::State(state.pipeline),
        body,
    )
    .await
}

async fn handle_poster_image(
    axum::extract::State(state): axum::extract::State<AppState>,
    query: axum::extract::Query<api::poster::PosterImageQuery>,
    body: axum::Json<api::PosterRequest>,
) -> Result<axum::response::Response, ApiError> {
    api::handle_poster_image(
        axum::extract::State(state.config),
        axum::extract::State(state.pipeline),
        query,
        body,
    )
    .await
}
