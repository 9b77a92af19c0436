use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::cache::ArtifactCache;
use crate::config::AppConfig;
use crate::handlers;
use crate::orchestrator::Orchestrator;
use crate::provider::Provider;

/// Builds the shared cache (starting its sweeper) and the provider. Must be
/// called inside a tokio runtime.
pub fn build_orchestrator(config: &AppConfig) -> Arc<Orchestrator> {
    let cache = ArtifactCache::new(config.cache);
    let provider = Provider::from_config(&config.provider);
    Arc::new(Orchestrator::new(cache, provider))
}

pub fn router(orchestrator: Arc<Orchestrator>, max_body_bytes: usize) -> Router {
    let ai = Router::new()
        .route("/analyze", post(handlers::analyze))
        .route("/analyze/refine", post(handlers::refine_analysis))
        .route("/cutout", post(handlers::generate_cutout))
        .route("/cutout/refine", post(handlers::refine_cutout))
        .route("/cutout/clear", post(handlers::clear_cache))
        .route("/avatar", post(handlers::generate_avatar))
        .route("/collage", post(handlers::generate_collage))
        .route("/tryon", post(handlers::virtual_try_on))
        .route("/match", post(handlers::match_in_wardrobe));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1/ai", ai)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(orchestrator)
}
