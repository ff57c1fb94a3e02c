use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        // Cross-sectional
        .route("/anomalies", get(handlers::anomalies))
        // Streaming engine
        .route("/stream/status", get(handlers::stream_status))
        .route("/stream/alerts", get(handlers::stream_alerts))
        .route("/stream/reset", post(handlers::stream_reset));

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
