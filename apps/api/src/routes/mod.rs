pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;

use crate::cosmos::handlers as cosmos;
use crate::portfolio::handlers as portfolio;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.request_body_limit;
    let request_timeout = state.config.request_timeout;

    Router::new()
        .route("/health", get(health::health_handler))
        // Build API
        .route(
            "/api/v1/build",
            post(portfolio::handle_build).layer(
                ServiceBuilder::new()
                    .layer(TimeoutLayer::new(request_timeout))
                    .layer(DefaultBodyLimit::max(body_limit)),
            ),
        )
        .route("/api/v1/flight-log", post(portfolio::handle_flight_log))
        .route("/api/v1/audio-tracks", get(portfolio::handle_audio_tracks))
        // Visuals API
        .route("/api/v1/appearance", get(cosmos::handle_appearance))
        .route("/api/v1/texture", get(cosmos::handle_texture))
        .with_state(state)
}
