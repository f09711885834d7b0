//! Route Definitions

use super::handlers::*;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        // Public game parameters
        .route("/api/config", get(config_handler))
        .route("/api/rtp", get(rtp_handler))
        // Session lifecycle
        .route("/api/session", post(create_session_handler))
        .route("/api/session/:token", get(session_info_handler))
        .route("/api/session/:token/end", post(end_session_handler))
        .route("/api/session/:token/round/:round_id", get(round_handler))
        // Rounds
        .route("/api/play", post(play_handler))
        .route("/api/round/end", post(end_round_handler))
        .route("/api/verify", post(verify_handler))
        .with_state(state)
}
