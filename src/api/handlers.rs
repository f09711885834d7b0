//! Request Handlers
//!
//! Thin adapters from HTTP to the session/round manager. Every handler takes the
//! request id from the middleware so error bodies can be correlated with logs.

use super::{errors::ApiError, middleware::RequestId, models::*};
use crate::config::{GameConfig, MICROS_PER_UNIT};
use crate::fairness::VerificationService;
use crate::games::seed_chain;
use crate::games::simulation;
use crate::games::types::Round;
use crate::session::{PlayResult, RoundSettlement, SessionCreated, SessionInfo, SessionReveal, SessionRoundManager};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use std::sync::Arc;
use tracing::debug;

/// Shared application state
pub struct AppState {
    pub manager: Arc<SessionRoundManager>,
    pub verifier: VerificationService,
    pub config: Arc<GameConfig>,
    pub version: String,
}

impl AppState {
    pub fn new(manager: Arc<SessionRoundManager>) -> Self {
        let config = Arc::new(manager.config().clone());
        Self {
            verifier: VerificationService::new(&config),
            manager,
            config,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

fn body<T>(request_id: &RequestId, payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|rejection| ApiError::bad_request(request_id.0.clone(), rejection.body_text()))
}

/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: state.version.clone(),
    })
}

/// GET /api/config
pub async fn config_handler(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    let config = &state.config;
    Json(ConfigResponse {
        betting: config.betting.clone(),
        wincap: config.payout.wincap,
        plan_mode: config.plan.mode,
        micros_per_unit: MICROS_PER_UNIT,
        rtp_target: config.rtp.target,
    })
}

/// GET /api/rtp
pub async fn rtp_handler(State(state): State<Arc<AppState>>) -> Json<RtpResponse> {
    let config = &state.config;
    let theoretical = simulation::theoretical_rtp(config);
    Json(RtpResponse {
        primary_rtp: simulation::primary_rtp(config),
        theoretical_rtp: theoretical,
        target: config.rtp.target,
        tolerance: config.rtp.tolerance,
        compliant: simulation::is_compliant(theoretical, config.rtp.target, config.rtp.tolerance),
    })
}

/// POST /api/session
///
/// The body is optional; without one the server picks the client seed.
pub async fn create_session_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    payload: Option<Json<CreateSessionRequest>>,
) -> Result<Json<SessionCreated>, ApiError> {
    let client_seed = payload.and_then(|Json(req)| req.client_seed);
    let created = state
        .manager
        .authenticate(client_seed)
        .await
        .map_err(|e| ApiError::game(request_id.0.clone(), e))?;

    debug!(request_id = %request_id.0, token = %created.token, "session created");
    Ok(Json(created))
}

/// GET /api/session/:token
pub async fn session_info_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<SessionInfo>, ApiError> {
    state
        .manager
        .session_info(&token)
        .await
        .map(Json)
        .map_err(|e| ApiError::game(request_id.0, e))
}

/// POST /api/session/:token/end
pub async fn end_session_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<SessionReveal>, ApiError> {
    state
        .manager
        .end_session(&token)
        .await
        .map(Json)
        .map_err(|e| ApiError::game(request_id.0, e))
}

/// POST /api/play
pub async fn play_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PlayRequest>, JsonRejection>,
) -> Result<Json<PlayResult>, ApiError> {
    let req = body(&request_id, payload)?;
    state
        .manager
        .play(&req.session_token, req.bet)
        .await
        .map(Json)
        .map_err(|e| ApiError::game(request_id.0, e))
}

/// POST /api/round/end
pub async fn end_round_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EndRoundRequest>, JsonRejection>,
) -> Result<Json<RoundSettlement>, ApiError> {
    let req = body(&request_id, payload)?;
    state
        .manager
        .end_round(&req.session_token, &req.round_id)
        .await
        .map(Json)
        .map_err(|e| ApiError::game(request_id.0, e))
}

/// GET /api/session/:token/round/:round_id
pub async fn round_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path((token, round_id)): Path<(String, String)>,
) -> Result<Json<Round>, ApiError> {
    state
        .manager
        .round(&token, &round_id)
        .await
        .map(Json)
        .map_err(|e| ApiError::game(request_id.0, e))
}

/// POST /api/verify
///
/// Stateless: works for any revealed seed pair, including ones this server
/// never issued.
pub async fn verify_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let req = body(&request_id, payload)?;

    let computed_value = seed_chain::derive_base(&req.server_seed, &req.client_seed, req.nonce);
    let value_matches = VerificationService::verify(&req.server_seed, &req.client_seed, req.nonce, req.expected_value);
    let commitment_valid = req
        .server_seed_hash
        .as_deref()
        .map(|hash| VerificationService::verify_commitment(&req.server_seed, hash));

    let outcome = match req.bet {
        Some(bet) => {
            let replayed = state
                .verifier
                .replay(&req.server_seed, &req.client_seed, req.nonce, bet)
                .map_err(|e| ApiError::game(request_id.0.clone(), e))?;
            Some(replayed.outcome)
        }
        None => None,
    };

    Ok(Json(VerifyResponse {
        valid: value_matches && commitment_valid.unwrap_or(true),
        computed_value,
        commitment_valid,
        outcome,
    }))
}
