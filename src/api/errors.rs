//! API Error Handling
//!
//! Structured error responses carrying the engine's stable error codes and the
//! request id for correlation.

use crate::errors::GameError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level API error response with request tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub request_id: String,
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable machine code (INVALID_BET, ROUND_COMPLETED, ...)
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub request_id: String,
}

#[derive(Debug)]
pub enum ApiErrorKind {
    Game(GameError),
    BadRequest(String),
}

impl ApiError {
    pub fn game(request_id: String, error: GameError) -> Self {
        Self {
            kind: ApiErrorKind::Game(error),
            request_id,
        }
    }

    pub fn bad_request(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::BadRequest(message),
            request_id,
        }
    }

    /// HTTP status and machine code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.kind {
            ApiErrorKind::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiErrorKind::Game(e) => {
                let status = match e {
                    GameError::InvalidSession | GameError::RoundNotFound => StatusCode::NOT_FOUND,
                    GameError::SessionExpired => StatusCode::GONE,
                    GameError::SessionMismatch | GameError::RoundCompleted => StatusCode::CONFLICT,
                    GameError::InvalidBet(_) | GameError::InsufficientBalance { .. } | GameError::InvalidSeed(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    GameError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.code())
            }
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ApiErrorKind::Game(e) => write!(f, "[{}] {}: {}", self.request_id, e.code(), e),
            ApiErrorKind::BadRequest(msg) => write!(f, "[{}] Bad Request: {}", self.request_id, msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self.kind {
            ApiErrorKind::Game(e) => e.to_string(),
            ApiErrorKind::BadRequest(msg) => msg.clone(),
        };

        let body = Json(ErrorResponse {
            request_id: self.request_id,
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}
