//! API Request and Response Models
//!
//! Session, play and settlement responses reuse the manager's own result
//! types; this module only adds what is specific to the HTTP surface.

use crate::config::{BettingConfig, PlanMode};
use crate::games::types::Outcome;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Public game parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub betting: BettingConfig,
    pub wincap: f64,
    pub plan_mode: PlanMode,
    pub micros_per_unit: u64,
    pub rtp_target: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RtpResponse {
    pub primary_rtp: f64,
    pub theoretical_rtp: f64,
    pub target: f64,
    pub tolerance: f64,
    pub compliant: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub client_seed: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayRequest {
    pub session_token: String,
    /// Micro-units
    pub bet: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndRoundRequest {
    pub session_token: String,
    pub round_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub server_seed: String,
    pub client_seed: String,
    pub nonce: u64,
    #[serde(alias = "claimed_value")]
    pub expected_value: f64,
    /// Also checked against the revealed seed when present
    #[serde(default)]
    pub server_seed_hash: Option<String>,
    /// Replays the outcome for this bet when present
    #[serde(default)]
    pub bet: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub computed_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commitment_valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
}
