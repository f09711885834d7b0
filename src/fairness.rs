//! Provably-fair verification
//!
//! Anyone holding a revealed seed pair can recompute a round's base value,
//! check it against the commitment published at session start, and replay
//! the outcome the engine must have produced for it.

use crate::config::GameConfig;
use crate::errors::GameError;
use crate::games::processor::{GameEngine, RoundResult};
use crate::games::seed_chain::{self, SeedPair};
use crate::games::types::Round;
use serde::{Deserialize, Serialize};

/// Absorbs float formatting on the claimant's side
pub const VERIFY_TOLERANCE: f64 = 1e-4;

/// Per-check outcome of auditing a stored round
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundAudit {
    pub round_id: String,
    pub nonce: u64,
    pub recomputed_base: f64,
    pub commitment_matches: bool,
    pub base_matches: bool,
    pub outcome_matches: bool,
}

impl RoundAudit {
    pub fn passed(&self) -> bool {
        self.commitment_matches && self.base_matches && self.outcome_matches
    }
}

/// Replays committed draws from revealed seeds
pub struct VerificationService {
    engine: GameEngine,
}

impl VerificationService {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            engine: GameEngine::new(config),
        }
    }

    /// Recompute the base value and compare it with `claimed_value`
    pub fn verify(server_seed: &str, client_seed: &str, nonce: u64, claimed_value: f64) -> bool {
        let base = seed_chain::derive_base(server_seed, client_seed, nonce);
        (base - claimed_value).abs() <= VERIFY_TOLERANCE
    }

    /// Check a revealed server seed against the commitment handed out earlier
    pub fn verify_commitment(server_seed: &str, server_seed_hash: &str) -> bool {
        seed_chain::verify_commitment(server_seed, server_seed_hash)
    }

    /// Outcome and plan the engine produces for this draw
    pub fn replay(&self, server_seed: &str, client_seed: &str, nonce: u64, bet: u64) -> Result<RoundResult, GameError> {
        let seeds = SeedPair::new(server_seed.to_string(), client_seed.to_string())?;
        self.engine.play_round(&seeds, nonce, bet)
    }

    /// Audit a stored round against the revealed seeds and commitment
    pub fn audit_round(
        &self,
        round: &Round,
        server_seed: &str,
        client_seed: &str,
        server_seed_hash: &str,
    ) -> Result<RoundAudit, GameError> {
        let replayed = self.replay(server_seed, client_seed, round.nonce, round.bet)?;
        Ok(RoundAudit {
            round_id: round.id.clone(),
            nonce: round.nonce,
            recomputed_base: replayed.base_value,
            commitment_matches: Self::verify_commitment(server_seed, server_seed_hash),
            base_matches: (replayed.base_value - round.base_value).abs() <= VERIFY_TOLERANCE,
            outcome_matches: replayed.outcome == round.outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::seed_chain::{commitment, derive_base};
    use crate::games::types::RoundStatus;
    use chrono::Utc;

    const SERVER: &str = "0f1e2d3c4b5a69788796a5b4c3d2e1f00f1e2d3c4b5a69788796a5b4c3d2e1f0";
    const CLIENT: &str = "1234567890abcdef";

    #[test]
    fn test_verify_accepts_recomputed_value() {
        let base = derive_base(SERVER, CLIENT, 42);
        assert!(VerificationService::verify(SERVER, CLIENT, 42, base));
        assert!(VerificationService::verify(SERVER, CLIENT, 42, base + 0.00005));
    }

    #[test]
    fn test_verify_rejects_wrong_inputs() {
        let base = derive_base(SERVER, CLIENT, 42);
        assert!(!VerificationService::verify(SERVER, CLIENT, 42, base + 0.01));
        assert!(!VerificationService::verify(SERVER, CLIENT, 42, base - 0.001));
    }

    #[test]
    fn test_commitment() {
        let hash = commitment(SERVER);
        assert!(VerificationService::verify_commitment(SERVER, &hash));
        assert!(!VerificationService::verify_commitment(&"00".repeat(32), &hash));
    }

    #[test]
    fn test_replay_rejects_bad_seeds() {
        let service = VerificationService::new(&GameConfig::default());
        let err = service.replay("short", CLIENT, 0, 1_000_000).unwrap_err();
        assert_eq!(err.code(), "INVALID_SEED");
    }

    #[test]
    fn test_audit_detects_tampered_outcome() {
        let service = VerificationService::new(&GameConfig::default());
        let result = service.replay(SERVER, CLIENT, 5, 1_000_000).unwrap();
        let mut round = Round {
            id: "r".into(),
            session_token: "s".into(),
            nonce: 5,
            base_value: result.base_value,
            bet: 1_000_000,
            outcome: result.outcome,
            plan: result.plan,
            status: RoundStatus::Completed,
            created_at: Utc::now(),
            settled_at: None,
            settlement: None,
        };

        let audit = service.audit_round(&round, SERVER, CLIENT, &commitment(SERVER)).unwrap();
        assert!(audit.passed());

        round.outcome.payout += 1;
        let audit = service.audit_round(&round, SERVER, CLIENT, &commitment(SERVER)).unwrap();
        assert!(audit.base_matches);
        assert!(!audit.outcome_matches);
    }
}
