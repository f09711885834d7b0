//! Session and round lifecycle
//!
//! Every state change is an optimistic compare-and-swap against the session's
//! version: read, validate, compute, swap. A lost race re-reads and validates
//! again, so two concurrent plays can never both pass the balance check
//! against the same pre-debit balance, and a round completes exactly once.

use crate::common::traits::SessionStore;
use crate::common::types::{RoundWrite, SessionLifecycle, SessionRecord};
use crate::config::{BettingConfig, GameConfig};
use crate::errors::{FreefallError, GameError};
use crate::games::plan::Plan;
use crate::games::processor::GameEngine;
use crate::games::seed_chain::{SeedChain, SeedPair, SeedSource};
use crate::games::types::{Outcome, Round, RoundId, RoundStatus, SessionToken, SettlementKind};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Ten years; keeps the TTL inside chrono's range
const MAX_ROUND_TTL_SECS: u64 = 10 * 365 * 24 * 3_600;

/// Returned by [`SessionRoundManager::authenticate`]; never carries the server seed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionCreated {
    pub token: SessionToken,
    pub balance: u64,
    pub client_seed: String,
    pub server_seed_hash: String,
    pub nonce: u64,
    pub limits: BettingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayResult {
    pub round_id: RoundId,
    pub nonce: u64,
    pub bet: u64,
    pub outcome: Outcome,
    pub plan: Plan,
    pub balance: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundSettlement {
    pub round_id: RoundId,
    pub payout: u64,
    pub balance: u64,
    pub status: RoundStatus,
    pub kind: SettlementKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionInfo {
    pub token: SessionToken,
    pub balance: u64,
    pub nonce: u64,
    pub rounds_played: u64,
    pub lifecycle: SessionLifecycle,
    pub client_seed: String,
    pub server_seed_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to audit a finished session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionReveal {
    pub token: SessionToken,
    pub server_seed: String,
    pub server_seed_hash: String,
    pub client_seed: String,
    /// Nonce the next round would have used
    pub final_nonce: u64,
    pub balance: u64,
    pub rounds_played: u64,
    pub auto_settled: Vec<RoundSettlement>,
}

/// Owns session balances and drives rounds through `active → completed`
pub struct SessionRoundManager {
    config: Arc<GameConfig>,
    engine: GameEngine,
    store: Arc<dyn SessionStore>,
    seeds: Arc<dyn SeedSource>,
}

impl SessionRoundManager {
    pub fn new(config: Arc<GameConfig>, store: Arc<dyn SessionStore>, seeds: Arc<dyn SeedSource>) -> Self {
        let engine = GameEngine::new(&config);
        Self {
            config,
            engine,
            store,
            seeds,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    /// Open a session with fresh seeds and the starting balance
    pub async fn authenticate(&self, client_seed: Option<String>) -> Result<SessionCreated, GameError> {
        let seeds = SeedPair::generate(self.seeds.as_ref(), client_seed)?;
        let token = Uuid::new_v4().to_string();
        let record = SessionRecord::new(
            token.clone(),
            self.config.session.starting_balance,
            SeedChain::new(seeds, self.config.session.nonce_start),
        );
        let created = SessionCreated {
            token: token.clone(),
            balance: record.balance,
            client_seed: record.chain.seeds().client_seed().to_string(),
            server_seed_hash: record.server_seed_hash(),
            nonce: record.chain.nonce(),
            limits: self.config.betting.clone(),
        };

        self.store.put(record).await.map_err(internal)?;
        info!(token = %token, commitment = %created.server_seed_hash, "session opened");
        Ok(created)
    }

    /// Debit `bet`, resolve a round at the current nonce and store it as active
    pub async fn play(&self, token: &str, bet: u64) -> Result<PlayResult, GameError> {
        let record = self.load_active(token).await?;
        self.validate_bet(bet)?;

        // Stale rounds are only settled once the bet is known to be affordable
        // with their payouts included, so a rejected play changes nothing.
        let now = Utc::now();
        let stale = self.stale_rounds(token, now).await?;
        let due = stale.iter().fold(0u64, |due, r| due.saturating_add(r.outcome.payout));
        if bet > record.balance.saturating_add(due) {
            return Err(GameError::InsufficientBalance { bet, balance: record.balance });
        }
        self.auto_settle(token, &stale, now).await?;

        for attempt in 0..self.max_attempts() {
            let record = self.load_active(token).await?;
            if bet > record.balance {
                return Err(GameError::InsufficientBalance { bet, balance: record.balance });
            }

            let mut next = record.clone();
            let nonce = next.chain.next_nonce();
            next.balance -= bet;
            next.rounds_played += 1;

            let result = self.engine.play_round(next.chain.seeds(), nonce, bet)?;
            let round = Round {
                id: Uuid::new_v4().to_string(),
                session_token: record.token.clone(),
                nonce,
                base_value: result.base_value,
                bet,
                outcome: result.outcome,
                plan: result.plan,
                status: RoundStatus::Active,
                created_at: Utc::now(),
                settled_at: None,
                settlement: None,
            };
            let balance = next.balance;
            let played = PlayResult {
                round_id: round.id.clone(),
                nonce,
                bet,
                outcome: round.outcome.clone(),
                plan: round.plan.clone(),
                balance,
            };

            let swapped = self
                .store
                .compare_and_swap(record.version, next, Some(RoundWrite::Insert(round)))
                .await
                .map_err(internal)?;
            if swapped {
                info!(
                    token = %token,
                    round_id = %played.round_id,
                    nonce,
                    bet,
                    payout = played.outcome.payout,
                    tier = %played.outcome.tier(),
                    "round played"
                );
                return Ok(played);
            }
            debug!(token = %token, attempt, "play lost a version race, retrying");
        }

        error!(token = %token, "play exhausted compare-and-swap attempts");
        Err(GameError::Internal)
    }

    /// Credit the round's payout and complete it; only the first call succeeds
    pub async fn end_round(&self, token: &str, round_id: &str) -> Result<RoundSettlement, GameError> {
        self.load_active(token).await?;
        self.settle(token, round_id, SettlementKind::Player, Utc::now()).await
    }

    /// Settle what is left, retire the session and reveal its seeds
    pub async fn end_session(&self, token: &str) -> Result<SessionReveal, GameError> {
        let mut auto_settled = Vec::new();

        for attempt in 0..self.max_attempts() {
            let record = self.load_active(token).await?;
            let open = self.store.active_rounds_for_session(token).await.map_err(internal)?;

            if !open.is_empty() {
                for round in &open {
                    match self.settle(token, &round.id, SettlementKind::Auto, Utc::now()).await {
                        Ok(settlement) => auto_settled.push(settlement),
                        Err(GameError::RoundCompleted) => {}
                        Err(e) => return Err(e),
                    }
                }
                continue;
            }

            let mut next = record.clone();
            next.lifecycle = SessionLifecycle::Ended;
            let swapped = self
                .store
                .compare_and_swap(record.version, next, None)
                .await
                .map_err(internal)?;
            if swapped {
                let seeds = record.chain.seeds();
                info!(
                    token = %token,
                    final_nonce = record.chain.nonce(),
                    auto_settled = auto_settled.len(),
                    "session ended, server seed revealed"
                );
                return Ok(SessionReveal {
                    token: record.token.clone(),
                    server_seed: seeds.reveal_server_seed().to_string(),
                    server_seed_hash: seeds.server_seed_hash(),
                    client_seed: seeds.client_seed().to_string(),
                    final_nonce: record.chain.nonce(),
                    balance: record.balance,
                    rounds_played: record.rounds_played,
                    auto_settled,
                });
            }
            debug!(token = %token, attempt, "end_session lost a version race, retrying");
        }

        error!(token = %token, "end_session exhausted compare-and-swap attempts");
        Err(GameError::Internal)
    }

    pub async fn session_info(&self, token: &str) -> Result<SessionInfo, GameError> {
        let record = self.load_active(token).await?;
        Ok(SessionInfo {
            token: record.token.clone(),
            balance: record.balance,
            nonce: record.chain.nonce(),
            rounds_played: record.rounds_played,
            lifecycle: record.lifecycle,
            client_seed: record.chain.seeds().client_seed().to_string(),
            server_seed_hash: record.server_seed_hash(),
            created_at: record.created_at,
        })
    }

    /// A round owned by `token`
    pub async fn round(&self, token: &str, round_id: &str) -> Result<Round, GameError> {
        self.load_active(token).await?;
        self.owned_round(token, round_id).await
    }

    /// Auto-settle active rounds created more than the configured TTL before `now`
    pub async fn settle_stale_rounds(&self, token: &str, now: DateTime<Utc>) -> Result<Vec<RoundSettlement>, GameError> {
        self.load_active(token).await?;
        let stale = self.stale_rounds(token, now).await?;
        self.auto_settle(token, &stale, now).await
    }

    async fn stale_rounds(&self, token: &str, now: DateTime<Utc>) -> Result<Vec<Round>, GameError> {
        let ttl = Duration::seconds(self.config.session.round_ttl_secs.min(MAX_ROUND_TTL_SECS) as i64);
        let open = self.store.active_rounds_for_session(token).await.map_err(internal)?;
        Ok(open
            .into_iter()
            .filter(|round| {
                round
                    .created_at
                    .checked_add_signed(ttl)
                    .map(|deadline| deadline <= now)
                    .unwrap_or(false)
            })
            .collect())
    }

    async fn auto_settle(&self, token: &str, rounds: &[Round], now: DateTime<Utc>) -> Result<Vec<RoundSettlement>, GameError> {
        let mut settled = Vec::new();
        for round in rounds {
            match self.settle(token, &round.id, SettlementKind::Auto, now).await {
                Ok(settlement) => {
                    warn!(token = %token, round_id = %round.id, "stale round auto-settled");
                    settled.push(settlement);
                }
                Err(GameError::RoundCompleted) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(settled)
    }

    fn validate_bet(&self, bet: u64) -> Result<(), GameError> {
        let betting = &self.config.betting;
        if bet < betting.min_bet || bet > betting.max_bet {
            return Err(GameError::InvalidBet(format!(
                "bet must be between {} and {}",
                betting.min_bet, betting.max_bet
            )));
        }
        if bet % betting.bet_step != 0 {
            return Err(GameError::InvalidBet(format!("bet must be a multiple of {}", betting.bet_step)));
        }
        Ok(())
    }

    async fn settle(
        &self,
        token: &str,
        round_id: &str,
        kind: SettlementKind,
        at: DateTime<Utc>,
    ) -> Result<RoundSettlement, GameError> {
        for attempt in 0..self.max_attempts() {
            let record = self.load_active(token).await?;
            let round = self.owned_round(token, round_id).await?;
            if !round.is_active() {
                return Err(GameError::RoundCompleted);
            }

            let payout = round.outcome.payout;
            let mut next = record.clone();
            next.balance = record.balance.checked_add(payout).ok_or_else(|| {
                error!(token = %token, round_id = %round_id, "balance overflow on settlement");
                GameError::Internal
            })?;
            let balance = next.balance;

            let write = RoundWrite::Complete {
                round_id: round.id.clone(),
                kind,
                at,
            };
            let swapped = self
                .store
                .compare_and_swap(record.version, next, Some(write))
                .await
                .map_err(internal)?;
            if swapped {
                info!(token = %token, round_id = %round_id, payout, balance, kind = ?kind, "round settled");
                return Ok(RoundSettlement {
                    round_id: round.id,
                    payout,
                    balance,
                    status: RoundStatus::Completed,
                    kind,
                });
            }
            debug!(token = %token, round_id = %round_id, attempt, "settlement lost a race, re-reading");
        }

        error!(token = %token, round_id = %round_id, "settlement exhausted compare-and-swap attempts");
        Err(GameError::Internal)
    }

    async fn load_active(&self, token: &str) -> Result<SessionRecord, GameError> {
        match self.store.get(token).await.map_err(internal)? {
            None => Err(GameError::InvalidSession),
            Some(record) if !record.is_active() => Err(GameError::SessionExpired),
            Some(record) => Ok(record),
        }
    }

    async fn owned_round(&self, token: &str, round_id: &str) -> Result<Round, GameError> {
        let round = self
            .store
            .get_round(round_id)
            .await
            .map_err(internal)?
            .ok_or(GameError::RoundNotFound)?;
        if round.session_token != token {
            return Err(GameError::SessionMismatch);
        }
        Ok(round)
    }

    fn max_attempts(&self) -> u32 {
        self.config.session.max_cas_attempts.max(1)
    }
}

fn internal(err: FreefallError) -> GameError {
    error!(error = %err, "session store failure");
    GameError::Internal
}
