//! Records shared between the session manager and its store
//!
//! The store persists these as opaque values; only the manager interprets
//! balances and lifecycle.

use crate::games::seed_chain::SeedChain;
use crate::games::types::{Round, RoundId, SessionToken, SettlementKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session lifecycle; `Ended` is terminal
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionLifecycle {
    Active,
    Ended,
}

/// Versioned session state as held by a [`SessionStore`](super::traits::SessionStore)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    pub token: SessionToken,
    /// Micro-units
    pub balance: u64,
    pub chain: SeedChain,
    pub lifecycle: SessionLifecycle,
    pub rounds_played: u64,
    pub created_at: DateTime<Utc>,
    /// Bumped by the store on every successful swap
    pub version: u64,
}

impl SessionRecord {
    pub fn new(token: SessionToken, balance: u64, chain: SeedChain) -> Self {
        Self {
            token,
            balance,
            chain,
            lifecycle: SessionLifecycle::Active,
            rounds_played: 0,
            created_at: Utc::now(),
            version: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == SessionLifecycle::Active
    }

    /// Public commitment to the server seed
    pub fn server_seed_hash(&self) -> String {
        self.chain.seeds().server_seed_hash()
    }
}

/// Round mutation applied atomically with a session swap
#[derive(Clone, Debug, PartialEq)]
pub enum RoundWrite {
    /// Store a freshly played round
    Insert(Round),
    /// Transition an active round to completed; fails the swap if it is not active
    Complete {
        round_id: RoundId,
        kind: SettlementKind,
        at: DateTime<Utc>,
    },
}
