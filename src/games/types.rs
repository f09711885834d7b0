use crate::games::plan::Plan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque session token handed to the player
pub type SessionToken = String;
/// Round identifier (UUID v4 string)
pub type RoundId = String;

/// One collectible counted by the modifier layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectibleHit {
    pub kind: String,
    pub value_multiplier: f64,
}

/// Collectibles resolved for a winning round
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModifierLayer {
    pub hits: Vec<CollectibleHit>,
}

impl ModifierLayer {
    pub fn count(&self) -> u32 {
        self.hits.len() as u32
    }

    /// Sum of the collected unit values
    pub fn value(&self) -> f64 {
        self.hits.iter().map(|h| h.value_multiplier).sum()
    }
}

/// Economic tier of a round
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeTier {
    Loss,
    Win,
    BonusWin,
}

impl fmt::Display for OutcomeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeTier::Loss => write!(f, "loss"),
            OutcomeTier::Win => write!(f, "win"),
            OutcomeTier::BonusWin => write!(f, "bonus_win"),
        }
    }
}

/// Layers drawn for one base value, tagged by tier.
///
/// A zero primary multiplier ends resolution: no modifier or bonus layer is
/// drawn for a loss.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum Resolution {
    Loss,
    Win {
        primary_multiplier: f64,
        modifiers: ModifierLayer,
    },
    BonusWin {
        primary_multiplier: f64,
        modifiers: ModifierLayer,
        bonus_multiplier: f64,
    },
}

impl Resolution {
    pub fn tier(&self) -> OutcomeTier {
        match self {
            Resolution::Loss => OutcomeTier::Loss,
            Resolution::Win { .. } => OutcomeTier::Win,
            Resolution::BonusWin { .. } => OutcomeTier::BonusWin,
        }
    }

    pub fn primary_multiplier(&self) -> f64 {
        match self {
            Resolution::Loss => 0.0,
            Resolution::Win { primary_multiplier, .. }
            | Resolution::BonusWin { primary_multiplier, .. } => *primary_multiplier,
        }
    }

    pub fn modifiers(&self) -> Option<&ModifierLayer> {
        match self {
            Resolution::Loss => None,
            Resolution::Win { modifiers, .. } | Resolution::BonusWin { modifiers, .. } => Some(modifiers),
        }
    }

    pub fn bonus_triggered(&self) -> bool {
        matches!(self, Resolution::BonusWin { .. })
    }

    /// Bonus factor applied to the payout; `1.0` when not triggered
    pub fn bonus_multiplier(&self) -> f64 {
        match self {
            Resolution::BonusWin { bonus_multiplier, .. } => *bonus_multiplier,
            _ => 1.0,
        }
    }

    pub fn modifier_count(&self) -> u32 {
        self.modifiers().map(ModifierLayer::count).unwrap_or(0)
    }

    pub fn modifier_value(&self) -> f64 {
        self.modifiers().map(ModifierLayer::value).unwrap_or(0.0)
    }
}

/// Settled economics of one round; immutable once produced
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Outcome {
    #[serde(flatten)]
    pub resolution: Resolution,
    pub final_multiplier: f64,
    /// Micro-units
    pub payout: u64,
    pub is_loss: bool,
}

impl Outcome {
    pub fn tier(&self) -> OutcomeTier {
        self.resolution.tier()
    }

    pub fn primary_multiplier(&self) -> f64 {
        self.resolution.primary_multiplier()
    }

    pub fn bonus_triggered(&self) -> bool {
        self.resolution.bonus_triggered()
    }

    pub fn bonus_multiplier(&self) -> f64 {
        self.resolution.bonus_multiplier()
    }

    pub fn modifier_count(&self) -> u32 {
        self.resolution.modifier_count()
    }
}

/// Round lifecycle; `Completed` is terminal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    Active,
    Completed,
}

/// Who closed a round
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SettlementKind {
    /// The player ended the round
    Player,
    /// Settled by session end or the stale-round sweep
    Auto,
}

/// One play of the game, retained for audit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Round {
    pub id: RoundId,
    pub session_token: SessionToken,
    pub nonce: u64,
    pub base_value: f64,
    pub bet: u64,
    pub outcome: Outcome,
    pub plan: Plan,
    pub status: RoundStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement: Option<SettlementKind>,
}

impl Round {
    pub fn is_active(&self) -> bool {
        self.status == RoundStatus::Active
    }

    /// Closed copy of this round
    pub fn completed(&self, kind: SettlementKind, at: DateTime<Utc>) -> Self {
        Self {
            status: RoundStatus::Completed,
            settled_at: Some(at),
            settlement: Some(kind),
            ..self.clone()
        }
    }
}
