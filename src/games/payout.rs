//! Payout composition
//!
//! Layers combine as `(bet * primary + bet * Σ modifiers) * bonus`, capped at
//! `bet * wincap`. Multipliers are floating point; the payout is truncated to
//! whole micro-units exactly once at the end.

use crate::config::PayoutConfig;
use crate::games::types::{Outcome, Resolution};

#[derive(Clone, Debug)]
pub struct PayoutEngine {
    wincap: f64,
}

impl PayoutEngine {
    pub fn new(config: &PayoutConfig) -> Self {
        Self { wincap: config.wincap }
    }

    pub fn wincap(&self) -> f64 {
        self.wincap
    }

    /// Combined multiplier before any bet is applied, capped at wincap
    pub fn final_multiplier(&self, resolution: &Resolution) -> f64 {
        let raw = (resolution.primary_multiplier() + resolution.modifier_value()) * resolution.bonus_multiplier();
        raw.min(self.wincap)
    }

    /// Payout in micro-units for `bet` micro-units
    pub fn settle(&self, bet: u64, resolution: &Resolution) -> u64 {
        if matches!(resolution, Resolution::Loss) {
            return 0;
        }
        let stake = bet as f64;
        let mut payout = stake * resolution.primary_multiplier();
        payout += stake * resolution.modifier_value();
        payout *= resolution.bonus_multiplier();

        let cap = stake * self.wincap;
        payout.min(cap).floor() as u64
    }

    /// Full immutable outcome for one round
    pub fn compose(&self, bet: u64, resolution: Resolution) -> Outcome {
        let payout = self.settle(bet, &resolution);
        let final_multiplier = self.final_multiplier(&resolution);
        let is_loss = matches!(resolution, Resolution::Loss);
        Outcome {
            resolution,
            final_multiplier,
            payout,
            is_loss,
        }
    }
}
