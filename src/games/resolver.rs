//! Outcome resolution
//!
//! Maps a committed base value onto the layered [`Resolution`]: the primary
//! multiplier from the base value itself, then collectible counts and the
//! bonus layer from independent sub-draws of the same base value.

use crate::config::{GameConfig, WeightedEntry};
use crate::games::seed_chain::{draw, SubDraws};
use crate::games::types::{CollectibleHit, ModifierLayer, Resolution};
use crate::games::weighted::WeightedTable;

/// Count table for one collectible kind
#[derive(Clone, Debug, PartialEq)]
pub struct CollectibleTable {
    pub kind: String,
    pub value_multiplier: f64,
    /// Weighted over counts `0..=max_per_round`
    pub counts: WeightedTable,
}

impl CollectibleTable {
    /// Binomial count distribution of `max_per_round` independent spawns
    pub fn binomial(kind: &str, value_multiplier: f64, spawn_probability: f64, max_per_round: u32) -> Self {
        let n = max_per_round as i32;
        let entries = (0..=n)
            .map(|k| {
                let weight = binomial_coefficient(n, k)
                    * spawn_probability.powi(k)
                    * (1.0 - spawn_probability).powi(n - k);
                WeightedEntry::new(k as f64, weight)
            })
            .collect();

        Self {
            kind: kind.to_string(),
            value_multiplier,
            counts: WeightedTable::new(entries),
        }
    }

    /// Expected contribution to the multiplier
    pub fn expected_value(&self) -> f64 {
        self.counts.expected_value() * self.value_multiplier
    }
}

fn binomial_coefficient(n: i32, k: i32) -> f64 {
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

/// Resolves base values into layered outcomes. Never samples randomness itself.
#[derive(Clone, Debug)]
pub struct OutcomeResolver {
    primary: WeightedTable,
    bonus_trigger_probability: f64,
    bonus: WeightedTable,
    collectibles: Vec<CollectibleTable>,
}

impl OutcomeResolver {
    pub fn new(config: &GameConfig) -> Self {
        let collectibles = config
            .collectibles
            .iter()
            .map(|c| CollectibleTable::binomial(&c.kind, c.value_multiplier, c.spawn_probability, c.max_per_round))
            .collect();

        Self {
            primary: WeightedTable::new(config.primary.entries.clone()),
            bonus_trigger_probability: config.bonus.trigger_probability,
            bonus: WeightedTable::new(config.bonus.multipliers.clone()),
            collectibles,
        }
    }

    pub fn primary_table(&self) -> &WeightedTable {
        &self.primary
    }

    pub fn bonus_table(&self) -> &WeightedTable {
        &self.bonus
    }

    pub fn bonus_trigger_probability(&self) -> f64 {
        self.bonus_trigger_probability
    }

    pub fn collectible_tables(&self) -> &[CollectibleTable] {
        &self.collectibles
    }

    /// Resolve every layer for `base`
    pub fn resolve(&self, base: f64) -> Resolution {
        let primary_multiplier = self.primary.select(base);
        if primary_multiplier <= 0.0 {
            return Resolution::Loss;
        }

        let draws = SubDraws::new(base);
        let modifiers = self.resolve_modifiers(&draws);

        if draws.draw(draw::BONUS_TRIGGER) < self.bonus_trigger_probability {
            let bonus_multiplier = self.bonus.select(draws.draw(draw::BONUS_MULTIPLIER));
            Resolution::BonusWin {
                primary_multiplier,
                modifiers,
                bonus_multiplier,
            }
        } else {
            Resolution::Win {
                primary_multiplier,
                modifiers,
            }
        }
    }

    fn resolve_modifiers(&self, draws: &SubDraws) -> ModifierLayer {
        let mut hits = Vec::new();
        for (i, table) in self.collectibles.iter().enumerate() {
            let count = table.counts.select(draws.draw(draw::COLLECTIBLE_COUNT_BASE + i as u64)) as usize;
            hits.extend(std::iter::repeat_with(|| CollectibleHit {
                kind: table.kind.clone(),
                value_multiplier: table.value_multiplier,
            }).take(count));
        }
        ModifierLayer { hits }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::ConfigBuilder;
    use crate::games::types::OutcomeTier;

    fn resolver() -> OutcomeResolver {
        OutcomeResolver::new(&GameConfig::default())
    }

    #[test]
    fn test_low_base_value_is_a_loss() {
        let resolution = resolver().resolve(0.10);
        assert_eq!(resolution, Resolution::Loss);
        assert_eq!(resolution.primary_multiplier(), 0.0);
    }

    #[test]
    fn test_mid_base_value_is_a_small_win() {
        let resolution = resolver().resolve(0.50);
        let primary = resolution.primary_multiplier();
        assert!(primary > 0.5 && primary < 2.0);
        assert_ne!(resolution.tier(), OutcomeTier::Loss);
    }

    #[test]
    fn test_high_base_value_hits_top_tiers() {
        assert!(resolver().resolve(0.995).primary_multiplier() >= 8.0);
    }

    #[test]
    fn test_resolution_is_pure() {
        let resolver = resolver();
        for i in 0..500 {
            let base = i as f64 / 500.0;
            assert_eq!(resolver.resolve(base), resolver.resolve(base));
        }
    }

    #[test]
    fn test_bonus_always_triggers_at_probability_one() {
        let config = ConfigBuilder::new().bonus_trigger_probability(1.0).build();
        let resolver = OutcomeResolver::new(&config);
        let resolution = resolver.resolve(0.8);
        assert!(resolution.bonus_triggered());
        assert!(resolution.bonus_multiplier() >= 1.5);
    }

    #[test]
    fn test_bonus_never_triggers_at_probability_zero() {
        let config = ConfigBuilder::new().bonus_trigger_probability(0.0).build();
        let resolver = OutcomeResolver::new(&config);
        for i in 46..100 {
            assert!(!resolver.resolve(i as f64 / 100.0).bonus_triggered());
        }
    }

    #[test]
    fn test_binomial_count_table() {
        let table = CollectibleTable::binomial("coin_small", 0.02, 0.10, 3);
        let probabilities = table.counts.probabilities();
        assert_eq!(probabilities.len(), 4);
        assert!((probabilities[0] - 0.729).abs() < 1e-12);
        assert!((probabilities[3] - 0.001).abs() < 1e-12);
        assert!((table.counts.expected_value() - 0.3).abs() < 1e-12);
        assert!((table.expected_value() - 0.006).abs() < 1e-12);
    }

    #[test]
    fn test_modifier_counts_respect_maximums() {
        let config = GameConfig::default();
        let max_total: u32 = config.collectibles.iter().map(|c| c.max_per_round).sum();
        let resolver = OutcomeResolver::new(&config);
        for i in 0..2_000 {
            let base = 0.46 + 0.54 * (i as f64 / 2_000.0);
            assert!(resolver.resolve(base).modifier_count() <= max_total);
        }
    }
}
