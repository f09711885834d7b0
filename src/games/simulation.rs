//! Math validation
//!
//! Exact expected return of the configured tables, deterministic simulation
//! over a fixed seed pair, tier distribution checks and payout-cap sampling.
//! Used by the `freefall-math` binary, the `/api/rtp` endpoint and the test
//! suite.

use crate::config::GameConfig;
use crate::games::processor::GameEngine;
use crate::games::resolver::OutcomeResolver;
use crate::games::seed_chain::SeedPair;
use crate::games::weighted::WeightedTable;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Upper bounds of the multiplier histogram buckets; the last bucket is open
const BUCKET_BOUNDS: [(f64, &str); 7] = [
    (0.0, "0x"),
    (1.0, "0-1x"),
    (2.0, "1-2x"),
    (5.0, "2-5x"),
    (10.0, "5-10x"),
    (50.0, "10-50x"),
    (f64::INFINITY, "50x+"),
];

/// Expected primary multiplier alone
pub fn primary_rtp(config: &GameConfig) -> f64 {
    WeightedTable::new(config.primary.entries.clone()).expected_value()
}

/// Expected final multiplier with every layer composed, ignoring the wincap.
///
/// Layers only apply to wins, and the modifier and bonus sub-draws are
/// independent of the primary tier, so
/// `E = Σ_{v>0} p(v) * (v + E[mod]) * ((1 - t) + t * E[bonus])`.
pub fn theoretical_rtp(config: &GameConfig) -> f64 {
    let resolver = OutcomeResolver::new(config);
    let primary = resolver.primary_table();

    let modifier_ev: f64 = resolver
        .collectible_tables()
        .iter()
        .map(|t| t.expected_value())
        .sum();
    let trigger = resolver.bonus_trigger_probability();
    let bonus_factor = (1.0 - trigger) + trigger * resolver.bonus_table().expected_value();

    let winning: f64 = primary
        .entries()
        .iter()
        .zip(primary.probabilities())
        .filter(|(entry, _)| entry.value > 0.0)
        .map(|(entry, p)| p * (entry.value + modifier_ev))
        .sum();

    winning * bonus_factor
}

/// Whether `actual` lies within `tolerance` of `target`
pub fn is_compliant(actual: f64, target: f64, tolerance: f64) -> bool {
    (actual - target).abs() <= tolerance
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MultiplierBucket {
    pub label: String,
    pub count: u64,
}

/// Aggregates of one deterministic simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub rounds: u64,
    pub bet: u64,
    pub total_wagered: u128,
    pub total_returned: u128,
    pub actual_rtp: f64,
    pub hit_rate: f64,
    pub min_multiplier: f64,
    pub max_multiplier: f64,
    pub average_multiplier: f64,
    pub bonus_hits: u64,
    pub capped_rounds: u64,
    /// Hits per primary table entry, in table order
    pub tier_counts: Vec<u64>,
    pub distribution: Vec<MultiplierBucket>,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Play `rounds` rounds of `bet` over consecutive nonces of `seeds`
pub fn simulate(config: &GameConfig, rounds: u64, bet: u64, seeds: &SeedPair) -> SimulationReport {
    let start = Instant::now();
    let engine = GameEngine::new(config);
    let primary = engine.resolver().primary_table();
    let wincap = engine.payout().wincap();

    let mut total_returned: u128 = 0;
    let mut wins = 0u64;
    let mut bonus_hits = 0u64;
    let mut capped_rounds = 0u64;
    let mut multiplier_sum = 0.0;
    let mut min_multiplier = f64::INFINITY;
    let mut max_multiplier: f64 = 0.0;
    let mut tier_counts = vec![0u64; primary.entries().len()];
    let mut buckets = vec![0u64; BUCKET_BOUNDS.len()];

    for nonce in 0..rounds {
        let base = seeds.derive_base(nonce);
        let outcome = engine.outcome(base, bet);

        if let Some(count) = tier_counts.get_mut(primary.select_index(base)) {
            *count += 1;
        }
        total_returned += outcome.payout as u128;
        if !outcome.is_loss {
            wins += 1;
        }
        if outcome.bonus_triggered() {
            bonus_hits += 1;
        }
        if outcome.final_multiplier >= wincap {
            capped_rounds += 1;
        }

        let m = outcome.final_multiplier;
        multiplier_sum += m;
        min_multiplier = min_multiplier.min(m);
        max_multiplier = max_multiplier.max(m);

        let bucket = BUCKET_BOUNDS
            .iter()
            .position(|(upper, _)| if *upper == 0.0 { m <= 0.0 } else { m < *upper })
            .unwrap_or(BUCKET_BOUNDS.len() - 1);
        buckets[bucket] += 1;
    }

    let total_wagered = rounds as u128 * bet as u128;
    let rate = |n: u64| if rounds > 0 { n as f64 / rounds as f64 } else { 0.0 };

    SimulationReport {
        rounds,
        bet,
        total_wagered,
        total_returned,
        actual_rtp: if total_wagered > 0 { total_returned as f64 / total_wagered as f64 } else { 0.0 },
        hit_rate: rate(wins),
        min_multiplier: if rounds > 0 { min_multiplier } else { 0.0 },
        max_multiplier,
        average_multiplier: if rounds > 0 { multiplier_sum / rounds as f64 } else { 0.0 },
        bonus_hits,
        capped_rounds,
        tier_counts,
        distribution: BUCKET_BOUNDS
            .iter()
            .zip(buckets)
            .map(|((_, label), count)| MultiplierBucket { label: label.to_string(), count })
            .collect(),
        elapsed: start.elapsed(),
    }
}

/// Observed against expected frequency for one primary tier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierFrequency {
    pub multiplier: f64,
    pub expected: f64,
    pub observed: f64,
}

impl TierFrequency {
    pub fn deviation(&self) -> f64 {
        (self.observed - self.expected).abs()
    }
}

pub fn distribution_report(config: &GameConfig, report: &SimulationReport) -> Vec<TierFrequency> {
    let table = WeightedTable::new(config.primary.entries.clone());
    let rounds = report.rounds.max(1) as f64;
    table
        .entries()
        .iter()
        .zip(table.probabilities())
        .zip(report.tier_counts.iter().copied().chain(std::iter::repeat(0)))
        .map(|((entry, expected), count)| TierFrequency {
            multiplier: entry.value,
            expected,
            observed: count as f64 / rounds,
        })
        .collect()
}

/// Result of sampling payouts against the cap
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayoutLimitReport {
    pub samples: u64,
    pub violations: u64,
    pub max_payout_ratio: f64,
    pub wincap: f64,
}

impl PayoutLimitReport {
    pub fn passed(&self) -> bool {
        self.violations == 0
    }
}

/// Check `payout <= bet * wincap` for every configured bet step across `draws` base values
pub fn payout_limits(config: &GameConfig, draws: u64, seeds: &SeedPair) -> PayoutLimitReport {
    let engine = GameEngine::new(config);
    let betting = &config.betting;
    let bets = [betting.min_bet, betting.default_bet, betting.max_bet];

    let mut samples = 0;
    let mut violations = 0;
    let mut max_payout_ratio: f64 = 0.0;

    for nonce in 0..draws {
        let base = seeds.derive_base(nonce);
        for &bet in &bets {
            let outcome = engine.outcome(base, bet);
            samples += 1;
            if outcome.payout as f64 > bet as f64 * config.payout.wincap {
                violations += 1;
            }
            max_payout_ratio = max_payout_ratio.max(outcome.payout as f64 / bet as f64);
        }
    }

    PayoutLimitReport {
        samples,
        violations,
        max_payout_ratio,
        wincap: config.payout.wincap,
    }
}

/// Primary outcome table as `multiplier,weight,probability` rows
pub fn outcome_table_csv(config: &GameConfig) -> String {
    let table = WeightedTable::new(config.primary.entries.clone());
    let mut csv = String::from("multiplier,weight,probability\n");
    for (entry, p) in table.entries().iter().zip(table.probabilities()) {
        csv.push_str(&format!("{},{},{:.8}\n", entry.value, entry.weight, p));
    }
    csv
}

/// Plain-text report rendering
pub struct SimulationReporter;

impl SimulationReporter {
    pub fn generate_report(config: &GameConfig, report: &SimulationReport) -> String {
        let theoretical = theoretical_rtp(config);
        let compliant = is_compliant(report.actual_rtp, config.rtp.target, config.rtp.tolerance);

        let mut out = String::new();
        out.push_str("🎯 Freefall Math Validation\n");
        out.push_str(&format!("{}\n", "=".repeat(50)));
        out.push_str(&format!("⏱️  Execution Time: {:?}\n", report.elapsed));
        out.push_str(&format!("🎮 Rounds: {} at bet {}\n", report.rounds, report.bet));
        out.push_str(&format!("📐 Primary RTP: {:.4}%\n", primary_rtp(config) * 100.0));
        out.push_str(&format!("📐 Theoretical RTP: {:.4}%\n", theoretical * 100.0));
        out.push_str(&format!("📊 Actual RTP: {:.4}%\n", report.actual_rtp * 100.0));
        out.push_str(&format!(
            "{} Target {:.2}% ± {:.2}%\n",
            if compliant { "✅" } else { "❌" },
            config.rtp.target * 100.0,
            config.rtp.tolerance * 100.0
        ));
        out.push_str(&format!("🏆 Hit Rate: {:.2}%\n", report.hit_rate * 100.0));
        out.push_str(&format!(
            "📈 Multiplier min {:.2}x / avg {:.4}x / max {:.2}x\n",
            report.min_multiplier, report.average_multiplier, report.max_multiplier
        ));
        out.push_str(&format!("🎁 Bonus hits: {}, capped rounds: {}\n", report.bonus_hits, report.capped_rounds));

        out.push_str("\nDistribution:\n");
        for bucket in &report.distribution {
            let share = bucket.count as f64 / report.rounds.max(1) as f64 * 100.0;
            out.push_str(&format!("   {:>7}  {:>9}  {:6.2}%\n", bucket.label, bucket.count, share));
        }

        out.push_str("\nPrimary tiers (expected / observed):\n");
        for tier in distribution_report(config, report) {
            out.push_str(&format!(
                "   {:>7.2}x  {:8.5}%  {:8.5}%\n",
                tier.multiplier,
                tier.expected * 100.0,
                tier.observed * 100.0
            ));
        }
        out
    }
}
