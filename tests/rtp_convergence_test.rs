//! Long-run return-to-player checks against the analytic expectation

use freefall::games::seed_chain::SeedPair;
use freefall::games::simulation::{self, distribution_report, payout_limits, simulate};
use freefall::GameConfig;

fn seeds() -> SeedPair {
    SeedPair::new("3a".repeat(32), "0123456789abcdef".to_string()).unwrap()
}

#[test]
fn test_theoretical_rtp_of_default_tables() {
    let config = GameConfig::default();

    assert!((simulation::primary_rtp(&config) - 0.94825).abs() < 1e-9);

    let theoretical = simulation::theoretical_rtp(&config);
    println!("📐 theoretical RTP {:.6}", theoretical);
    assert!((theoretical - 0.9707).abs() < 0.001);
    assert!(simulation::is_compliant(theoretical, config.rtp.target, config.rtp.tolerance));
}

#[test]
fn test_simulated_rtp_converges() {
    let config = GameConfig::default();
    let report = simulate(&config, 500_000, config.betting.default_bet, &seeds());
    let theoretical = simulation::theoretical_rtp(&config);

    println!(
        "📊 {} rounds: actual {:.4}, theoretical {:.4}, hit rate {:.4}",
        report.rounds, report.actual_rtp, theoretical, report.hit_rate
    );

    assert_eq!(report.total_wagered, 500_000u128 * config.betting.default_bet as u128);
    assert!((report.actual_rtp - theoretical).abs() < 0.02);
    assert!((report.hit_rate - 0.55).abs() < 0.01);
    assert_eq!(report.min_multiplier, 0.0);
    assert!(report.max_multiplier <= config.payout.wincap);
}

#[test]
fn test_tier_frequencies_match_weights() {
    let config = GameConfig::default();
    let report = simulate(&config, 200_000, config.betting.default_bet, &seeds());
    let tiers = distribution_report(&config, &report);

    assert_eq!(tiers.len(), config.primary.entries.len());
    for tier in &tiers {
        assert!(
            tier.deviation() < 0.005,
            "tier {}x expected {} observed {}",
            tier.multiplier,
            tier.expected,
            tier.observed
        );
    }

    let bonus_rate = report.bonus_hits as f64 / report.rounds as f64;
    // Bonus only draws on wins: 0.55 * 0.01
    assert!((bonus_rate - 0.0055).abs() < 0.002);
}

#[test]
fn test_payout_never_exceeds_cap() {
    let config = GameConfig::default();
    let limits = payout_limits(&config, 50_000, &seeds());
    assert!(limits.passed());
    assert_eq!(limits.samples, 150_000);
    assert!(limits.max_payout_ratio <= config.payout.wincap);
}

#[test]
fn test_low_cap_is_enforced() {
    let mut config = GameConfig::default();
    config.payout.wincap = 5.0;

    let limits = payout_limits(&config, 20_000, &seeds());
    assert!(limits.passed());
    assert!(limits.max_payout_ratio <= 5.0 + 1e-9);

    let report = simulate(&config, 20_000, config.betting.default_bet, &seeds());
    assert!(report.capped_rounds > 0);
    assert!(report.max_multiplier <= 5.0);
}
