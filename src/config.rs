//! Game configuration with reference defaults
//!
//! Weighted tables, bet limits and plan geometry are versioned data consumed
//! by the resolver and plan generators. Loading, environment overrides and
//! validation live in [`crate::common::config`].

use serde::{Deserialize, Serialize};

/// Micro-units per display currency unit
pub const MICROS_PER_UNIT: u64 = 1_000_000;

/// Complete game configuration; missing sections fall back to defaults
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub betting: BettingConfig,
    pub payout: PayoutConfig,
    pub primary: PrimaryTableConfig,
    pub bonus: BonusConfig,
    pub collectibles: Vec<CollectibleConfig>,
    pub obstacles: Vec<ObstacleConfig>,
    pub geometry: GeometryConfig,
    pub plan: PlanConfig,
    pub session: SessionConfig,
    pub rtp: RtpConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            betting: BettingConfig::default(),
            payout: PayoutConfig::default(),
            primary: PrimaryTableConfig::default(),
            bonus: BonusConfig::default(),
            collectibles: default_collectibles(),
            obstacles: default_obstacles(),
            geometry: GeometryConfig::default(),
            plan: PlanConfig::default(),
            session: SessionConfig::default(),
            rtp: RtpConfig::default(),
        }
    }
}

/// One `(value, weight)` row of a weighted cumulative table
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct WeightedEntry {
    pub value: f64,
    pub weight: f64,
}

impl WeightedEntry {
    pub const fn new(value: f64, weight: f64) -> Self {
        Self { value, weight }
    }
}

/// Bet limits in micro-units
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BettingConfig {
    pub min_bet: u64,
    pub max_bet: u64,
    pub bet_step: u64,
    pub default_bet: u64,
}

impl Default for BettingConfig {
    fn default() -> Self {
        Self {
            min_bet: 100_000,        // 0.10
            max_bet: 100_000_000,    // 100.00
            bet_step: 10_000,        // 0.01
            default_bet: 1_000_000,  // 1.00
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PayoutConfig {
    /// Maximum payout as a multiple of the bet
    pub wincap: f64,
}

impl Default for PayoutConfig {
    fn default() -> Self {
        Self { wincap: 10_000.0 }
    }
}

/// Primary multiplier table, listed from lowest to highest tier
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PrimaryTableConfig {
    pub entries: Vec<WeightedEntry>,
}

impl Default for PrimaryTableConfig {
    fn default() -> Self {
        Self {
            entries: vec![
                WeightedEntry::new(0.0, 45.0),
                WeightedEntry::new(0.8, 22.0),
                WeightedEntry::new(1.3, 16.0),
                WeightedEntry::new(2.0, 10.0),
                WeightedEntry::new(3.0, 4.0),
                WeightedEntry::new(5.0, 1.8),
                WeightedEntry::new(8.0, 0.8),
                WeightedEntry::new(15.0, 0.3),
                WeightedEntry::new(30.0, 0.08),
                WeightedEntry::new(75.0, 0.015),
                WeightedEntry::new(200.0, 0.005),
            ],
        }
    }
}

/// Secondary bonus layer, gated by a Bernoulli trigger
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BonusConfig {
    pub trigger_probability: f64,
    /// Presentation hint for how long the bonus sequence plays
    pub duration_ms: u64,
    pub multipliers: Vec<WeightedEntry>,
}

impl Default for BonusConfig {
    fn default() -> Self {
        Self {
            trigger_probability: 0.01,
            duration_ms: 3_000,
            multipliers: vec![
                WeightedEntry::new(1.5, 40.0),
                WeightedEntry::new(2.0, 30.0),
                WeightedEntry::new(3.0, 15.0),
                WeightedEntry::new(5.0, 10.0),
                WeightedEntry::new(7.0, 4.0),
                WeightedEntry::new(10.0, 1.0),
            ],
        }
    }
}

/// A collectible kind contributing to the modifier layer
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CollectibleConfig {
    pub kind: String,
    /// Added to the multiplier per collected instance
    pub value_multiplier: f64,
    pub spawn_probability: f64,
    pub max_per_round: u32,
}

impl CollectibleConfig {
    fn new(kind: &str, value_multiplier: f64, spawn_probability: f64, max_per_round: u32) -> Self {
        Self {
            kind: kind.to_string(),
            value_multiplier,
            spawn_probability,
            max_per_round,
        }
    }
}

pub fn default_collectibles() -> Vec<CollectibleConfig> {
    vec![
        CollectibleConfig::new("coin_small", 0.02, 0.10, 3),
        CollectibleConfig::new("coin_medium", 0.05, 0.05, 2),
        CollectibleConfig::new("coin_large", 0.10, 0.02, 1),
        CollectibleConfig::new("power_up", 0.25, 0.005, 1),
    ]
}

/// Obstacle kinds used for row placement; purely presentational
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ObstacleConfig {
    pub kind: String,
    /// Relative weight when choosing a row's obstacle kind
    pub spawn_probability: f64,
    pub effect_duration_ms: u64,
    pub effect: String,
}

impl ObstacleConfig {
    fn new(kind: &str, spawn_probability: f64, effect_duration_ms: u64, effect: &str) -> Self {
        Self {
            kind: kind.to_string(),
            spawn_probability,
            effect_duration_ms,
            effect: effect.to_string(),
        }
    }
}

pub fn default_obstacles() -> Vec<ObstacleConfig> {
    vec![
        ObstacleConfig::new("cloud", 0.20, 500, "stun"),
        ObstacleConfig::new("bird", 0.15, 300, "bounce"),
        ObstacleConfig::new("wind", 0.10, 0, "drift"),
    ]
}

/// One rectangle of a closure template.
///
/// `x0`/`x1` are fractions of the corridor width (values outside `0..=1`
/// overhang into the walls); `dy0`/`dy1` are world units below terminal depth.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClosurePiece {
    pub x0: f64,
    pub x1: f64,
    pub dy0: f64,
    pub dy1: f64,
}

impl ClosurePiece {
    pub const fn new(x0: f64, x1: f64, dy0: f64, dy1: f64) -> Self {
        Self { x0, x1, dy0, dy1 }
    }
}

/// Named structure that blocks the corridor at terminal depth
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClosureTemplate {
    pub name: String,
    pub pieces: Vec<ClosurePiece>,
}

pub fn default_closure_templates() -> Vec<ClosureTemplate> {
    vec![
        ClosureTemplate {
            name: "slab".to_string(),
            pieces: vec![ClosurePiece::new(-0.1, 1.1, 0.0, 160.0)],
        },
        ClosureTemplate {
            name: "funnel".to_string(),
            pieces: vec![
                ClosurePiece::new(-0.1, 0.55, 0.0, 120.0),
                ClosurePiece::new(0.45, 1.1, 0.0, 120.0),
                ClosurePiece::new(0.3, 0.7, 120.0, 300.0),
            ],
        },
        ClosureTemplate {
            name: "pillars".to_string(),
            pieces: vec![
                ClosurePiece::new(-0.1, 1.1, 0.0, 80.0),
                ClosurePiece::new(0.0, 0.15, 80.0, 400.0),
                ClosurePiece::new(0.425, 0.575, 80.0, 400.0),
                ClosurePiece::new(0.85, 1.0, 80.0, 400.0),
            ],
        },
        ClosureTemplate {
            name: "steps".to_string(),
            pieces: vec![
                ClosurePiece::new(-0.1, 0.4, 0.0, 200.0),
                ClosurePiece::new(0.35, 0.75, 0.0, 140.0),
                ClosurePiece::new(0.7, 1.1, 0.0, 260.0),
            ],
        },
    ]
}

/// World and corridor geometry for the geometric plan.
///
/// The traversal axis is `y`, growing downward from the entry.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GeometryConfig {
    pub world_width: f64,
    pub world_height: f64,
    pub ground_y: f64,
    pub corridor_center_x: f64,
    pub corridor_width: f64,
    pub wall_thickness: f64,
    pub wall_segment_height: f64,
    pub entry_depth: f64,
    pub min_terminal_depth: f64,
    pub max_terminal_depth: f64,
    /// Final multiplier that maps to the deepest terminal depth
    pub depth_cap_multiplier: f64,
    pub first_row_depth: f64,
    pub row_spacing: f64,
    pub row_thickness: f64,
    pub min_gap: f64,
    pub max_gap: f64,
    /// Open space kept between the last row and the closure
    pub closure_clearance: f64,
    pub player_width: f64,
    pub bonus_size: f64,
    pub decorations_per_1000: f64,
    pub collectibles_per_1000: f64,
    pub closure_templates: Vec<ClosureTemplate>,
}

impl GeometryConfig {
    pub fn corridor_min_x(&self) -> f64 {
        self.corridor_center_x - self.corridor_width / 2.0
    }

    pub fn corridor_max_x(&self) -> f64 {
        self.corridor_center_x + self.corridor_width / 2.0
    }
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            world_width: 16_000.0,
            world_height: 20_000.0,
            ground_y: 19_300.0,
            corridor_center_x: 8_000.0,
            corridor_width: 1_400.0,
            wall_thickness: 200.0,
            wall_segment_height: 2_000.0,
            entry_depth: 0.0,
            min_terminal_depth: 800.0,
            max_terminal_depth: 17_500.0,
            depth_cap_multiplier: 10.0,
            first_row_depth: 1_200.0,
            row_spacing: 1_200.0,
            row_thickness: 120.0,
            min_gap: 300.0,
            max_gap: 700.0,
            closure_clearance: 400.0,
            player_width: 120.0,
            bonus_size: 300.0,
            decorations_per_1000: 12.0,
            collectibles_per_1000: 20.0,
            closure_templates: default_closure_templates(),
        }
    }
}

/// Which plan form the presentation layer receives
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanMode {
    #[default]
    Geometric,
    Abstract,
}

impl std::str::FromStr for PlanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "geometric" => Ok(PlanMode::Geometric),
            "abstract" => Ok(PlanMode::Abstract),
            other => Err(format!("unknown plan mode '{}'", other)),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PlanConfig {
    pub mode: PlanMode,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    pub starting_balance: u64,
    pub nonce_start: u64,
    /// Active rounds older than this are auto-settled
    pub round_ttl_secs: u64,
    pub max_cas_attempts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            starting_balance: 1_000 * MICROS_PER_UNIT,
            nonce_start: 0,
            round_ttl_secs: 3_600,
            max_cas_attempts: 16,
        }
    }
}

/// Return-to-player target the tables are authored against
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RtpConfig {
    pub target: f64,
    pub tolerance: f64,
}

impl Default for RtpConfig {
    fn default() -> Self {
        Self {
            target: 0.96,
            tolerance: 0.02,
        }
    }
}
