//! Configuration loading for the freefall engine
//!
//! Reads an optional TOML file, applies `FREEFALL_*` environment overrides
//! and validates the result before any table reaches the resolver.

use crate::config::{
    BettingConfig, ClosureTemplate, GameConfig, GeometryConfig, PlanMode, WeightedEntry,
};
use crate::errors::{ConfigurationError, FreefallResult};
use std::env;
use std::path::Path;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> FreefallResult<GameConfig> {
        let mut config = if let Some(ref path) = self.config_path {
            self.load_from_file(path)?
        } else {
            GameConfig::default()
        };

        self.apply_env_overrides(&mut config)?;
        self.validate(&config)?;

        Ok(config)
    }

    /// Load configuration from TOML file
    fn load_from_file(&self, path: &str) -> FreefallResult<GameConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)).into())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&self, config: &mut GameConfig) -> FreefallResult<()> {
        if let Ok(mode) = env::var("FREEFALL_PLAN_MODE") {
            config.plan.mode = mode.parse::<PlanMode>()
                .map_err(|reason| ConfigurationError::InvalidValue {
                    field: "FREEFALL_PLAN_MODE".to_string(),
                    value: mode,
                    reason,
                })?;
        }

        if let Some(wincap) = parse_env::<f64>("FREEFALL_WINCAP", "Invalid multiplier")? {
            config.payout.wincap = wincap;
        }
        if let Some(min_bet) = parse_env::<u64>("FREEFALL_MIN_BET", "Invalid micro-unit amount")? {
            config.betting.min_bet = min_bet;
        }
        if let Some(max_bet) = parse_env::<u64>("FREEFALL_MAX_BET", "Invalid micro-unit amount")? {
            config.betting.max_bet = max_bet;
        }
        if let Some(step) = parse_env::<u64>("FREEFALL_BET_STEP", "Invalid micro-unit amount")? {
            config.betting.bet_step = step;
        }
        if let Some(balance) = parse_env::<u64>("FREEFALL_STARTING_BALANCE", "Invalid micro-unit amount")? {
            config.session.starting_balance = balance;
        }
        if let Some(p) = parse_env::<f64>("FREEFALL_BONUS_TRIGGER_PROBABILITY", "Invalid probability")? {
            config.bonus.trigger_probability = p;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self, config: &GameConfig) -> FreefallResult<()> {
        validate_betting(&config.betting)?;

        if !(config.payout.wincap.is_finite() && config.payout.wincap > 0.0) {
            return Err(invalid("payout.wincap", config.payout.wincap, "Wincap must be positive"));
        }

        validate_table("primary.entries", &config.primary.entries)?;
        let ascending = config.primary.entries
            .windows(2)
            .all(|pair| pair[0].value <= pair[1].value);
        if !ascending {
            return Err(ConfigurationError::ValidationFailed(
                "primary.entries must be listed from lowest to highest multiplier".to_string(),
            ).into());
        }

        validate_probability("bonus.trigger_probability", config.bonus.trigger_probability)?;
        validate_table("bonus.multipliers", &config.bonus.multipliers)?;

        for (i, collectible) in config.collectibles.iter().enumerate() {
            validate_probability(&format!("collectibles[{}].spawn_probability", i), collectible.spawn_probability)?;
            if !(collectible.value_multiplier.is_finite() && collectible.value_multiplier >= 0.0) {
                return Err(invalid(
                    &format!("collectibles[{}].value_multiplier", i),
                    collectible.value_multiplier,
                    "Value multiplier must be non-negative",
                ));
            }
        }

        if config.obstacles.is_empty() {
            return Err(ConfigurationError::MissingRequired("obstacles".to_string()).into());
        }
        let obstacle_weights: Vec<WeightedEntry> = config.obstacles
            .iter()
            .map(|o| WeightedEntry::new(0.0, o.spawn_probability))
            .collect();
        validate_table("obstacles.spawn_probability", &obstacle_weights)?;

        validate_geometry(&config.geometry)?;

        validate_probability("rtp.target", config.rtp.target)?;
        validate_probability("rtp.tolerance", config.rtp.tolerance)?;

        if config.session.max_cas_attempts == 0 {
            return Err(invalid("session.max_cas_attempts", 0, "At least one attempt is required"));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, config: &GameConfig, path: &str) -> FreefallResult<()> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to write to {}: {}", path, e)).into())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, reason: &str) -> FreefallResult<Option<T>> {
    match env::var(key) {
        Ok(raw) => raw.parse::<T>().map(Some).map_err(|_| {
            ConfigurationError::InvalidValue {
                field: key.to_string(),
                value: raw,
                reason: reason.to_string(),
            }
            .into()
        }),
        Err(_) => Ok(None),
    }
}

fn invalid<V: ToString>(field: &str, value: V, reason: &str) -> crate::errors::FreefallError {
    ConfigurationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

fn validate_probability(field: &str, p: f64) -> FreefallResult<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(invalid(field, p, "Probability must be within [0, 1]"));
    }
    Ok(())
}

fn validate_table(field: &str, entries: &[WeightedEntry]) -> FreefallResult<()> {
    if entries.is_empty() {
        return Err(ConfigurationError::MissingRequired(field.to_string()).into());
    }
    for entry in entries {
        if !(entry.weight.is_finite() && entry.weight >= 0.0) {
            return Err(invalid(field, entry.weight, "Weights must be finite and non-negative"));
        }
        if !(entry.value.is_finite() && entry.value >= 0.0) {
            return Err(invalid(field, entry.value, "Values must be finite and non-negative"));
        }
    }
    let total: f64 = entries.iter().map(|e| e.weight).sum();
    if total <= 0.0 {
        return Err(invalid(field, total, "Total weight must be positive"));
    }
    Ok(())
}

fn validate_betting(betting: &BettingConfig) -> FreefallResult<()> {
    if betting.bet_step == 0 {
        return Err(invalid("betting.bet_step", 0, "Bet step cannot be zero"));
    }
    if betting.min_bet == 0 || betting.min_bet > betting.max_bet {
        return Err(invalid(
            "betting.min_bet",
            betting.min_bet,
            "Minimum bet must be positive and not above the maximum",
        ));
    }
    for (field, amount) in [("betting.min_bet", betting.min_bet), ("betting.max_bet", betting.max_bet)] {
        if amount % betting.bet_step != 0 {
            return Err(invalid(field, amount, "Bet limits must be multiples of the bet step"));
        }
    }
    if !(betting.min_bet..=betting.max_bet).contains(&betting.default_bet)
        || betting.default_bet % betting.bet_step != 0
    {
        return Err(invalid("betting.default_bet", betting.default_bet, "Default bet must be a valid bet"));
    }
    Ok(())
}

fn validate_geometry(geometry: &GeometryConfig) -> FreefallResult<()> {
    if geometry.corridor_width <= 0.0 || geometry.wall_thickness <= 0.0 {
        return Err(invalid("geometry.corridor_width", geometry.corridor_width, "Corridor and walls need positive width"));
    }
    if !(geometry.player_width < geometry.min_gap
        && geometry.min_gap <= geometry.max_gap
        && geometry.max_gap <= geometry.corridor_width)
    {
        return Err(invalid(
            "geometry.min_gap",
            geometry.min_gap,
            "Gaps must be wider than the player and fit inside the corridor",
        ));
    }
    if !(geometry.entry_depth < geometry.min_terminal_depth
        && geometry.min_terminal_depth <= geometry.max_terminal_depth
        && geometry.max_terminal_depth < geometry.ground_y
        && geometry.ground_y <= geometry.world_height)
    {
        return Err(invalid(
            "geometry.max_terminal_depth",
            geometry.max_terminal_depth,
            "Depth bounds must be ordered inside the world",
        ));
    }
    if geometry.min_terminal_depth - geometry.entry_depth < geometry.closure_clearance + geometry.bonus_size {
        return Err(invalid(
            "geometry.min_terminal_depth",
            geometry.min_terminal_depth,
            "Shallowest terminal depth must leave room for the bonus object above the closure",
        ));
    }
    if geometry.depth_cap_multiplier <= 0.0 {
        return Err(invalid("geometry.depth_cap_multiplier", geometry.depth_cap_multiplier, "Depth cap must be positive"));
    }
    if geometry.row_thickness <= 0.0 || geometry.row_spacing - geometry.row_thickness < geometry.player_width {
        return Err(invalid(
            "geometry.row_spacing",
            geometry.row_spacing,
            "Space between rows must fit the player",
        ));
    }
    if geometry.closure_clearance < geometry.player_width {
        return Err(invalid(
            "geometry.closure_clearance",
            geometry.closure_clearance,
            "Clearance above the closure must fit the player",
        ));
    }
    if geometry.first_row_depth - geometry.entry_depth < geometry.bonus_size {
        return Err(invalid(
            "geometry.first_row_depth",
            geometry.first_row_depth,
            "First row must leave room for the bonus object below the entry",
        ));
    }
    if geometry.wall_segment_height <= 0.0 {
        return Err(invalid("geometry.wall_segment_height", geometry.wall_segment_height, "Wall segments need height"));
    }
    if geometry.closure_templates.is_empty() {
        return Err(ConfigurationError::MissingRequired("geometry.closure_templates".to_string()).into());
    }
    for template in &geometry.closure_templates {
        validate_closure_template(template, geometry)?;
    }
    Ok(())
}

/// A template must span the whole corridor along its leading edge, and may
/// not reach above terminal depth or beyond the walls.
fn validate_closure_template(template: &ClosureTemplate, geometry: &GeometryConfig) -> FreefallResult<()> {
    let field = format!("geometry.closure_templates.{}", template.name);
    let overhang = geometry.wall_thickness / geometry.corridor_width;

    if template.pieces.iter().any(|p| p.dy0 < 0.0 || p.dy1 <= p.dy0 || p.x1 <= p.x0) {
        return Err(invalid(&field, "pieces", "Pieces must be non-empty and start at or below terminal depth"));
    }
    if template.pieces.iter().any(|p| p.x0 < -overhang || p.x1 > 1.0 + overhang) {
        return Err(invalid(&field, "pieces", "Pieces may not extend past the walls"));
    }

    let mut leading: Vec<(f64, f64)> = template.pieces
        .iter()
        .filter(|p| p.dy0 == 0.0)
        .map(|p| (p.x0, p.x1))
        .collect();
    leading.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut covered = 0.0_f64;
    for (x0, x1) in leading {
        if x0 > covered {
            break;
        }
        covered = covered.max(x1);
    }
    if covered < 1.0 {
        return Err(invalid(&field, covered, "Leading edge must cover the full corridor width"));
    }
    Ok(())
}

/// Builder pattern for creating configurations
pub struct ConfigBuilder {
    config: GameConfig,
}

impl ConfigBuilder {
    /// Create a new config builder with defaults
    pub fn new() -> Self {
        Self {
            config: GameConfig::default(),
        }
    }

    pub fn betting(mut self, betting: BettingConfig) -> Self {
        self.config.betting = betting;
        self
    }

    pub fn wincap(mut self, wincap: f64) -> Self {
        self.config.payout.wincap = wincap;
        self
    }

    pub fn plan_mode(mut self, mode: PlanMode) -> Self {
        self.config.plan.mode = mode;
        self
    }

    pub fn bonus_trigger_probability(mut self, probability: f64) -> Self {
        self.config.bonus.trigger_probability = probability;
        self
    }

    pub fn starting_balance(mut self, balance: u64) -> Self {
        self.config.session.starting_balance = balance;
        self
    }

    pub fn round_ttl_secs(mut self, secs: u64) -> Self {
        self.config.session.round_ttl_secs = secs;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> GameConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a sample configuration file
pub fn generate_sample_config(path: &str) -> FreefallResult<()> {
    let config = GameConfig::default();
    let loader = ConfigLoader::new();
    loader.save(&config, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClosurePiece;
    use crate::errors::FreefallError;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = GameConfig::default();
        assert!(ConfigLoader::new().validate(&config).is_ok());
        assert_eq!(config.primary.entries.len(), 11);
        assert_eq!(config.geometry.closure_templates.len(), 4);
    }

    #[test]
    fn test_primary_weights_total_one_hundred() {
        let config = GameConfig::default();
        let total: f64 = config.primary.entries.iter().map(|e| e.weight).sum();
        assert!((total - 100.0).abs() < 1e-9);

        let bonus_total: f64 = config.bonus.multipliers.iter().map(|e| e.weight).sum();
        assert!((bonus_total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_bad_bet_limits() {
        let loader = ConfigLoader::new();
        let mut config = GameConfig::default();

        config.betting.bet_step = 0;
        assert!(loader.validate(&config).is_err());

        config.betting = BettingConfig::default();
        config.betting.max_bet = 100_000_005;
        assert!(loader.validate(&config).is_err());

        config.betting = BettingConfig::default();
        config.betting.min_bet = config.betting.max_bet + config.betting.bet_step;
        assert!(loader.validate(&config).is_err());
    }

    fn rejected_field(config: &GameConfig) -> String {
        match ConfigLoader::new().validate(config) {
            Err(FreefallError::Configuration(ConfigurationError::InvalidValue { field, .. })) => field,
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_geometry_that_traps_the_player() {
        let mut config = GameConfig::default();
        config.geometry.row_spacing = 150.0;
        assert_eq!(rejected_field(&config), "geometry.row_spacing");

        let mut config = GameConfig::default();
        config.geometry.closure_clearance = config.geometry.player_width - 1.0;
        assert_eq!(rejected_field(&config), "geometry.closure_clearance");

        let mut config = GameConfig::default();
        config.geometry.first_row_depth = config.geometry.entry_depth + config.geometry.bonus_size - 1.0;
        assert_eq!(rejected_field(&config), "geometry.first_row_depth");

        let mut config = GameConfig::default();
        config.geometry.row_spacing = config.geometry.row_thickness + config.geometry.player_width;
        assert!(ConfigLoader::new().validate(&config).is_ok());
    }

    #[test]
    fn test_rejects_negative_and_empty_tables() {
        let loader = ConfigLoader::new();
        let mut config = GameConfig::default();

        config.primary.entries[1].weight = -1.0;
        assert!(loader.validate(&config).is_err());

        config.primary.entries.clear();
        assert!(loader.validate(&config).is_err());

        let mut config = GameConfig::default();
        config.bonus.multipliers.iter_mut().for_each(|e| e.weight = 0.0);
        assert!(loader.validate(&config).is_err());
    }

    #[test]
    fn test_rejects_unsorted_primary_table() {
        let mut config = GameConfig::default();
        config.primary.entries.swap(0, 1);
        assert!(ConfigLoader::new().validate(&config).is_err());
    }

    #[test]
    fn test_rejects_closure_template_with_hole() {
        let mut config = GameConfig::default();
        config.geometry.closure_templates.push(ClosureTemplate {
            name: "broken".to_string(),
            pieces: vec![
                ClosurePiece::new(-0.1, 0.4, 0.0, 100.0),
                ClosurePiece::new(0.6, 1.1, 0.0, 100.0),
            ],
        });
        assert!(ConfigLoader::new().validate(&config).is_err());
    }

    #[test]
    fn test_rejects_closure_rising_above_terminal_depth() {
        let mut config = GameConfig::default();
        config.geometry.closure_templates[0].pieces[0].dy0 = -50.0;
        assert!(ConfigLoader::new().validate(&config).is_err());
    }

    #[test]
    fn test_rejects_gap_narrower_than_player() {
        let mut config = GameConfig::default();
        config.geometry.min_gap = config.geometry.player_width;
        assert!(ConfigLoader::new().validate(&config).is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .wincap(50.0)
            .plan_mode(PlanMode::Abstract)
            .starting_balance(5_000_000)
            .build();

        assert_eq!(config.payout.wincap, 50.0);
        assert_eq!(config.plan.mode, PlanMode::Abstract);
        assert_eq!(config.session.starting_balance, 5_000_000);
    }

    #[test]
    fn test_save_and_load_config() -> FreefallResult<()> {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap();

        let original = ConfigBuilder::new().plan_mode(PlanMode::Abstract).build();
        ConfigLoader::new().save(&original, path)?;

        let loaded = ConfigLoader::new().with_path(path).load()?;
        assert_eq!(loaded.primary, original.primary);
        assert_eq!(loaded.geometry.closure_templates, original.geometry.closure_templates);
        assert_eq!(loaded.betting, original.betting);

        Ok(())
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = ConfigLoader::new().with_path("/nonexistent/freefall.toml").load();
        assert!(result.is_err());
    }
}
