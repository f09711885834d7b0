use crate::config::GameConfig;
use crate::errors::GameError;
use crate::games::payout::PayoutEngine;
use crate::games::plan::{generator_for, Plan, PlanGenerator};
use crate::games::resolver::OutcomeResolver;
use crate::games::seed_chain::{derive_base, SeedPair};
use crate::games::types::Outcome;
use std::sync::Arc;
use tracing::error;

/// Everything one round produces from its committed inputs
#[derive(Debug, Clone, PartialEq)]
pub struct RoundResult {
    pub nonce: u64,
    pub base_value: f64,
    pub outcome: Outcome,
    pub plan: Plan,
}

/// Runs the deterministic pipeline: base value → outcome → plan
pub struct GameEngine {
    resolver: OutcomeResolver,
    payout: PayoutEngine,
    planner: Arc<dyn PlanGenerator>,
}

impl GameEngine {
    /// Create an engine for the given configuration
    pub fn new(config: &GameConfig) -> Self {
        Self {
            resolver: OutcomeResolver::new(config),
            payout: PayoutEngine::new(&config.payout),
            planner: generator_for(config),
        }
    }

    /// Create an engine with a custom plan generator
    pub fn with_planner(config: &GameConfig, planner: Arc<dyn PlanGenerator>) -> Self {
        Self {
            resolver: OutcomeResolver::new(config),
            payout: PayoutEngine::new(&config.payout),
            planner,
        }
    }

    pub fn resolver(&self) -> &OutcomeResolver {
        &self.resolver
    }

    pub fn payout(&self) -> &PayoutEngine {
        &self.payout
    }

    pub fn planner(&self) -> &dyn PlanGenerator {
        self.planner.as_ref()
    }

    /// Outcome for a base value, without a plan
    pub fn outcome(&self, base: f64, bet: u64) -> Outcome {
        self.payout.compose(bet, self.resolver.resolve(base))
    }

    /// Resolve a full round for `bet` at `nonce`
    pub fn play_round(&self, seeds: &SeedPair, nonce: u64, bet: u64) -> Result<RoundResult, GameError> {
        self.from_base(seeds.derive_base(nonce), nonce, bet)
    }

    /// Recompute a round from revealed seeds
    pub fn replay(&self, server_seed: &str, client_seed: &str, nonce: u64, bet: u64) -> Result<RoundResult, GameError> {
        self.from_base(derive_base(server_seed, client_seed, nonce), nonce, bet)
    }

    fn from_base(&self, base_value: f64, nonce: u64, bet: u64) -> Result<RoundResult, GameError> {
        let outcome = self.outcome(base_value, bet);
        let plan = self.planner.plan(base_value, &outcome).map_err(|violation| {
            error!(nonce, base_value, %violation, "generated plan failed reachability");
            GameError::Internal
        })?;
        Ok(RoundResult {
            nonce,
            base_value,
            outcome,
            plan,
        })
    }
}

impl std::fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameEngine")
            .field("payout", &self.payout)
            .field("plan_mode", &self.planner.mode())
            .finish()
    }
}
