pub mod payout;
pub mod plan;
pub mod processor;
pub mod resolver;
pub mod seed_chain;
pub mod simulation;
pub mod types;
pub mod weighted;

pub use payout::PayoutEngine;
pub use plan::{Plan, PlanGenerator};
pub use processor::{GameEngine, RoundResult};
pub use resolver::OutcomeResolver;
pub use seed_chain::{OsSeedSource, SeedChain, SeedPair, SeedSource};
pub use types::*;
pub use weighted::WeightedTable;
