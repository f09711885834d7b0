//! Freefall - provably-fair outcome engine for a vertical-descent game
//!
//! A round's fate is fixed before play: a committed seed pair and nonce yield a
//! base value, the resolver turns it into a multiplier, and the plan generator
//! lays out a world whose geometry can only produce that result. Sessions carry
//! the balance and seed chain; settlement credits each round exactly once.
//!
//! Layout:
//! - [`games`]: derivation, resolution, payout, plans and math validation
//! - [`session`]: session store and the round state machine
//! - [`fairness`]: replay and verification of revealed draws
//! - [`api`]: axum HTTP surface

pub mod api;
pub mod common;
pub mod config;
pub mod errors;
pub mod fairness;
pub mod games;
pub mod session;

pub use common::config::ConfigLoader;
pub use config::GameConfig;
pub use errors::{FreefallError, FreefallResult, GameError};
pub use fairness::VerificationService;
pub use games::{GameEngine, Outcome, Plan, SeedPair};
pub use session::{InMemorySessionStore, SessionRoundManager};
