//! Sessions, balances and the round state machine

pub mod manager;
pub mod store;

pub use manager::{PlayResult, RoundSettlement, SessionCreated, SessionInfo, SessionReveal, SessionRoundManager};
pub use store::InMemorySessionStore;
