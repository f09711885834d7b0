//! Shared infrastructure used across the engine
//!
//! Configuration loading lives here so the game modules only see validated
//! data, alongside the session store seam and the records it persists.

pub mod config;
pub mod traits;
pub mod types;

pub use traits::SessionStore;
pub use types::{RoundWrite, SessionLifecycle, SessionRecord};
