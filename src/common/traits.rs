//! Storage seam for sessions and rounds
//!
//! The manager only needs `get`/`put`/`compare_and_swap` on a versioned
//! session record plus round reads, so any backend with a transactional
//! check-and-set can stand in for the in-memory one.

use crate::common::types::{RoundWrite, SessionRecord};
use crate::errors::FreefallResult;
use crate::games::types::Round;
use async_trait::async_trait;

/// Session and round persistence
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch a session by token
    async fn get(&self, token: &str) -> FreefallResult<Option<SessionRecord>>;

    /// Insert a new session; an existing token is an error
    async fn put(&self, record: SessionRecord) -> FreefallResult<()>;

    /// Replace the session iff its stored version equals `expected_version`,
    /// applying `round` in the same atomic step.
    ///
    /// Returns `Ok(false)` when the version moved or a `Complete` targets a
    /// round that is no longer active; nothing is written in that case. On
    /// success the stored version becomes `expected_version + 1`.
    async fn compare_and_swap(
        &self,
        expected_version: u64,
        record: SessionRecord,
        round: Option<RoundWrite>,
    ) -> FreefallResult<bool>;

    /// Fetch a round by id
    async fn get_round(&self, round_id: &str) -> FreefallResult<Option<Round>>;

    /// Every round of a session in play order
    async fn rounds_for_session(&self, token: &str) -> FreefallResult<Vec<Round>>;

    /// Rounds of a session still awaiting settlement, in play order. Cost
    /// follows the number of open rounds, not the session's history.
    async fn active_rounds_for_session(&self, token: &str) -> FreefallResult<Vec<Round>>;
}
