//! In-memory session store
//!
//! Lock-free maps for concurrent access across sessions. A swap holds the
//! session's map entry while it touches rounds, so every write for one
//! session is serialized; locks are always taken sessions → rounds → indexes.
//! Open rounds get their own index so settlement sweeps skip history.

use crate::common::traits::SessionStore;
use crate::common::types::{RoundWrite, SessionRecord};
use crate::errors::{FreefallError, FreefallResult, StoreError};
use crate::games::types::{Round, RoundId, SessionToken};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<SessionToken, SessionRecord>,
    rounds: DashMap<RoundId, Round>,
    session_rounds: DashMap<SessionToken, Vec<RoundId>>,
    active_rounds: DashMap<SessionToken, Vec<RoundId>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rounds named by `index` for one session
    fn load_indexed(&self, index: &DashMap<SessionToken, Vec<RoundId>>, token: &str) -> FreefallResult<Vec<Round>> {
        let ids = index.get(token).map(|ids| ids.value().clone()).unwrap_or_default();

        ids.iter()
            .map(|id| {
                self.rounds
                    .get(id)
                    .map(|r| r.value().clone())
                    .ok_or_else(|| FreefallError::from(StoreError::CorruptedRecord(format!("round {} missing from index", id))))
            })
            .collect()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, token: &str) -> FreefallResult<Option<SessionRecord>> {
        Ok(self.sessions.get(token).map(|r| r.value().clone()))
    }

    async fn put(&self, record: SessionRecord) -> FreefallResult<()> {
        match self.sessions.entry(record.token.clone()) {
            Entry::Occupied(_) => Err(StoreError::CorruptedRecord(format!("session {} already exists", record.token)).into()),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        record: SessionRecord,
        round: Option<RoundWrite>,
    ) -> FreefallResult<bool> {
        let Some(mut current) = self.sessions.get_mut(&record.token) else {
            return Ok(false);
        };
        if current.version != expected_version {
            debug!(token = %record.token, expected_version, stored = current.version, "session version moved");
            return Ok(false);
        }

        match round {
            Some(RoundWrite::Insert(round)) => {
                if round.session_token != record.token {
                    return Err(StoreError::CorruptedRecord(format!("round {} written under foreign session", round.id)).into());
                }
                match self.rounds.entry(round.id.clone()) {
                    Entry::Occupied(_) => return Err(StoreError::DuplicateRound(round.id).into()),
                    Entry::Vacant(slot) => {
                        self.session_rounds
                            .entry(record.token.clone())
                            .or_default()
                            .push(round.id.clone());
                        self.active_rounds
                            .entry(record.token.clone())
                            .or_default()
                            .push(round.id.clone());
                        slot.insert(round);
                    }
                }
            }
            Some(RoundWrite::Complete { round_id, kind, at }) => {
                let Some(mut stored) = self.rounds.get_mut(&round_id) else {
                    return Ok(false);
                };
                if !stored.is_active() {
                    return Ok(false);
                }
                *stored = stored.completed(kind, at);
                if let Some(mut open) = self.active_rounds.get_mut(&record.token) {
                    open.retain(|id| *id != round_id);
                }
            }
            None => {}
        }

        *current = SessionRecord {
            version: expected_version + 1,
            ..record
        };
        Ok(true)
    }

    async fn get_round(&self, round_id: &str) -> FreefallResult<Option<Round>> {
        Ok(self.rounds.get(round_id).map(|r| r.value().clone()))
    }

    async fn rounds_for_session(&self, token: &str) -> FreefallResult<Vec<Round>> {
        self.load_indexed(&self.session_rounds, token)
    }

    async fn active_rounds_for_session(&self, token: &str) -> FreefallResult<Vec<Round>> {
        self.load_indexed(&self.active_rounds, token)
    }
}
