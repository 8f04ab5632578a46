//! Session persistence
//!
//! The controller reads a session record, mutates it and writes it back
//! while holding that session's lock, so implementations only need
//! per-record atomicity. [`MemoryStore`] keeps everything in process.

use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};
use serde::Serialize;
use thiserror::Error;

use crate::{
    join_code::JoinCode,
    session::{Session, SessionId, Status},
};

/// Failures reported by a session store
#[derive(Error, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record with this id
    #[error("session record not found")]
    NotFound,
    /// The record or its join code already exists
    #[error("session record conflicts with an existing one")]
    Conflict,
    /// The backing store could not be reached
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Storage for session records
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores a new record
    ///
    /// Fails with [`StoreError::Conflict`] if the id exists or the join code
    /// belongs to a session that has not completed.
    async fn insert(&self, session: Session) -> Result<(), StoreError>;

    /// Loads a record by id
    async fn get(&self, id: SessionId) -> Result<Session, StoreError>;

    /// Overwrites an existing record
    async fn save(&self, session: &Session) -> Result<(), StoreError>;

    /// Finds the most recent session that used a join code
    async fn find_by_join_code(&self, code: JoinCode) -> Result<Option<Session>, StoreError>;

    /// Whether a waiting or in-progress session holds this join code
    async fn join_code_in_flight(&self, code: JoinCode) -> Result<bool, StoreError>;
}

/// In-process session store
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: DashMap<SessionId, Session>,
    join_codes: DashMap<JoinCode, SessionId>,
}

impl MemoryStore {
    fn in_flight(&self, code: JoinCode) -> bool {
        let Some(id) = self.join_codes.get(&code).map(|id| *id) else {
            return false;
        };
        self.sessions
            .get(&id)
            .is_some_and(|s| s.status() != Status::Completed)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert(&self, session: Session) -> Result<(), StoreError> {
        let id = session.id();
        // join code slot is held across the session insert; lock order is
        // join_codes then sessions
        let slot = self.join_codes.entry(session.join_code());
        if let Entry::Occupied(holder) = &slot {
            let live = self
                .sessions
                .get(holder.get())
                .is_some_and(|s| s.status() != Status::Completed);
            if live {
                return Err(StoreError::Conflict);
            }
        }
        match self.sessions.entry(id) {
            Entry::Occupied(_) => return Err(StoreError::Conflict),
            Entry::Vacant(v) => {
                v.insert(session);
            }
        }
        slot.insert(id);
        Ok(())
    }

    async fn get(&self, id: SessionId) -> Result<Session, StoreError> {
        self.sessions
            .get(&id)
            .map(|s| s.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        match self.sessions.get_mut(&session.id()) {
            Some(mut stored) => {
                *stored = session.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn find_by_join_code(&self, code: JoinCode) -> Result<Option<Session>, StoreError> {
        let Some(id) = self.join_codes.get(&code).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.sessions.get(&id).map(|s| s.clone()))
    }

    async fn join_code_in_flight(&self, code: JoinCode) -> Result<bool, StoreError> {
        Ok(self.in_flight(code))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{
        content::ItemRef,
        participant::{self, Participant},
        session::tests::waiting_session,
    };

    fn session() -> Session {
        waiting_session(vec![ItemRef::question("q1")])
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryStore::default();
        let session = session();
        store.insert(session.clone()).await.unwrap();

        assert_eq!(store.get(session.id()).await.unwrap(), session);
        assert_eq!(
            store
                .find_by_join_code(session.join_code())
                .await
                .unwrap()
                .map(|s| s.id()),
            Some(session.id())
        );
        assert!(store.join_code_in_flight(session.join_code()).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = MemoryStore::default();
        assert_eq!(
            store.get(SessionId::new()).await,
            Err(StoreError::NotFound)
        );
        assert_eq!(store.save(&session()).await, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_duplicate_insert_conflicts() {
        let store = MemoryStore::default();
        let session = session();
        store.insert(session.clone()).await.unwrap();
        assert_eq!(store.insert(session).await, Err(StoreError::Conflict));
    }

    #[tokio::test]
    async fn test_in_flight_join_code_conflicts() {
        let store = MemoryStore::default();
        let first = session();
        store.insert(first.clone()).await.unwrap();

        let second = Session::new(
            first.content_id().clone(),
            participant::Id::new(),
            first.join_code(),
            first.items().to_vec(),
        );
        assert_eq!(store.insert(second).await, Err(StoreError::Conflict));
    }

    #[tokio::test]
    async fn test_completed_join_code_is_reusable() {
        let store = MemoryStore::default();
        let mut first = session();
        first
            .add_participant(Participant::new(participant::Id::new(), "Ada"), 10)
            .unwrap();
        store.insert(first.clone()).await.unwrap();

        first.complete().unwrap();
        store.save(&first).await.unwrap();
        assert!(!store.join_code_in_flight(first.join_code()).await.unwrap());

        let found = store.find_by_join_code(first.join_code()).await.unwrap();
        assert_eq!(found.map(|s| s.status()), Some(Status::Completed));

        let second = Session::new(
            first.content_id().clone(),
            participant::Id::new(),
            first.join_code(),
            first.items().to_vec(),
        );
        store.insert(second.clone()).await.unwrap();
        let found = store.find_by_join_code(first.join_code()).await.unwrap();
        assert_eq!(found.map(|s| s.id()), Some(second.id()));
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let store = MemoryStore::default();
        let mut session = session();
        store.insert(session.clone()).await.unwrap();

        session
            .add_participant(Participant::new(participant::Id::new(), "Ada"), 10)
            .unwrap();
        store.save(&session).await.unwrap();
        assert_eq!(
            store.get(session.id()).await.unwrap().participants().len(),
            1
        );
    }
}
