//! Session records and their lifecycle invariants
//!
//! A [`Session`] is one live run of a quiz or survey. Its status and
//! current index only move forward, and the methods here refuse anything
//! else. The controller is the only caller of the mutating methods.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use uuid::Uuid;

use crate::{
    content::{ContentId, ItemRef},
    error::Error,
    join_code::JoinCode,
    participant::{self, Participant},
};

/// A unique identifier for a session
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new random session id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum Status {
    /// Created, accepting participants, no item shown yet
    #[display("waiting")]
    Waiting,
    /// Presenting items
    #[display("in progress")]
    InProgress,
    /// Finished; terminal
    #[display("completed")]
    Completed,
}

/// Lifecycle actions, as reported in rejected transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum Action {
    /// Start presenting items
    #[display("start")]
    Start,
    /// Move to the next item
    #[display("advance")]
    Advance,
    /// Finish the session
    #[display("end")]
    End,
}

/// A persisted session record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    join_code: JoinCode,
    content_id: ContentId,
    host: participant::Id,
    items: Vec<ItemRef>,
    status: Status,
    current_index: Option<usize>,
    participants: Vec<Participant>,
}

impl Session {
    /// Creates a waiting session with an empty roster
    pub fn new(
        content_id: ContentId,
        host: participant::Id,
        join_code: JoinCode,
        items: Vec<ItemRef>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            join_code,
            content_id,
            host,
            items,
            status: Status::Waiting,
            current_index: None,
            participants: Vec::new(),
        }
    }

    /// The session's identifier
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The code participants join with
    pub fn join_code(&self) -> JoinCode {
        self.join_code
    }

    /// The hosted quiz or survey
    pub fn content_id(&self) -> &ContentId {
        &self.content_id
    }

    /// Item references in presentation order
    pub fn items(&self) -> &[ItemRef] {
        &self.items
    }

    /// Current lifecycle status
    pub fn status(&self) -> Status {
        self.status
    }

    /// Index of the current item, `None` before start
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Reference to the current item, `None` before start
    pub fn current_item(&self) -> Option<&ItemRef> {
        self.current_index.and_then(|i| self.items.get(i))
    }

    /// Participants in join order
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Whether `id` is the session's host
    pub fn is_host(&self, id: participant::Id) -> bool {
        self.host == id
    }

    /// Whether `id` is on the roster
    pub fn is_participant(&self, id: participant::Id) -> bool {
        self.participants.iter().any(|p| p.id == id)
    }

    /// Adds a participant to the roster
    ///
    /// Returns `true` if the participant was newly added and `false` if
    /// they were already present, in which case the first entry is kept.
    ///
    /// # Errors
    ///
    /// * `Error::SessionAlreadyEnded` - the session is completed
    /// * `Error::SessionFull` - the roster already holds `limit` participants
    pub(crate) fn add_participant(
        &mut self,
        participant: Participant,
        limit: usize,
    ) -> Result<bool, Error> {
        if self.status == Status::Completed {
            return Err(Error::SessionAlreadyEnded);
        }
        if self.is_participant(participant.id) {
            return Ok(false);
        }
        if self.participants.len() >= limit {
            return Err(Error::SessionFull);
        }
        self.participants.push(participant);
        Ok(true)
    }

    /// Checks that `action` is allowed from the current status
    ///
    /// Starting also needs at least one participant.
    ///
    /// # Errors
    ///
    /// Returns `Error::SessionAlreadyEnded` for a completed session and
    /// `Error::InvalidStateTransition` otherwise.
    pub fn check(&self, action: Action) -> Result<(), Error> {
        let allowed = match action {
            Action::Start => self.status == Status::Waiting && !self.participants.is_empty(),
            Action::Advance => self.status == Status::InProgress,
            Action::End => self.status != Status::Completed,
        };
        match self.status {
            _ if allowed => Ok(()),
            Status::Completed => Err(Error::SessionAlreadyEnded),
            from => Err(Error::InvalidStateTransition { from, action }),
        }
    }

    /// Moves a waiting session to its first item
    ///
    /// `items` replaces the stored references with the order captured at
    /// start.
    ///
    /// # Errors
    ///
    /// Fails unless the session is waiting with a non-empty roster and
    /// `items` is non-empty.
    pub(crate) fn begin(&mut self, items: Vec<ItemRef>) -> Result<(), Error> {
        self.check(Action::Start)?;
        if items.is_empty() {
            return Err(Error::ContentNotHostable);
        }
        self.items = items;
        self.status = Status::InProgress;
        self.current_index = Some(0);
        Ok(())
    }

    /// Moves an in-progress session forward to `index`
    ///
    /// # Errors
    ///
    /// Fails unless the session is in progress and `index` is after the
    /// current index and within the item list.
    pub(crate) fn advance_to(&mut self, index: usize) -> Result<(), Error> {
        self.check(Action::Advance)?;
        let forward = self.current_index.is_none_or(|current| index > current);
        if !forward || index >= self.items.len() {
            return Err(Error::InvalidStateTransition {
                from: self.status,
                action: Action::Advance,
            });
        }
        self.current_index = Some(index);
        Ok(())
    }

    /// Marks the session completed
    ///
    /// # Errors
    ///
    /// Returns `Error::SessionAlreadyEnded` if it already is.
    pub(crate) fn complete(&mut self) -> Result<(), Error> {
        self.check(Action::End)?;
        self.status = Status::Completed;
        Ok(())
    }
}
