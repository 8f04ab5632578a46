//! Errors returned by session operations
//!
//! Every error is recoverable. A failed request is reported back to the
//! connection that made it and leaves the session untouched.

use serde::Serialize;
use thiserror::Error;

use crate::{
    content::AuthoringError,
    names,
    session::{Action, Status},
    store::StoreError,
};

/// Errors that can occur while operating a session
#[derive(Error, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No session uses this join code
    #[error("no session matches this join code")]
    InvalidJoinCode,
    /// The session is completed
    #[error("session has already ended")]
    SessionAlreadyEnded,
    /// The requested lifecycle step is not allowed from the current status
    #[error("cannot {action} a session that is {from}")]
    InvalidStateTransition {
        /// Status when the action was attempted
        from: Status,
        /// The rejected action
        action: Action,
    },
    /// The content is not active or has no items
    #[error("content cannot be hosted")]
    ContentNotHostable,
    /// The answer is for an item that is not current
    #[error("answer is for an item that is no longer current")]
    StaleSubmission,
    /// The participant already answered the current item
    #[error("answer already submitted for this item")]
    DuplicateSubmission,
    /// The caller may not perform this operation
    #[error("not allowed")]
    Unauthorized,
    /// No session with this id
    #[error("session not found")]
    SessionNotFound,
    /// The roster is at its limit
    #[error("session is full")]
    SessionFull,
    /// No unused join code could be found
    #[error("no join code available")]
    JoinCodeExhausted,
    /// The answer does not fit the question
    #[error("answer does not fit the question")]
    InvalidAnswer,
    /// An item body failed validation
    #[error("invalid item: {0}")]
    InvalidItem(String),
    /// The display name was refused
    #[error(transparent)]
    Name(#[from] names::Error),
    /// The authoring subsystem failed
    #[error(transparent)]
    Authoring(#[from] AuthoringError),
    /// The session store failed
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Controller settings failed validation
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

impl Error {
    /// Whether the error is a rejection of the client's request rather than
    /// a failure of a collaborator
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            Self::Authoring(AuthoringError::Unavailable(_))
                | Self::Store(_)
                | Self::InvalidItem(_)
                | Self::InvalidSettings(_)
                | Self::JoinCodeExhausted
        )
    }
}
