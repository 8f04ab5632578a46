//! Read-only contract with the authoring subsystem

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{ContentId, Item, ItemId, ItemKind, ItemRef};

/// Publication state of a quiz or survey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentStatus {
    /// Published and hostable
    Active,
    /// Still being edited
    Draft,
    /// No longer accepting sessions
    Closed,
}

/// Failures reported by the authoring subsystem
#[derive(Error, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum AuthoringError {
    /// The referenced content or item does not exist
    #[error("content not found")]
    NotFound,
    /// The authoring subsystem could not be reached
    #[error("authoring subsystem unavailable: {0}")]
    Unavailable(String),
}

/// Lookup operations the session core needs from authored content
#[async_trait]
pub trait Authoring: Send + Sync {
    /// Reports whether the content may be hosted
    async fn content_status(&self, content: &ContentId) -> Result<ContentStatus, AuthoringError>;

    /// Returns the content's mixed slide/question order
    async fn items_in_order(&self, content: &ContentId) -> Result<Vec<ItemRef>, AuthoringError>;

    /// Resolves a single item body
    ///
    /// Implementations must return [`AuthoringError::NotFound`] when the
    /// item exists but is of a different kind than requested.
    async fn item(&self, id: &ItemId, kind: ItemKind) -> Result<Item, AuthoringError>;
}
