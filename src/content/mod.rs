//! Hosted content: slides, questions and the authoring contract
//!
//! The session core never edits content. It reads the authored order and
//! the item bodies through [`Authoring`], validates them once when a
//! session starts, and from then on works from that snapshot.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

pub mod authoring;
pub mod catalog;
pub mod item;

pub use authoring::{Authoring, AuthoringError, ContentStatus};
pub use catalog::Catalog;
pub use item::{AnswerOption, Item, ItemView, Question, ResponseType, Slide};

/// Identifier of a quiz or survey in the authoring subsystem
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

/// Identifier of a slide or question
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

/// Identifier of an option on a choice-based question
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionId(String);

impl From<&str> for ContentId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<&str> for OptionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Whether an item reference points at a slide or a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Display-only content
    Slide,
    /// Content that accepts answers
    Question,
}

/// A reference to one entry of a content's authored order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    /// The referenced item
    pub id: ItemId,
    /// Which collection the item lives in
    pub kind: ItemKind,
}

impl ItemRef {
    /// Creates a reference to a slide
    pub fn slide(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            kind: ItemKind::Slide,
        }
    }

    /// Creates a reference to a question
    pub fn question(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            kind: ItemKind::Question,
        }
    }
}
