//! Ordered traversal of a session's items
//!
//! The sequencer is built once when a session starts. It captures the
//! authored order and every item body, so later edits to the content do
//! not reach a running session.

use garde::Validate;
use itertools::Itertools;

use crate::{
    constants::session,
    content::{Authoring, ContentId, Item, ItemRef},
    error::Error,
};

/// An item together with where it sits in the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Zero-based index in the session's order
    pub index: usize,
    /// The resolved item body
    pub item: Item,
    /// Whether no item follows this one
    pub is_last: bool,
}

/// What comes after the current index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    /// Another item to present
    Item(Position),
    /// The current item was the last one
    Exhausted,
}

/// Resolved, immutable item sequence for one session
#[derive(Debug, Clone)]
pub struct Sequencer {
    refs: Vec<ItemRef>,
    items: Vec<Item>,
}

impl Sequencer {
    /// Reads the authored order and captures every item body
    ///
    /// # Errors
    ///
    /// * `Error::ContentNotHostable` - the content has no items
    /// * `Error::InvalidItem` - an item body fails validation
    /// * `Error::Authoring` - the authoring subsystem failed
    pub async fn snapshot<A: Authoring + ?Sized>(
        authoring: &A,
        content: &ContentId,
    ) -> Result<Self, Error> {
        let refs = authoring.items_in_order(content).await?;
        Self::resolve(authoring, refs).await
    }

    /// Captures the bodies for an already known order
    ///
    /// # Errors
    ///
    /// Same as [`Sequencer::snapshot`].
    pub async fn resolve<A: Authoring + ?Sized>(
        authoring: &A,
        refs: Vec<ItemRef>,
    ) -> Result<Self, Error> {
        if refs.is_empty() || refs.len() > session::MAX_ITEM_COUNT {
            return Err(Error::ContentNotHostable);
        }
        // answers are matched to the current item by id alone
        if let Some(repeated) = refs.iter().map(|r| &r.id).duplicates().next() {
            return Err(Error::InvalidItem(format!("{repeated}: listed more than once")));
        }
        let mut items = Vec::with_capacity(refs.len());
        for item_ref in &refs {
            let item = authoring.item(&item_ref.id, item_ref.kind).await?;
            if item.id() != &item_ref.id || item.kind() != item_ref.kind {
                return Err(Error::InvalidItem(format!(
                    "{}: authoring returned {} instead",
                    item_ref.id,
                    item.id()
                )));
            }
            item.validate()
                .map_err(|report| Error::InvalidItem(format!("{}: {report}", item_ref.id)))?;
            items.push(item);
        }
        Ok(Self { refs, items })
    }

    /// The captured order
    pub fn refs(&self) -> &[ItemRef] {
        &self.refs
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false; empty content is refused at snapshot time
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The item at `index`, with its position metadata
    pub fn position(&self, index: usize) -> Option<Position> {
        self.items.get(index).map(|item| Position {
            index,
            item: item.clone(),
            is_last: index + 1 == self.items.len(),
        })
    }

    /// The item after `current`, or the first item when `current` is `None`
    pub fn next(&self, current: Option<usize>) -> Next {
        let index = current.map_or(0, |i| i + 1);
        self.position(index).map_or(Next::Exhausted, Next::Item)
    }
}
