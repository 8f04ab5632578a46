//! # Quizroom
//!
//! Live session engine for quizzes and surveys. A host opens a session for
//! authored content, participants join with a short numeric code, and the
//! host steps through the slides and questions while answers are tallied
//! and broadcast in real time. When the last item is passed, or the host
//! ends early, everyone receives the same summary.
//!
//! [`controller::Controller`] drives the session lifecycle. Content comes
//! from an [`content::Authoring`] implementation, records are kept by a
//! [`store::SessionStore`] and clients are reached through
//! [`tunnel::Tunnel`]s.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::ignored_unit_patterns)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
use derive_where::derive_where;
use itertools::Itertools;
use serde::Serialize;

pub mod config;
pub mod constants;
pub mod content;
pub mod controller;
pub mod countdown;
pub mod error;
pub mod join_code;
pub mod message;
pub mod names;
pub mod participant;
pub mod room;
pub mod sequencer;
pub mod session;
pub mod store;
pub mod summary;
pub mod tally;
pub mod tunnel;

pub use config::Settings;
pub use controller::{Advance, Controller};
pub use error::Error;
pub use message::{IncomingMessage, SyncMessage, UpdateMessage};
pub use session::{Session, SessionId, Status};

/// A list cut down for display that still reports how long it really is
///
/// Rosters are sent this way so a session with hundreds of participants
/// does not push every name to every client on each join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[derive_where(Default)]
pub struct TruncatedVec<T> {
    /// The exact total count of items
    exact_count: usize,
    /// Up to the limit of the items
    items: Vec<T>,
}

impl<T> TruncatedVec<T> {
    /// Keeps at most `limit` items from `list`, recording `exact_count` as
    /// the full length
    pub fn new<I: Iterator<Item = T>>(list: I, limit: usize, exact_count: usize) -> Self {
        let items = list.take(limit).collect_vec();
        Self { exact_count, items }
    }

    /// Returns the exact count of items
    pub fn exact_count(&self) -> usize {
        self.exact_count
    }

    /// Returns the kept items
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Whether some items were left out
    pub fn is_truncated(&self) -> bool {
        self.items.len() < self.exact_count
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_vec_new() {
        let data = vec![1, 2, 3, 4, 5];
        let truncated = TruncatedVec::new(data.into_iter(), 3, 5);

        assert_eq!(truncated.exact_count(), 5);
        assert_eq!(truncated.items(), &[1, 2, 3]);
        assert!(truncated.is_truncated());
    }

    #[test]
    fn test_truncated_vec_new_limit_larger_than_items() {
        let data = vec![1, 2, 3];
        let truncated = TruncatedVec::new(data.into_iter(), 5, 3);

        assert_eq!(truncated.exact_count(), 3);
        assert_eq!(truncated.items(), &[1, 2, 3]);
        assert!(!truncated.is_truncated());
    }

    #[test]
    fn test_truncated_vec_default_is_empty() {
        let truncated = TruncatedVec::<String>::default();

        assert_eq!(truncated.exact_count(), 0);
        assert!(truncated.items().is_empty());
    }

    #[test]
    fn test_truncated_vec_serializes_count() {
        let roster = TruncatedVec::new(["Ada", "Bob"].into_iter().map(String::from), 1, 2);
        let json = serde_json::to_string(&roster).unwrap();

        assert_eq!(json, r#"{"exact_count":2,"items":["Ada"]}"#);
    }
}
