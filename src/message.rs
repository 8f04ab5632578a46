//! Realtime events exchanged with clients
//!
//! [`UpdateMessage`]s are incremental and broadcast as things happen.
//! [`SyncMessage`]s carry the whole state a client needs after connecting
//! or reconnecting. [`IncomingMessage`]s are what clients send; the caller
//! identity never comes from the message itself.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    TruncatedVec,
    content::{ItemId, ItemView, OptionId},
    error::Error,
    join_code::JoinCode,
    participant::{self, Participant},
    session::SessionId,
    summary::SessionSummary,
    tally::{AnswerValue, Tally},
};

/// Messages clients send to a session
#[derive(Debug, Deserialize, Clone)]
pub enum IncomingMessage {
    /// Join the session with its code and a display name
    Join {
        /// The join code as typed
        code: String,
        /// Requested display name
        name: String,
    },
    /// Answer the current question
    Submit {
        /// The question being answered
        item: ItemId,
        /// The answer
        value: AnswerValue,
    },
    /// Move to the next item (host only)
    Advance,
    /// End the session (host only)
    End,
}

/// Incremental updates broadcast to a session's connections
#[serde_with::serde_as]
#[derive(Debug, Serialize, Clone)]
pub enum UpdateMessage {
    /// Someone joined the roster
    ParticipantJoined {
        /// The new participant
        participant: Participant,
        /// Names on the roster
        roster: TruncatedVec<String>,
    },
    /// A participant's connection went away; they stay on the roster
    ///
    /// Sent to the host only.
    ParticipantLeft {
        /// The disconnected participant
        participant: participant::Id,
    },
    /// A new item is current
    ItemChanged {
        /// The item, without correct answers
        item: ItemView,
        /// Zero-based position
        index: usize,
        /// Number of items in the session
        count: usize,
        /// Whether this is the final item
        is_last: bool,
        /// Advisory answering time, for questions
        #[serde_as(as = "Option<serde_with::DurationSeconds<u64>>")]
        countdown: Option<Duration>,
    },
    /// The live tally changed
    TallyUpdated {
        /// Full current counts
        tally: Tally,
        /// Share of respondents per option
        percentages: Vec<(OptionId, u32)>,
    },
    /// The session is over
    SessionEnded(SessionSummary),
    /// Time left on the current question
    CountdownTick {
        /// The question being counted down
        item: ItemId,
        /// Seconds remaining
        #[serde_as(as = "serde_with::DurationSeconds<u64>")]
        remaining: Duration,
    },
    /// A request from this connection failed
    Rejected {
        /// Why
        error: Error,
    },
}

impl UpdateMessage {
    /// Builds a tally broadcast
    pub fn tally(tally: Tally) -> Self {
        Self::TallyUpdated {
            percentages: tally.percentages(),
            tally,
        }
    }

    /// Converts the update message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Full state sent to a connection when it attaches
#[serde_with::serde_as]
#[derive(Debug, Serialize, Clone)]
pub enum SyncMessage {
    /// The host's lobby view of a waiting session
    SessionCreated {
        /// The session
        session: SessionId,
        /// Code to hand out to participants
        join_code: JoinCode,
        /// Names on the roster so far
        roster: TruncatedVec<String>,
    },
    /// A participant's lobby view of a waiting session
    Waiting {
        /// Names on the roster so far
        roster: TruncatedVec<String>,
    },
    /// The current item of a running session
    Item {
        /// The item, without correct answers
        item: ItemView,
        /// Zero-based position
        index: usize,
        /// Number of items in the session
        count: usize,
        /// Whether this is the final item
        is_last: bool,
        /// Advisory time left, for questions
        #[serde_as(as = "Option<serde_with::DurationSeconds<u64>>")]
        remaining: Option<Duration>,
        /// Live tally, for questions
        tally: Option<Tally>,
        /// Whether the receiving participant has already answered
        answered: bool,
    },
    /// Results of a completed session
    SessionEnded(SessionSummary),
}

impl SyncMessage {
    /// Converts the sync message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}
