//! Configuration constants for the live session core
//!
//! This module contains the compile-time limits used throughout the
//! session core to keep snapshotted content, rosters and submissions
//! within predictable bounds.

/// Session-wide limits
pub mod session {
    /// Maximum number of items (slides and questions) in a hosted sequence
    pub const MAX_ITEM_COUNT: usize = 200;
    /// Upper bound on participants a single session may hold
    pub const MAX_PARTICIPANT_COUNT: usize = 1000;
}

/// Join code configuration constants
pub mod join_code {
    /// Number of decimal digits in a join code
    pub const LENGTH: usize = 6;
    /// Exclusive upper bound of the numeric join code space
    pub const SPACE: u32 = 1_000_000;
}

/// Participant configuration constants
pub mod participant {
    /// Maximum length of a display name in characters
    pub const MAX_NAME_LENGTH: usize = 30;
}

/// Slide configuration constants
pub mod slide {
    /// Maximum length of a slide title
    pub const MAX_TITLE_LENGTH: usize = 200;
    /// Maximum length of a slide body
    pub const MAX_BODY_LENGTH: usize = 2000;
}

/// Question configuration constants
pub mod question {
    /// Maximum length of a question prompt
    pub const MAX_PROMPT_LENGTH: usize = 500;
    /// Minimum time budget in seconds for answering a question
    pub const MIN_TIME_LIMIT: u64 = 5;
    /// Maximum time budget in seconds for answering a question
    pub const MAX_TIME_LIMIT: u64 = 600;
    /// Maximum number of options on a choice-based question
    pub const MAX_OPTION_COUNT: usize = 10;
    /// Maximum length of an option's text
    pub const MAX_OPTION_TEXT_LENGTH: usize = 200;
}

/// Open-ended answer configuration constants
pub mod answer_text {
    /// Maximum length of a free-text answer in characters
    pub const MAX_LENGTH: usize = 500;
}
