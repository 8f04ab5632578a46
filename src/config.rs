//! Runtime settings for the session controller
//!
//! Unlike [`crate::constants`], these values are chosen by the embedding
//! service (usually deserialized from its own configuration file) and are
//! validated once when the controller is built.

use std::time::Duration;

use garde::Validate;
use serde::{Deserialize, Serialize};

type ValidationResult = garde::Result;

/// Validates that the countdown tick interval is within [100ms, 10s]
fn validate_tick_interval(val: &Duration, _ctx: &()) -> ValidationResult {
    if (100..=10_000).contains(&val.as_millis()) {
        Ok(())
    } else {
        Err(garde::Error::new(
            "tick_interval is outside of the bounds [100ms,10000ms]",
        ))
    }
}

/// Controller settings
#[serde_with::serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    /// Maximum number of participants a single session accepts
    #[garde(range(min = 1, max = crate::constants::session::MAX_PARTICIPANT_COUNT))]
    pub max_participants: usize,
    /// How often the advisory countdown is rebroadcast
    #[garde(custom(validate_tick_interval))]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub tick_interval: Duration,
    /// How many random join codes to try before giving up
    #[garde(range(min = 1, max = 1000))]
    pub join_code_attempts: usize,
    /// How many participant names are included in roster broadcasts
    #[garde(range(min = 1))]
    pub roster_display_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_participants: crate::constants::session::MAX_PARTICIPANT_COUNT,
            tick_interval: Duration::from_secs(1),
            join_code_attempts: 32,
            roster_display_limit: 50,
        }
    }
}
