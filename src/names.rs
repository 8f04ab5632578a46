//! Participant display name validation
//!
//! Names arrive with the join request and are shown on the host's lobby
//! and in roster broadcasts, so they are trimmed and filtered before they
//! are stored on the session.

use rustrict::CensorStr;
use serde::Serialize;
use thiserror::Error;

use crate::constants::participant::MAX_NAME_LENGTH;

/// Errors that can occur during name validation
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The name is empty or contains only whitespace
    #[error("name cannot be empty")]
    Empty,
    /// The name contains inappropriate content
    #[error("name is inappropriate")]
    Sinful,
    /// The name exceeds the maximum allowed length
    #[error("name is too long")]
    TooLong,
}

/// Cleans a requested display name
///
/// # Errors
///
/// * `Error::TooLong` - Name exceeds [`MAX_NAME_LENGTH`] characters after trimming
/// * `Error::Empty` - Name is empty after trimming whitespace
/// * `Error::Sinful` - Name contains inappropriate content
pub fn clean(name: &str) -> Result<String, Error> {
    let name = rustrict::trim_whitespace(name);
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(Error::TooLong);
    }
    if name.is_empty() {
        return Err(Error::Empty);
    }
    if name.is_inappropriate() {
        return Err(Error::Sinful);
    }
    Ok(name.to_owned())
}
