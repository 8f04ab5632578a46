//! Join code generation and parsing
//!
//! A join code is the short numeric string participants type to enter a
//! session. Codes are always displayed zero-padded to a fixed number of
//! digits so `"004211"` and `"4211"` are never confused.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::constants::join_code::{LENGTH, SPACE};

/// A human-readable code identifying a waiting or running session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JoinCode(u32);

/// Errors produced while parsing a join code
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// The code does not have exactly the expected number of digits
    #[error("join code must be {LENGTH} digits")]
    Length,
    /// The code contains something other than ASCII digits
    #[error("join code must only contain digits")]
    NotNumeric,
}

impl JoinCode {
    /// Creates a new random join code
    pub fn new() -> Self {
        Self(fastrand::u32(0..SPACE))
    }
}

impl Default for JoinCode {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for JoinCode {
    /// Formats the code as a zero-padded decimal string
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:0width$}", self.0, width = LENGTH)
    }
}

impl FromStr for JoinCode {
    type Err = ParseError;

    /// Parses a join code, tolerating surrounding whitespace
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Length`] when the trimmed input is not exactly
    /// [`LENGTH`] characters and [`ParseError::NotNumeric`] when it contains
    /// non-digit characters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::NotNumeric);
        }
        if s.len() != LENGTH {
            return Err(ParseError::Length);
        }
        s.parse::<u32>()
            .map(Self)
            .map_err(|_| ParseError::NotNumeric)
    }
}

impl Serialize for JoinCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for JoinCode {
    fn deserialize<D>(deserializer: D) -> Result<JoinCode, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        JoinCode::from_str(&s).map_err(|e| serde::de::Error::custom(e.to_string()))
    }
}
