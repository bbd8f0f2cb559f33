//! Error types for notation decoding.

use std::fmt;

/// An error that occurred while decoding a part string.
#[derive(Debug, Clone, PartialEq)]
pub enum NotationError {
    /// The part string is too short to carry a 3-character instrument key.
    MalformedPart { len: usize },
    /// A note name outside the pitch table's 13 keys. Defensive: the scanner
    /// alphabet keeps this off every ordinary path (only spellings like `E#`
    /// can reach it).
    InvalidNote { name: String },
}

impl fmt::Display for NotationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotationError::MalformedPart { len } => {
                write!(f, "part string too short for instrument key ({len} chars, need 3)")
            }
            NotationError::InvalidNote { name } => {
                write!(f, "unrecognized note name: '{name}'")
            }
        }
    }
}

impl std::error::Error for NotationError {}
