//! Notation — decoding part strings into playable pitch events.
//!
//! A part string starts with a three-letter instrument key followed by note
//! tokens (`C44`, `D#48`, `X42`, ...). [`parse_part`] extracts the key and
//! tokens; [`pitch_events`] resolves tokens against a tempo into
//! (frequency, duration) pairs ready for the sequencer.

pub mod error;
pub mod freq;
pub mod parser;
pub mod pitch;
pub mod token;

pub use error::NotationError;
pub use freq::{note_duration, note_frequency, pitch_events, PitchEvent};
pub use parser::{parse_part, ParsedPart};
pub use pitch::base_frequency;
pub use token::NoteToken;
