//! Minuet — a miniature music-notation interpreter and real-time note sequencer.
//!
//! A part string like `"PIAC404D#48"` names a three-letter instrument and a
//! run of note tokens; [`notation`] decodes it into (Hz, seconds) pitch
//! events, and [`player`] loops each part through a [`engine::ToneEngine`]
//! forever, one independent sequencer per part.

pub mod engine;
pub mod notation;
pub mod player;
pub mod score;
