//! Track player — resolves a named track and launches one sequencer per part.
//!
//! `play` parses every part string, resolves its instrument, computes its
//! pitch-event sequence once, and spawns an independent sequencer thread for
//! it. Parts share nothing but the engine; they drift apart according to
//! their own note durations. A part that fails to start is logged and
//! skipped without touching its siblings. The returned [`PlaybackHandle`] is
//! the only way to end playback.

pub mod sequencer;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use log::{info, warn};

use crate::engine::ToneEngine;
use crate::notation::{parse_part, pitch_events, NotationError};
use crate::score::Score;

pub use sequencer::PartSequencer;

/// An error starting playback.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayError {
    /// The requested track is not in the score. The only error `play`
    /// surfaces to its caller.
    UnknownTrack(String),
    /// A part's instrument key has no matching instrument.
    UnknownInstrument { key: String },
    /// A part string failed to decode.
    Notation(NotationError),
}

impl fmt::Display for PlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayError::UnknownTrack(name) => write!(f, "unknown track: '{name}'"),
            PlayError::UnknownInstrument { key } => write!(f, "unknown instrument: '{key}'"),
            PlayError::Notation(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PlayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlayError::Notation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<NotationError> for PlayError {
    fn from(e: NotationError) -> Self {
        PlayError::Notation(e)
    }
}

/// Running playback: the stop flag and the per-part sequencer threads.
///
/// Playback is otherwise unbounded; dropping the handle without calling
/// [`stop`](PlaybackHandle::stop) leaves the loops running.
#[derive(Debug)]
pub struct PlaybackHandle {
    stop: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
}

impl PlaybackHandle {
    /// Number of parts that actually started.
    pub fn part_count(&self) -> usize {
        self.threads.len()
    }

    /// Signal every sequencer to stop and wait for them to finish. Returns
    /// once all part threads have joined.
    pub fn stop(self) {
        self.stop.store(true, Ordering::Relaxed);
        for handle in self.threads {
            if handle.join().is_err() {
                warn!("a part sequencer panicked");
            }
        }
    }
}

/// Plays named tracks from a [`Score`] through a shared tone engine.
///
/// The engine is injected at construction and shared with every sequencer —
/// the one resource all concurrent parts mix into.
pub struct TrackPlayer<E: ToneEngine> {
    engine: Arc<Mutex<E>>,
    score: Score,
}

impl<E: ToneEngine + 'static> TrackPlayer<E> {
    pub fn new(engine: E, score: Score) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            score,
        }
    }

    /// Start playing the named track. Returns immediately after launching
    /// one sequencer loop per startable part.
    ///
    /// Fails only with [`PlayError::UnknownTrack`]; a part that cannot start
    /// (malformed string, unknown instrument, bad note spelling) is logged
    /// at warn level and skipped.
    pub fn play(&self, track_name: &str) -> Result<PlaybackHandle, PlayError> {
        let track = self
            .score
            .track(track_name)
            .ok_or_else(|| PlayError::UnknownTrack(track_name.to_string()))?;

        let stop = Arc::new(AtomicBool::new(false));
        let mut threads = Vec::new();

        for part in &track.parts {
            match self.prepare_part(part, track.bpm) {
                Ok(sequencer) => {
                    info!("part '{part}': {} notes", sequencer.len());
                    let engine = Arc::clone(&self.engine);
                    let stop = Arc::clone(&stop);
                    threads.push(thread::spawn(move || sequencer.run(engine, stop)));
                }
                Err(e) => warn!("skipping part '{part}': {e}"),
            }
        }

        Ok(PlaybackHandle { stop, threads })
    }

    /// Decode one part string into a ready sequencer: key, instrument,
    /// events.
    fn prepare_part(&self, part: &str, bpm: u32) -> Result<PartSequencer, PlayError> {
        let parsed = parse_part(part)?;
        let instrument =
            *self
                .score
                .instrument(&parsed.instrument_key)
                .ok_or(PlayError::UnknownInstrument {
                    key: parsed.instrument_key.clone(),
                })?;
        let events = pitch_events(&parsed.notes, bpm)?;
        Ok(PartSequencer::new(instrument, events))
    }
}
