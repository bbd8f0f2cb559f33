//! Part sequencer — one part's infinite playback loop.
//!
//! Plays the part's pitch events in order, one tone request per event,
//! advancing only on the engine's completion signal and wrapping back to the
//! first event after the last. The loop runs until the shared stop flag is
//! set; the flag is polled while waiting so a stop never blocks on a long
//! note.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use log::debug;

use crate::engine::ToneEngine;
use crate::notation::PitchEvent;
use crate::score::{EffectStage, Instrument};

/// How often a waiting sequencer rechecks the stop flag.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Per-part playback state: the resolved instrument, the fixed event
/// sequence computed once at startup, and the cursor of the note being
/// played.
pub struct PartSequencer {
    instrument: Instrument,
    events: Vec<PitchEvent>,
    cursor: usize,
}

impl PartSequencer {
    pub fn new(instrument: Instrument, events: Vec<PitchEvent>) -> Self {
        Self {
            instrument,
            events,
            cursor: 0,
        }
    }

    /// Number of events in the loop.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Run the loop until `stop` is set.
    ///
    /// A part with no events issues no tone requests and returns at once.
    pub fn run<E: ToneEngine>(mut self, engine: Arc<Mutex<E>>, stop: Arc<AtomicBool>) {
        if self.events.is_empty() {
            debug!("part has no notes; nothing to sequence");
            return;
        }

        while !stop.load(Ordering::Relaxed) {
            let event = self.events[self.cursor];
            debug!(
                "note {}/{}: {:.2} Hz for {:.3}s",
                self.cursor + 1,
                self.events.len(),
                event.frequency_hz,
                event.duration_secs
            );

            let completion = self.issue(&engine, event);
            if !wait_for_completion(&completion, &stop) {
                break;
            }
            self.cursor = (self.cursor + 1) % self.events.len();
        }
    }

    /// Issue one tone request: tone source, effect stages folded in chain
    /// order, output connection, start, and the scheduled stop. The engine
    /// lock is held only for the request itself, never while waiting.
    fn issue<E: ToneEngine>(&self, engine: &Arc<Mutex<E>>, event: PitchEvent) -> mpsc::Receiver<()> {
        // A sibling part panicking inside its own request poisons the lock;
        // the engine state is still usable, and part failures stay local.
        let mut engine = engine.lock().unwrap_or_else(|e| e.into_inner());

        let tone = engine.create_tone(self.instrument.waveform);
        engine.set_frequency(tone, event.frequency_hz);

        let mut tail = tone;
        for stage in self.instrument.effect_stages() {
            tail = match stage {
                EffectStage::Gain(level) => engine.attach_gain(tail, level),
                EffectStage::Pan(position) => engine.attach_pan(tail, position),
            };
        }
        engine.connect_to_output(tail);

        let completion = engine.start(tone);
        engine.stop(tone, event.duration_secs);
        completion
    }
}

/// Wait for the tone to finish, polling `stop` in between. Returns false if
/// the sequencer should shut down instead of advancing.
fn wait_for_completion(completion: &mpsc::Receiver<()>, stop: &AtomicBool) -> bool {
    loop {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        match completion.recv_timeout(STOP_POLL_INTERVAL) {
            Ok(()) => return true,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                // Engine went away mid-note; only a stop can end the loop.
                std::thread::sleep(STOP_POLL_INTERVAL);
            }
        }
    }
}
