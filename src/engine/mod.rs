//! Tone engines — the audio-graph collaborator behind playback.
//!
//! The sequencer talks to a [`ToneEngine`]: create a tone source, set its
//! frequency, optionally chain gain and pan stages onto it, connect the tail
//! of the chain to the output, then start the tone and schedule its stop.
//! The engine reports end-of-playback through the channel returned by
//! [`ToneEngine::start`]; that signal is what advances the sequencer.

pub mod capture;
pub mod oscillator;
pub mod synth;

use std::sync::mpsc;

pub use capture::{CaptureEngine, CaptureLog, ToneRequest};
pub use oscillator::{oscillator, Waveform};
pub use synth::{SynthEngine, SynthError};

/// Identifies a node (tone source or effect stage) in an engine's graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

/// The audio-graph contract consumed by the sequencer.
///
/// Per note, the expected call order is: [`create_tone`], [`set_frequency`],
/// zero or more of [`attach_gain`]/[`attach_pan`] (each returns the new chain
/// tail to feed into the next stage), [`connect_to_output`] on the tail,
/// then [`start`] and [`stop`] on the tone node. Nodes are single-use; the
/// engine reclaims a chain once its stop has been scheduled.
///
/// [`create_tone`]: ToneEngine::create_tone
/// [`set_frequency`]: ToneEngine::set_frequency
/// [`attach_gain`]: ToneEngine::attach_gain
/// [`attach_pan`]: ToneEngine::attach_pan
/// [`connect_to_output`]: ToneEngine::connect_to_output
/// [`start`]: ToneEngine::start
/// [`stop`]: ToneEngine::stop
pub trait ToneEngine: Send {
    /// Create a new tone source with the given waveform.
    fn create_tone(&mut self, waveform: Waveform) -> NodeId;

    /// Set the tone's frequency in Hz. 0 Hz plays as silence.
    fn set_frequency(&mut self, node: NodeId, hz: f64);

    /// Chain a gain stage (level in (0, 1]) onto `node`; returns the stage.
    fn attach_gain(&mut self, node: NodeId, level: f64) -> NodeId;

    /// Chain a stereo pan stage (position in [-1, 1]) onto `node`; returns
    /// the stage.
    fn attach_pan(&mut self, node: NodeId, position: f64) -> NodeId;

    /// Connect the tail of a chain to the audio output. Concurrent chains
    /// from independent parts mix at the output.
    fn connect_to_output(&mut self, node: NodeId);

    /// Start the tone. The returned channel yields one message when the tone
    /// has finished playing.
    fn start(&mut self, node: NodeId) -> mpsc::Receiver<()>;

    /// Schedule the tone to stop `at_offset_secs` seconds from now.
    fn stop(&mut self, node: NodeId, at_offset_secs: f64);
}
