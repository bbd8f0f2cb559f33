//! Capture engine — a hardware-free [`ToneEngine`] for tests.
//!
//! Records every fully scheduled tone as a [`ToneRequest`] and completes the
//! first N of them instantly, so a sequencer under test races through exactly
//! N notes and then parks until it is stopped. The request log is shared, so
//! a test can keep a handle while the player owns the engine.

use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use super::oscillator::Waveform;
use super::{NodeId, ToneEngine};

/// One observed tone: the full effect-chain settings plus scheduled duration.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneRequest {
    pub waveform: Waveform,
    pub frequency_hz: f64,
    pub gain: Option<f64>,
    pub pan: Option<f64>,
    pub duration_secs: f64,
    pub connected: bool,
}

/// Shared view of the requests a [`CaptureEngine`] has recorded.
#[derive(Debug, Clone, Default)]
pub struct CaptureLog(Arc<Mutex<Vec<ToneRequest>>>);

impl CaptureLog {
    /// Snapshot of all requests recorded so far.
    pub fn snapshot(&self) -> Vec<ToneRequest> {
        self.0.lock().unwrap().clone()
    }

    /// Number of requests recorded so far.
    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&self, request: ToneRequest) {
        self.0.lock().unwrap().push(request);
    }
}

/// A tone chain under construction.
#[derive(Debug, Clone)]
struct PendingTone {
    waveform: Waveform,
    frequency_hz: f64,
    gain: Option<f64>,
    pan: Option<f64>,
    connected: bool,
    done: Option<mpsc::Sender<()>>,
}

/// Recording tone engine. See the module docs for the completion-limit
/// device that makes loop tests deterministic.
pub struct CaptureEngine {
    log: CaptureLog,
    tones: HashMap<u64, PendingTone>,
    /// Maps every node in a chain (tone or effect stage) to its tone id.
    chain_roots: HashMap<NodeId, u64>,
    next_id: u64,
    /// Completions left to hand out; `None` means unlimited.
    completions: Option<usize>,
    /// Senders withheld past the completion limit, kept alive so waiting
    /// receivers see a timeout rather than a disconnect.
    held: Vec<mpsc::Sender<()>>,
}

impl CaptureEngine {
    /// Engine that completes every tone instantly.
    pub fn new() -> Self {
        Self::with_completions(None)
    }

    /// Engine that completes only the first `limit` tones.
    pub fn with_completion_limit(limit: usize) -> Self {
        Self::with_completions(Some(limit))
    }

    fn with_completions(completions: Option<usize>) -> Self {
        Self {
            log: CaptureLog::default(),
            tones: HashMap::new(),
            chain_roots: HashMap::new(),
            next_id: 0,
            completions,
            held: Vec::new(),
        }
    }

    /// Shared handle to the request log.
    pub fn log(&self) -> CaptureLog {
        self.log.clone()
    }

    fn alloc(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn tone_mut(&mut self, node: NodeId) -> Option<&mut PendingTone> {
        let root = *self.chain_roots.get(&node)?;
        self.tones.get_mut(&root)
    }
}

impl Default for CaptureEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ToneEngine for CaptureEngine {
    fn create_tone(&mut self, waveform: Waveform) -> NodeId {
        let id = self.alloc();
        self.chain_roots.insert(id, id.0);
        self.tones.insert(
            id.0,
            PendingTone {
                waveform,
                frequency_hz: 0.0,
                gain: None,
                pan: None,
                connected: false,
                done: None,
            },
        );
        id
    }

    fn set_frequency(&mut self, node: NodeId, hz: f64) {
        if let Some(tone) = self.tone_mut(node) {
            tone.frequency_hz = hz;
        }
    }

    fn attach_gain(&mut self, node: NodeId, level: f64) -> NodeId {
        let stage = self.alloc();
        if let Some(&root) = self.chain_roots.get(&node) {
            self.chain_roots.insert(stage, root);
            if let Some(tone) = self.tones.get_mut(&root) {
                tone.gain = Some(level);
            }
        }
        stage
    }

    fn attach_pan(&mut self, node: NodeId, position: f64) -> NodeId {
        let stage = self.alloc();
        if let Some(&root) = self.chain_roots.get(&node) {
            self.chain_roots.insert(stage, root);
            if let Some(tone) = self.tones.get_mut(&root) {
                tone.pan = Some(position);
            }
        }
        stage
    }

    fn connect_to_output(&mut self, node: NodeId) {
        if let Some(tone) = self.tone_mut(node) {
            tone.connected = true;
        }
    }

    fn start(&mut self, node: NodeId) -> mpsc::Receiver<()> {
        let (done, completion) = mpsc::channel();
        if let Some(tone) = self.tone_mut(node) {
            tone.done = Some(done);
        }
        completion
    }

    fn stop(&mut self, node: NodeId, at_offset_secs: f64) {
        let Some(&root) = self.chain_roots.get(&node) else {
            return;
        };
        let Some(tone) = self.tones.remove(&root) else {
            return;
        };
        self.chain_roots.retain(|_, r| *r != root);

        self.log.record(ToneRequest {
            waveform: tone.waveform,
            frequency_hz: tone.frequency_hz,
            gain: tone.gain,
            pan: tone.pan,
            duration_secs: at_offset_secs,
            connected: tone.connected,
        });

        if let Some(done) = tone.done {
            let allow = match self.completions.as_mut() {
                None => true,
                Some(0) => false,
                Some(n) => {
                    *n -= 1;
                    true
                }
            };
            if allow {
                let _ = done.send(());
            } else {
                self.held.push(done);
            }
        }
    }
}
