//! Score data model — instruments and tracks, as supplied by configuration.

pub mod config;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::engine::Waveform;

pub use config::ConfigError;

/// An effect stage to splice between a tone source and the output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectStage {
    Gain(f64),
    Pan(f64),
}

/// An instrument voice: waveform plus optional gain and pan.
///
/// Looked up by a 3-character key taken from the head of each part string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub waveform: Waveform,
    /// Output level in (0, 1]. Absent (or zero) means no gain stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gain: Option<f64>,
    /// Stereo position in [-1, 1]. Absent (or zero) means no pan stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pan: Option<f64>,
}

impl Instrument {
    /// The effect stages present on this instrument, in chain order
    /// (gain, then pan). A field that is absent or zero contributes no
    /// stage; the chain passes through.
    pub fn effect_stages(&self) -> Vec<EffectStage> {
        let mut stages = Vec::new();
        if let Some(gain) = self.gain.filter(|g| *g != 0.0) {
            stages.push(EffectStage::Gain(gain));
        }
        if let Some(pan) = self.pan.filter(|p| *p != 0.0) {
            stages.push(EffectStage::Pan(pan));
        }
        stages
    }
}

/// A track: tempo plus the raw part strings played concurrently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub bpm: u32,
    pub parts: Vec<String>,
}

/// Everything needed to play: instruments by key, tracks by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    #[serde(default)]
    pub instruments: HashMap<String, Instrument>,
    #[serde(default)]
    pub tracks: HashMap<String, Track>,
}

impl Score {
    pub fn instrument(&self, key: &str) -> Option<&Instrument> {
        self.instruments.get(key)
    }

    pub fn track(&self, name: &str) -> Option<&Track> {
        self.tracks.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instrument(gain: Option<f64>, pan: Option<f64>) -> Instrument {
        Instrument {
            waveform: Waveform::Sine,
            gain,
            pan,
        }
    }

    #[test]
    fn both_stages_in_order() {
        let stages = instrument(Some(0.8), Some(-0.5)).effect_stages();
        assert_eq!(stages, vec![EffectStage::Gain(0.8), EffectStage::Pan(-0.5)]);
    }

    #[test]
    fn absent_fields_yield_no_stages() {
        assert!(instrument(None, None).effect_stages().is_empty());
    }

    #[test]
    fn zero_counts_as_absent() {
        assert!(instrument(Some(0.0), Some(0.0)).effect_stages().is_empty());
        assert_eq!(
            instrument(Some(0.0), Some(1.0)).effect_stages(),
            vec![EffectStage::Pan(1.0)]
        );
    }

    #[test]
    fn score_lookups() {
        let mut score = Score::default();
        score.instruments.insert("PIA".into(), instrument(None, None));
        score.tracks.insert(
            "intro".into(),
            Track {
                bpm: 120,
                parts: vec!["PIAC44".into()],
            },
        );

        assert!(score.instrument("PIA").is_some());
        assert!(score.instrument("DRM").is_none());
        assert_eq!(score.track("intro").unwrap().bpm, 120);
        assert!(score.track("outro").is_none());
    }
}
