//! Oscillator primitives — waveform shapes and per-phase sample generation.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Available waveform shapes. Lowercase in score files
/// (`sine`, `square`, `sawtooth`, `triangle`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// Generate a single sample for the given waveform at the specified phase.
///
/// `phase` is in the range [0.0, 1.0), representing one full cycle.
/// Returns a value in [-1.0, 1.0].
pub fn oscillator(waveform: Waveform, phase: f64) -> f64 {
    match waveform {
        Waveform::Sine => (phase * 2.0 * PI).sin(),
        Waveform::Sawtooth => 2.0 * phase - 1.0,
        Waveform::Square => {
            if phase < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Triangle => {
            if phase < 0.25 {
                4.0 * phase
            } else if phase < 0.75 {
                2.0 - 4.0 * phase
            } else {
                4.0 * phase - 4.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_at_zero() {
        let v = oscillator(Waveform::Sine, 0.0);
        assert!(v.abs() < 1e-10);
    }

    #[test]
    fn sine_at_quarter() {
        let v = oscillator(Waveform::Sine, 0.25);
        assert!((v - 1.0).abs() < 1e-10);
    }

    #[test]
    fn sawtooth_ramps() {
        assert!((oscillator(Waveform::Sawtooth, 0.0) - (-1.0)).abs() < 1e-10);
        assert!(oscillator(Waveform::Sawtooth, 0.5).abs() < 1e-10);
        assert!((oscillator(Waveform::Sawtooth, 1.0) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn square_halves() {
        assert!((oscillator(Waveform::Square, 0.25) - 1.0).abs() < 1e-10);
        assert!((oscillator(Waveform::Square, 0.75) - (-1.0)).abs() < 1e-10);
    }

    #[test]
    fn triangle_vertices() {
        assert!(oscillator(Waveform::Triangle, 0.0).abs() < 1e-10);
        assert!((oscillator(Waveform::Triangle, 0.25) - 1.0).abs() < 1e-10);
        assert!(oscillator(Waveform::Triangle, 0.5).abs() < 1e-10);
        assert!((oscillator(Waveform::Triangle, 0.75) - (-1.0)).abs() < 1e-10);
    }

    #[test]
    fn all_waveforms_bounded() {
        for wf in [
            Waveform::Sine,
            Waveform::Sawtooth,
            Waveform::Square,
            Waveform::Triangle,
        ] {
            for i in 0..1000 {
                let phase = i as f64 / 1000.0;
                let v = oscillator(wf, phase);
                assert!(
                    v >= -1.0 && v <= 1.0,
                    "{wf:?} at phase {phase}: {v} out of bounds"
                );
            }
        }
    }

    #[test]
    fn waveform_yaml_names() {
        let wf: Waveform = serde_yaml::from_str("sawtooth").unwrap();
        assert_eq!(wf, Waveform::Sawtooth);
        assert_eq!(serde_yaml::to_string(&Waveform::Sine).unwrap().trim(), "sine");
    }
}
