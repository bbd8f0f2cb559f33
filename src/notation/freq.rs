//! Pitch/duration calculator — resolves note tokens against a tempo.
//!
//! Frequencies follow equal temperament: every octave doubles the table's
//! octave-zero reference, expressed as the twelfth root of two raised to
//! twelve semitones per octave, exactly as the notation was authored against.

use super::error::NotationError;
use super::pitch::base_frequency;
use super::token::NoteToken;

const TWELFTH_ROOT_OF_TWO: f64 = 1.059463094359;
const SEMITONES_PER_OCTAVE: u32 = 12;
const CROTCHETS_PER_BAR: u32 = 4;

/// A resolved note, ready for playback: frequency in Hz (0 for a rest) and
/// duration in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEvent {
    pub frequency_hz: f64,
    pub duration_secs: f64,
}

/// Resolve one token's frequency in Hz.
///
/// The octave acts as a linear exponent of two on the octave-zero reference;
/// rests resolve to 0 Hz at any octave.
pub fn note_frequency(token: &NoteToken) -> Result<f64, NotationError> {
    let base = base_frequency(&token.name())?;
    Ok(base * TWELFTH_ROOT_OF_TWO.powf((SEMITONES_PER_OCTAVE * token.octave as u32) as f64))
}

/// Convert a duration code to seconds at the given tempo.
///
/// Formula: `code / (bpm / 60) / 4`. The trailing division by 4 reads the
/// code as sixteenth-equivalent units relative to crotchets, which
/// double-discounts against conventional notation (code 4 at 120 BPM is
/// 0.5 s, not 2 s). Existing scores are authored against this timing, so it
/// is kept as-is.
pub fn note_duration(duration_code: u8, bpm: u32) -> f64 {
    let crotchets_per_second = bpm as f64 / 60.0;
    duration_code as f64 / crotchets_per_second / CROTCHETS_PER_BAR as f64
}

/// Resolve a token sequence into pitch events at the given tempo.
///
/// Pure: the same tokens and tempo always produce the same events.
pub fn pitch_events(tokens: &[NoteToken], bpm: u32) -> Result<Vec<PitchEvent>, NotationError> {
    tokens
        .iter()
        .map(|token| {
            Ok(PitchEvent {
                frequency_hz: note_frequency(token)?,
                duration_secs: note_duration(token.duration_code, bpm),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn freq(letter: char, sharp: bool, octave: u8) -> f64 {
        note_frequency(&NoteToken::new(letter, sharp, octave, 4)).unwrap()
    }

    #[test]
    fn a4_is_concert_pitch() {
        // 27.5 Hz base doubled four times, within the constant's precision.
        assert_approx_eq!(freq('A', false, 4), 440.0, 0.01);
    }

    #[test]
    fn octave_doubles_frequency() {
        for letter in ['A', 'B', 'C', 'D', 'E', 'F', 'G'] {
            for octave in 2..=8u8 {
                let lower = freq(letter, false, octave - 1);
                let upper = freq(letter, false, octave);
                assert_approx_eq!(upper / lower, 2.0, 1e-6);
            }
        }
    }

    #[test]
    fn rest_is_zero_at_every_octave() {
        for octave in 1..=8u8 {
            assert_eq!(freq('X', false, octave), 0.0);
        }
    }

    #[test]
    fn sharp_raises_frequency() {
        assert!(freq('C', true, 4) > freq('C', false, 4));
    }

    #[test]
    fn unknown_spelling_is_invalid() {
        let err = note_frequency(&NoteToken::new('E', true, 4, 4)).unwrap_err();
        assert_eq!(err, NotationError::InvalidNote { name: "E#".into() });
    }

    #[test]
    fn quarter_code_at_120_bpm() {
        assert_approx_eq!(note_duration(4, 120), 0.5);
    }

    #[test]
    fn duration_formula() {
        // code / (bpm/60) / 4, verbatim.
        assert_approx_eq!(note_duration(9, 60), 9.0 / 1.0 / 4.0);
        assert_approx_eq!(note_duration(1, 90), 1.0 / 1.5 / 4.0);
        assert_approx_eq!(note_duration(16, 120), 2.0);
    }

    #[test]
    fn duration_scales_linearly_with_code() {
        let one = note_duration(1, 100);
        for code in 2..=99u8 {
            assert_approx_eq!(note_duration(code, 100), one * code as f64, 1e-9);
        }
    }

    #[test]
    fn events_carry_frequency_and_duration() {
        let tokens = [
            NoteToken::new('C', false, 4, 4),
            NoteToken::new('X', false, 4, 2),
        ];
        let events = pitch_events(&tokens, 120).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].frequency_hz > 0.0);
        assert_approx_eq!(events[0].duration_secs, 0.5);
        assert_eq!(events[1].frequency_hz, 0.0);
        assert_approx_eq!(events[1].duration_secs, 0.25);
    }

    #[test]
    fn recomputation_is_identical() {
        let tokens = [
            NoteToken::new('G', true, 3, 12),
            NoteToken::new('A', false, 2, 7),
        ];
        let a = pitch_events(&tokens, 97).unwrap();
        let b = pitch_events(&tokens, 97).unwrap();
        assert_eq!(a, b);
    }
}
