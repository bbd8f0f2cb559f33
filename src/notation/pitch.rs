//! Octave-zero pitch table — reference frequencies for the 12 semitone names
//! plus the rest marker `X`.

use super::error::NotationError;

/// Look up the octave-zero reference frequency for a note name.
///
/// Accepts the 12 semitone names `C` through `B` (sharps spelled `C#`,
/// `D#`, `F#`, `G#`, `A#`) and `X`, the rest marker, which is 0 Hz.
/// Anything else is an [`NotationError::InvalidNote`].
pub fn base_frequency(name: &str) -> Result<f64, NotationError> {
    let hz = match name {
        "C" => 16.35,
        "C#" => 17.32,
        "D" => 18.35,
        "D#" => 19.45,
        "E" => 20.6,
        "F" => 21.83,
        "F#" => 23.12,
        "G" => 24.5,
        "G#" => 25.96,
        "A" => 27.5,
        "A#" => 29.14,
        "B" => 30.87,
        // A sharp on a rest is syntactically legal and still silent.
        "X" | "X#" => 0.0,
        _ => {
            return Err(NotationError::InvalidNote {
                name: name.to_string(),
            })
        }
    };
    Ok(hz)
}
