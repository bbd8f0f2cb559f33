//! Note tokens — the parsed unit of notation.

/// A single parsed note: pitch letter, sharp flag, octave, and duration code.
///
/// The letter is one of `A`–`G` or `X` (a rest). Octave runs 1–8. The
/// duration code is a 1–2 digit integer ≥ 1 counted in sixteenth-equivalent
/// units (see [`note_duration`](super::note_duration)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteToken {
    pub letter: char,
    pub sharp: bool,
    pub octave: u8,
    pub duration_code: u8,
}

impl NoteToken {
    /// Create a pitched (or rest) token.
    pub fn new(letter: char, sharp: bool, octave: u8, duration_code: u8) -> Self {
        Self {
            letter,
            sharp,
            octave,
            duration_code,
        }
    }

    /// Whether this token is a rest (letter `X`, always 0 Hz).
    pub fn is_rest(&self) -> bool {
        self.letter == 'X'
    }

    /// The pitch-table key for this token: the letter plus `#` when sharp.
    pub fn name(&self) -> String {
        if self.sharp {
            format!("{}#", self.letter)
        } else {
            self.letter.to_string()
        }
    }
}
