//! Part-string parser.
//!
//! A part string is a 3-character instrument key followed by note tokens:
//! one letter in `A`–`G` or `X`, an optional `#`, one octave digit 1–8, then
//! one or two duration digits. Scanning is non-overlapping and left-to-right;
//! characters that fit no token are silently skipped. Each call scans from a
//! fresh cursor, so parsing is a pure function of its input.

use super::error::NotationError;
use super::token::NoteToken;

/// Minimum part length: the instrument key alone.
const KEY_LEN: usize = 3;

/// A decoded part string: instrument key plus the ordered note tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPart {
    pub instrument_key: String,
    pub notes: Vec<NoteToken>,
}

/// Parse a part string into its instrument key and note tokens.
///
/// Fails with [`NotationError::MalformedPart`] when the string is shorter
/// than the 3-character key. Zero note tokens is a valid (empty) result.
pub fn parse_part(part: &str) -> Result<ParsedPart, NotationError> {
    let chars: Vec<char> = part.chars().collect();
    if chars.len() < KEY_LEN {
        return Err(NotationError::MalformedPart { len: chars.len() });
    }

    let instrument_key: String = chars[..KEY_LEN].iter().collect();
    let notes = scan_notes(&chars[KEY_LEN..]);

    Ok(ParsedPart {
        instrument_key,
        notes,
    })
}

/// Scan the body of a part for note tokens, skipping anything that does not
/// complete one.
fn scan_notes(chars: &[char]) -> Vec<NoteToken> {
    let mut notes = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        match scan_note_at(chars, pos) {
            Some((token, next)) => {
                notes.push(token);
                pos = next;
            }
            None => pos += 1,
        }
    }

    notes
}

/// Try to scan one note token starting exactly at `pos`.
///
/// Returns the token and the position just past it, or `None` if no token
/// starts here.
fn scan_note_at(chars: &[char], pos: usize) -> Option<(NoteToken, usize)> {
    let mut i = pos;

    let letter = *chars.get(i)?;
    if !matches!(letter, 'A'..='G' | 'X') {
        return None;
    }
    i += 1;

    let sharp = chars.get(i) == Some(&'#');
    if sharp {
        i += 1;
    }

    let octave = match chars.get(i)? {
        c @ '1'..='8' => *c as u8 - b'0',
        _ => return None,
    };
    i += 1;

    // Duration: one or two digits, taken greedily. A leading zero is fine
    // ("09" is nine) but the value itself must be at least 1.
    let first = match chars.get(i)? {
        c @ '0'..='9' => *c as u8 - b'0',
        _ => return None,
    };
    i += 1;

    let duration_code = match chars.get(i) {
        Some(c @ '0'..='9') => {
            i += 1;
            first * 10 + (*c as u8 - b'0')
        }
        _ => first,
    };
    if duration_code == 0 {
        return None;
    }

    Some((NoteToken::new(letter, sharp, octave, duration_code), i))
}
