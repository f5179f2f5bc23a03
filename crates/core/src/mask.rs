//! Matriculation number masking for device-facing responses.

/// Character used to mask hidden digits.
const MASK_CHAR: char = '*';

/// How many trailing characters stay visible.
const UNMASKED_SUFFIX: usize = 3;

/// Mask a matriculation number, keeping only the trailing characters
/// visible. Terminals display this to the swiping student; the full number
/// never leaves the operator API.
pub fn matriculation(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= UNMASKED_SUFFIX {
        return value.to_string();
    }
    let masked = chars.len() - UNMASKED_SUFFIX;
    let mut out = String::with_capacity(chars.len());
    for _ in 0..masked {
        out.push(MASK_CHAR);
    }
    out.extend(&chars[masked..]);
    out
}
