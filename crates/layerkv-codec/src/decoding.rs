use super::CodecError;
use super::SEPARATOR;
use super::ZERO;

// =============================================================================
// Decoding Functions
// =============================================================================

/// Decode a key into its parts.
///
/// Lenient: a zero byte followed by anything but the separator is read as an
/// escaped zero, and an unterminated tail (including a lone trailing zero) is
/// dropped. Keys produced by [`encode`](crate::encode), or prefixes of them cut
/// at part boundaries, decode exactly.
pub fn decode(key: &[u8]) -> Vec<Vec<u8>> {
    let mut parts = Vec::new();
    let mut current = Vec::new();
    let mut i = 0;

    while i < key.len() {
        let b = key[i];
        if b != ZERO {
            current.push(b);
            i += 1;
            continue;
        }

        match key.get(i + 1) {
            Some(&SEPARATOR) => parts.push(std::mem::take(&mut current)),
            Some(_) => current.push(ZERO),
            None => break,
        }
        i += 2;
    }

    parts
}

/// Decode a key, rejecting anything [`encode`](crate::encode) cannot produce.
pub fn try_decode(key: &[u8]) -> Result<Vec<Vec<u8>>, CodecError> {
    let mut parts = Vec::new();
    let mut offset = 0;

    while offset < key.len() {
        let (part, consumed) = decode_part(key, offset)?;
        parts.push(part);
        offset += consumed;
    }

    Ok(parts)
}

/// Decode only the first part of `key`.
///
/// Returns the part and the number of bytes it occupied, terminator included.
/// `None` when the first part is unterminated or badly escaped. A caller
/// holding the key of a record under some prefix uses this to tell an
/// immediate child (`consumed == rest.len()`) from a deeper descendant.
pub fn split_first(key: &[u8]) -> Option<(Vec<u8>, usize)> {
    decode_part(key, 0).ok()
}

/// Decode one part starting at `start`.
fn decode_part(data: &[u8], start: usize) -> Result<(Vec<u8>, usize), CodecError> {
    let mut part = Vec::new();
    let mut i = start;

    while i < data.len() {
        let b = data[i];
        if b != ZERO {
            part.push(b);
            i += 1;
            continue;
        }

        match data.get(i + 1) {
            Some(&SEPARATOR) => return Ok((part, i + 2 - start)),
            Some(&ZERO) => {
                part.push(ZERO);
                i += 2;
            }
            Some(_) => return Err(CodecError::InvalidEscape { offset: i }),
            None => break,
        }
    }

    Err(CodecError::Unterminated { offset: start })
}
