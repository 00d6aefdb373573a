use super::SUCCESSOR;
use super::TERMINATOR;
use super::ZERO;

// =============================================================================
// Encoding Functions
// =============================================================================

/// Escape a single part without terminating it.
///
/// Every `0x00` is doubled. The result is what a part contributes to a key
/// before its terminator, and is also the right shape for "starts with"
/// matches against the next part of a key.
pub fn escape(part: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(part.len() + 1);
    escape_into(part, &mut buf);
    buf
}

/// Escape a single part into an existing buffer.
pub fn escape_into(part: &[u8], buf: &mut Vec<u8>) {
    for &b in part {
        buf.push(b);
        if b == ZERO {
            buf.push(ZERO);
        }
    }
}

/// Encode a single part: escaped bytes followed by the terminator.
pub fn encode_part(part: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(part.len() + TERMINATOR.len());
    escape_into(part, &mut buf);
    buf.extend_from_slice(&TERMINATOR);
    buf
}

/// Encode a sequence of parts into one sortable key.
///
/// Total: every input, including an empty sequence or empty parts, has an
/// encoding.
pub fn encode<I>(parts: I) -> Vec<u8>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let mut buf = Vec::new();
    encode_into(parts, &mut buf);
    buf
}

/// Encode a sequence of parts, appending to `buf`.
pub fn encode_into<I>(parts: I, buf: &mut Vec<u8>)
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    for part in parts {
        escape_into(part.as_ref(), buf);
        buf.extend_from_slice(&TERMINATOR);
    }
}

/// Length of `encode(parts)` without building it.
pub fn encoded_len<I>(parts: I) -> usize
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    parts
        .into_iter()
        .map(|part| {
            let part = part.as_ref();
            let zeros = part.iter().filter(|&&b| b == ZERO).count();
            part.len() + zeros + TERMINATOR.len()
        })
        .sum()
}

/// Smallest byte string above `encode_part(part)` and every key nested under it.
///
/// A descendant of `part` starts with `escape(part) ++ [0x00, 0x01]`; replacing
/// the terminator with `[0x00, 0x02]` gives a bound that no descendant reaches,
/// while any sibling sorting after `part` differs before the terminator and so
/// stays above it. Seeking to `prefix ++ part_successor(part)` therefore skips
/// a whole subtree in one jump.
pub fn part_successor(part: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(part.len() + SUCCESSOR.len());
    escape_into(part, &mut buf);
    buf.extend_from_slice(&SUCCESSOR);
    buf
}
