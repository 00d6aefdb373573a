use std::cmp::Ordering;

use super::TERMINATOR;
use super::ZERO;

/// Compare two parts the way the store orders their encodings.
///
/// Equivalent to `encode_part(a).cmp(&encode_part(b))` without allocating.
/// This is the order in which a cursor visits sibling parts, so anything that
/// merges cursor output (the set-operation engine) must use it rather than
/// plain byte comparison of the unescaped parts.
pub fn cmp_parts(a: &[u8], b: &[u8]) -> Ordering {
    encoded_bytes(a).cmp(encoded_bytes(b))
}

fn encoded_bytes(part: &[u8]) -> impl Iterator<Item = u8> + '_ {
    part.iter()
        .flat_map(|&b| std::iter::repeat_n(b, if b == ZERO { 2 } else { 1 }))
        .chain(TERMINATOR)
}
