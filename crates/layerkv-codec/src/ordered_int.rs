//! Fixed-width integer parts that sort numerically.
//!
//! Parts compare as escaped bytes, so `b"10" < b"9"`. Callers that want a
//! numeric order under a prefix (for set-operation suffixes in particular)
//! store integers through these helpers. Every value is exactly eight bytes,
//! which keeps them clear of the zero-continuation ordering exception.

/// Big-endian part for an unsigned integer.
pub fn u64_part(n: u64) -> [u8; 8] {
    n.to_be_bytes()
}

/// Part for a signed integer: sign bit flipped so negatives sort first.
pub fn i64_part(n: i64) -> [u8; 8] {
    ((n as u64) ^ (1 << 63)).to_be_bytes()
}

/// Inverse of [`u64_part`]. `None` unless the part is exactly eight bytes.
pub fn u64_from_part(part: &[u8]) -> Option<u64> {
    let bytes: [u8; 8] = part.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

/// Inverse of [`i64_part`]. `None` unless the part is exactly eight bytes.
pub fn i64_from_part(part: &[u8]) -> Option<i64> {
    u64_from_part(part).map(|n| (n ^ (1 << 63)) as i64)
}
