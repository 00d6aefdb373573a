//! Composite key codec.
//!
//! A composite key is an ordered sequence of opaque byte strings ("parts")
//! packed into a single byte string that an ordered key-value store can sort
//! and range-scan.
//!
//! # Layout
//!
//! Every part is escaped and then terminated:
//!
//! | Input | Output |
//! |-------|--------|
//! | `0x00` inside a part | `0x00 0x00` |
//! | any other byte | the byte itself |
//! | end of part | `0x00 0x01` |
//!
//! The composite key is the concatenation of the encoded parts. This layout is
//! the on-disk contract: two implementations must produce identical bytes to
//! share a store.
//!
//! # Guarantees
//!
//! 1. **Lossless**: `decode(encode(parts)) == parts`, including empty parts and
//!    parts containing `0x00`.
//! 2. **Prefix-free**: `encode(p)` is a byte prefix of `encode(q)` iff `p` is a
//!    part-wise prefix of `q`, so a byte range scan over `encode(p)` visits
//!    exactly the descendants of `p`.
//! 3. **Ordered**: byte order of encodings equals part-wise lexicographic
//!    order, except when one part continues another with a zero byte
//!    (`q = p ++ [0x00, ..]` sorts before `p`). Fixed-width parts such as the
//!    ones produced by [`i64_part`] never hit that case.
//!
//! # Example
//!
//! ```
//! use layerkv_codec::{decode, encode};
//!
//! let key = encode(["users", "alice"]);
//! assert_eq!(key, b"users\x00\x01alice\x00\x01");
//! assert_eq!(decode(&key), vec![b"users".to_vec(), b"alice".to_vec()]);
//! ```

mod decoding;
mod encoding;
mod ordered_int;
mod ordering;

#[cfg(test)]
mod proptest;

pub use decoding::decode;
pub use decoding::split_first;
pub use decoding::try_decode;
pub use encoding::encode;
pub use encoding::encode_into;
pub use encoding::encode_part;
pub use encoding::encoded_len;
pub use encoding::escape;
pub use encoding::escape_into;
pub use encoding::part_successor;
pub use ordered_int::i64_from_part;
pub use ordered_int::i64_part;
pub use ordered_int::u64_from_part;
pub use ordered_int::u64_part;
pub use ordering::cmp_parts;
use snafu::Snafu;

/// Escape marker. Doubled inside parts, first byte of every terminator.
pub const ZERO: u8 = 0x00;

/// Second byte of the part terminator.
pub const SEPARATOR: u8 = 0x01;

/// Bytes appended after every escaped part.
pub const TERMINATOR: [u8; 2] = [ZERO, SEPARATOR];

/// Bytes appended after an escaped part to bound all of its descendants.
pub const SUCCESSOR: [u8; 2] = [ZERO, SEPARATOR + 1];

/// Errors reported by [`try_decode`].
///
/// The lenient [`decode`] never fails; these only surface where a caller asks
/// for strict validation of a key read back from a store.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum CodecError {
    /// A part started at `offset` but no terminator followed.
    #[snafu(display("unterminated key part starting at offset {offset}"))]
    Unterminated {
        /// Byte offset of the first byte of the part.
        offset: usize,
    },

    /// A zero byte was followed by something other than `0x00` or `0x01`.
    #[snafu(display("invalid escape sequence at offset {offset}"))]
    InvalidEscape {
        /// Byte offset of the zero byte.
        offset: usize,
    },
}
