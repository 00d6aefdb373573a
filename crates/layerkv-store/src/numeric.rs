//! Numeric record values.
//!
//! Counters are stored as eight big-endian bytes: two's complement for
//! integers, IEEE-754 bits for floats. Anything of another width is a type
//! mismatch rather than a zero.

use crate::error::StoreError;
use crate::error::StoreResult;

/// Width of every numeric value.
pub const NUMERIC_LEN: usize = 8;

pub fn encode_i64(n: i64) -> [u8; NUMERIC_LEN] {
    n.to_be_bytes()
}

pub fn decode_i64(value: &[u8]) -> StoreResult<i64> {
    Ok(i64::from_be_bytes(fixed(value, "i64")?))
}

pub fn encode_f64(n: f64) -> [u8; NUMERIC_LEN] {
    n.to_be_bytes()
}

pub fn decode_f64(value: &[u8]) -> StoreResult<f64> {
    Ok(f64::from_be_bytes(fixed(value, "f64")?))
}

fn fixed(value: &[u8], expected: &'static str) -> StoreResult<[u8; NUMERIC_LEN]> {
    value.try_into().map_err(|_| StoreError::TypeMismatch {
        expected,
        len: value.len(),
    })
}

/// Checks a compare-and-swap precondition against the current value.
///
/// `expected == None` asks for absence. An absent record with an expected
/// value is reported separately from a mismatch so callers can tell "gone"
/// from "changed".
pub fn check_cas_condition(expected: Option<&[u8]>, current: Option<&[u8]>) -> StoreResult<()> {
    match (expected, current) {
        (None, None) => Ok(()),
        (Some(_), None) => Err(StoreError::NoRecord),
        (None, Some(_)) => Err(StoreError::Conflict),
        (Some(want), Some(have)) if want == have => Ok(()),
        (Some(_), Some(_)) => Err(StoreError::Conflict),
    }
}
