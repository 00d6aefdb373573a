//! Property-based tests for the composite key codec.
//!
//! 1. **Roundtrip**: both decoders invert `encode`
//! 2. **Ordering**: encoded order equals part-wise order outside the
//!    zero-continuation exception
//! 3. **Prefix-free**: byte prefixes of encodings are part-wise prefixes
//! 4. **Successor bound**: `part_successor` bounds a whole subtree

use std::cmp::Ordering;

use proptest::prelude::*;

use crate::ZERO;
use crate::cmp_parts;
use crate::decode;
use crate::encode;
use crate::encode_into;
use crate::encode_part;
use crate::encoded_len;
use crate::i64_from_part;
use crate::i64_part;
use crate::part_successor;
use crate::split_first;
use crate::try_decode;

// =============================================================================
// Strategies for generating test data
// =============================================================================

/// Parts biased towards the interesting bytes: zero and the separator.
fn arb_part() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 0..12),
        prop::collection::vec(prop_oneof![Just(0u8), Just(1u8), Just(2u8), Just(b'a')], 0..8),
    ]
}

fn arb_parts() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(arb_part(), 0..5)
}

/// Parts without zero bytes, for which ordering holds unconditionally.
fn arb_zero_free_parts() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(1u8..=255, 0..6), 0..4)
}

/// True when the first differing parts of `a` and `b` are related as
/// `q = p ++ [0x00, ..]`.
fn hits_zero_continuation(a: &[Vec<u8>], b: &[Vec<u8>]) -> bool {
    let Some((p, q)) = a.iter().zip(b).find(|(p, q)| p != q) else {
        return false;
    };
    let (short, long) = if p.len() < q.len() { (p, q) } else { (q, p) };
    long.starts_with(short) && long[short.len()] == ZERO
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #[test]
    fn prop_roundtrip(parts in arb_parts()) {
        let key = encode(&parts);
        prop_assert_eq!(&decode(&key), &parts);
        prop_assert_eq!(try_decode(&key), Ok(parts));
    }

    #[test]
    fn prop_encoded_len(parts in arb_parts()) {
        prop_assert_eq!(encoded_len(&parts), encode(&parts).len());
    }

    #[test]
    fn prop_zero_free_ordering(a in arb_zero_free_parts(), b in arb_zero_free_parts()) {
        prop_assert_eq!(encode(&a).cmp(&encode(&b)), a.cmp(&b));
    }

    /// Ordering holds for arbitrary parts unless the first difference is a
    /// zero continuation.
    #[test]
    fn prop_ordering(a in arb_parts(), b in arb_parts()) {
        prop_assume!(!hits_zero_continuation(&a, &b));
        prop_assert_eq!(encode(&a).cmp(&encode(&b)), a.cmp(&b));
    }

    #[test]
    fn prop_cmp_parts_matches_encoding(a in arb_part(), b in arb_part()) {
        prop_assert_eq!(cmp_parts(&a, &b), encode_part(&a).cmp(&encode_part(&b)));
    }

    #[test]
    fn prop_prefix_free(a in arb_parts(), b in arb_parts()) {
        let ka = encode(&a);
        let kb = encode(&b);
        prop_assert_eq!(kb.starts_with(&ka), b.starts_with(&a));
    }

    #[test]
    fn prop_split_first_consumes_one_part(parts in prop::collection::vec(arb_part(), 1..5)) {
        let key = encode(&parts);
        let (first, consumed) = split_first(&key).expect("encoded key has a first part");
        prop_assert_eq!(&first, &parts[0]);
        prop_assert_eq!(consumed, encode_part(&parts[0]).len());
    }

    /// Everything nested under `part` sorts strictly between the part and its
    /// successor.
    #[test]
    fn prop_successor_bounds_subtree(part in arb_part(), rest in arb_parts()) {
        let bound = part_successor(&part);
        let mut nested = encode_part(&part);
        encode_into(&rest, &mut nested);
        prop_assert!(encode_part(&part) <= nested);
        prop_assert!(nested < bound);
    }

    /// A sibling sorting after `part` also sorts after its successor.
    #[test]
    fn prop_successor_below_later_siblings(a in arb_part(), b in arb_part()) {
        if cmp_parts(&a, &b) == Ordering::Less {
            prop_assert!(part_successor(&a) < encode_part(&b));
        }
    }

    #[test]
    fn prop_i64_part_ordering(a in any::<i64>(), b in any::<i64>()) {
        prop_assert_eq!(cmp_parts(&i64_part(a), &i64_part(b)), a.cmp(&b));
        prop_assert_eq!(i64_from_part(&i64_part(a)), Some(a));
    }
}
