//! Behaviour every `OrderedStore` backend must share.

use std::collections::BTreeMap;

use layerkv_store::MemoryStore;
use layerkv_store::OrderedStore;
use layerkv_store::RedbStore;
use layerkv_store::Regex;
use layerkv_store::StoreError;
use layerkv_store::numeric::encode_i64;
use proptest::prelude::*;
use tempfile::TempDir;

enum Backend {
    Memory(MemoryStore),
    Redb(RedbStore, TempDir),
}

fn backends() -> Vec<Backend> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let dir = TempDir::new().unwrap();
    let redb = RedbStore::open(dir.path().join("contract.redb")).unwrap();
    vec![Backend::Memory(MemoryStore::new()), Backend::Redb(redb, dir)]
}

/// Runs the body once per backend, binding the store to `$store`.
macro_rules! for_each_backend {
    (|$store:ident| $body:block) => {
        for backend in backends() {
            match &backend {
                Backend::Memory($store) => $body,
                Backend::Redb($store, _) => $body,
            }
        }
    };
}

#[test]
fn test_get_set_remove() {
    for_each_backend!(|store| {
        assert_eq!(store.get(b"k").unwrap(), None);
        store.set(b"k", b"v").unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert!(store.remove(b"k").unwrap());
        assert!(!store.remove(b"k").unwrap());
    });
}

#[test]
fn test_conditional_writes() {
    for_each_backend!(|store| {
        store.add(b"k", b"1").unwrap();
        assert!(matches!(store.add(b"k", b"2"), Err(StoreError::Duplicate)));
        store.replace(b"k", b"3").unwrap();
        assert!(matches!(store.replace(b"missing", b"x"), Err(StoreError::NoRecord)));

        store.append(b"k", b"4").unwrap();
        store.append(b"fresh", b"x").unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"34".to_vec()));
        assert_eq!(store.get(b"fresh").unwrap(), Some(b"x".to_vec()));
    });
}

#[test]
fn test_cas() {
    for_each_backend!(|store| {
        store.cas(b"k", None, Some(b"a".as_slice())).unwrap();
        assert!(matches!(store.cas(b"k", None, Some(b"b".as_slice())), Err(StoreError::Conflict)));
        assert!(matches!(store.cas(b"k", Some(b"x".as_slice()), Some(b"b".as_slice())), Err(StoreError::Conflict)));
        store.cas(b"k", Some(b"a".as_slice()), Some(b"b".as_slice())).unwrap();
        store.cas(b"k", Some(b"b".as_slice()), None).unwrap();
        assert_eq!(store.get(b"k").unwrap(), None);
        assert!(matches!(store.cas(b"k", Some(b"b".as_slice()), None), Err(StoreError::NoRecord)));
    });
}

#[test]
fn test_counters() {
    for_each_backend!(|store| {
        assert_eq!(store.incr_int(b"n", 5).unwrap(), 5);
        assert_eq!(store.incr_int(b"n", -7).unwrap(), -2);
        assert_eq!(store.get(b"n").unwrap(), Some(encode_i64(-2).to_vec()));

        store.set(b"max", &encode_i64(i64::MAX)).unwrap();
        assert!(matches!(store.incr_int(b"max", 1), Err(StoreError::Overflow)));

        assert_eq!(store.incr_float(b"f", 0.5).unwrap(), 0.5);
        assert_eq!(store.incr_float(b"f", 1.25).unwrap(), 1.75);

        store.set(b"text", b"abc").unwrap();
        assert!(matches!(
            store.incr_int(b"text", 1),
            Err(StoreError::TypeMismatch { expected: "i64", len: 3 })
        ));
        assert!(matches!(store.incr_float(b"text", 1.0), Err(StoreError::TypeMismatch { .. })));
    });
}

#[test]
fn test_match_prefix_and_regex() {
    for_each_backend!(|store| {
        for key in ["app", "apple", "apply", "banana"] {
            store.set(key.as_bytes(), b"").unwrap();
        }
        assert_eq!(store.match_prefix(b"appl", 10).unwrap(), vec![b"apple".to_vec(), b"apply".to_vec()]);
        assert_eq!(store.match_prefix(b"a", 2).unwrap().len(), 2);
        assert!(store.match_prefix(b"a", 0).unwrap().is_empty());

        let pattern = Regex::new("an+a").unwrap();
        assert_eq!(store.match_regex(&pattern, 10).unwrap(), vec![b"banana".to_vec()]);
    });
}

#[test]
fn test_cursor_walk() {
    for_each_backend!(|store| {
        for key in [b"a", b"c", b"e"] {
            store.set(key, key).unwrap();
        }
        let mut cursor = store.cursor();
        assert_eq!(cursor.get_key(false).unwrap(), None);

        assert!(cursor.jump(b"b").unwrap());
        assert_eq!(cursor.get_key(true).unwrap(), Some(b"c".to_vec()));
        assert_eq!(cursor.get_key(false).unwrap(), Some(b"e".to_vec()));
        assert!(!cursor.step().unwrap());
        assert_eq!(cursor.get(false).unwrap(), None);

        assert!(cursor.jump_back(b"d").unwrap());
        assert_eq!(cursor.get_key(false).unwrap(), Some(b"c".to_vec()));
        assert!(cursor.jump_first().unwrap());
        assert_eq!(cursor.get_key(false).unwrap(), Some(b"a".to_vec()));
        assert!(!cursor.jump(b"f").unwrap());
    });
}

#[test]
fn test_cursor_survives_removal() {
    for_each_backend!(|store| {
        for key in [b"a", b"b", b"c"] {
            store.set(key, b"").unwrap();
        }
        let mut cursor = store.cursor();
        cursor.jump(b"a").unwrap();
        let mut seen = Vec::new();
        while let Some(key) = cursor.get_key(false).unwrap() {
            store.remove(&key).unwrap();
            seen.push(key);
        }
        assert_eq!(seen, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        assert_eq!(store.count().unwrap(), 0);
    });
}

#[test]
fn test_transaction_rollback_and_commit() {
    for_each_backend!(|store| {
        store.set(b"keep", b"1").unwrap();

        store.begin_transaction(false).unwrap();
        store.set(b"keep", b"2").unwrap();
        store.set(b"new", b"x").unwrap();
        store.end_transaction(false).unwrap();
        assert_eq!(store.get(b"keep").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(b"new").unwrap(), None);

        store.begin_transaction(true).unwrap();
        store.clear().unwrap();
        store.end_transaction(true).unwrap();
        assert_eq!(store.count().unwrap(), 0);

        assert!(matches!(store.end_transaction(true), Err(StoreError::NoTransaction)));
    });
}

#[derive(Debug, Clone)]
enum Op {
    Set(Vec<u8>, Vec<u8>),
    Remove(Vec<u8>),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let key = prop::collection::vec(0u8..4, 0..4);
    prop_oneof![
        (key.clone(), prop::collection::vec(any::<u8>(), 0..4)).prop_map(|(k, v)| Op::Set(k, v)),
        key.prop_map(Op::Remove),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_cursor_walk_matches_btreemap(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let store = MemoryStore::new();
        let mut model = BTreeMap::new();
        for op in ops {
            match op {
                Op::Set(key, value) => {
                    store.set(&key, &value).unwrap();
                    model.insert(key, value);
                }
                Op::Remove(key) => {
                    prop_assert_eq!(store.remove(&key).unwrap(), model.remove(&key).is_some());
                }
            }
        }

        let mut walked = Vec::new();
        let mut cursor = store.cursor();
        if cursor.jump_first().unwrap() {
            while let Some(record) = cursor.get(true).unwrap() {
                walked.push((record.key, record.value));
            }
        }
        prop_assert_eq!(walked, model.into_iter().collect::<Vec<_>>());
    }
}
