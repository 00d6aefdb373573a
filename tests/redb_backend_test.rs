//! The composite-key layer on the persistent redb backend.

mod support;

use layerkv::BackendKind;
use layerkv::Db;
use layerkv::Error;
use layerkv::RedbStore;
use layerkv::StoreConfig;
use support::pairs;
use support::parts;
use tempfile::TempDir;

fn redb_config(dir: &TempDir) -> StoreConfig {
    StoreConfig {
        backend: BackendKind::Redb,
        path: Some(dir.path().join("nested").join("layerkv.redb")),
        ..Default::default()
    }
}

#[test]
fn test_records_survive_reopen() {
    support::init_tracing();
    let dir = TempDir::new().unwrap();
    let config = redb_config(&dir);

    {
        let db = config.open().unwrap();
        db.set(&["users", "alice"], b"1").unwrap();
        db.set(&["users", "bob"], b"2").unwrap();
        db.incr_int(&["stats", "logins"], 3).unwrap();
    }

    let db = config.open().unwrap();
    assert_eq!(db.get(&["users", "bob"]).unwrap(), Some(b"2".to_vec()));
    assert_eq!(db.incr_int(&["stats", "logins"], 1).unwrap(), 4);
    assert_eq!(pairs(&db.collection(&["users"]).unwrap()), vec![
        ("alice".to_string(), "1".to_string()),
        ("bob".to_string(), "2".to_string()),
    ]);
}

#[test]
fn test_rollback_discards_writes() {
    let dir = TempDir::new().unwrap();
    let db = redb_config(&dir).open().unwrap();
    db.set(&["k"], b"before").unwrap();

    let result: Result<(), Error> = db.transact(|txn| {
        txn.set(&["k"], b"during")?;
        txn.set(&["new"], b"x")?;
        assert_eq!(txn.get(&["k"])?, Some(b"during".to_vec()));
        txn.add(&["k"], b"dup")
    });

    assert!(matches!(result, Err(Error::Duplicate)));
    assert_eq!(db.get(&["k"]).unwrap(), Some(b"before".to_vec()));
    assert_eq!(db.get(&["new"]).unwrap(), None);
}

#[test]
fn test_set_operations_and_clear_all() {
    let dir = TempDir::new().unwrap();
    let db = Db::new(RedbStore::open(dir.path().join("sets.redb")).unwrap());
    for (path, value) in [("a/b", "c"), ("a/c", "d"), ("a/c/deep", "x"), ("b/c", "e"), ("b/d", "f")] {
        db.set(&parts(path), value.as_bytes()).unwrap();
    }

    assert_eq!(pairs(&db.set_op_str("(I:ConCat a b)").unwrap()), vec![(
        "c".to_string(),
        "de".to_string()
    )]);
    assert_eq!(pairs(&db.set_op_str("(X a b)").unwrap()).len(), 2);

    assert_eq!(db.clear_all(&["a"]).unwrap(), 2);
    assert_eq!(db.count().unwrap(), 3);
    assert_eq!(db.get(&["a", "c", "deep"]).unwrap(), Some(b"x".to_vec()));
}

#[test]
fn test_match_limit_from_config() {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig {
        max_match_results: 1,
        ..redb_config(&dir)
    };
    let db = config.open().unwrap();
    db.set(&["a"], b"").unwrap();
    db.set(&["b"], b"").unwrap();
    assert_eq!(db.match_prefix::<&str>(&[], 10).unwrap(), vec![parts("a")]);
}
