//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use layerkv::Db;
use layerkv::Entry;
use layerkv::MemoryStore;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn memory_db() -> Db<MemoryStore> {
    init_tracing();
    Db::new(MemoryStore::new())
}

/// Split a `/`-separated path into key parts.
pub fn parts(path: &str) -> Vec<Vec<u8>> {
    path.split('/').map(|part| part.as_bytes().to_vec()).collect()
}

/// Write each `(path, value)` pair.
pub fn load(db: &Db<MemoryStore>, records: &[(&str, &str)]) {
    for (path, value) in records {
        db.set(&parts(path), value.as_bytes()).unwrap();
    }
}

/// Entries as `(last part, value)` strings, for compact assertions.
pub fn pairs(entries: &[Entry]) -> Vec<(String, String)> {
    entries
        .iter()
        .map(|entry| {
            let last = entry.keys.last().cloned().unwrap_or_default();
            (
                String::from_utf8(last).unwrap(),
                String::from_utf8(entry.value.clone()).unwrap(),
            )
        })
        .collect()
}
