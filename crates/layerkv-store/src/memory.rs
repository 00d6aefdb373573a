//! In-memory implementation of [`OrderedStore`].
//!
//! Records live in a `BTreeMap` behind a mutex. A transaction keeps an undo
//! journal holding the value each key had before its first write, so a
//! rollback restores exactly the touched keys.

use std::collections::BTreeMap;
use std::ops::Bound;

use parking_lot::Condvar;
use parking_lot::Mutex;
use snafu::OptionExt;
use tracing::debug;

use crate::error::NoTransactionSnafu;
use crate::error::StoreResult;
use crate::traits::Mutation;
use crate::traits::OrderedStore;
use crate::traits::Record;
use crate::traits::Seek;

#[derive(Default)]
struct MemoryState {
    records: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Pre-transaction values of touched keys, `None` meaning absent.
    journal: Option<BTreeMap<Vec<u8>, Option<Vec<u8>>>>,
}

impl MemoryState {
    fn write(&mut self, key: &[u8], value: Option<Vec<u8>>) -> Option<Vec<u8>> {
        let previous = match value {
            Some(value) => self.records.insert(key.to_vec(), value),
            None => self.records.remove(key),
        };
        if let Some(journal) = &mut self.journal
            && !journal.contains_key(key)
        {
            journal.insert(key.to_vec(), previous.clone());
        }
        previous
    }

    fn rollback(&mut self, journal: BTreeMap<Vec<u8>, Option<Vec<u8>>>) {
        for (key, value) in journal {
            match value {
                Some(value) => self.records.insert(key, value),
                None => self.records.remove(&key),
            };
        }
    }
}

/// Non-persistent store for tests and ephemeral data.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    released: Condvar,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderedStore for MemoryStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.state.lock().records.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.state.lock().write(key, Some(value.to_vec()));
        Ok(())
    }

    fn remove(&self, key: &[u8]) -> StoreResult<bool> {
        let mut state = self.state.lock();
        if !state.records.contains_key(key) {
            return Ok(false);
        }
        state.write(key, None);
        Ok(true)
    }

    fn modify<T, F>(&self, key: &[u8], f: F) -> StoreResult<T>
    where
        F: FnOnce(Option<&[u8]>) -> StoreResult<(Mutation, T)>,
    {
        let mut state = self.state.lock();
        let (mutation, out) = f(state.records.get(key).map(Vec::as_slice))?;
        match mutation {
            Mutation::Keep => {}
            Mutation::Put(value) => {
                state.write(key, Some(value));
            }
            Mutation::Delete => {
                state.write(key, None);
            }
        }
        Ok(out)
    }

    fn seek(&self, key: &[u8], mode: Seek) -> StoreResult<Option<Record>> {
        let state = self.state.lock();
        let found = match mode {
            Seek::AtOrAfter => state.records.range::<[u8], _>((Bound::Included(key), Bound::Unbounded)).next(),
            Seek::After => state.records.range::<[u8], _>((Bound::Excluded(key), Bound::Unbounded)).next(),
            Seek::AtOrBefore => state.records.range::<[u8], _>((Bound::Unbounded, Bound::Included(key))).next_back(),
        };
        Ok(found.map(|(key, value)| Record {
            key: key.clone(),
            value: value.clone(),
        }))
    }

    fn scan(&self, start: &[u8], visit: &mut dyn FnMut(&[u8], &[u8]) -> bool) -> StoreResult<()> {
        let state = self.state.lock();
        for (key, value) in state.records.range::<[u8], _>((Bound::Included(start), Bound::Unbounded)) {
            if !visit(key, value) {
                break;
            }
        }
        Ok(())
    }

    fn count(&self) -> StoreResult<u64> {
        Ok(self.state.lock().records.len() as u64)
    }

    fn clear(&self) -> StoreResult<()> {
        let mut state = self.state.lock();
        let keys: Vec<Vec<u8>> = state.records.keys().cloned().collect();
        for key in keys {
            state.write(&key, None);
        }
        Ok(())
    }

    fn begin_transaction(&self, _durable: bool) -> StoreResult<()> {
        let mut state = self.state.lock();
        while state.journal.is_some() {
            self.released.wait(&mut state);
        }
        state.journal = Some(BTreeMap::new());
        debug!("memory store transaction started");
        Ok(())
    }

    fn end_transaction(&self, commit: bool) -> StoreResult<()> {
        let mut state = self.state.lock();
        let journal = state.journal.take().context(NoTransactionSnafu)?;
        if !commit {
            debug!(keys = journal.len(), "memory store transaction rolled back");
            state.rollback(journal);
        }
        drop(state);
        self.released.notify_one();
        Ok(())
    }
}
