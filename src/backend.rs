//! Runtime choice of store backend.

use layerkv_store::MemoryStore;
use layerkv_store::Mutation;
use layerkv_store::OrderedStore;
use layerkv_store::Record;
use layerkv_store::RedbStore;
use layerkv_store::Seek;
use layerkv_store::StoreResult;

/// The store selected by [`StoreConfig`](crate::StoreConfig).
pub enum Backend {
    Memory(MemoryStore),
    Redb(RedbStore),
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            Backend::Memory($store) => $call,
            Backend::Redb($store) => $call,
        }
    };
}

impl OrderedStore for Backend {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        dispatch!(self, store => store.get(key))
    }

    fn set(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        dispatch!(self, store => store.set(key, value))
    }

    fn remove(&self, key: &[u8]) -> StoreResult<bool> {
        dispatch!(self, store => store.remove(key))
    }

    fn modify<T, F>(&self, key: &[u8], f: F) -> StoreResult<T>
    where
        F: FnOnce(Option<&[u8]>) -> StoreResult<(Mutation, T)>,
    {
        dispatch!(self, store => store.modify(key, f))
    }

    fn seek(&self, key: &[u8], mode: Seek) -> StoreResult<Option<Record>> {
        dispatch!(self, store => store.seek(key, mode))
    }

    fn scan(&self, start: &[u8], visit: &mut dyn FnMut(&[u8], &[u8]) -> bool) -> StoreResult<()> {
        dispatch!(self, store => store.scan(start, visit))
    }

    fn count(&self) -> StoreResult<u64> {
        dispatch!(self, store => store.count())
    }

    fn clear(&self) -> StoreResult<()> {
        dispatch!(self, store => store.clear())
    }

    fn begin_transaction(&self, durable: bool) -> StoreResult<()> {
        dispatch!(self, store => store.begin_transaction(durable))
    }

    fn end_transaction(&self, commit: bool) -> StoreResult<()> {
        dispatch!(self, store => store.end_transaction(commit))
    }
}
