//! Persistent [`OrderedStore`] on a single redb table.
//!
//! Outside a transaction every write runs in its own redb write transaction
//! and commits immediately. `begin_transaction` opens one long-lived write
//! transaction that all reads and writes go through until
//! `end_transaction`, so callers see their own uncommitted writes.

use std::ops::Bound;
use std::path::Path;
use std::path::PathBuf;

use parking_lot::Condvar;
use parking_lot::Mutex;
use redb::Database;
use redb::Durability;
use redb::ReadableTable;
use redb::Table;
use redb::TableDefinition;
use redb::WriteTransaction;
use snafu::OptionExt;
use snafu::ResultExt;
use tracing::debug;

use crate::error::AbortSnafu;
use crate::error::BeginReadSnafu;
use crate::error::BeginWriteSnafu;
use crate::error::CommitSnafu;
use crate::error::CreateDirectorySnafu;
use crate::error::GetSnafu;
use crate::error::InsertSnafu;
use crate::error::LengthSnafu;
use crate::error::NoTransactionSnafu;
use crate::error::OpenDatabaseSnafu;
use crate::error::OpenTableSnafu;
use crate::error::RangeSnafu;
use crate::error::RemoveSnafu;
use crate::error::StoreResult;
use crate::traits::Mutation;
use crate::traits::OrderedStore;
use crate::traits::Record;
use crate::traits::Seek;

/// Table holding every record.
const KV_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("layerkv");

type KvTable<'txn> = Table<'txn, &'static [u8], &'static [u8]>;

/// Read access shared by read-only and writable tables.
trait KvRead {
    fn read_value(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;
    fn read_seek(&self, key: &[u8], mode: Seek) -> StoreResult<Option<Record>>;
    fn read_scan(&self, start: &[u8], visit: &mut dyn FnMut(&[u8], &[u8]) -> bool) -> StoreResult<()>;
    fn read_len(&self) -> StoreResult<u64>;
}

impl<T> KvRead for T
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    fn read_value(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.get(key).context(GetSnafu)?.map(|guard| guard.value().to_vec()))
    }

    fn read_seek(&self, key: &[u8], mode: Seek) -> StoreResult<Option<Record>> {
        let found = match mode {
            Seek::AtOrAfter => self.range::<&[u8]>(key..).context(RangeSnafu)?.next(),
            Seek::After => self
                .range::<&[u8]>((Bound::Excluded(key), Bound::Unbounded))
                .context(RangeSnafu)?
                .next(),
            Seek::AtOrBefore => self.range::<&[u8]>(..=key).context(RangeSnafu)?.next_back(),
        };
        let Some((key, value)) = found.transpose().context(RangeSnafu)? else {
            return Ok(None);
        };
        Ok(Some(Record {
            key: key.value().to_vec(),
            value: value.value().to_vec(),
        }))
    }

    fn read_scan(&self, start: &[u8], visit: &mut dyn FnMut(&[u8], &[u8]) -> bool) -> StoreResult<()> {
        for item in self.range::<&[u8]>(start..).context(RangeSnafu)? {
            let (key, value) = item.context(RangeSnafu)?;
            if !visit(key.value(), value.value()) {
                break;
            }
        }
        Ok(())
    }

    fn read_len(&self) -> StoreResult<u64> {
        self.len().context(LengthSnafu)
    }
}

/// redb-backed store.
pub struct RedbStore {
    db: Database,
    path: PathBuf,
    /// The open store-wide transaction, if any.
    active: Mutex<Option<WriteTransaction>>,
    released: Condvar,
}

impl RedbStore {
    /// Open the database at `path`, creating the file and its directory when
    /// missing.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).context(CreateDirectorySnafu { path: parent })?;
        }

        let db = if path.exists() {
            Database::open(&path).context(OpenDatabaseSnafu { path: &path })?
        } else {
            Database::create(&path).context(OpenDatabaseSnafu { path: &path })?
        };

        let write_txn = db.begin_write().context(BeginWriteSnafu)?;
        write_txn.open_table(KV_TABLE).context(OpenTableSnafu)?;
        write_txn.commit().context(CommitSnafu)?;

        debug!(path = %path.display(), "opened redb store");
        Ok(Self {
            db,
            path,
            active: Mutex::new(None),
            released: Condvar::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read<T>(&self, f: impl FnOnce(&dyn KvRead) -> StoreResult<T>) -> StoreResult<T> {
        let active = self.active.lock();
        if let Some(txn) = active.as_ref() {
            let table = txn.open_table(KV_TABLE).context(OpenTableSnafu)?;
            return f(&table);
        }
        drop(active);

        let read_txn = self.db.begin_read().context(BeginReadSnafu)?;
        let table = read_txn.open_table(KV_TABLE).context(OpenTableSnafu)?;
        f(&table)
    }

    /// Run `f` against the writable table, inside the open transaction or in
    /// a fresh one that commits when `f` succeeds.
    fn write<T>(&self, f: impl FnOnce(&mut KvTable<'_>) -> StoreResult<T>) -> StoreResult<T> {
        let active = self.active.lock();
        if let Some(txn) = active.as_ref() {
            let mut table = txn.open_table(KV_TABLE).context(OpenTableSnafu)?;
            return f(&mut table);
        }

        let write_txn = self.db.begin_write().context(BeginWriteSnafu)?;
        let out = {
            let mut table = write_txn.open_table(KV_TABLE).context(OpenTableSnafu)?;
            f(&mut table)?
        };
        write_txn.commit().context(CommitSnafu)?;
        Ok(out)
    }
}

impl OrderedStore for RedbStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.read(|table| table.read_value(key))
    }

    fn set(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.write(|table| {
            table.insert(key, value).context(InsertSnafu)?;
            Ok(())
        })
    }

    fn remove(&self, key: &[u8]) -> StoreResult<bool> {
        self.write(|table| Ok(table.remove(key).context(RemoveSnafu)?.is_some()))
    }

    fn modify<T, F>(&self, key: &[u8], f: F) -> StoreResult<T>
    where
        F: FnOnce(Option<&[u8]>) -> StoreResult<(Mutation, T)>,
    {
        self.write(|table| {
            let current = table.read_value(key)?;
            let (mutation, out) = f(current.as_deref())?;
            match mutation {
                Mutation::Keep => {}
                Mutation::Put(value) => {
                    table.insert(key, value.as_slice()).context(InsertSnafu)?;
                }
                Mutation::Delete => {
                    table.remove(key).context(RemoveSnafu)?;
                }
            }
            Ok(out)
        })
    }

    fn seek(&self, key: &[u8], mode: Seek) -> StoreResult<Option<Record>> {
        self.read(|table| table.read_seek(key, mode))
    }

    fn scan(&self, start: &[u8], visit: &mut dyn FnMut(&[u8], &[u8]) -> bool) -> StoreResult<()> {
        self.read(|table| table.read_scan(start, visit))
    }

    fn count(&self) -> StoreResult<u64> {
        self.read(|table| table.read_len())
    }

    fn clear(&self) -> StoreResult<()> {
        self.write(|table| {
            let mut keys = Vec::new();
            table.read_scan(&[], &mut |key, _| {
                keys.push(key.to_vec());
                true
            })?;
            for key in &keys {
                table.remove(key.as_slice()).context(RemoveSnafu)?;
            }
            Ok(())
        })
    }

    fn begin_transaction(&self, durable: bool) -> StoreResult<()> {
        let mut active = self.active.lock();
        while active.is_some() {
            self.released.wait(&mut active);
        }

        let mut write_txn = self.db.begin_write().context(BeginWriteSnafu)?;
        write_txn.set_durability(if durable { Durability::Immediate } else { Durability::Eventual });
        *active = Some(write_txn);
        debug!(durable, "redb store transaction started");
        Ok(())
    }

    fn end_transaction(&self, commit: bool) -> StoreResult<()> {
        let mut active = self.active.lock();
        let write_txn = active.take().context(NoTransactionSnafu)?;
        let result = if commit {
            write_txn.commit().context(CommitSnafu)
        } else {
            write_txn.abort().context(AbortSnafu)
        };
        drop(active);
        self.released.notify_one();
        debug!(commit, ok = result.is_ok(), "redb store transaction ended");
        result
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn open_temp() -> (TempDir, RedbStore) {
        let dir = TempDir::new().unwrap();
        let store = RedbStore::open(dir.path().join("kv.redb")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_reopen_keeps_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/kv.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            store.set(b"k", b"v").unwrap();
        }
        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_transaction_reads_own_writes() {
        let (_dir, store) = open_temp();
        store.begin_transaction(false).unwrap();
        store.set(b"k", b"v").unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.count().unwrap(), 1);
        store.end_transaction(false).unwrap();
        assert_eq!(store.get(b"k").unwrap(), None);
    }

    #[test]
    fn test_seek_modes() {
        let (_dir, store) = open_temp();
        for key in [b"b", b"d", b"f"] {
            store.set(key, b"").unwrap();
        }
        let key_of = |found: Option<Record>| found.map(|record| record.key);
        assert_eq!(key_of(store.seek(b"c", Seek::AtOrAfter).unwrap()), Some(b"d".to_vec()));
        assert_eq!(key_of(store.seek(b"d", Seek::AtOrAfter).unwrap()), Some(b"d".to_vec()));
        assert_eq!(key_of(store.seek(b"d", Seek::After).unwrap()), Some(b"f".to_vec()));
        assert_eq!(key_of(store.seek(b"c", Seek::AtOrBefore).unwrap()), Some(b"b".to_vec()));
        assert_eq!(key_of(store.seek(b"a", Seek::AtOrBefore).unwrap()), None);
        assert_eq!(key_of(store.seek(b"g", Seek::After).unwrap()), None);
    }

    #[test]
    fn test_failed_modify_aborts() {
        let (_dir, store) = open_temp();
        store.set(b"k", b"v").unwrap();
        assert!(store.add(b"k", b"other").is_err());
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
    }
}
