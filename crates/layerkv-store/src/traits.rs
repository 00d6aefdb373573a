//! The ordered store contract.

use regex::bytes::Regex;
use snafu::ensure;

use crate::cursor::RawCursor;
use crate::error::DuplicateSnafu;
use crate::error::NoRecordSnafu;
use crate::error::OverflowSnafu;
use crate::error::StoreResult;
use crate::numeric::check_cas_condition;
use crate::numeric::decode_f64;
use crate::numeric::decode_i64;
use crate::numeric::encode_f64;
use crate::numeric::encode_i64;

/// A stored key and its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Where a seek lands relative to the requested key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seek {
    /// First record whose key is `>=` the requested key.
    AtOrAfter,
    /// First record whose key is `>` the requested key.
    After,
    /// Last record whose key is `<=` the requested key.
    AtOrBefore,
}

/// Outcome of a read-modify-write closure passed to [`OrderedStore::modify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Leave the record as it is.
    Keep,
    /// Store this value under the key.
    Put(Vec<u8>),
    /// Delete the record.
    Delete,
}

/// An ordered byte-keyed store with cursor-style seeks and a store-wide
/// transaction.
///
/// Keys sort by plain byte comparison. Every method takes `&self`; backends
/// serialize writes internally. Between `begin_transaction` and
/// `end_transaction` every write from every caller belongs to the one open
/// transaction, and a second `begin_transaction` blocks until it ends.
pub trait OrderedStore: Send + Sync {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    fn set(&self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Delete a record. Returns whether one existed.
    fn remove(&self, key: &[u8]) -> StoreResult<bool>;

    /// Atomically read a record, decide, and write.
    ///
    /// `f` sees the current value and returns the mutation to apply along
    /// with a result for the caller. When `f` fails nothing is written.
    fn modify<T, F>(&self, key: &[u8], f: F) -> StoreResult<T>
    where
        F: FnOnce(Option<&[u8]>) -> StoreResult<(Mutation, T)>;

    /// Find the record nearest to `key` in the direction given by `mode`.
    fn seek(&self, key: &[u8], mode: Seek) -> StoreResult<Option<Record>>;

    /// Visit records in key order starting at the first key `>= start`,
    /// until `visit` returns `false`.
    ///
    /// The visitor runs while the backend holds its read state and must not
    /// call back into the store.
    fn scan(&self, start: &[u8], visit: &mut dyn FnMut(&[u8], &[u8]) -> bool) -> StoreResult<()>;

    fn count(&self) -> StoreResult<u64>;

    /// Delete every record.
    fn clear(&self) -> StoreResult<()>;

    /// Open the store-wide transaction, waiting for any open one to end.
    ///
    /// `durable` asks the backend to sync the commit to disk.
    fn begin_transaction(&self, durable: bool) -> StoreResult<()>;

    /// Commit or roll back the open transaction.
    fn end_transaction(&self, commit: bool) -> StoreResult<()>;

    /// Insert a record that must not exist yet.
    fn add(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.modify(key, |current| {
            ensure!(current.is_none(), DuplicateSnafu);
            Ok((Mutation::Put(value.to_vec()), ()))
        })
    }

    /// Overwrite a record that must already exist.
    fn replace(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.modify(key, |current| {
            ensure!(current.is_some(), NoRecordSnafu);
            Ok((Mutation::Put(value.to_vec()), ()))
        })
    }

    /// Append bytes to a record, creating it when absent.
    fn append(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.modify(key, |current| {
            let mut joined = current.map(<[u8]>::to_vec).unwrap_or_default();
            joined.extend_from_slice(value);
            Ok((Mutation::Put(joined), ()))
        })
    }

    /// Compare-and-swap.
    ///
    /// `old == None` requires the record to be absent and `new == None`
    /// deletes it. Fails with `NoRecord` when an expected record is missing
    /// and with `Conflict` when the stored value differs.
    fn cas(&self, key: &[u8], old: Option<&[u8]>, new: Option<&[u8]>) -> StoreResult<()> {
        self.modify(key, |current| {
            check_cas_condition(old, current)?;
            let mutation = match (new, current) {
                (Some(value), _) => Mutation::Put(value.to_vec()),
                (None, Some(_)) => Mutation::Delete,
                (None, None) => Mutation::Keep,
            };
            Ok((mutation, ()))
        })
    }

    /// Add `delta` to an integer record, treating an absent one as zero.
    fn incr_int(&self, key: &[u8], delta: i64) -> StoreResult<i64> {
        self.modify(key, |current| {
            let base = current.map(decode_i64).transpose()?.unwrap_or(0);
            let sum = base.checked_add(delta).ok_or_else(|| OverflowSnafu.build())?;
            Ok((Mutation::Put(encode_i64(sum).to_vec()), sum))
        })
    }

    /// Add `delta` to a float record, treating an absent one as zero.
    fn incr_float(&self, key: &[u8], delta: f64) -> StoreResult<f64> {
        self.modify(key, |current| {
            let base = current.map(decode_f64).transpose()?.unwrap_or(0.0);
            let sum = base + delta;
            Ok((Mutation::Put(encode_f64(sum).to_vec()), sum))
        })
    }

    /// Keys starting with `prefix`, in order, at most `max` of them.
    fn match_prefix(&self, prefix: &[u8], max: usize) -> StoreResult<Vec<Vec<u8>>> {
        let mut keys = Vec::new();
        if max == 0 {
            return Ok(keys);
        }
        self.scan(prefix, &mut |key, _| {
            if !key.starts_with(prefix) {
                return false;
            }
            keys.push(key.to_vec());
            keys.len() < max
        })?;
        Ok(keys)
    }

    /// Keys the pattern matches anywhere, in order, at most `max` of them.
    fn match_regex(&self, pattern: &Regex, max: usize) -> StoreResult<Vec<Vec<u8>>> {
        let mut keys = Vec::new();
        if max == 0 {
            return Ok(keys);
        }
        self.scan(&[], &mut |key, _| {
            if pattern.is_match(key) {
                keys.push(key.to_vec());
            }
            keys.len() < max
        })?;
        Ok(keys)
    }

    /// A fresh, unpositioned cursor.
    fn cursor(&self) -> RawCursor<'_, Self>
    where
        Self: Sized,
    {
        RawCursor::new(self)
    }
}
