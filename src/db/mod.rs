//! Composite-key facade over an [`OrderedStore`].
//!
//! Every operation takes its key as a slice of parts, encodes it with
//! [`layerkv_codec::encode`] and delegates to the store. Decoded keys come
//! back as `Vec<Vec<u8>>`.

mod cursor;
mod transaction;

use std::sync::Arc;

pub use cursor::Cursor;
pub use cursor::Keys;
use layerkv_codec::decode;
use layerkv_codec::encode;
use layerkv_codec::encode_into;
use layerkv_codec::escape_into;
use layerkv_store::OrderedStore;
use layerkv_store::Regex;
use layerkv_store::error::InvalidPatternSnafu;
use snafu::ResultExt;
use transaction::TxnState;
pub use transaction::Txn;

use crate::error::NotFoundSnafu;
use crate::error::Result;

/// Default cap on `match_prefix` and `match_regex` results.
pub const DEFAULT_MAX_MATCH_RESULTS: usize = 10_000;

/// A composite-key view of an ordered store.
///
/// Cloning is cheap and shares the store. A `Db` reached through a [`Txn`]
/// is bound to that open transaction.
pub struct Db<S> {
    store: Arc<S>,
    max_match_results: usize,
    durable_transactions: bool,
    txn: Option<Arc<TxnState<S>>>,
}

impl<S> Clone for Db<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            max_match_results: self.max_match_results,
            durable_transactions: self.durable_transactions,
            txn: self.txn.clone(),
        }
    }
}

impl<S: OrderedStore> Db<S> {
    pub fn new(store: S) -> Self {
        Self::from_arc(Arc::new(store))
    }

    pub fn from_arc(store: Arc<S>) -> Self {
        Self {
            store,
            max_match_results: DEFAULT_MAX_MATCH_RESULTS,
            durable_transactions: true,
            txn: None,
        }
    }

    /// Cap results of the match operations regardless of the `max` passed.
    pub fn with_match_limit(mut self, limit: usize) -> Self {
        self.max_match_results = limit;
        self
    }

    /// Whether transactions opened by [`transact`](Self::transact) sync on
    /// commit.
    pub fn with_durable_transactions(mut self, durable: bool) -> Self {
        self.durable_transactions = durable;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Value stored under `parts`, or `None` when there is no record.
    pub fn get<K: AsRef<[u8]>>(&self, parts: &[K]) -> Result<Option<Vec<u8>>> {
        Ok(self.store.get(&encode(parts))?)
    }

    /// Insert or overwrite.
    pub fn set<K: AsRef<[u8]>>(&self, parts: &[K], value: &[u8]) -> Result<()> {
        Ok(self.store.set(&encode(parts), value)?)
    }

    /// Delete the record under `parts`. Fails with `NotFound` when absent.
    pub fn remove<K: AsRef<[u8]>>(&self, parts: &[K]) -> Result<()> {
        if !self.store.remove(&encode(parts))? {
            return NotFoundSnafu.fail();
        }
        Ok(())
    }

    /// Compare-and-swap.
    ///
    /// `old == None` requires the record to be absent, `new == None` deletes
    /// it. Fails with `NotFound` when `old` is given but nothing is stored and
    /// with `Conflict` when the stored value differs from `old`.
    pub fn cas<K: AsRef<[u8]>>(&self, parts: &[K], old: Option<&[u8]>, new: Option<&[u8]>) -> Result<()> {
        Ok(self.store.cas(&encode(parts), old, new)?)
    }

    /// Add to an 8-byte big-endian integer, starting from zero.
    pub fn incr_int<K: AsRef<[u8]>>(&self, parts: &[K], delta: i64) -> Result<i64> {
        Ok(self.store.incr_int(&encode(parts), delta)?)
    }

    /// Add to an 8-byte big-endian float, starting from zero.
    pub fn incr_float<K: AsRef<[u8]>>(&self, parts: &[K], delta: f64) -> Result<f64> {
        Ok(self.store.incr_float(&encode(parts), delta)?)
    }

    /// Insert only. Fails with `Duplicate` when a record exists.
    pub fn add<K: AsRef<[u8]>>(&self, parts: &[K], value: &[u8]) -> Result<()> {
        Ok(self.store.add(&encode(parts), value)?)
    }

    /// Overwrite only. Fails with `NotFound` when no record exists.
    pub fn replace<K: AsRef<[u8]>>(&self, parts: &[K], value: &[u8]) -> Result<()> {
        Ok(self.store.replace(&encode(parts), value)?)
    }

    /// Append bytes to the record, creating it when absent.
    pub fn append<K: AsRef<[u8]>>(&self, parts: &[K], value: &[u8]) -> Result<()> {
        Ok(self.store.append(&encode(parts), value)?)
    }

    /// Keys whose leading parts equal `parts` except the last one, which only
    /// has to be a prefix of the corresponding key part.
    ///
    /// `match_prefix(&["us"], 10)` finds `["users"]` and `["users", "alice"]`
    /// alike. With no parts every key matches.
    pub fn match_prefix<K: AsRef<[u8]>>(&self, parts: &[K], max: usize) -> Result<Vec<Vec<Vec<u8>>>> {
        let mut prefix = Vec::new();
        if let Some((last, leading)) = parts.split_last() {
            encode_into(leading, &mut prefix);
            escape_into(last.as_ref(), &mut prefix);
        }
        let keys = self.store.match_prefix(&prefix, max.min(self.max_match_results))?;
        Ok(keys.iter().map(|key| decode(key)).collect())
    }

    /// Keys whose raw encoding matches `pattern`.
    ///
    /// The pattern runs against encoded bytes, so part boundaries appear as
    /// `\x00\x01` and zero bytes inside parts as `\x00\x00`. Unanchored, like
    /// [`Regex::is_match`].
    pub fn match_regex(&self, pattern: &str, max: usize) -> Result<Vec<Vec<Vec<u8>>>> {
        let pattern = Regex::new(pattern).context(InvalidPatternSnafu)?;
        let keys = self.store.match_regex(&pattern, max.min(self.max_match_results))?;
        Ok(keys.iter().map(|key| decode(key)).collect())
    }

    /// Every key in order, decoded.
    pub fn keys(&self) -> Keys<'_, S> {
        Keys::new(self.store.cursor())
    }

    pub fn count(&self) -> Result<u64> {
        Ok(self.store.count()?)
    }

    /// Delete every record in the store.
    pub fn clear(&self) -> Result<()> {
        Ok(self.store.clear()?)
    }

    /// A cursor over composite keys. Jump it before reading.
    pub fn cursor(&self) -> Cursor<'_, S> {
        Cursor::new(self.store.cursor())
    }

    /// Open the store-wide transaction directly.
    ///
    /// Prefer [`transact`](Self::transact), which also ends it on every exit
    /// path. Blocks while another transaction is open.
    pub fn begin_transaction(&self, durable: bool) -> Result<()> {
        Ok(self.store.begin_transaction(durable)?)
    }

    pub fn end_transaction(&self, commit: bool) -> Result<()> {
        Ok(self.store.end_transaction(commit)?)
    }
}
