use layerkv_codec::encode;
use layerkv_codec::try_decode;
use layerkv_store::OrderedStore;
use layerkv_store::RawCursor;
use snafu::ResultExt;

use crate::error::MalformedKeySnafu;
use crate::error::Result;

fn decode_key(key: Vec<u8>) -> Result<Vec<Vec<u8>>> {
    try_decode(&key).context(MalformedKeySnafu { key: key.clone() })
}

/// A cursor over composite keys.
///
/// Wraps a [`RawCursor`], so it is positioned by key and tolerates writes
/// between reads. Keys that do not decode as composite keys are reported as
/// [`Error::MalformedKey`](crate::Error::MalformedKey).
pub struct Cursor<'db, S: OrderedStore> {
    raw: RawCursor<'db, S>,
}

impl<'db, S: OrderedStore> Cursor<'db, S> {
    pub(crate) fn new(raw: RawCursor<'db, S>) -> Self {
        Self { raw }
    }

    /// Position on the first key `>= parts`. Returns whether one exists.
    pub fn jump<K: AsRef<[u8]>>(&mut self, parts: &[K]) -> Result<bool> {
        Ok(self.raw.jump(&encode(parts))?)
    }

    /// Position on the last key `<= parts`.
    pub fn jump_back<K: AsRef<[u8]>>(&mut self, parts: &[K]) -> Result<bool> {
        Ok(self.raw.jump_back(&encode(parts))?)
    }

    pub fn jump_first(&mut self) -> Result<bool> {
        Ok(self.raw.jump_first()?)
    }

    /// The current key and value, stepping past them when `advance` is set.
    pub fn get(&mut self, advance: bool) -> Result<Option<(Vec<Vec<u8>>, Vec<u8>)>> {
        let Some(record) = self.raw.get(advance)? else {
            return Ok(None);
        };
        Ok(Some((decode_key(record.key)?, record.value)))
    }

    pub fn get_key(&mut self, advance: bool) -> Result<Option<Vec<Vec<u8>>>> {
        self.raw.get_key(advance)?.map(decode_key).transpose()
    }

    /// Move to the next record. Returns whether there is one.
    pub fn step(&mut self) -> Result<bool> {
        Ok(self.raw.step()?)
    }
}

/// Lazy iterator over every key of the store. Returned by [`Db::keys`](crate::Db::keys).
///
/// Stops after the first error.
pub struct Keys<'db, S: OrderedStore> {
    raw: RawCursor<'db, S>,
    started: bool,
    done: bool,
}

impl<'db, S: OrderedStore> Keys<'db, S> {
    pub(crate) fn new(raw: RawCursor<'db, S>) -> Self {
        Self {
            raw,
            started: false,
            done: false,
        }
    }

    fn next_key(&mut self) -> Result<Option<Vec<Vec<u8>>>> {
        if !self.started {
            self.started = true;
            if !self.raw.jump_first()? {
                return Ok(None);
            }
        }
        self.raw.get_key(true)?.map(decode_key).transpose()
    }
}

impl<S: OrderedStore> Iterator for Keys<'_, S> {
    type Item = Result<Vec<Vec<u8>>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.next_key().transpose();
        if !matches!(next, Some(Ok(_))) {
            self.done = true;
        }
        next
    }
}
