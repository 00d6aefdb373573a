//! Key-positioned cursors over an [`OrderedStore`].

use crate::error::StoreResult;
use crate::traits::OrderedStore;
use crate::traits::Record;
use crate::traits::Seek;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Position {
    /// Never jumped.
    Unset,
    /// On the first record `>=` this key.
    At(Vec<u8>),
    /// On the first record `>` this key.
    After(Vec<u8>),
    /// Past the last record.
    End,
}

/// A cursor over raw byte keys.
///
/// The cursor remembers a key, not a storage location, and seeks again on
/// every read. Writes between reads are therefore safe: removing the record
/// under the cursor moves it onto the next record, and records inserted ahead
/// of it are visited.
///
/// A cursor must be jumped before its first read; reads on an unjumped cursor
/// find nothing.
pub struct RawCursor<'s, S: OrderedStore> {
    store: &'s S,
    position: Position,
}

impl<'s, S: OrderedStore> RawCursor<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            position: Position::Unset,
        }
    }

    /// Position on the first record whose key is `>= key`.
    ///
    /// Returns whether such a record exists.
    pub fn jump(&mut self, key: &[u8]) -> StoreResult<bool> {
        self.position = Position::At(key.to_vec());
        Ok(self.resolve()?.is_some())
    }

    /// Position on the last record whose key is `<= key`.
    pub fn jump_back(&mut self, key: &[u8]) -> StoreResult<bool> {
        let found = self.store.seek(key, Seek::AtOrBefore)?;
        self.settle(found.as_ref());
        Ok(found.is_some())
    }

    /// Position on the first record of the store.
    pub fn jump_first(&mut self) -> StoreResult<bool> {
        self.jump(&[])
    }

    /// Read the current record, then step past it when `advance` is set.
    pub fn get(&mut self, advance: bool) -> StoreResult<Option<Record>> {
        let found = self.resolve()?;
        if advance && let Some(record) = &found {
            self.position = Position::After(record.key.clone());
        }
        Ok(found)
    }

    /// Read the current key, then step past it when `advance` is set.
    pub fn get_key(&mut self, advance: bool) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.get(advance)?.map(|record| record.key))
    }

    /// Move to the next record. Returns whether there is one.
    pub fn step(&mut self) -> StoreResult<bool> {
        if self.get(true)?.is_none() {
            return Ok(false);
        }
        Ok(self.resolve()?.is_some())
    }

    /// Seek to the record the position describes and pin the cursor to it.
    fn resolve(&mut self) -> StoreResult<Option<Record>> {
        let found = match &self.position {
            Position::Unset | Position::End => return Ok(None),
            Position::At(key) => self.store.seek(key, Seek::AtOrAfter)?,
            Position::After(key) => self.store.seek(key, Seek::After)?,
        };
        self.settle(found.as_ref());
        Ok(found)
    }

    fn settle(&mut self, found: Option<&Record>) {
        self.position = match found {
            Some(record) => Position::At(record.key.clone()),
            None => Position::End,
        };
    }
}
