//! Enumerating the direct children of a key prefix.
//!
//! The children of `["users"]` are the records keyed `["users", x]` for any
//! single part `x`. Deeper records such as `["users", x, "email"]` are not
//! children; the enumeration jumps over each such subtree with one seek.

use layerkv_codec::encode;
use layerkv_codec::part_successor;
use layerkv_codec::split_first;
use layerkv_store::OrderedStore;
use layerkv_store::RawCursor;

use crate::Db;
use crate::error::Result;

/// A decoded key and its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub keys: Vec<Vec<u8>>,
    pub value: Vec<u8>,
}

/// Lazy iterator over the direct children of a prefix, in key order.
///
/// Returned by [`Db::children`]. Stops after the first error.
pub struct Children<'db, S: OrderedStore> {
    cursor: RawCursor<'db, S>,
    prefix_parts: Vec<Vec<u8>>,
    prefix: Vec<u8>,
    started: bool,
    done: bool,
}

impl<'db, S: OrderedStore> Children<'db, S> {
    fn new(cursor: RawCursor<'db, S>, prefix_parts: Vec<Vec<u8>>) -> Self {
        let prefix = encode(&prefix_parts);
        Self {
            cursor,
            prefix_parts,
            prefix,
            started: false,
            done: false,
        }
    }

    /// Next child along with its raw key.
    fn next_child(&mut self) -> Result<Option<(Vec<u8>, Entry)>> {
        if !self.started {
            self.started = true;
            if !self.cursor.jump(&self.prefix)? {
                return Ok(None);
            }
        }

        loop {
            let Some(record) = self.cursor.get(true)? else {
                return Ok(None);
            };
            let Some(rest) = record.key.strip_prefix(self.prefix.as_slice()) else {
                return Ok(None);
            };

            match split_first(rest) {
                Some((part, consumed)) if consumed == rest.len() => {
                    let mut keys = self.prefix_parts.clone();
                    keys.push(part);
                    let entry = Entry {
                        keys,
                        value: record.value,
                    };
                    return Ok(Some((record.key, entry)));
                }
                Some((part, _)) => {
                    let mut past_subtree = self.prefix.clone();
                    past_subtree.extend_from_slice(&part_successor(&part));
                    self.cursor.jump(&past_subtree)?;
                }
                // The prefix record itself, or a key that is not a composite key.
                None => {}
            }
        }
    }
}

impl<S: OrderedStore> Iterator for Children<'_, S> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_child() {
            Ok(Some((_, entry))) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<S: OrderedStore> Db<S> {
    /// Direct children of `prefix`, lazily.
    ///
    /// Each call starts a fresh cursor, so the iterator can be recreated to
    /// restart.
    pub fn children<K: AsRef<[u8]>>(&self, prefix: &[K]) -> Children<'_, S> {
        let prefix_parts = prefix.iter().map(|part| part.as_ref().to_vec()).collect();
        Children::new(self.store().cursor(), prefix_parts)
    }

    /// Direct children of `prefix`, collected.
    pub fn collection<K: AsRef<[u8]>>(&self, prefix: &[K]) -> Result<Vec<Entry>> {
        self.children(prefix).collect()
    }

    /// Delete every direct child of `prefix`. Returns how many were removed.
    ///
    /// Deeper descendants are left in place. Deleting while enumerating is
    /// safe because the cursor is positioned by key.
    pub fn clear_all<K: AsRef<[u8]>>(&self, prefix: &[K]) -> Result<usize> {
        let mut children = self.children(prefix);
        let mut removed = 0;
        while let Some((key, _)) = children.next_child()? {
            self.store().remove(&key)?;
            removed += 1;
        }
        Ok(removed)
    }
}
