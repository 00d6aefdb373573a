//! The skip protocol and its two implementations.
//!
//! A skipper yields the children of some key set in [`cmp_parts`] order. Each
//! call to [`Skipper::skip`] asks for the first child at or past a bound, so a
//! consumer that knows it needs nothing below `m` jumps there directly instead
//! of stepping through everything in between.

use std::cmp::Ordering;
use std::ops::Bound;

use layerkv_codec::cmp_parts;
use layerkv_codec::encode;
use layerkv_codec::encode_part;
use layerkv_codec::part_successor;
use layerkv_codec::split_first;
use layerkv_store::OrderedStore;
use layerkv_store::RawCursor;
use tracing::trace;

use super::MergePolicy;
use super::SetOpKind;
use super::SetOpResult;
use crate::error::Result;

/// A source of set-operation results that can skip ahead.
pub trait Skipper {
    /// The first result whose key satisfies `min`, or `None` once the source
    /// is exhausted.
    ///
    /// Callers pass bounds that never decrease between calls.
    fn skip(&mut self, min: Bound<&[u8]>) -> Result<Option<SetOpResult>>;
}

/// Whether `key` lies at or past `min` in [`cmp_parts`] order.
fn satisfies(key: &[u8], min: Bound<&[u8]>) -> bool {
    match min {
        Bound::Unbounded => true,
        Bound::Included(m) => cmp_parts(key, m) != Ordering::Less,
        Bound::Excluded(m) => cmp_parts(key, m) == Ordering::Greater,
    }
}

fn as_bound(bound: &Bound<Vec<u8>>) -> Bound<&[u8]> {
    match bound {
        Bound::Unbounded => Bound::Unbounded,
        Bound::Included(key) => Bound::Included(key.as_slice()),
        Bound::Excluded(key) => Bound::Excluded(key.as_slice()),
    }
}

/// Skipper over the direct children of one key prefix.
pub struct KeySkipper<'db, S: OrderedStore> {
    cursor: RawCursor<'db, S>,
    prefix: Vec<u8>,
    /// Raw key of the last result; the cursor still rests on it.
    last_key: Option<Vec<u8>>,
    exhausted: bool,
}

impl<'db, S: OrderedStore> KeySkipper<'db, S> {
    pub fn new<K: AsRef<[u8]>>(store: &'db S, parts: &[K]) -> Self {
        Self {
            cursor: store.cursor(),
            prefix: encode(parts),
            last_key: None,
            exhausted: false,
        }
    }

    /// Smallest raw key that can hold a child satisfying `min`.
    fn target(&self, min: Bound<&[u8]>) -> Vec<u8> {
        let mut target = self.prefix.clone();
        match min {
            Bound::Unbounded => {}
            Bound::Included(m) => target.extend_from_slice(&encode_part(m)),
            Bound::Excluded(m) => target.extend_from_slice(&part_successor(m)),
        }
        target
    }

    fn finish(&mut self) -> Result<Option<SetOpResult>> {
        self.exhausted = true;
        self.last_key = None;
        Ok(None)
    }
}

impl<S: OrderedStore> Skipper for KeySkipper<'_, S> {
    fn skip(&mut self, min: Bound<&[u8]>) -> Result<Option<SetOpResult>> {
        if self.exhausted {
            return Ok(None);
        }

        let target = self.target(min);
        let still_ahead = self.last_key.as_ref().is_some_and(|last| *last >= target);
        if !still_ahead {
            trace!(target = ?target, "key skipper jump");
            self.cursor.jump(&target)?;
        }

        loop {
            let Some(record) = self.cursor.get(false)? else {
                return self.finish();
            };
            let Some(rest) = record.key.strip_prefix(self.prefix.as_slice()) else {
                return self.finish();
            };

            match split_first(rest) {
                Some((part, consumed)) if consumed == rest.len() => {
                    self.last_key = Some(record.key);
                    return Ok(Some(SetOpResult {
                        key: part,
                        values: vec![record.value],
                    }));
                }
                Some((part, _)) => {
                    let mut past_subtree = self.prefix.clone();
                    past_subtree.extend_from_slice(&part_successor(&part));
                    trace!(target = ?past_subtree, "key skipper gallop past subtree");
                    self.cursor.jump(&past_subtree)?;
                }
                None => {
                    self.cursor.step()?;
                }
            }
        }
    }
}

/// One source's most recent result inside an [`OpSkipper`].
#[derive(Debug)]
enum Head {
    Pending,
    At(SetOpResult),
    Exhausted,
}

impl Head {
    fn key(&self) -> Option<&[u8]> {
        match self {
            Self::At(result) => Some(&result.key),
            Self::Pending | Self::Exhausted => None,
        }
    }
}

/// Skipper combining the output of other skippers.
pub struct OpSkipper<'a> {
    kind: SetOpKind,
    merge: MergePolicy,
    sources: Vec<Box<dyn Skipper + 'a>>,
    heads: Vec<Head>,
}

impl<'a> OpSkipper<'a> {
    pub fn new(kind: SetOpKind, merge: MergePolicy, sources: Vec<Box<dyn Skipper + 'a>>) -> Self {
        let heads = sources.iter().map(|_| Head::Pending).collect();
        Self {
            kind,
            merge,
            sources,
            heads,
        }
    }

    /// Make head `i` satisfy `min`, asking its source only when the cached
    /// result falls short.
    fn refresh(&mut self, i: usize, min: Bound<&[u8]>) -> Result<()> {
        let current = match &self.heads[i] {
            Head::Exhausted => return Ok(()),
            Head::At(result) if satisfies(&result.key, min) => return Ok(()),
            Head::At(_) | Head::Pending => self.sources[i].skip(min)?,
        };
        self.heads[i] = match current {
            Some(result) => Head::At(result),
            None => Head::Exhausted,
        };
        Ok(())
    }

    fn refresh_all(&mut self, min: Bound<&[u8]>) -> Result<()> {
        for i in 0..self.heads.len() {
            self.refresh(i, min)?;
        }
        Ok(())
    }

    /// Smallest key among the heads.
    fn min_key(&self) -> Option<Vec<u8>> {
        self.heads
            .iter()
            .filter_map(Head::key)
            .min_by(|a, b| cmp_parts(a, b))
            .map(<[u8]>::to_vec)
    }

    /// Merge the values of every head at `key`, in source order.
    fn merge_at(&self, key: Vec<u8>) -> Result<SetOpResult> {
        let values = self
            .heads
            .iter()
            .filter_map(|head| match head {
                Head::At(result) if result.key == key => Some(result.values.iter().cloned()),
                _ => None,
            })
            .flatten()
            .collect();
        Ok(SetOpResult {
            key,
            values: self.merge.merge(values)?,
        })
    }

    fn heads_at(&self, key: &[u8]) -> usize {
        self.heads.iter().filter(|head| head.key() == Some(key)).count()
    }

    fn union(&mut self, min: Bound<&[u8]>) -> Result<Option<SetOpResult>> {
        self.refresh_all(min)?;
        match self.min_key() {
            Some(key) => Ok(Some(self.merge_at(key)?)),
            None => Ok(None),
        }
    }

    fn intersection(&mut self, min: Bound<&[u8]>) -> Result<Option<SetOpResult>> {
        let mut bound = min.map(<[u8]>::to_vec);
        loop {
            self.refresh_all(as_bound(&bound))?;
            if self.heads.iter().any(|head| matches!(head, Head::Exhausted)) {
                return Ok(None);
            }
            let Some(max) = self.heads.iter().filter_map(Head::key).max_by(|a, b| cmp_parts(a, b)) else {
                return Ok(None);
            };
            let max = max.to_vec();
            if self.heads_at(&max) == self.heads.len() {
                return Ok(Some(self.merge_at(max)?));
            }
            bound = Bound::Included(max);
        }
    }

    fn difference(&mut self, min: Bound<&[u8]>) -> Result<Option<SetOpResult>> {
        let mut bound = min.map(<[u8]>::to_vec);
        loop {
            self.refresh(0, as_bound(&bound))?;
            let Head::At(first) = &self.heads[0] else {
                return Ok(None);
            };
            let key = first.key.clone();

            let mut excluded = false;
            for i in 1..self.heads.len() {
                self.refresh(i, Bound::Included(&key))?;
                if self.heads[i].key() == Some(key.as_slice()) {
                    excluded = true;
                    break;
                }
            }
            if !excluded {
                let Head::At(first) = &self.heads[0] else {
                    return Ok(None);
                };
                return Ok(Some(SetOpResult {
                    key,
                    values: self.merge.merge(first.values.clone())?,
                }));
            }
            bound = Bound::Excluded(key);
        }
    }

    fn xor(&mut self, min: Bound<&[u8]>) -> Result<Option<SetOpResult>> {
        let mut bound = min.map(<[u8]>::to_vec);
        loop {
            self.refresh_all(as_bound(&bound))?;
            let Some(key) = self.min_key() else {
                return Ok(None);
            };
            if self.heads_at(&key) == 1 {
                return Ok(Some(self.merge_at(key)?));
            }
            bound = Bound::Excluded(key);
        }
    }
}

impl Skipper for OpSkipper<'_> {
    fn skip(&mut self, min: Bound<&[u8]>) -> Result<Option<SetOpResult>> {
        if self.sources.is_empty() {
            return Ok(None);
        }
        match self.kind {
            SetOpKind::Union => self.union(min),
            SetOpKind::Intersection => self.intersection(min),
            SetOpKind::Difference => self.difference(min),
            SetOpKind::Xor => self.xor(min),
        }
    }
}
