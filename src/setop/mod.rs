//! Set operations over the children of key prefixes.
//!
//! A [`SetExpr`] names key prefixes at its leaves and combines their
//! children with union, intersection, difference or symmetric difference.
//! Evaluation is lazy and gallops: each operator asks its sources only for
//! results at or past the key it needs next, so disjoint ranges are skipped
//! with a single seek.

mod merge;
mod parse;
mod skipper;

use std::ops::Bound;

use layerkv_store::OrderedStore;
use tracing::debug;

pub use self::merge::MergePolicy;
pub use self::parse::ParseError;
pub use self::skipper::KeySkipper;
pub use self::skipper::OpSkipper;
pub use self::skipper::Skipper;
use crate::Db;
use crate::collection::Entry;
use crate::error::Result;

/// A set expression: the children of a key, or an operation over other
/// expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetExpr {
    /// The direct children of the key with these parts.
    Key(Vec<Vec<u8>>),
    Op(SetOp),
}

impl SetExpr {
    pub fn key<K: AsRef<[u8]>>(parts: &[K]) -> Self {
        Self::Key(parts.iter().map(|part| part.as_ref().to_vec()).collect())
    }

    pub fn op(kind: SetOpKind, merge: MergePolicy, sources: Vec<SetExpr>) -> Self {
        Self::Op(SetOp { kind, merge, sources })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetOp {
    pub kind: SetOpKind,
    pub merge: MergePolicy,
    pub sources: Vec<SetExpr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOpKind {
    /// Keys present in any source.
    Union,
    /// Keys present in every source.
    Intersection,
    /// Keys of the first source absent from all others.
    Difference,
    /// Keys present in exactly one source.
    Xor,
}

/// One key of a set operation's output and its merged values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetOpResult {
    /// The child part, without the prefix it was found under.
    pub key: Vec<u8>,
    pub values: Vec<Vec<u8>>,
}

/// Build the skipper tree for `expr`.
pub fn build<'db, S: OrderedStore>(db: &'db Db<S>, expr: &SetExpr) -> Box<dyn Skipper + 'db> {
    match expr {
        SetExpr::Key(parts) => Box::new(KeySkipper::new(db.store(), parts)),
        SetExpr::Op(op) => {
            let sources = op.sources.iter().map(|source| build(db, source)).collect();
            Box::new(OpSkipper::new(op.kind, op.merge, sources))
        }
    }
}

/// Lazy iterator over the results of a set operation, in key order.
///
/// Returned by [`Db::set_op`]. Stops after the first error.
pub struct SetOpIter<'a> {
    root: Box<dyn Skipper + 'a>,
    last: Option<Vec<u8>>,
    done: bool,
}

impl<'a> SetOpIter<'a> {
    pub fn new(root: Box<dyn Skipper + 'a>) -> Self {
        Self {
            root,
            last: None,
            done: false,
        }
    }
}

impl Iterator for SetOpIter<'_> {
    type Item = Result<SetOpResult>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let min = match &self.last {
            Some(last) => Bound::Excluded(last.as_slice()),
            None => Bound::Unbounded,
        };
        match self.root.skip(min) {
            Ok(Some(result)) => {
                self.last = Some(result.key.clone());
                Some(Ok(result))
            }
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
    /// Evaluate `expr` lazily.
    pub fn set_op(&self, expr: &SetExpr) -> SetOpIter<'_> {
        debug!(expr = %expr, "set operation");
        SetOpIter::new(build(self, expr))
    }

    /// Parse and evaluate a set expression such as `(I:ConCat a b)`.
    ///
    /// Each result becomes an [`Entry`] whose single key part is the child
    /// part and whose value is the first merged value, or empty when the
    /// merge produced none.
    pub fn set_op_str(&self, code: &str) -> Result<Vec<Entry>> {
        let expr: SetExpr = code.parse()?;
        self.set_op(&expr)
            .map(|result| {
                let SetOpResult { key, values } = result?;
                Ok(Entry {
                    keys: vec![key],
                    value: values.into_iter().next().unwrap_or_default(),
                })
            })
            .collect()
    }
}
