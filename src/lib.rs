//! Composite-key layer over ordered byte key-value stores.
//!
//! Keys are sequences of byte-string parts, packed by [`layerkv_codec`] into
//! single byte strings that sort part by part. On top of any
//! [`OrderedStore`] the crate provides:
//!
//! - [`Db`]: point operations, conditional writes, counters, pattern matches,
//!   cursors and scoped transactions, all keyed by parts
//! - [`Db::children`]: lazy enumeration of the direct children of a prefix,
//!   skipping deeper subtrees with one seek each
//! - [`Db::set_op`]: galloping union, intersection, difference and symmetric
//!   difference over the children of several prefixes
//!
//! # Example
//!
//! ```
//! use layerkv::{Db, MemoryStore};
//!
//! let db = Db::new(MemoryStore::new());
//! db.set(&["a", "b"], b"c").unwrap();
//! db.set(&["a", "c"], b"d").unwrap();
//! db.set(&["b", "c"], b"e").unwrap();
//! db.set(&["b", "d"], b"f").unwrap();
//!
//! let shared = db.set_op_str("(I:ConCat a b)").unwrap();
//! assert_eq!(shared.len(), 1);
//! assert_eq!(shared[0].keys, vec![b"c".to_vec()]);
//! assert_eq!(shared[0].value, b"de");
//! ```

mod backend;
mod collection;
pub mod config;
mod db;
pub mod error;
pub mod setop;

pub use backend::Backend;
pub use collection::Children;
pub use collection::Entry;
pub use config::BackendKind;
pub use config::ConfigError;
pub use config::StoreConfig;
pub use db::Cursor;
pub use db::DEFAULT_MAX_MATCH_RESULTS;
pub use db::Db;
pub use db::Keys;
pub use db::Txn;
pub use error::Error;
pub use error::Result;
pub use layerkv_codec;
pub use layerkv_store;
pub use layerkv_store::MemoryStore;
pub use layerkv_store::OrderedStore;
pub use layerkv_store::RedbStore;
pub use setop::MergePolicy;
pub use setop::ParseError;
pub use setop::SetExpr;
pub use setop::SetOp;
pub use setop::SetOpIter;
pub use setop::SetOpKind;
pub use setop::SetOpResult;
