//! Ordered byte key-value store contract for layerkv.
//!
//! [`OrderedStore`] is the narrow interface the composite-key layer needs
//! from a backend: point reads and writes, an atomic read-modify-write,
//! nearest-key seeks, ordered scans and a store-wide transaction. Conditional
//! writes (`add`, `replace`, `append`, `cas`) and counters are provided on
//! top of [`OrderedStore::modify`], so a backend only implements the
//! primitives.
//!
//! Two backends ship with the crate:
//!
//! - [`MemoryStore`]: a `BTreeMap` with an undo journal for rollback
//! - [`RedbStore`]: a persistent single-table redb database

mod cursor;
pub mod error;
mod memory;
pub mod numeric;
mod redb_store;
mod traits;

pub use cursor::RawCursor;
pub use error::StoreError;
pub use error::StoreResult;
pub use memory::MemoryStore;
pub use redb_store::RedbStore;
pub use regex::bytes::Regex;
pub use traits::Mutation;
pub use traits::OrderedStore;
pub use traits::Record;
pub use traits::Seek;
