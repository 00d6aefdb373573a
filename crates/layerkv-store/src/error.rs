//! Error types for ordered store operations.

use std::path::PathBuf;

use snafu::Snafu;

/// Errors from [`OrderedStore`](crate::OrderedStore) operations.
///
/// The first group are typed outcomes of conditional writes that callers are
/// expected to handle. The rest report a fault in the backend.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    /// The key has no record.
    #[snafu(display("no record for key"))]
    NoRecord,

    /// An insert-only write found an existing record.
    #[snafu(display("record already exists"))]
    Duplicate,

    /// A compare-and-swap found a value other than the expected one.
    #[snafu(display("stored value does not match the expected value"))]
    Conflict,

    /// A numeric operation found a value of the wrong width.
    #[snafu(display("stored value is not an {expected}: {len} bytes"))]
    TypeMismatch {
        /// Name of the expected numeric type.
        expected: &'static str,
        /// Length of the stored value.
        len: usize,
    },

    /// An integer increment left the range of `i64`.
    #[snafu(display("integer increment overflowed"))]
    Overflow,

    /// `end_transaction` was called with no transaction in progress.
    #[snafu(display("no transaction in progress"))]
    NoTransaction,

    /// A key pattern failed to compile.
    #[snafu(display("invalid key pattern: {source}"))]
    InvalidPattern {
        /// The underlying regex error.
        source: regex::Error,
    },

    /// Failed to create the directory holding the database file.
    #[snafu(display("failed to create directory {}: {source}", path.display()))]
    CreateDirectory {
        /// Path to the directory.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to open the redb database file.
    #[snafu(display("failed to open redb database at {}: {source}", path.display()))]
    OpenDatabase {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying database error.
        #[snafu(source(from(redb::DatabaseError, Box::new)))]
        source: Box<redb::DatabaseError>,
    },

    /// Failed to begin a write transaction.
    #[snafu(display("failed to begin write transaction: {source}"))]
    BeginWrite {
        /// The underlying transaction error.
        #[snafu(source(from(redb::TransactionError, Box::new)))]
        source: Box<redb::TransactionError>,
    },

    /// Failed to begin a read transaction.
    #[snafu(display("failed to begin read transaction: {source}"))]
    BeginRead {
        /// The underlying transaction error.
        #[snafu(source(from(redb::TransactionError, Box::new)))]
        source: Box<redb::TransactionError>,
    },

    /// Failed to open the key-value table.
    #[snafu(display("failed to open table: {source}"))]
    OpenTable {
        /// The underlying table error.
        #[snafu(source(from(redb::TableError, Box::new)))]
        source: Box<redb::TableError>,
    },

    /// Failed to commit a transaction.
    #[snafu(display("failed to commit transaction: {source}"))]
    Commit {
        /// The underlying commit error.
        #[snafu(source(from(redb::CommitError, Box::new)))]
        source: Box<redb::CommitError>,
    },

    /// Failed to abort a transaction.
    #[snafu(display("failed to abort transaction: {source}"))]
    Abort {
        /// The underlying storage error.
        #[snafu(source(from(redb::StorageError, Box::new)))]
        source: Box<redb::StorageError>,
    },

    /// Failed to insert a value into the table.
    #[snafu(display("failed to insert into table: {source}"))]
    Insert {
        /// The underlying storage error.
        #[snafu(source(from(redb::StorageError, Box::new)))]
        source: Box<redb::StorageError>,
    },

    /// Failed to retrieve a value from the table.
    #[snafu(display("failed to get from table: {source}"))]
    Get {
        /// The underlying storage error.
        #[snafu(source(from(redb::StorageError, Box::new)))]
        source: Box<redb::StorageError>,
    },

    /// Failed to remove a value from the table.
    #[snafu(display("failed to remove from table: {source}"))]
    Remove {
        /// The underlying storage error.
        #[snafu(source(from(redb::StorageError, Box::new)))]
        source: Box<redb::StorageError>,
    },

    /// Failed to iterate over a table range.
    #[snafu(display("failed to iterate table range: {source}"))]
    Range {
        /// The underlying storage error.
        #[snafu(source(from(redb::StorageError, Box::new)))]
        source: Box<redb::StorageError>,
    },

    /// Failed to read table metadata.
    #[snafu(display("failed to read table length: {source}"))]
    Length {
        /// The underlying storage error.
        #[snafu(source(from(redb::StorageError, Box::new)))]
        source: Box<redb::StorageError>,
    },
}

/// Result alias used throughout the store crate.
pub type StoreResult<T> = Result<T, StoreError>;
