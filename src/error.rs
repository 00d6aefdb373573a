//! Error types for the composite-key layer.

use layerkv_codec::CodecError;
use layerkv_store::StoreError;
use snafu::Snafu;

use crate::config::ConfigError;
use crate::setop::ParseError;

/// Errors from [`Db`](crate::Db) operations and set-operation queries.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// The key has no record.
    #[snafu(display("key not found"))]
    NotFound,

    /// A compare-and-swap found a different value than expected.
    #[snafu(display("compare-and-swap conflict"))]
    Conflict,

    /// An insert-only write found an existing record.
    #[snafu(display("key already exists"))]
    Duplicate,

    /// A numeric operation found a value of the wrong width.
    #[snafu(display("value is not an {expected}: {len} bytes"))]
    TypeMismatch {
        /// Name of the expected numeric type.
        expected: &'static str,
        /// Length of the value found.
        len: usize,
    },

    /// An integer increment or sum left the range of `i64`.
    #[snafu(display("integer overflow"))]
    Overflow,

    /// A stored key does not decode as a composite key.
    #[snafu(display("malformed key {key:?}: {source}"))]
    MalformedKey {
        /// The raw stored key.
        key: Vec<u8>,
        /// Why decoding failed.
        source: CodecError,
    },

    /// The backend failed.
    #[snafu(display("store error: {source}"))]
    Store {
        /// The underlying store error.
        source: StoreError,
    },

    /// A set expression string did not parse.
    #[snafu(display("invalid set expression: {source}"))]
    Parse {
        /// The underlying parse error.
        source: ParseError,
    },

    /// Configuration could not be loaded or is invalid.
    #[snafu(display("configuration error: {source}"))]
    Config {
        /// The underlying configuration error.
        source: ConfigError,
    },
}

/// Result alias for composite-key operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<StoreError> for Error {
    fn from(source: StoreError) -> Self {
        match source {
            StoreError::NoRecord => Self::NotFound,
            StoreError::Duplicate => Self::Duplicate,
            StoreError::Conflict => Self::Conflict,
            StoreError::TypeMismatch { expected, len } => Self::TypeMismatch { expected, len },
            StoreError::Overflow => Self::Overflow,
            source => Self::Store { source },
        }
    }
}

impl From<ParseError> for Error {
    fn from(source: ParseError) -> Self {
        Self::Parse { source }
    }
}

impl From<ConfigError> for Error {
    fn from(source: ConfigError) -> Self {
        Self::Config { source }
    }
}
