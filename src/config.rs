//! Store configuration.
//!
//! Values come from, lowest precedence first: built-in defaults, a TOML file,
//! and `LAYERKV_*` environment variables.
//!
//! ```toml
//! backend = "redb"
//! path = "./data/layerkv.redb"
//! max_match_results = 1000
//! durable_transactions = true
//! ```

use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use layerkv_store::MemoryStore;
use layerkv_store::RedbStore;
use serde::Deserialize;
use serde::Serialize;
use snafu::ResultExt;
use snafu::Snafu;
use tracing::debug;

use crate::Db;
use crate::DEFAULT_MAX_MATCH_RESULTS;
use crate::backend::Backend;
use crate::error::Result;

/// Configuration error types.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadFile {
        /// Path of the file.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`StoreConfig`].
    #[snafu(display("failed to parse TOML: {source}"))]
    ParseToml {
        /// The underlying TOML error.
        source: toml::de::Error,
    },

    /// A configuration value is invalid.
    #[snafu(display("invalid configuration for {key}: '{value}' ({reason})"))]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// A required configuration value is missing.
    #[snafu(display("missing required configuration: {key} ({hint})"))]
    MissingRequired { key: String, hint: String },
}

/// Which [`OrderedStore`](layerkv_store::OrderedStore) backs the database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Non-persistent, in process.
    #[default]
    Memory,
    /// Persistent redb file at [`StoreConfig::path`].
    Redb,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redb" => Ok(Self::Redb),
            _ => InvalidValueSnafu {
                key: "backend",
                value: s,
                reason: "expected 'memory' or 'redb'",
            }
            .fail(),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Redb => f.write_str("redb"),
        }
    }
}

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: BackendKind,
    /// Database file for the redb backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Upper bound on results from `match_prefix` and `match_regex`.
    #[serde(default = "StoreConfig::default_max_match_results")]
    pub max_match_results: usize,
    /// Whether transactions opened by `Db::transact` sync on commit.
    #[serde(default = "StoreConfig::default_durable_transactions")]
    pub durable_transactions: bool,
}

impl StoreConfig {
    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).context(ParseTomlSnafu)
    }

    /// Load a TOML file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).context(ReadFileSnafu { path })?;
        let mut config = Self::from_toml_str(&contents)?;
        config.apply_env_overrides()?;
        debug!(path = %path.display(), backend = %config.backend, "loaded store configuration");
        Ok(config)
    }

    /// Apply environment variable overrides to existing configuration.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("LAYERKV_BACKEND") {
            self.backend = val.parse()?;
        }
        if let Ok(val) = std::env::var("LAYERKV_PATH") {
            self.path = Some(val.into());
        }
        if let Ok(val) = std::env::var("LAYERKV_MAX_MATCH_RESULTS") {
            self.max_match_results = val.parse().map_err(|_| ConfigError::InvalidValue {
                key: "LAYERKV_MAX_MATCH_RESULTS".to_string(),
                value: val.clone(),
                reason: "expected a positive integer".to_string(),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == BackendKind::Redb && self.path.is_none() {
            return MissingRequiredSnafu {
                key: "path",
                hint: "the redb backend needs a database file",
            }
            .fail();
        }
        if self.max_match_results == 0 {
            return InvalidValueSnafu {
                key: "max_match_results",
                value: "0",
                reason: "must be at least 1",
            }
            .fail();
        }
        Ok(())
    }

    /// Validate, open the configured backend and wrap it in a [`Db`].
    pub fn open(&self) -> Result<Db<Backend>> {
        self.validate()?;
        let backend = match (self.backend, &self.path) {
            (BackendKind::Redb, Some(path)) => Backend::Redb(RedbStore::open(path)?),
            _ => Backend::Memory(MemoryStore::new()),
        };
        debug!(backend = %self.backend, "opened store");
        Ok(Db::new(backend)
            .with_match_limit(self.max_match_results)
            .with_durable_transactions(self.durable_transactions))
    }

    fn default_max_match_results() -> usize {
        DEFAULT_MAX_MATCH_RESULTS
    }

    fn default_durable_transactions() -> bool {
        true
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            path: None,
            max_match_results: Self::default_max_match_results(),
            durable_transactions: Self::default_durable_transactions(),
        }
    }
}
