use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, SqliteShimError};

/// Default number of compiled statements rusqlite keeps per connection.
pub const DEFAULT_STATEMENT_CACHE_CAPACITY: usize = 16;

/// Options for opening a [`Database`](crate::Database).
///
/// Every field has an explicit default; a JSON document may set any subset of them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseOptions {
    /// Open a private in-memory database instead of a file.
    pub in_memory: bool,
    /// Open the file read-only.
    pub readonly: bool,
    /// Create the file (and its directory) when it does not exist. Ignored when read-only.
    pub create_if_not_exist: bool,
    /// Directory database names are resolved against; the working directory when unset.
    pub base_dir: Option<PathBuf>,
    /// Capacity of the connection-level prepared statement cache.
    pub statement_cache_capacity: usize,
    /// Busy timeout in milliseconds applied to the connection.
    pub busy_timeout_ms: Option<u64>,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            in_memory: false,
            readonly: false,
            create_if_not_exist: true,
            base_dir: None,
            statement_cache_capacity: DEFAULT_STATEMENT_CACHE_CAPACITY,
            busy_timeout_ms: None,
        }
    }
}

impl DatabaseOptions {
    #[must_use]
    pub fn builder() -> DatabaseOptionsBuilder {
        DatabaseOptionsBuilder::default()
    }

    /// Parse options from a JSON document.
    ///
    /// # Errors
    /// Returns `SqliteShimError::ConfigError` if the document is not valid JSON or names an
    /// unknown option.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| SqliteShimError::ConfigError(format!("invalid database options: {e}")))
    }

    /// Load options from a JSON file.
    ///
    /// # Errors
    /// Returns `SqliteShimError::Io` if the file cannot be read, or `ConfigError` if it does
    /// not parse.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub(crate) fn busy_timeout(&self) -> Option<Duration> {
        self.busy_timeout_ms.map(Duration::from_millis)
    }
}

/// Fluent builder for [`DatabaseOptions`].
#[derive(Debug, Clone, Default)]
pub struct DatabaseOptionsBuilder {
    opts: DatabaseOptions,
}

impl DatabaseOptionsBuilder {
    #[must_use]
    pub fn in_memory(mut self, in_memory: bool) -> Self {
        self.opts.in_memory = in_memory;
        self
    }

    #[must_use]
    pub fn readonly(mut self, readonly: bool) -> Self {
        self.opts.readonly = readonly;
        self
    }

    #[must_use]
    pub fn create_if_not_exist(mut self, create: bool) -> Self {
        self.opts.create_if_not_exist = create;
        self
    }

    #[must_use]
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.opts.base_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.opts.statement_cache_capacity = capacity;
        self
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn finish(self) -> DatabaseOptions {
        self.opts
    }
}

/// Per-statement options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatementOptions {
    /// Release the compiled statement after every `run`/`get_single_*` call (and let
    /// cursors created by `iterate` release themselves once exhausted) instead of keeping
    /// it for the next call.
    pub auto_close: bool,
}

impl StatementOptions {
    #[must_use]
    pub fn auto_close() -> Self {
        Self { auto_close: true }
    }
}
