use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::results::Row;

use super::config::{DatabaseOptions, StatementOptions};
use super::connection::SharedConnection;
use super::prepared::Statement;
use super::provider::{ConnectionProvider, FileSystemProvider};

const IN_MEMORY_NAME: &str = ":memory:";

/// Handle owning one engine connection.
///
/// Statements and iterators created from the handle share its connection slot, so after
/// [`close`](Self::close) every one of them fails with `SqliteShimError::ClosedHandle`.
#[derive(Debug)]
pub struct Database {
    name: String,
    path: Option<PathBuf>,
    in_memory: bool,
    readonly: bool,
    connection: SharedConnection,
}

impl Database {
    /// Open (or create) the database called `name`, resolved against
    /// `options.base_dir`.
    ///
    /// # Errors
    /// Returns `ConnectionError` if the engine cannot open the file, `ConfigError` for an
    /// unusable name, `Io` if its directory cannot be prepared.
    pub fn open(name: &str, options: &DatabaseOptions) -> Result<Self> {
        let provider = FileSystemProvider::from_options(options);
        Self::open_with_provider(name, options, &provider)
    }

    /// Open through a caller-supplied [`ConnectionProvider`].
    ///
    /// # Errors
    /// Same as [`open`](Self::open), plus whatever the provider reports.
    pub fn open_with_provider(
        name: &str,
        options: &DatabaseOptions,
        provider: &dyn ConnectionProvider,
    ) -> Result<Self> {
        let (conn, path) = provider.open(name, options)?;
        conn.set_prepared_statement_cache_capacity(options.statement_cache_capacity);
        if let Some(timeout) = options.busy_timeout() {
            conn.busy_timeout(timeout)?;
        }

        let name = if options.in_memory && name.is_empty() {
            IN_MEMORY_NAME.to_string()
        } else {
            name.to_string()
        };
        tracing::debug!(
            database = %name,
            path = ?path,
            in_memory = options.in_memory,
            readonly = options.readonly,
            "opened database"
        );
        let connection = SharedConnection::new(conn, &name);
        Ok(Self {
            name,
            path,
            in_memory: options.in_memory,
            readonly: options.readonly,
            connection,
        })
    }

    /// Private in-memory database.
    ///
    /// # Errors
    /// Returns `ConnectionError` if the engine cannot allocate the database.
    pub fn in_memory() -> Result<Self> {
        let options = DatabaseOptions::builder().in_memory(true).finish();
        Self::open(IN_MEMORY_NAME, &options)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File backing the database; `None` in memory.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.in_memory
    }

    #[must_use]
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.connection.is_open()
    }

    /// Run one statement that returns no rows, without parameters.
    /// Returns the number of changed rows.
    ///
    /// # Errors
    /// Returns `ExecutionError` for malformed SQL or constraint violations,
    /// `ClosedHandle` after `close`.
    pub fn execute(&self, sql: &str) -> Result<usize> {
        let changed = self
            .connection
            .with_connection("execute", |conn| Ok(conn.execute(sql, [])?))?;
        tracing::debug!(database = %self.name, sql, changed, "execute");
        Ok(changed)
    }

    /// Run a script of `;`-separated statements.
    ///
    /// # Errors
    /// Returns `ExecutionError` for the first failing statement, `ClosedHandle` after
    /// `close`.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.connection
            .with_connection("execute batch", |conn| Ok(conn.execute_batch(sql)?))?;
        tracing::debug!(database = %self.name, "execute batch");
        Ok(())
    }

    /// Run `PRAGMA <sql>` and return every row it produces.
    ///
    /// ```
    /// use sqlite_shim::prelude::*;
    ///
    /// let db = Database::in_memory()?;
    /// db.execute("CREATE TABLE t (a INTEGER, b TEXT)")?;
    /// let columns = db.pragma("table_info(t)")?;
    /// assert_eq!(columns.len(), 2);
    /// # Ok::<(), SqliteShimError>(())
    /// ```
    ///
    /// # Errors
    /// Returns `ExecutionError` for an unknown or malformed pragma, `ClosedHandle` after
    /// `close`.
    pub fn pragma(&self, sql: &str) -> Result<Vec<Row>> {
        let stmt = self.prepare_with(&format!("PRAGMA {sql}"), StatementOptions::auto_close())?;
        stmt.all(&[])
    }

    /// Statement over `sql`. Nothing is compiled until the statement is first used.
    ///
    /// # Errors
    /// Returns `ClosedHandle` after `close`.
    pub fn prepare(&self, sql: &str, auto_close: bool) -> Result<Statement> {
        self.prepare_with(sql, StatementOptions { auto_close })
    }

    /// [`prepare`](Self::prepare) with explicit [`StatementOptions`].
    ///
    /// # Errors
    /// Returns `ClosedHandle` after `close`.
    pub fn prepare_with(&self, sql: &str, options: StatementOptions) -> Result<Statement> {
        self.connection.ensure_open("prepare")?;
        Ok(Statement::new(self.connection.clone(), sql, options))
    }

    /// Row id of the most recent successful INSERT on this connection.
    ///
    /// # Errors
    /// Returns `ClosedHandle` after `close`.
    pub fn last_insert_row_id(&self) -> Result<i64> {
        let mut stmt = self.prepare("SELECT last_insert_rowid();", true)?;
        let id = stmt.get_single_number(&[]);
        stmt.close();
        id
    }

    /// Schema version stored in the database header (`PRAGMA user_version`).
    ///
    /// # Errors
    /// Returns `ClosedHandle` after `close`, `ExecutionError` if the engine fails.
    pub fn version(&self) -> Result<i32> {
        self.connection.with_connection("version", |conn| {
            Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
        })
    }

    /// # Errors
    /// Returns `ExecutionError` on a read-only database, `ClosedHandle` after `close`.
    pub fn set_version(&self, version: i32) -> Result<()> {
        self.connection.with_connection("set version", |conn| {
            Ok(conn.pragma_update(None, "user_version", version)?)
        })?;
        tracing::debug!(database = %self.name, version, "set user_version");
        Ok(())
    }

    /// Release the engine connection. Calling it again is a no-op.
    ///
    /// # Errors
    /// Returns `ExecutionError` if the engine refuses to close; the handle counts as
    /// closed regardless.
    pub fn close(&self) -> Result<()> {
        if self.connection.close()? {
            tracing::debug!(database = %self.name, "closed database");
        }
        Ok(())
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::warn!(database = %self.name, error = %err, "closing database on drop failed");
        }
    }
}
