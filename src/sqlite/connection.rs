use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::error::{Result, SqliteShimError};

/// Connection slot shared by a database and every statement/iterator derived from it.
///
/// Closing empties the slot, so later calls through any clone fail with
/// `SqliteShimError::ClosedHandle` instead of touching a released connection.
#[derive(Clone)]
pub(crate) struct SharedConnection {
    slot: Arc<Mutex<Option<Connection>>>,
    label: Arc<str>,
}

impl SharedConnection {
    pub(crate) fn new(conn: Connection, label: &str) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(conn))),
            label: Arc::from(label),
        }
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    /// Run `func` against the live connection.
    ///
    /// # Errors
    /// Returns `SqliteShimError::ClosedHandle` (mentioning `ctx`) if the connection was
    /// closed, or whatever `func` returns.
    pub(crate) fn with_connection<F, R>(&self, ctx: &str, func: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R>,
    {
        let guard = self.lock();
        match guard.as_ref() {
            Some(conn) => func(conn),
            None => Err(self.closed_error(ctx)),
        }
    }

    /// Fail fast when the connection is gone.
    ///
    /// # Errors
    /// Returns `SqliteShimError::ClosedHandle` if the connection was closed.
    pub(crate) fn ensure_open(&self, ctx: &str) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(self.closed_error(ctx))
        }
    }

    /// Take the connection out of the slot and close it.
    /// Returns `Ok(false)` when it was already closed.
    ///
    /// # Errors
    /// Returns the engine error if `sqlite3_close` fails; the slot stays empty either way.
    pub(crate) fn close(&self) -> Result<bool> {
        let taken = self.lock().take();
        match taken {
            Some(conn) => {
                conn.close().map_err(|(_conn, err)| SqliteShimError::from(err))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn closed_error(&self, ctx: &str) -> SqliteShimError {
        SqliteShimError::ClosedHandle(format!("database '{}' is closed ({ctx})", self.label))
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        match self.slot.lock() {
            Ok(guard) => guard,
            // A panic inside a closure cannot leave the connection half-updated.
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl fmt::Debug for SharedConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedConnection")
            .field("label", &self.label)
            .field("open", &self.is_open())
            .finish()
    }
}
