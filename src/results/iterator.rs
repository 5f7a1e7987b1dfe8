use std::sync::Arc;

use crate::error::{Result, SqliteShimError};
use crate::sqlite::connection::SharedConnection;
use crate::sqlite::cursor::Cursor;

use super::materialize::materialize_row;
use super::row::{Columns, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IterState {
    /// Not yet exhausted.
    Ready,
    /// Ran past the last row; the cursor was released (`auto_close`) or rewound.
    Exhausted,
}

#[derive(Debug, Clone, Copy)]
enum Edge {
    First,
    Last,
}

/// Lazy, pull-based sequence of [`Row`]s over one result cursor.
///
/// With `auto_close` the cursor is released as soon as the rows run out (or after
/// [`get_first`](Self::get_first)/[`get_last`](Self::get_last)); without it the cursor
/// is rewound instead and [`reset`](Self::reset) makes the iterator restartable.
#[derive(Debug)]
pub struct RowIterator {
    cursor: Option<Cursor>,
    columns: Arc<Columns>,
    connection: SharedConnection,
    state: IterState,
    auto_close: bool,
    closed: bool,
}

impl RowIterator {
    pub(crate) fn new(cursor: Cursor, connection: SharedConnection, auto_close: bool) -> Self {
        let columns = Arc::new(Columns::new(cursor.shared_column_names()));
        Self {
            cursor: Some(cursor),
            columns,
            connection,
            state: IterState::Ready,
            auto_close,
            closed: false,
        }
    }

    /// Advance one row.
    ///
    /// Past exhaustion (or after `close`) this returns `Ok(None)` every time without
    /// touching the cursor.
    ///
    /// # Errors
    /// Returns `SqliteShimError::ClosedHandle` if the database was closed while rows were
    /// still pending, or a materialization error for the current row.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        if self.closed || self.state == IterState::Exhausted {
            return Ok(None);
        }
        self.connection.ensure_open("row iterator")?;

        let columns = &self.columns;
        let Some(cursor) = self.cursor.as_mut() else {
            return Err(released());
        };
        if cursor.move_to_next()? {
            let row = materialize_row(&*cursor, columns)?;
            return Ok(Some(row));
        }

        if self.auto_close {
            self.release();
        } else {
            cursor.restore_position(-1);
        }
        self.state = IterState::Exhausted;
        Ok(None)
    }

    /// First row of the result, leaving the iteration position where it was.
    ///
    /// # Errors
    /// Returns `SqliteShimError::EmptyResult` on an empty result, `ClosedHandle` if the
    /// iterator or its database is closed.
    pub fn get_first(&mut self) -> Result<Row> {
        self.get_edge(Edge::First)
    }

    /// Last row of the result, leaving the iteration position where it was.
    ///
    /// # Errors
    /// Returns `SqliteShimError::EmptyResult` on an empty result, `ClosedHandle` if the
    /// iterator or its database is closed.
    pub fn get_last(&mut self) -> Result<Row> {
        self.get_edge(Edge::Last)
    }

    /// Rewind to before the first row so iteration starts over.
    ///
    /// # Errors
    /// Returns `SqliteShimError::ClosedHandle` once the cursor has been released.
    pub fn reset(&mut self) -> Result<()> {
        self.connection.ensure_open("row iterator reset")?;
        let cursor = self.cursor_mut()?;
        cursor.restore_position(-1);
        self.state = IterState::Ready;
        Ok(())
    }

    /// Release the cursor. Safe to call any number of times.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.release();
        self.state = IterState::Exhausted;
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        self.columns.names()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[must_use]
    pub fn auto_close(&self) -> bool {
        self.auto_close
    }

    fn get_edge(&mut self, edge: Edge) -> Result<Row> {
        self.connection.ensure_open("row iterator")?;
        let columns = Arc::clone(&self.columns);
        let cursor = self.cursor_mut()?;

        let saved = cursor.position();
        let moved = match edge {
            Edge::First => cursor.move_to_first(),
            Edge::Last => cursor.move_to_last(),
        };
        let row = match moved {
            Ok(true) => materialize_row(&*cursor, &columns),
            Ok(false) => Err(SqliteShimError::EmptyResult(format!(
                "no {} row in an empty result",
                match edge {
                    Edge::First => "first",
                    Edge::Last => "last",
                }
            ))),
            Err(err) => Err(err),
        };
        cursor.restore_position(saved);

        if self.auto_close {
            self.release();
            self.state = IterState::Exhausted;
        }
        row
    }

    fn cursor_mut(&mut self) -> Result<&mut Cursor> {
        self.cursor.as_mut().ok_or_else(released)
    }

    fn release(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            cursor.close();
            tracing::debug!(database = %self.connection.label(), "released cursor");
        }
        self.closed = true;
    }
}

fn released() -> SqliteShimError {
    SqliteShimError::ClosedHandle("row iterator cursor was released".into())
}

impl Iterator for RowIterator {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

impl Drop for RowIterator {
    fn drop(&mut self) {
        self.close();
    }
}
