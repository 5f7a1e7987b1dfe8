use std::sync::Arc;

use rusqlite::params_from_iter;
use rusqlite::types::{Type, Value};

use crate::error::{Result, SqliteShimError};

use super::compiled::with_prepared;
use super::connection::SharedConnection;
use super::params::BindingList;

/// Rows held by the first window a cursor fills.
pub const FIRST_WINDOW_ROWS: usize = 1;
/// Upper bound a window grows to while a cursor is read front to back.
pub const MAX_WINDOW_ROWS: usize = 16 * 1024;

/// Engine type tags reported by [`ColumnSource::column_type`].
pub const FIELD_TYPE_NULL: i32 = 0;
pub const FIELD_TYPE_INTEGER: i32 = 1;
pub const FIELD_TYPE_FLOAT: i32 = 2;
pub const FIELD_TYPE_STRING: i32 = 3;
pub const FIELD_TYPE_BLOB: i32 = 4;

/// Decoded column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Null,
    Integer,
    Float,
    String,
    Blob,
}

impl ColumnType {
    /// `None` for tags this layer does not understand.
    #[must_use]
    pub fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            FIELD_TYPE_NULL => Some(ColumnType::Null),
            FIELD_TYPE_INTEGER => Some(ColumnType::Integer),
            FIELD_TYPE_FLOAT => Some(ColumnType::Float),
            FIELD_TYPE_STRING => Some(ColumnType::String),
            FIELD_TYPE_BLOB => Some(ColumnType::Blob),
            _ => None,
        }
    }

    #[must_use]
    pub fn tag(self) -> i32 {
        match self {
            ColumnType::Null => FIELD_TYPE_NULL,
            ColumnType::Integer => FIELD_TYPE_INTEGER,
            ColumnType::Float => FIELD_TYPE_FLOAT,
            ColumnType::String => FIELD_TYPE_STRING,
            ColumnType::Blob => FIELD_TYPE_BLOB,
        }
    }

    fn of(value: &Value) -> Self {
        match value {
            Value::Null => ColumnType::Null,
            Value::Integer(_) => ColumnType::Integer,
            Value::Real(_) => ColumnType::Float,
            Value::Text(_) => ColumnType::String,
            Value::Blob(_) => ColumnType::Blob,
        }
    }
}

/// A positioned row exposing column names, a type tag per column and typed accessors.
pub trait ColumnSource {
    fn column_names(&self) -> &[String];

    /// # Errors
    /// Fails if the source is not positioned on a row or `idx` is out of range.
    fn column_type(&self, idx: usize) -> Result<i32>;

    /// # Errors
    /// Fails if the cell is not an integer.
    fn get_long(&self, idx: usize) -> Result<i64>;

    /// # Errors
    /// Fails if the cell is not a float.
    fn get_double(&self, idx: usize) -> Result<f64>;

    /// # Errors
    /// Fails if the cell is not text.
    fn get_string(&self, idx: usize) -> Result<String>;

    /// # Errors
    /// Fails if the cell is not a blob.
    fn get_blob(&self, idx: usize) -> Result<Vec<u8>>;
}

/// Copy every cell of `row` out of the engine.
///
/// # Errors
/// Returns `ExecutionError` if a cell cannot be read, including text that is not UTF-8.
pub(crate) fn read_cells(row: &rusqlite::Row<'_>, column_count: usize) -> Result<Vec<Value>> {
    let mut cells = Vec::with_capacity(column_count);
    for i in 0..column_count {
        cells.push(Value::try_from(row.get_ref(i)?).map_err(rusqlite::Error::from)?);
    }
    Ok(cells)
}

/// The query a cursor re-runs whenever it needs rows outside its window.
#[derive(Debug)]
struct QuerySource {
    connection: SharedConnection,
    sql: Arc<str>,
    cached: bool,
    params: Vec<Value>,
}

impl QuerySource {
    /// Run the query, skip `start` rows and copy at most `limit` rows.
    /// The second element is the total row count once the end was reached.
    fn read(
        &self,
        start: usize,
        limit: usize,
        column_count: usize,
    ) -> Result<(Vec<Vec<Value>>, Option<usize>)> {
        self.connection.with_connection("cursor window", |conn| {
            with_prepared(conn, &self.sql, self.cached, |stmt| {
                let mut rows = stmt.query(params_from_iter(self.params.iter()))?;
                for skipped in 0..start {
                    if rows.next()?.is_none() {
                        return Ok((Vec::new(), Some(skipped)));
                    }
                }
                let mut window = Vec::new();
                while window.len() < limit {
                    match rows.next()? {
                        Some(row) => window.push(read_cells(row, column_count)?),
                        None => {
                            let total = start + window.len();
                            return Ok((window, Some(total)));
                        }
                    }
                }
                Ok((window, None))
            })
        })
    }

    fn count_rows(&self) -> Result<usize> {
        self.connection.with_connection("cursor count", |conn| {
            with_prepared(conn, &self.sql, self.cached, |stmt| {
                let mut rows = stmt.query(params_from_iter(self.params.iter()))?;
                let mut total = 0;
                while rows.next()?.is_some() {
                    total += 1;
                }
                Ok(total)
            })
        })
    }
}

/// Positioned view over a query result, filled one window at a time.
///
/// Only the rows of the current window are held. Moving outside it re-runs the query
/// and copies the next window, which doubles in size while the cursor is read front to
/// back. Statements that may write are read in a single pass when the cursor opens so
/// they never run twice. Position `-1` is before the first row; once the end has been
/// seen, the row count is the position after the last one.
#[derive(Debug)]
pub struct Cursor {
    columns: Arc<Vec<String>>,
    source: Option<QuerySource>,
    window: Vec<Vec<Value>>,
    window_start: usize,
    window_rows: usize,
    total: Option<usize>,
    position: isize,
    closed: bool,
}

impl Cursor {
    /// Prepare `sql`, check `bindings` against its placeholders and open a cursor over it.
    /// Read-only queries are not stepped until the first move.
    ///
    /// # Errors
    /// Returns `ClosedHandle` if the connection is closed, `BindError` for surplus
    /// bindings, `ExecutionError` if the SQL does not compile or a writing statement fails.
    pub(crate) fn open(
        connection: SharedConnection,
        sql: Arc<str>,
        cached: bool,
        bindings: BindingList,
    ) -> Result<Self> {
        let (columns, params, readonly) = connection.with_connection("open cursor", |conn| {
            with_prepared(conn, &sql, cached, |stmt| {
                let params = bindings.fit_to(stmt.parameter_count())?;
                let columns: Vec<String> = stmt
                    .column_names()
                    .iter()
                    .map(std::string::ToString::to_string)
                    .collect();
                Ok((columns, params, stmt.readonly()))
            })
        })?;

        let mut cursor = Self {
            columns: Arc::new(columns),
            source: Some(QuerySource {
                connection,
                sql,
                cached,
                params,
            }),
            window: Vec::new(),
            window_start: 0,
            window_rows: if readonly { FIRST_WINDOW_ROWS } else { usize::MAX },
            total: None,
            position: -1,
            closed: false,
        };
        if !readonly {
            cursor.load(0)?;
        }
        Ok(cursor)
    }

    /// Build a cursor from already materialized cells.
    #[must_use]
    pub fn from_parts(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns: Arc::new(columns),
            source: None,
            total: Some(rows.len()),
            window_rows: rows.len(),
            window: rows,
            window_start: 0,
            position: -1,
            closed: false,
        }
    }

    /// Number of rows, stepping through the rest of the query if the end has not been
    /// seen yet.
    ///
    /// # Errors
    /// Returns the engine error met while counting.
    pub fn count(&mut self) -> Result<usize> {
        if let Some(total) = self.total {
            return Ok(total);
        }
        let total = match &self.source {
            Some(source) => source.count_rows()?,
            None => self.window.len(),
        };
        self.total = Some(total);
        Ok(total)
    }

    #[must_use]
    pub fn position(&self) -> isize {
        self.position
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[must_use]
    pub fn shared_column_names(&self) -> Arc<Vec<String>> {
        Arc::clone(&self.columns)
    }

    /// Move to `position`, clamping to the before-first/after-last sentinels.
    /// Returns `true` when the cursor lands on a row.
    ///
    /// # Errors
    /// Returns `ClosedHandle` if the connection closed before a needed window was read,
    /// or the engine error met while reading it.
    pub fn move_to_position(&mut self, position: isize) -> Result<bool> {
        let Ok(target) = usize::try_from(position) else {
            self.position = -1;
            return Ok(false);
        };
        if self.closed {
            self.position = -1;
            return Ok(false);
        }
        if self.total.is_some_and(|total| target >= total) {
            self.position = to_isize(self.total.unwrap_or(target));
            return Ok(false);
        }
        if !self.in_window(target) {
            if !self.window.is_empty() && target == self.window_start + self.window.len() {
                self.window_rows = self.window_rows.saturating_mul(2).min(MAX_WINDOW_ROWS);
            }
            self.load(target)?;
            if !self.in_window(target) {
                self.position = to_isize(self.total.unwrap_or(target));
                return Ok(false);
            }
        }
        self.position = position;
        Ok(true)
    }

    /// # Errors
    /// See [`move_to_position`](Self::move_to_position).
    pub fn move_to_next(&mut self) -> Result<bool> {
        self.move_to_position(self.position + 1)
    }

    /// # Errors
    /// See [`move_to_position`](Self::move_to_position).
    pub fn move_to_first(&mut self) -> Result<bool> {
        self.move_to_position(0)
    }

    /// # Errors
    /// See [`move_to_position`](Self::move_to_position); also counts the remaining rows
    /// when the end has not been seen.
    pub fn move_to_last(&mut self) -> Result<bool> {
        if self.closed {
            return Ok(false);
        }
        let total = self.count()?;
        self.move_to_position(to_isize(total) - 1)
    }

    /// Put the position back to a value returned by [`position`](Self::position)
    /// without reading anything. The next move refills the window if needed.
    pub fn restore_position(&mut self, position: isize) {
        if !self.closed {
            self.position = position.max(-1);
        }
    }

    /// Drop the window and the query. Idempotent.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.window = Vec::new();
            self.source = None;
            self.position = -1;
        }
    }

    fn in_window(&self, target: usize) -> bool {
        target >= self.window_start && target < self.window_start + self.window.len()
    }

    fn load(&mut self, start: usize) -> Result<()> {
        let Some(source) = &self.source else {
            return Ok(());
        };
        let (rows, total) = source.read(start, self.window_rows, self.columns.len())?;
        tracing::trace!(start, rows = rows.len(), "filled cursor window");
        self.window = rows;
        self.window_start = start;
        if total.is_some() {
            self.total = total;
        }
        Ok(())
    }

    fn cell(&self, idx: usize) -> Result<&Value> {
        if self.closed {
            return Err(SqliteShimError::ClosedHandle("cursor".into()));
        }
        let row = usize::try_from(self.position)
            .ok()
            .filter(|p| self.in_window(*p))
            .and_then(|p| self.window.get(p - self.window_start))
            .ok_or_else(|| {
                SqliteShimError::EmptyResult(format!(
                    "cursor is not positioned on a row (position {})",
                    self.position
                ))
            })?;
        row.get(idx)
            .ok_or(SqliteShimError::ExecutionError(rusqlite::Error::InvalidColumnIndex(idx)))
    }

    fn mismatch(&self, idx: usize, value: &Value) -> SqliteShimError {
        let name = self.columns.get(idx).cloned().unwrap_or_default();
        SqliteShimError::ExecutionError(rusqlite::Error::InvalidColumnType(
            idx,
            name,
            value_type(value),
        ))
    }
}

fn to_isize(n: usize) -> isize {
    isize::try_from(n).unwrap_or(isize::MAX)
}

fn value_type(value: &Value) -> Type {
    match value {
        Value::Null => Type::Null,
        Value::Integer(_) => Type::Integer,
        Value::Real(_) => Type::Real,
        Value::Text(_) => Type::Text,
        Value::Blob(_) => Type::Blob,
    }
}

impl ColumnSource for Cursor {
    fn column_names(&self) -> &[String] {
        &self.columns
    }

    fn column_type(&self, idx: usize) -> Result<i32> {
        self.cell(idx).map(|v| ColumnType::of(v).tag())
    }

    fn get_long(&self, idx: usize) -> Result<i64> {
        match self.cell(idx)? {
            Value::Integer(i) => Ok(*i),
            other => Err(self.mismatch(idx, other)),
        }
    }

    fn get_double(&self, idx: usize) -> Result<f64> {
        match self.cell(idx)? {
            Value::Real(f) => Ok(*f),
            other => Err(self.mismatch(idx, other)),
        }
    }

    fn get_string(&self, idx: usize) -> Result<String> {
        match self.cell(idx)? {
            Value::Text(s) => Ok(s.clone()),
            other => Err(self.mismatch(idx, other)),
        }
    }

    fn get_blob(&self, idx: usize) -> Result<Vec<u8>> {
        match self.cell(idx)? {
            Value::Blob(b) => Ok(b.clone()),
            other => Err(self.mismatch(idx, other)),
        }
    }
}
