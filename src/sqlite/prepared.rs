use std::sync::Arc;

use rusqlite::types::Value;

use crate::error::{Result, SqliteShimError};
use crate::results::{Row, RowIterator};
use crate::types::RowValues;

use super::compiled::{CompiledStatement, with_prepared};
use super::config::StatementOptions;
use super::connection::SharedConnection;
use super::cursor::Cursor;
use super::params::{BindStrategy, Bindable, BindingList, bind_values, classify};

/// A prepared statement bound to one database.
///
/// Compilation is lazy: the SQL is compiled on the first `run`/`get_single_*` call and
/// kept for later calls, unless the statement was created with `auto_close`, in which
/// case the compiled form is released after every use.
#[derive(Debug)]
pub struct Statement {
    connection: SharedConnection,
    sql: Arc<str>,
    auto_close: bool,
    compiled: Option<CompiledStatement>,
}

impl Statement {
    pub(crate) fn new(connection: SharedConnection, sql: &str, options: StatementOptions) -> Self {
        Self {
            connection,
            sql: Arc::from(sql),
            auto_close: options.auto_close,
            compiled: None,
        }
    }

    /// Access the raw SQL string of the prepared statement.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn auto_close(&self) -> bool {
        self.auto_close
    }

    /// Whether a compiled form is currently held.
    #[must_use]
    pub fn is_compiled(&self) -> bool {
        self.compiled.is_some()
    }

    /// Number of placeholders in the SQL. Compiles the statement if needed.
    ///
    /// # Errors
    /// Returns `SqliteShimError::ClosedHandle` if the database is closed, or
    /// `ExecutionError` if the SQL does not compile.
    pub fn parameter_count(&mut self) -> Result<usize> {
        self.with_compiled("parameter count", |compiled, _stmt| {
            Ok(compiled.parameter_count().unwrap_or(0))
        })
    }

    /// Bind `params` and execute as INSERT/UPDATE/DELETE, returning the affected row count.
    ///
    /// # Errors
    /// Returns `BindError` for parameters the statement cannot take, `ExecutionError` for
    /// engine failures, `ClosedHandle` if the database is closed.
    pub fn run(&mut self, params: &[RowValues]) -> Result<i64> {
        let changed = self.with_compiled("run", |compiled, stmt| {
            bind_values(compiled, params)?;
            compiled.execute_update_delete(stmt)
        })?;
        tracing::debug!(sql = %self.sql, changed, "run");
        Ok(changed)
    }

    /// Bind `params`, run a scalar query and return its single value as an integer.
    ///
    /// # Errors
    /// Returns `EmptyResult` when no row comes back, `ScalarQueryError` when the result
    /// is not exactly one integral numeric column.
    pub fn get_single_number(&mut self, params: &[RowValues]) -> Result<i64> {
        let value = self.scalar(params)?;
        match value {
            Value::Integer(i) => Ok(i),
            Value::Real(f) => match classify(&RowValues::Float(f)) {
                BindStrategy::Long(i) => Ok(i),
                _ => Err(SqliteShimError::ScalarQueryError(format!(
                    "value {f} is not an integer"
                ))),
            },
            other => Err(SqliteShimError::ScalarQueryError(format!(
                "expected a number, got {}",
                RowValues::from(other).kind()
            ))),
        }
    }

    /// Bind `params`, run a scalar query and return its single value as text.
    ///
    /// Numbers are rendered the way the engine casts them to TEXT, so `1.0` stays
    /// `"1.0"` and `1e20` becomes `"1.0e+20"`.
    ///
    /// # Errors
    /// Returns `EmptyResult` when no row comes back, `ScalarQueryError` when the result
    /// is not exactly one column or the value is NULL/blob.
    pub fn get_single_string(&mut self, params: &[RowValues]) -> Result<String> {
        let value = self.scalar(params)?;
        match value {
            Value::Text(s) => Ok(s),
            Value::Integer(i) => Ok(i.to_string()),
            Value::Real(f) => self.connection.with_connection("render real", |conn| {
                let mut stmt = conn.prepare_cached("SELECT CAST(?1 AS TEXT)")?;
                Ok(stmt.query_row([f], |row| row.get::<_, String>(0))?)
            }),
            other => Err(SqliteShimError::ScalarQueryError(format!(
                "expected text, got {}",
                RowValues::from(other).kind()
            ))),
        }
    }

    /// First row of the result.
    ///
    /// # Errors
    /// Returns `EmptyResult` if the query yields no rows.
    pub fn get(&self, params: &[RowValues]) -> Result<Row> {
        self.iterate(params)?.get_first()
    }

    /// Every row of the result, in cursor order.
    ///
    /// # Errors
    /// Returns the first error met while querying or materializing rows.
    pub fn all(&self, params: &[RowValues]) -> Result<Vec<Row>> {
        self.iterate(params)?.collect()
    }

    /// Run the query with `params` bound inline and return a fresh [`RowIterator`].
    ///
    /// This does not go through the compiled form held for `run`.
    ///
    /// # Errors
    /// Returns `BindError` for too many parameters, `ExecutionError` for engine failures,
    /// `ClosedHandle` if the database is closed.
    pub fn iterate(&self, params: &[RowValues]) -> Result<RowIterator> {
        let mut bindings = BindingList::default();
        bind_values(&mut bindings, params)?;
        let cursor = Cursor::open(
            self.connection.clone(),
            Arc::clone(&self.sql),
            !self.auto_close,
            bindings,
        )?;
        tracing::debug!(sql = %self.sql, "opened cursor");
        Ok(RowIterator::new(
            cursor,
            self.connection.clone(),
            self.auto_close,
        ))
    }

    /// Release the compiled statement. Idempotent.
    pub fn close(&mut self) {
        if self.compiled.take().is_some() {
            tracing::debug!(sql = %self.sql, "released compiled statement");
        }
    }

    fn scalar(&mut self, params: &[RowValues]) -> Result<Value> {
        let first = self.with_compiled("scalar query", |compiled, stmt| {
            let columns = compiled.column_count();
            if columns != 1 {
                return Err(SqliteShimError::ScalarQueryError(format!(
                    "scalar query must return exactly one column, got {columns}"
                )));
            }
            bind_values(compiled, params)?;
            compiled.query_first_row(stmt)
        })?;
        first
            .and_then(|cells| cells.into_iter().next())
            .ok_or_else(|| {
                SqliteShimError::EmptyResult(format!("scalar query returned no rows: {}", self.sql))
            })
    }

    /// Prepare once, record the compiled form on first use, run `func`, then release
    /// the compiled form if `auto_close` is set, whether or not `func` succeeded.
    fn with_compiled<R, F>(&mut self, ctx: &str, func: F) -> Result<R>
    where
        F: FnOnce(&mut CompiledStatement, &mut rusqlite::Statement<'_>) -> Result<R>,
    {
        let Self {
            connection,
            sql,
            auto_close,
            compiled,
        } = self;
        let sql: &str = sql;
        let cached = !*auto_close;
        let result = connection.with_connection(ctx, |conn| {
            with_prepared(conn, sql, cached, |stmt| {
                let held = match compiled.take() {
                    Some(held) => held,
                    None => CompiledStatement::from_prepared(sql, stmt),
                };
                func(compiled.insert(held), stmt)
            })
        });
        if *auto_close {
            self.close();
        }
        result
    }
}

impl Drop for Statement {
    fn drop(&mut self) {
        self.close();
    }
}
