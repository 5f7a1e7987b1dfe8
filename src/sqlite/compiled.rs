use rusqlite::types::Value;
use rusqlite::{Connection, Statement, params_from_iter};

use crate::error::{Result, SqliteShimError};

use super::cursor::read_cells;
use super::params::{Bindable, slot_index};

/// Prepare `sql` and hand the statement to `func`.
///
/// Cached statements go through rusqlite's per-connection statement cache and return to
/// it afterwards; uncached ones are finalized when `func` returns.
pub(crate) fn with_prepared<R, F>(conn: &Connection, sql: &str, cached: bool, func: F) -> Result<R>
where
    F: FnOnce(&mut Statement<'_>) -> Result<R>,
{
    if cached {
        let mut stmt = conn.prepare_cached(sql)?;
        func(&mut *stmt)
    } else {
        let mut stmt = conn.prepare(sql)?;
        func(&mut stmt)
    }
}

/// Compiled form of one SQL string: its placeholder and column counts and the current
/// positional bindings. The engine statement itself stays in the connection cache.
#[derive(Debug, Clone)]
pub(crate) struct CompiledStatement {
    parameter_count: usize,
    column_count: usize,
    bindings: Vec<Value>,
}

impl CompiledStatement {
    /// Record the shape of a statement that has just been prepared.
    pub(crate) fn from_prepared(sql: &str, stmt: &Statement<'_>) -> Self {
        let parameter_count = stmt.parameter_count();
        let column_count = stmt.column_count();
        tracing::debug!(sql, parameter_count, column_count, "compiled statement");
        Self {
            parameter_count,
            column_count,
            bindings: vec![Value::Null; parameter_count],
        }
    }

    pub(crate) fn column_count(&self) -> usize {
        self.column_count
    }

    /// Execute `stmt` as INSERT/UPDATE/DELETE and return the number of changed rows.
    pub(crate) fn execute_update_delete(&self, stmt: &mut Statement<'_>) -> Result<i64> {
        let changed = stmt.execute(params_from_iter(self.bindings.iter()))?;
        Ok(changed_rows(changed))
    }

    /// Execute `stmt` and return the first row, if any. Later rows are never stepped.
    pub(crate) fn query_first_row(&self, stmt: &mut Statement<'_>) -> Result<Option<Vec<Value>>> {
        let column_count = stmt.column_count();
        let mut rows = stmt.query(params_from_iter(self.bindings.iter()))?;
        match rows.next()? {
            Some(row) => Ok(Some(read_cells(row, column_count)?)),
            None => Ok(None),
        }
    }

    fn slot(&mut self, slot: usize) -> Result<&mut Value> {
        let idx = slot_index(slot)?;
        let count = self.parameter_count;
        self.bindings.get_mut(idx).ok_or_else(|| {
            SqliteShimError::BindError(format!(
                "slot {slot} is out of range; statement has {count} placeholders"
            ))
        })
    }
}

/// Changed-row count as the signed width callers see, saturating at `i64::MAX`.
fn changed_rows(changed: usize) -> i64 {
    i64::try_from(changed).unwrap_or(i64::MAX)
}

impl Bindable for CompiledStatement {
    fn parameter_count(&self) -> Option<usize> {
        Some(self.parameter_count)
    }

    fn clear_bindings(&mut self) {
        self.bindings.fill(Value::Null);
    }

    fn bind_null(&mut self, slot: usize) -> Result<()> {
        *self.slot(slot)? = Value::Null;
        Ok(())
    }

    fn bind_long(&mut self, slot: usize, value: i64) -> Result<()> {
        *self.slot(slot)? = Value::Integer(value);
        Ok(())
    }

    fn bind_double(&mut self, slot: usize, value: f64) -> Result<()> {
        *self.slot(slot)? = Value::Real(value);
        Ok(())
    }

    fn bind_text(&mut self, slot: usize, value: &str) -> Result<()> {
        *self.slot(slot)? = Value::Text(value.to_owned());
        Ok(())
    }

    fn bind_blob(&mut self, slot: usize, value: &[u8]) -> Result<()> {
        *self.slot(slot)? = Value::Blob(value.to_vec());
        Ok(())
    }
}
