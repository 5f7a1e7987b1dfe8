use std::sync::Arc;

use crate::error::{Result, SqliteShimError};
use crate::sqlite::cursor::{ColumnSource, ColumnType};
use crate::types::RowValues;

use super::row::{Columns, Row};

/// Read the current position of `source` into a [`Row`].
///
/// Each column's engine tag selects exactly one accessor; NULL columns are stored as
/// `RowValues::Null` without reading anything.
///
/// # Errors
/// Returns `SqliteShimError::UnsupportedColumnType` for a tag outside the known set, or
/// the accessor's error.
pub fn materialize_row<S: ColumnSource + ?Sized>(source: &S, columns: &Arc<Columns>) -> Result<Row> {
    let mut values = Vec::with_capacity(columns.len());
    for (idx, name) in columns.names().iter().enumerate() {
        let tag = source.column_type(idx)?;
        let value = match ColumnType::from_tag(tag) {
            Some(ColumnType::Null) => RowValues::Null,
            Some(ColumnType::Integer) => RowValues::Int(source.get_long(idx)?),
            Some(ColumnType::Float) => RowValues::Float(source.get_double(idx)?),
            Some(ColumnType::String) => RowValues::Text(source.get_string(idx)?),
            Some(ColumnType::Blob) => RowValues::Blob(source.get_blob(idx)?),
            None => {
                return Err(SqliteShimError::UnsupportedColumnType {
                    column: name.clone(),
                    tag,
                });
            }
        };
        values.push(value);
    }
    tracing::trace!(columns = columns.len(), "materialized row");
    Ok(Row::new(Arc::clone(columns), values))
}
