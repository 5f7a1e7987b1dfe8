use std::collections::HashMap;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::RowValues;

/// Column names of a result set plus a name→index lookup, shared by every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
    names: Arc<Vec<String>>,
    index: HashMap<String, usize>,
}

impl Columns {
    /// Build the lookup. When a name repeats, the last column with that name wins.
    #[must_use]
    pub fn new(names: Arc<Vec<String>>) -> Self {
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { names, index }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

/// One materialized result row: a mapping from column name to value.
///
/// Values are kept in cursor order; lookups by name go through the shared [`Columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<Columns>,
    values: Vec<RowValues>,
}

impl Row {
    /// # Panics
    /// Debug builds assert that there is one value per column.
    #[must_use]
    pub fn new(columns: Arc<Columns>, values: Vec<RowValues>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Value of the column called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RowValues> {
        self.columns
            .index_of(name)
            .and_then(|idx| self.values.get(idx))
    }

    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.values.get(index)
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        self.columns.names()
    }

    #[must_use]
    pub fn values(&self) -> &[RowValues] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(name, value)` pairs in cursor order, skipping columns shadowed by a later
    /// column of the same name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValues)> + '_ {
        self.columns
            .names()
            .iter()
            .zip(&self.values)
            .enumerate()
            .filter(|(i, (name, _))| self.columns.index_of(name) == Some(*i))
            .map(|(_, (name, value))| (name.as_str(), value))
    }

    /// Consume the row into a plain map.
    #[must_use]
    pub fn into_map(self) -> HashMap<String, RowValues> {
        let Row { columns, values } = self;
        columns
            .names()
            .iter()
            .cloned()
            .zip(values)
            .collect()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries: Vec<(&str, &RowValues)> = self.iter().collect();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (name, value) in entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
