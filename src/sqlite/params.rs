use std::borrow::Cow;

use rusqlite::types::Value;

use crate::error::{Result, SqliteShimError};
use crate::types::RowValues;

/// `i64::MIN` as an exact double; `-i64::MIN` is the first double past `i64::MAX`.
const I64_MIN_F64: f64 = -9_223_372_036_854_775_808.0;

/// A target exposing positional (1-based) parameter slots.
pub trait Bindable {
    /// Number of placeholders, when the target knows it up front.
    fn parameter_count(&self) -> Option<usize>;

    /// Reset every slot to NULL.
    fn clear_bindings(&mut self);

    /// # Errors
    /// Returns `SqliteShimError::BindError` if `slot` is not a valid placeholder.
    fn bind_null(&mut self, slot: usize) -> Result<()>;

    /// # Errors
    /// Returns `SqliteShimError::BindError` if `slot` is not a valid placeholder.
    fn bind_long(&mut self, slot: usize, value: i64) -> Result<()>;

    /// # Errors
    /// Returns `SqliteShimError::BindError` if `slot` is not a valid placeholder.
    fn bind_double(&mut self, slot: usize, value: f64) -> Result<()>;

    /// # Errors
    /// Returns `SqliteShimError::BindError` if `slot` is not a valid placeholder.
    fn bind_text(&mut self, slot: usize, value: &str) -> Result<()>;

    /// # Errors
    /// Returns `SqliteShimError::BindError` if `slot` is not a valid placeholder.
    fn bind_blob(&mut self, slot: usize, value: &[u8]) -> Result<()>;
}

/// The engine bind call chosen for one parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum BindStrategy<'a> {
    Null,
    Long(i64),
    Double(f64),
    Text(&'a str),
    Blob(Cow<'a, [u8]>),
}

/// Pick the bind call for a value.
///
/// Priority: NULL, integral numbers as 64-bit integers, other numbers as doubles,
/// booleans as 1/0, text as text, and everything else as a blob. JSON values take the
/// blob path as their serialized bytes.
#[must_use]
pub fn classify(value: &RowValues) -> BindStrategy<'_> {
    match value {
        RowValues::Null => BindStrategy::Null,
        RowValues::Int(i) => BindStrategy::Long(*i),
        RowValues::Float(f) => match integral_value(*f) {
            Some(i) => BindStrategy::Long(i),
            None => BindStrategy::Double(*f),
        },
        RowValues::Bool(b) => BindStrategy::Long(i64::from(*b)),
        RowValues::Text(s) => BindStrategy::Text(s),
        RowValues::Blob(bytes) => BindStrategy::Blob(Cow::Borrowed(bytes)),
        RowValues::JSON(json) => BindStrategy::Blob(Cow::Owned(json.to_string().into_bytes())),
    }
}

/// `Some` when `f` is a whole number representable as an `i64`.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn integral_value(f: f64) -> Option<i64> {
    if f.is_finite() && f.trunc() == f && (I64_MIN_F64..-I64_MIN_F64).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

/// Clear `target` and bind `params` in order: the Nth value goes to slot N.
///
/// # Errors
/// Returns `SqliteShimError::BindError` if there are more values than placeholders or a
/// slot is rejected by the target.
pub fn bind_values<B: Bindable + ?Sized>(target: &mut B, params: &[RowValues]) -> Result<()> {
    if let Some(expected) = target.parameter_count() {
        if params.len() > expected {
            return Err(SqliteShimError::BindError(format!(
                "{} values supplied for {expected} placeholders",
                params.len()
            )));
        }
    }

    target.clear_bindings();
    for (idx, value) in params.iter().enumerate() {
        let slot = idx + 1;
        let strategy = classify(value);
        tracing::trace!(slot, kind = value.kind(), ?strategy, "bind");
        match strategy {
            BindStrategy::Null => target.bind_null(slot)?,
            BindStrategy::Long(i) => target.bind_long(slot, i)?,
            BindStrategy::Double(f) => target.bind_double(slot, f)?,
            BindStrategy::Text(s) => target.bind_text(slot, s)?,
            BindStrategy::Blob(bytes) => target.bind_blob(slot, &bytes)?,
        }
    }
    Ok(())
}

/// Growable binding list for one-shot queries whose placeholder count is only known to
/// the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingList {
    values: Vec<Value>,
}

impl BindingList {
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Pad with NULLs up to `count` placeholders.
    ///
    /// # Errors
    /// Returns `SqliteShimError::BindError` if more values are bound than `count`.
    pub fn fit_to(mut self, count: usize) -> Result<Vec<Value>> {
        if self.values.len() > count {
            return Err(SqliteShimError::BindError(format!(
                "{} values supplied for {count} placeholders",
                self.values.len()
            )));
        }
        self.values.resize(count, Value::Null);
        Ok(self.values)
    }

    fn set(&mut self, slot: usize, value: Value) -> Result<()> {
        let idx = slot_index(slot)?;
        if self.values.len() <= idx {
            self.values.resize(idx + 1, Value::Null);
        }
        self.values[idx] = value;
        Ok(())
    }
}

impl Bindable for BindingList {
    fn parameter_count(&self) -> Option<usize> {
        None
    }

    fn clear_bindings(&mut self) {
        self.values.clear();
    }

    fn bind_null(&mut self, slot: usize) -> Result<()> {
        self.set(slot, Value::Null)
    }

    fn bind_long(&mut self, slot: usize, value: i64) -> Result<()> {
        self.set(slot, Value::Integer(value))
    }

    fn bind_double(&mut self, slot: usize, value: f64) -> Result<()> {
        self.set(slot, Value::Real(value))
    }

    fn bind_text(&mut self, slot: usize, value: &str) -> Result<()> {
        self.set(slot, Value::Text(value.to_owned()))
    }

    fn bind_blob(&mut self, slot: usize, value: &[u8]) -> Result<()> {
        self.set(slot, Value::Blob(value.to_vec()))
    }
}

/// Translate a 1-based slot into a vector index.
pub(crate) fn slot_index(slot: usize) -> Result<usize> {
    slot.checked_sub(1)
        .ok_or_else(|| SqliteShimError::BindError("parameter slots start at 1".into()))
}
