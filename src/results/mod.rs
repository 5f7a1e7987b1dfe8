pub mod iterator;
pub mod materialize;
pub mod row;

pub use iterator::RowIterator;
pub use materialize::materialize_row;
pub use row::{Columns, Row};
