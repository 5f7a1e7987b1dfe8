//! Convenient imports for common functionality.

pub use crate::error::{Result, SqliteShimError};
pub use crate::params;
pub use crate::results::{Row, RowIterator};
pub use crate::sqlite::{
    ConnectionProvider, Database, DatabaseOptions, FileSystemProvider, Statement,
    StatementOptions,
};
pub use crate::types::RowValues;
