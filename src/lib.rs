//! Synchronous statement/row API over an embedded SQLite engine.
//!
//! A [`Database`] owns one connection. [`Statement`]s bind [`RowValues`] positionally and
//! run them; row-returning calls hand back [`Row`]s, either all at once or through a
//! pull-based [`RowIterator`].
//!
//! ```
//! use sqlite_shim::prelude::*;
//!
//! let db = Database::in_memory()?;
//! db.execute("CREATE TABLE t (x INTEGER)")?;
//! let mut insert = db.prepare("INSERT INTO t (x) VALUES (?)", false)?;
//! assert_eq!(insert.run(&params![42])?, 1);
//!
//! let row = db.prepare("SELECT x FROM t WHERE x = ?", false)?.get(&params![42])?;
//! assert_eq!(row.get("x"), Some(&RowValues::Int(42)));
//! # Ok::<(), SqliteShimError>(())
//! ```

pub mod error;
pub mod prelude;
pub mod results;
pub mod sqlite;
pub mod types;

pub use error::{Result, SqliteShimError};
pub use results::{Columns, Row, RowIterator};
pub use sqlite::{
    ConnectionProvider, Database, DatabaseOptions, DatabaseOptionsBuilder, FileSystemProvider,
    Statement, StatementOptions,
};
pub use types::RowValues;
