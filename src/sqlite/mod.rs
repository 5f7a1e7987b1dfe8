// SQLite engine binding.
//
// - config: database and statement options
// - provider: where database files live and how connections are opened
// - connection: the connection slot shared by a database and everything derived from it
// - params: value binding
// - cursor: owned result windows read by the row materializer
// - compiled / prepared: statement lifecycle
// - database: the public handle

pub mod config;
pub(crate) mod connection;
pub(crate) mod compiled;
pub mod cursor;
pub mod database;
pub mod params;
pub mod prepared;
pub mod provider;

pub use config::{DatabaseOptions, DatabaseOptionsBuilder, StatementOptions};
pub use cursor::{ColumnSource, ColumnType, Cursor};
pub use database::Database;
pub use params::{BindStrategy, Bindable, BindingList, bind_values, classify};
pub use prepared::Statement;
pub use provider::{ConnectionProvider, FileSystemProvider, open_flags};
