use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sqlite_shim::{DatabaseOptions, Result};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run statements against a SQLite database")]
pub(crate) struct Args {
    /// Database name, resolved against --dir.
    #[arg(long, default_value = "main.db")]
    pub(crate) db: String,
    #[arg(long)]
    pub(crate) dir: Option<PathBuf>,
    #[arg(long)]
    pub(crate) in_memory: bool,
    #[arg(long)]
    pub(crate) readonly: bool,
    /// Fail instead of creating a missing database file.
    #[arg(long)]
    pub(crate) no_create: bool,
    #[arg(long)]
    pub(crate) log: Option<PathBuf>,
    /// JSON file with database options; flags given on the command line win.
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    #[arg(long)]
    pub(crate) verbose: bool,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    /// Run statements that return no rows.
    Exec { sql: String },
    /// Run a query and print each row as a JSON line.
    Query {
        sql: String,
        /// Positional parameter, parsed as JSON when possible and as text otherwise.
        #[arg(long = "param")]
        params: Vec<String>,
    },
    /// Run `PRAGMA <sql>` and print its rows.
    Pragma { sql: String },
    /// Print the schema version, or set it with --set.
    Version {
        #[arg(long)]
        set: Option<i32>,
    },
    /// Print the single value of a scalar query.
    Scalar {
        sql: String,
        #[arg(long = "param")]
        params: Vec<String>,
    },
}

impl Args {
    pub(crate) fn database_options(&self) -> Result<DatabaseOptions> {
        let mut options = match &self.config {
            Some(path) => DatabaseOptions::from_json_file(path)?,
            None => DatabaseOptions::default(),
        };
        if let Some(dir) = &self.dir {
            options.base_dir = Some(dir.clone());
        }
        if self.in_memory {
            options.in_memory = true;
        }
        if self.readonly {
            options.readonly = true;
        }
        if self.no_create {
            options.create_if_not_exist = false;
        }
        Ok(options)
    }
}
