mod args;
mod commands;
mod logging;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use sqlite_shim::{Database, Result};
use tracing::Level;

use crate::args::Args;
use crate::logging::LogSink;

fn main() -> ExitCode {
    let args = Args::parse();
    let sink = match LogSink::open(args.log.as_deref()) {
        Ok(sink) => sink,
        Err(err) => {
            eprintln!("failed to open log file: {err}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_writer(sink)
        .with_target(false)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    match execute(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            ExitCode::FAILURE
        }
    }
}

fn execute(args: &Args) -> Result<()> {
    let options = args.database_options()?;
    let db = Database::open(&args.db, &options)?;
    tracing::debug!(
        database = %db.name(),
        path = ?db.path(),
        readonly = db.is_readonly(),
        "database ready"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    commands::run(&db, &args.command, &mut out)?;
    db.close()
}
