use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};

use crate::error::{Result, SqliteShimError};

use super::config::DatabaseOptions;

/// Supplies engine connections to [`Database`](crate::Database).
///
/// Implementations decide where named databases live on disk and how first-time files
/// get a writable home. The default methods cover the common case; only
/// [`resolve_path`](Self::resolve_path) is required.
pub trait ConnectionProvider {
    /// Absolute location of the database file called `name`.
    ///
    /// # Errors
    /// Returns `SqliteShimError::ConfigError` if `name` cannot be resolved.
    fn resolve_path(&self, name: &str) -> Result<PathBuf>;

    /// Make sure the directory of a not-yet-existing database file exists and is
    /// readable/writable by the owner.
    ///
    /// # Errors
    /// Returns `SqliteShimError::Io` if the directory cannot be created or its
    /// permissions cannot be changed.
    fn prepare_location(&self, path: &Path) -> Result<()> {
        if path.exists() {
            return Ok(());
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
            make_owner_accessible(parent)?;
        }
        Ok(())
    }

    /// Open the connection for `name`.
    ///
    /// Returns the connection plus the file it was opened from (`None` in memory).
    ///
    /// # Errors
    /// Returns `SqliteShimError::ConnectionError` if the engine refuses to open the file.
    fn open(&self, name: &str, options: &DatabaseOptions) -> Result<(Connection, Option<PathBuf>)> {
        if options.in_memory {
            let conn = Connection::open_in_memory().map_err(|e| {
                SqliteShimError::ConnectionError(format!("failed to open in-memory database: {e}"))
            })?;
            return Ok((conn, None));
        }

        let path = self.resolve_path(name)?;
        let flags = open_flags(options);
        if flags.contains(OpenFlags::SQLITE_OPEN_CREATE) {
            self.prepare_location(&path)?;
        }
        let conn = Connection::open_with_flags(&path, flags).map_err(|e| {
            SqliteShimError::ConnectionError(format!(
                "failed to open '{}': {e}",
                path.display()
            ))
        })?;
        Ok((conn, Some(path)))
    }
}

/// Engine open flags for `options`.
///
/// The create flag is only ever added to read-write opens.
#[must_use]
pub fn open_flags(options: &DatabaseOptions) -> OpenFlags {
    let mut flags = if options.readonly {
        OpenFlags::SQLITE_OPEN_READ_ONLY
    } else {
        OpenFlags::SQLITE_OPEN_READ_WRITE
    };
    if options.create_if_not_exist && !options.readonly {
        flags |= OpenFlags::SQLITE_OPEN_CREATE;
    }
    flags | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX
}

#[cfg(unix)]
fn make_owner_accessible(dir: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(dir)?.permissions();
    perms.set_mode(perms.mode() | 0o700);
    fs::set_permissions(dir, perms)?;
    Ok(())
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn make_owner_accessible(dir: &Path) -> Result<()> {
    let mut perms = fs::metadata(dir)?.permissions();
    perms.set_readonly(false);
    fs::set_permissions(dir, perms)?;
    Ok(())
}

/// Resolves names against a base directory, like an application's database directory.
#[derive(Debug, Clone)]
pub struct FileSystemProvider {
    base_dir: PathBuf,
}

impl FileSystemProvider {
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Provider rooted at `options.base_dir`, or the working directory.
    #[must_use]
    pub fn from_options(options: &DatabaseOptions) -> Self {
        Self::new(options.base_dir.clone().unwrap_or_else(|| PathBuf::from(".")))
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl ConnectionProvider for FileSystemProvider {
    fn resolve_path(&self, name: &str) -> Result<PathBuf> {
        if name.trim().is_empty() {
            return Err(SqliteShimError::ConfigError(
                "database name must not be empty".into(),
            ));
        }
        let candidate = Path::new(name);
        if candidate.is_absolute() {
            Ok(candidate.to_path_buf())
        } else {
            Ok(self.base_dir.join(candidate))
        }
    }
}
