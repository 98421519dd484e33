/// Connection Management Module
///
/// This module owns the single database connection: opening and validating
/// it, and the process-wide instance handed out by `Database::instance()`.

use crate::config::DatabaseConfig;
use crate::core::{DaoError, Result};
use once_cell::sync::OnceCell;
use rusqlite::{Connection, OpenFlags};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Process-wide instance, created on first use and never torn down.
static INSTANCE: OnceCell<Database> = OnceCell::new();

/// Data-access object wrapping one SQLite connection.
///
/// The connection is shared by every caller. `rusqlite::Connection` is not
/// `Sync`, so it lives behind a mutex that each operation holds for one
/// prepare/execute cycle.
///
/// The only public ways to obtain a handle are [`Database::instance`] and
/// [`Database::initialize`], so at most one connection is live per process.
/// A second handle cannot be constructed from outside the crate:
///
/// ```compile_fail
/// use sqldao::{Database, DatabaseConfig};
///
/// let second = Database::open(DatabaseConfig::in_memory());
/// ```
#[derive(Debug)]
pub struct Database {
    connection: Mutex<Connection>,
    config: DatabaseConfig,
}

impl Database {
    /// Returns the process-wide instance, creating it on the first call.
    ///
    /// Settings come from [`DatabaseConfig::resolve`].
    ///
    /// # Errors
    ///
    /// `DaoError::Config` if the settings cannot be resolved, and
    /// `DaoError::Connection` if the database cannot be opened. A failed first
    /// call leaves the instance uninitialized so a later call can retry.
    pub fn instance() -> Result<&'static Database> {
        INSTANCE.get_or_try_init(|| Database::open(DatabaseConfig::resolve()?))
    }

    /// Creates the process-wide instance from explicit settings.
    ///
    /// If the instance already exists it is returned unchanged and `config` is
    /// ignored.
    pub fn initialize(config: DatabaseConfig) -> Result<&'static Database> {
        if let Some(existing) = INSTANCE.get() {
            if existing.config != config {
                warn!(
                    "Database already initialized at {}; ignoring settings for {}",
                    existing.config.path, config.path
                );
            }
            return Ok(existing);
        }
        INSTANCE.get_or_try_init(|| Database::open(config))
    }

    /// Returns the process-wide instance if it has been created.
    pub fn get() -> Option<&'static Database> {
        INSTANCE.get()
    }

    /// Opens a handle. Only the process-wide instance and test fixtures call this.
    ///
    /// The connection is validated by reading the schema version, so a path
    /// that exists but is not a database fails here rather than on first use.
    ///
    /// # Errors
    ///
    /// Returns `DaoError::Connection` if the file cannot be opened, is not a
    /// database, or the connection pragmas cannot be applied.
    pub(crate) fn open(config: DatabaseConfig) -> Result<Database> {
        let connection = Connection::open_with_flags(&config.path, open_flags(&config))
            .map_err(|e| DaoError::Connection(format!("{}: {}", config.path, e)))?;

        connection
            .query_row("PRAGMA schema_version", [], |row| row.get::<_, i64>(0))
            .map_err(|e| DaoError::Connection(format!("{}: {}", config.path, e)))?;

        connection
            .pragma_update(None, "foreign_keys", config.foreign_keys)
            .map_err(|e| DaoError::Connection(format!("{}: {}", config.path, e)))?;

        info!(
            "Opened database {} (read_only={}, foreign_keys={})",
            config.path, config.read_only, config.foreign_keys
        );

        Ok(Database {
            connection: Mutex::new(connection),
            config,
        })
    }

    /// Opens a private in-memory database.
    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Database> {
        Database::open(DatabaseConfig::in_memory())
    }

    /// The configured database location.
    pub fn path(&self) -> &str {
        &self.config.path
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Locks the connection, reporting a poisoned lock through `on_error`.
    pub(crate) fn lock(
        &self,
        on_error: fn(String) -> DaoError,
    ) -> Result<MutexGuard<'_, Connection>> {
        self.connection.lock().map_err(|_| {
            debug!("Connection lock poisoned for {}", self.config.path);
            on_error("connection lock poisoned by a panicked caller".to_string())
        })
    }
}

fn open_flags(config: &DatabaseConfig) -> OpenFlags {
    let mode = if config.read_only {
        OpenFlags::SQLITE_OPEN_READ_ONLY
    } else if config.create_if_missing {
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
    } else {
        OpenFlags::SQLITE_OPEN_READ_WRITE
    };
    mode | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX
}
