//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas and the `casefold` SQL function required
//!   by core behavior.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - Connections from [`open_db`] / [`open_db_in_memory`] have migrations
//!   fully applied.
//! - Connections from [`connect`] never migrate; they refuse stale schemas.

use super::migrations::{apply_migrations, current_version, latest_version};
use super::{DbError, DbResult};
use log::{debug, error, info};
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQL function that lowercases text with full Unicode case mapping.
pub(crate) const CASEFOLD_FN: &str = "casefold";

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Creates the file when it does not exist.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with("file", || Connection::open(path))
}

/// Opens an in-memory SQLite database and applies all pending migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", Connection::open_in_memory)
}

/// Opens a per-operation connection to an already migrated database file.
///
/// # Errors
/// - `DbError::SchemaNotReady` when `user_version` differs from the latest
///   migration known by this binary.
pub fn connect(path: impl AsRef<Path>) -> DbResult<Connection> {
    let conn = Connection::open(path)?;
    configure_connection(&conn)?;

    let db_version = current_version(&conn)?;
    let expected = latest_version();
    if db_version != expected {
        return Err(DbError::SchemaNotReady {
            db_version,
            expected,
        });
    }

    debug!("event=db_connect module=db status=ok");
    Ok(conn)
}

fn open_with(
    mode: &str,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={} schema_version={}",
                mode,
                started_at.elapsed().as_millis(),
                latest_version()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    configure_connection(conn)?;
    apply_migrations(conn)?;
    Ok(())
}

fn configure_connection(conn: &Connection) -> DbResult<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    // Built-in LIKE folds ASCII only; search compares casefold() of both sides.
    conn.create_scalar_function(
        CASEFOLD_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|text| text.to_lowercase())),
    )?;
    Ok(())
}
