//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the contact store.
//! - Bring legacy and partial `contacts` tables up to the current shape.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write contacts before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub(crate) use open::CASEFOLD_FN;
pub use open::{connect, open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A migration step failed; the whole migration was rolled back.
    Migration {
        version: u32,
        name: &'static str,
        source: Box<DbError>,
    },
    /// A per-operation connection found a schema that was never migrated.
    SchemaNotReady { db_version: u32, expected: u32 },
    /// An existing `contacts` table has neither the current nor the legacy layout.
    UnrecognizedTable { columns: Vec<String> },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Migration {
                version,
                name,
                source,
            } => write!(f, "migration {version} ({name}) failed: {source}"),
            Self::SchemaNotReady {
                db_version,
                expected,
            } => write!(
                f,
                "database schema version {db_version} does not match expected {expected}; open the store with migrations first"
            ),
            Self::UnrecognizedTable { columns } => write!(
                f,
                "contacts table has unrecognized columns [{}]",
                columns.join(", ")
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Migration { source, .. } => Some(source.as_ref()),
            Self::UnsupportedSchemaVersion { .. }
            | Self::SchemaNotReady { .. }
            | Self::UnrecognizedTable { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
