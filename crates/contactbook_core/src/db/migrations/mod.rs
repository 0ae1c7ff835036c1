//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Detect legacy `contacts` layouts and repair them in place.
//! - Apply pending migrations atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - A failed step rolls back every step of the same run.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::types::Value;
use rusqlite::{params, Connection};

pub(crate) const CONTACTS_TABLE: &str = "contacts";
const REBUILD_TABLE: &str = "contacts_migrating";
const LEGACY_NAME_COLUMN: &str = "name";

/// Optional columns with the DDL used when they are missing.
const OPTIONAL_COLUMNS: &[(&str, &str)] = &[
    ("category", "TEXT NOT NULL DEFAULT ''"),
    ("phone_number", "TEXT NOT NULL DEFAULT ''"),
    ("email", "TEXT NOT NULL DEFAULT ''"),
    ("address", "TEXT NOT NULL DEFAULT ''"),
    ("institution", "TEXT NOT NULL DEFAULT ''"),
    ("is_starred", "INTEGER NOT NULL DEFAULT 0"),
];

type MigrationFn = fn(&Connection) -> DbResult<()>;

#[derive(Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    apply: MigrationFn,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "contacts_baseline",
        apply: ensure_contacts_table,
    },
    Migration {
        version: 2,
        name: "contacts_starred_index",
        apply: create_starred_index,
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
///
/// Running this on an up-to-date database is a no-op.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        let step = (migration.apply)(&tx).and_then(|()| {
            tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
            Ok(())
        });
        if let Err(err) = step {
            error!(
                "event=db_migrate module=db status=error version={} name={} error={}",
                migration.version, migration.name, err
            );
            return Err(DbError::Migration {
                version: migration.version,
                name: migration.name,
                source: Box::new(err),
            });
        }
        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;

    Ok(())
}

/// Reads the schema version recorded in `PRAGMA user_version`.
pub fn current_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Splits a legacy combined name on the first space.
///
/// Single-token names yield an empty last name.
pub fn split_legacy_name(full_name: &str) -> (String, String) {
    match full_name.split_once(' ') {
        Some((first, last)) => (first.to_string(), last.to_string()),
        None => (full_name.to_string(), String::new()),
    }
}

fn ensure_contacts_table(conn: &Connection) -> DbResult<()> {
    let columns = table_columns(conn, CONTACTS_TABLE)?;

    if columns.is_empty() {
        conn.execute_batch(&create_table_sql(CONTACTS_TABLE))?;
        return Ok(());
    }

    let has_names = has_column(&columns, "first_name") && has_column(&columns, "last_name");
    if !has_names {
        if !has_column(&columns, LEGACY_NAME_COLUMN) {
            return Err(DbError::UnrecognizedTable { columns });
        }
        return rebuild_legacy_table(conn, &columns);
    }

    for (column, ddl) in OPTIONAL_COLUMNS {
        if !has_column(&columns, column) {
            conn.execute_batch(&format!(
                "ALTER TABLE {CONTACTS_TABLE} ADD COLUMN {column} {ddl};"
            ))?;
        }
    }

    if !has_natural_key_index(conn)? {
        conn.execute_batch(&format!(
            "CREATE UNIQUE INDEX idx_contacts_natural_key ON {CONTACTS_TABLE}(first_name, last_name);"
        ))?;
    }

    Ok(())
}

fn create_starred_index(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(&format!(
        "CREATE INDEX IF NOT EXISTS idx_contacts_starred ON {CONTACTS_TABLE}(is_starred DESC);"
    ))?;
    Ok(())
}

/// Copies every legacy row into a table of the current shape, then swaps it in.
///
/// Runs inside the caller's transaction, so a failure leaves the legacy
/// table untouched.
fn rebuild_legacy_table(conn: &Connection, legacy_columns: &[String]) -> DbResult<()> {
    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {REBUILD_TABLE};\n{}",
        create_table_sql(REBUILD_TABLE)
    ))?;

    let select_list = OPTIONAL_COLUMNS
        .iter()
        .map(|(column, _)| {
            if has_column(legacy_columns, column) {
                (*column).to_string()
            } else {
                format!("NULL AS {column}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    let mut select = conn.prepare(&format!(
        "SELECT {LEGACY_NAME_COLUMN}, {select_list} FROM {CONTACTS_TABLE};"
    ))?;
    let mut insert = conn.prepare(&format!(
        "INSERT INTO {REBUILD_TABLE} (
            first_name,
            last_name,
            category,
            phone_number,
            email,
            address,
            institution,
            is_starred
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);"
    ))?;

    let mut copied = 0usize;
    let mut rows = select.query([])?;
    while let Some(row) = rows.next()? {
        let full_name = value_to_text(row.get::<_, Value>(0)?);
        let (first_name, last_name) = split_legacy_name(&full_name);
        insert.execute(params![
            first_name,
            last_name,
            value_to_text(row.get::<_, Value>(1)?),
            value_to_text(row.get::<_, Value>(2)?),
            value_to_text(row.get::<_, Value>(3)?),
            value_to_text(row.get::<_, Value>(4)?),
            value_to_text(row.get::<_, Value>(5)?),
            i64::from(value_to_flag(row.get::<_, Value>(6)?)),
        ])?;
        copied += 1;
    }
    drop(rows);
    drop(select);
    drop(insert);

    conn.execute_batch(&format!(
        "DROP TABLE {CONTACTS_TABLE};\nALTER TABLE {REBUILD_TABLE} RENAME TO {CONTACTS_TABLE};"
    ))?;

    info!("event=db_legacy_rebuild module=db status=ok rows={copied}");
    Ok(())
}

fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT '',
            phone_number TEXT NOT NULL DEFAULT '',
            email TEXT NOT NULL DEFAULT '',
            address TEXT NOT NULL DEFAULT '',
            institution TEXT NOT NULL DEFAULT '',
            is_starred INTEGER NOT NULL DEFAULT 0,
            UNIQUE(first_name, last_name)
        );"
    )
}

fn table_columns(conn: &Connection, table: &str) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

fn has_column(columns: &[String], name: &str) -> bool {
    columns.iter().any(|column| column.eq_ignore_ascii_case(name))
}

/// Returns whether some unique index covers exactly `(first_name, last_name)`.
fn has_natural_key_index(conn: &Connection) -> DbResult<bool> {
    let mut list = conn.prepare(&format!("PRAGMA index_list({CONTACTS_TABLE});"))?;
    let unique_indexes = list
        .query_map([], |row| {
            Ok((row.get::<_, String>("name")?, row.get::<_, i64>("unique")?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for (index_name, unique) in unique_indexes {
        if unique == 0 {
            continue;
        }
        let mut info = conn.prepare("SELECT name FROM pragma_index_info(?1) ORDER BY seqno;")?;
        let mut indexed = info
            .query_map([index_name.as_str()], |row| row.get::<_, Option<String>>(0))?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten()
            .map(|column| column.to_ascii_lowercase())
            .collect::<Vec<_>>();
        indexed.sort();
        if indexed == ["first_name", "last_name"] {
            return Ok(true);
        }
    }

    Ok(false)
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(number) => number.to_string(),
        Value::Real(number) => number.to_string(),
        Value::Text(text) => text,
        Value::Blob(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
    }
}

fn value_to_flag(value: Value) -> bool {
    match value {
        Value::Null => false,
        Value::Integer(number) => number != 0,
        Value::Real(number) => number != 0.0,
        Value::Text(text) => !matches!(text.trim(), "" | "0"),
        Value::Blob(bytes) => !bytes.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, latest_version, split_legacy_name, table_columns};
    use rusqlite::Connection;

    #[test]
    fn split_legacy_name_splits_on_first_space_only() {
        assert_eq!(
            split_legacy_name("Ada Lovelace"),
            ("Ada".to_string(), "Lovelace".to_string())
        );
        assert_eq!(
            split_legacy_name("Jean Luc Picard"),
            ("Jean".to_string(), "Luc Picard".to_string())
        );
        assert_eq!(
            split_legacy_name("Prince"),
            ("Prince".to_string(), String::new())
        );
    }

    #[test]
    fn fresh_database_gets_current_shape() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();

        let columns = table_columns(&conn, "contacts").unwrap();
        assert_eq!(
            columns,
            [
                "id",
                "first_name",
                "last_name",
                "category",
                "phone_number",
                "email",
                "address",
                "institution",
                "is_starred"
            ]
        );
        let version: u32 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, latest_version());
    }

    #[test]
    fn table_without_any_name_column_is_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE contacts (id INTEGER PRIMARY KEY, email TEXT);")
            .unwrap();

        let err = apply_migrations(&mut conn).unwrap_err();
        assert!(err.to_string().contains("unrecognized columns"));
        let version: u32 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, 0);
    }
}
