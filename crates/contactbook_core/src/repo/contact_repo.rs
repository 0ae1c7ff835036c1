//! Contact repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, search and bulk-insert APIs over the `contacts` table.
//! - Keep SQL details inside the core persistence boundary.
//! - Translate constraint failures into semantic errors.
//!
//! # Invariants
//! - Write paths call `Contact::validate()` before SQL mutations.
//! - Keys are resolved with indexed `WHERE first_name = ? AND last_name = ?`
//!   lookups, never by scanning a loaded list.
//! - Listing order is starred first, then insertion order (`rowid`).
//! - Search folds case with the connection's Unicode `casefold` function,
//!   so it needs a connection prepared by `crate::db`.

use crate::db::{DbError, CASEFOLD_FN};
use crate::model::contact::{Contact, ContactKey, ContactValidationError};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const CONTACT_SELECT_SQL: &str = "SELECT
    first_name,
    last_name,
    category,
    phone_number,
    email,
    address,
    institution,
    is_starred
FROM contacts";

const CONTACT_ORDER_SQL: &str = "ORDER BY is_starred DESC, rowid ASC";

const CONTACT_INSERT_SQL: &str = "INSERT INTO contacts (
    first_name,
    last_name,
    category,
    phone_number,
    email,
    address,
    institution,
    is_starred
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);";

const LIKE_ESCAPE: char = '\\';

/// Text columns matched by `search`, names first.
const SEARCH_COLUMNS: [&str; 7] = [
    "first_name",
    "last_name",
    "category",
    "phone_number",
    "email",
    "address",
    "institution",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for contact persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ContactValidationError),
    /// Another contact already uses this natural key.
    DuplicateKey(ContactKey),
    /// No contact has this natural key.
    NotFound(ContactKey),
    Db(DbError),
    InvalidData(String),
}

impl RepoError {
    /// Returns whether the caller can recover by changing its input.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::DuplicateKey(_) | Self::NotFound(_)
        )
    }

    /// Stable machine-readable failure category.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "invalid_input",
            Self::DuplicateKey(_) => "duplicate_key",
            Self::NotFound(_) => "not_found",
            Self::Db(_) | Self::InvalidData(_) => "storage_failure",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateKey(key) => write!(f, "contact with name '{key}' already exists"),
            Self::NotFound(key) => write!(f, "contact not found: '{key}'"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted contact data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::DuplicateKey(_) | Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ContactValidationError> for RepoError {
    fn from(value: ContactValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Outcome of [`ContactRepository::bulk_add`].
///
/// Partial success is the normal case: each record is evaluated on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkAddReport {
    /// Number of records inserted.
    pub inserted: usize,
    /// Keys skipped because they already existed (in the store or earlier in
    /// the same batch).
    pub duplicates: Vec<ContactKey>,
    /// Keys skipped because the record failed validation.
    pub invalid: Vec<ContactKey>,
}

/// Repository interface for contact operations.
pub trait ContactRepository {
    /// Lists every contact, starred first.
    fn list(&self) -> RepoResult<Vec<Contact>>;
    /// Gets one contact by natural key.
    fn get(&self, key: &ContactKey) -> RepoResult<Option<Contact>>;
    /// Counts stored contacts.
    fn count(&self) -> RepoResult<usize>;
    /// Inserts a new contact; fails with `DuplicateKey` when the key exists.
    fn add(&self, contact: &Contact) -> RepoResult<()>;
    /// Replaces the contact stored under `old_key` with `contact`.
    fn update(&self, old_key: &ContactKey, contact: &Contact) -> RepoResult<()>;
    /// Deletes one contact by key.
    fn delete(&self, key: &ContactKey) -> RepoResult<()>;
    /// Flips `is_starred` and returns the new value.
    fn toggle_star(&self, key: &ContactKey) -> RepoResult<bool>;
    /// Case-insensitive substring search over all text fields.
    fn search(&self, term: &str) -> RepoResult<Vec<Contact>>;
    /// Inserts each record independently, skipping duplicates and invalid rows.
    fn bulk_add(&self, contacts: &[Contact]) -> RepoResult<BulkAddReport>;
}

/// SQLite-backed contact repository over a migrated connection.
pub struct SqliteContactRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContactRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn insert(&self, contact: &Contact) -> RepoResult<()> {
        self.conn
            .execute(
                CONTACT_INSERT_SQL,
                params![
                    contact.first_name.as_str(),
                    contact.last_name.as_str(),
                    contact.category.as_str(),
                    contact.phone_number.as_str(),
                    contact.email.as_str(),
                    contact.address.as_str(),
                    contact.institution.as_str(),
                    bool_to_int(contact.is_starred),
                ],
            )
            .map_err(|err| map_write_error(err, contact.key()))?;
        Ok(())
    }

    fn query_contacts(
        &self,
        sql: &str,
        bind: impl rusqlite::Params,
    ) -> RepoResult<Vec<Contact>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind)?;
        let mut contacts = Vec::new();

        while let Some(row) = rows.next()? {
            contacts.push(parse_contact_row(row)?);
        }

        Ok(contacts)
    }
}

impl ContactRepository for SqliteContactRepository<'_> {
    fn list(&self) -> RepoResult<Vec<Contact>> {
        self.query_contacts(&format!("{CONTACT_SELECT_SQL} {CONTACT_ORDER_SQL};"), [])
    }

    fn get(&self, key: &ContactKey) -> RepoResult<Option<Contact>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CONTACT_SELECT_SQL}
             WHERE first_name = ?1
               AND last_name = ?2;"
        ))?;

        let mut rows = stmt.query(params![key.first_name, key.last_name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_contact_row(row)?));
        }

        Ok(None)
    }

    fn count(&self) -> RepoResult<usize> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM contacts;", [], |row| row.get::<_, i64>(0))?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative contact count `{count}`")))
    }

    fn add(&self, contact: &Contact) -> RepoResult<()> {
        contact.validate()?;
        self.insert(contact)
    }

    fn update(&self, old_key: &ContactKey, contact: &Contact) -> RepoResult<()> {
        contact.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE contacts
                 SET
                    first_name = ?1,
                    last_name = ?2,
                    category = ?3,
                    phone_number = ?4,
                    email = ?5,
                    address = ?6,
                    institution = ?7,
                    is_starred = ?8
                 WHERE first_name = ?9
                   AND last_name = ?10;",
                params![
                    contact.first_name.as_str(),
                    contact.last_name.as_str(),
                    contact.category.as_str(),
                    contact.phone_number.as_str(),
                    contact.email.as_str(),
                    contact.address.as_str(),
                    contact.institution.as_str(),
                    bool_to_int(contact.is_starred),
                    old_key.first_name.as_str(),
                    old_key.last_name.as_str(),
                ],
            )
            .map_err(|err| map_write_error(err, contact.key()))?;

        if changed == 0 {
            return Err(RepoError::NotFound(old_key.clone()));
        }

        Ok(())
    }

    fn delete(&self, key: &ContactKey) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM contacts WHERE first_name = ?1 AND last_name = ?2;",
            params![key.first_name, key.last_name],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(key.clone()));
        }

        Ok(())
    }

    fn toggle_star(&self, key: &ContactKey) -> RepoResult<bool> {
        // Single statement so the read-modify-write cannot interleave.
        let starred = self
            .conn
            .query_row(
                "UPDATE contacts
                 SET is_starred = CASE WHEN is_starred = 0 THEN 1 ELSE 0 END
                 WHERE first_name = ?1
                   AND last_name = ?2
                 RETURNING is_starred;",
                params![key.first_name, key.last_name],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        match starred {
            Some(value) => Ok(value != 0),
            None => Err(RepoError::NotFound(key.clone())),
        }
    }

    fn search(&self, term: &str) -> RepoResult<Vec<Contact>> {
        let pattern = like_pattern(term);
        let conditions = SEARCH_COLUMNS
            .iter()
            .map(|column| {
                format!(
                    "{CASEFOLD_FN}(COALESCE({column}, '')) LIKE {CASEFOLD_FN}(?1) ESCAPE '\\'"
                )
            })
            .collect::<Vec<_>>()
            .join("\n                    OR ");
        self.query_contacts(
            &format!("{CONTACT_SELECT_SQL}\n WHERE {conditions}\n {CONTACT_ORDER_SQL};"),
            [pattern],
        )
    }

    fn bulk_add(&self, contacts: &[Contact]) -> RepoResult<BulkAddReport> {
        let mut report = BulkAddReport::default();

        // One transaction for throughput; a constraint failure aborts only the
        // offending statement, so every record is still evaluated on its own.
        let tx = self.conn.unchecked_transaction()?;
        for contact in contacts {
            if contact.validate().is_err() {
                report.invalid.push(contact.key());
                continue;
            }

            match self.insert(contact) {
                Ok(()) => report.inserted += 1,
                Err(RepoError::DuplicateKey(key)) => report.duplicates.push(key),
                Err(err) => return Err(err),
            }
        }
        tx.commit()?;

        Ok(report)
    }
}

fn parse_contact_row(row: &Row<'_>) -> RepoResult<Contact> {
    let is_starred = match row.get::<_, Option<i64>>("is_starred")? {
        None | Some(0) => false,
        Some(1) => true,
        Some(other) => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_starred value `{other}` in contacts.is_starred"
            )));
        }
    };

    Ok(Contact {
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        category: text_or_empty(row, "category")?,
        phone_number: text_or_empty(row, "phone_number")?,
        email: text_or_empty(row, "email")?,
        address: text_or_empty(row, "address")?,
        institution: text_or_empty(row, "institution")?,
        is_starred,
    })
}

/// Columns added by older schema versions may hold NULL.
fn text_or_empty(row: &Row<'_>, column: &str) -> RepoResult<String> {
    Ok(row.get::<_, Option<String>>(column)?.unwrap_or_default())
}

fn map_write_error(err: rusqlite::Error, key: ContactKey) -> RepoError {
    if is_unique_violation(&err) {
        return RepoError::DuplicateKey(key);
    }
    RepoError::Db(DbError::Sqlite(err))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && (failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        }
        _ => false,
    }
}

/// Builds a `LIKE` pattern that matches `term` literally anywhere.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
