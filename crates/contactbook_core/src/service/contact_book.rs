//! Contact book storage engine.
//!
//! # Responsibility
//! - Own the database location and run schema migration once at construction.
//! - Serve every repository operation on its own short-lived connection.
//! - Emit metadata-only `event=contact_*` diagnostics.
//!
//! # Invariants
//! - No contact data is cached between calls; every read hits the store.
//! - Construct one instance at startup and pass it to consumers.
//! - Concurrent writers are serialized by SQLite locking only; racing updates
//!   on one key resolve last-writer-wins or fail with a busy error.

use crate::config::ContactBookConfig;
use crate::db::{connect, open_db, DbResult};
use crate::model::contact::{Contact, ContactKey};
use crate::repo::contact_repo::{
    BulkAddReport, ContactRepository, RepoResult, SqliteContactRepository,
};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// File-backed contact store.
#[derive(Debug)]
pub struct ContactBook {
    db_path: PathBuf,
}

impl ContactBook {
    /// Opens (creating if needed) and migrates the store at `db_path`.
    ///
    /// # Errors
    /// - Any migration failure; the store must not be used afterwards.
    pub fn open(db_path: impl Into<PathBuf>) -> DbResult<Self> {
        let db_path = db_path.into();
        // Migration connection is dropped right away; operations reconnect.
        open_db(&db_path)?;
        info!("event=contact_book_open module=service status=ok");
        Ok(Self { db_path })
    }

    /// Opens the store configured in `config`.
    pub fn from_config(config: &ContactBookConfig) -> DbResult<Self> {
        Self::open(config.db_path.clone())
    }

    /// Database file backing this store.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn with_repo<T>(
        &self,
        event: &'static str,
        f: impl FnOnce(&SqliteContactRepository<'_>) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let started_at = Instant::now();
        let conn = connect(&self.db_path)?;
        let result = f(&SqliteContactRepository::new(&conn));
        let duration_ms = started_at.elapsed().as_millis();

        match &result {
            Ok(_) => debug!("event={event} module=service status=ok duration_ms={duration_ms}"),
            Err(err) if err.is_recoverable() => info!(
                "event={event} module=service status=rejected duration_ms={duration_ms} reason={}",
                err.code()
            ),
            Err(err) => error!(
                "event={event} module=service status=error duration_ms={duration_ms} error={err}"
            ),
        }

        result
    }
}

impl ContactRepository for ContactBook {
    fn list(&self) -> RepoResult<Vec<Contact>> {
        let contacts = self.with_repo("contact_list", |repo| repo.list())?;
        debug!("event=contact_list module=service count={}", contacts.len());
        Ok(contacts)
    }

    fn get(&self, key: &ContactKey) -> RepoResult<Option<Contact>> {
        self.with_repo("contact_get", |repo| repo.get(key))
    }

    fn count(&self) -> RepoResult<usize> {
        self.with_repo("contact_count", |repo| repo.count())
    }

    fn add(&self, contact: &Contact) -> RepoResult<()> {
        self.with_repo("contact_add", |repo| repo.add(contact))
    }

    fn update(&self, old_key: &ContactKey, contact: &Contact) -> RepoResult<()> {
        self.with_repo("contact_update", |repo| repo.update(old_key, contact))
    }

    fn delete(&self, key: &ContactKey) -> RepoResult<()> {
        self.with_repo("contact_delete", |repo| repo.delete(key))
    }

    fn toggle_star(&self, key: &ContactKey) -> RepoResult<bool> {
        self.with_repo("contact_toggle_star", |repo| repo.toggle_star(key))
    }

    fn search(&self, term: &str) -> RepoResult<Vec<Contact>> {
        self.with_repo("contact_search", |repo| repo.search(term))
    }

    fn bulk_add(&self, contacts: &[Contact]) -> RepoResult<BulkAddReport> {
        let report = self.with_repo("contact_bulk_add", |repo| repo.bulk_add(contacts))?;
        if !report.duplicates.is_empty() || !report.invalid.is_empty() {
            warn!(
                "event=contact_bulk_add module=service status=partial inserted={} duplicates={} invalid={}",
                report.inserted,
                report.duplicates.len(),
                report.invalid.len()
            );
        } else {
            info!(
                "event=contact_bulk_add module=service status=ok inserted={}",
                report.inserted
            );
        }
        Ok(report)
    }
}
