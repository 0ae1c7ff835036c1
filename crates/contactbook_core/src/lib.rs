//! Core storage engine for the personal contact directory.
//! This crate is the single source of truth for contact invariants.

pub mod api;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod transfer;

pub use config::ContactBookConfig;
pub use db::{connect, open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::contact::{Contact, ContactKey, ContactValidationError};
pub use repo::contact_repo::{
    BulkAddReport, ContactRepository, RepoError, RepoResult, SqliteContactRepository,
};
pub use service::contact_book::ContactBook;
pub use transfer::export::{export_contacts, render_contacts, ExportFile};
pub use transfer::import::{import_contacts, parse_import, ImportReport, ParsedImport};
pub use transfer::{SpreadsheetFormat, TransferError, TransferResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
