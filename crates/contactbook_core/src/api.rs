//! Use-case API for boundary layers (HTTP handlers, CLI, FFI).
//!
//! # Responsibility
//! - Accept loosely-typed input (flat JSON maps, uploaded bytes) and return
//!   serializable envelopes with a definite success flag.
//! - Keep human-readable messages in one place.
//!
//! # Invariants
//! - Functions never panic; every failure becomes an envelope with a
//!   `false` success flag and a message.
//! - Messages may echo contact names back to the caller but those names are
//!   never logged.

use crate::model::contact::{Contact, ContactKey};
use crate::repo::contact_repo::{ContactRepository, RepoError};
use crate::transfer::export::{export_contacts as export_inner, ExportFile};
use crate::transfer::import::import_contacts as import_inner;
use crate::transfer::SpreadsheetFormat;
use serde::Serialize;
use serde_json::{Map, Value};

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResponse {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Human-readable result message.
    pub message: String,
    /// Failure category (`duplicate_key|not_found|invalid_input|storage_failure`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            error_code: None,
        }
    }

    fn failure(error_code: &'static str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            error_code: Some(error_code),
        }
    }

    fn from_repo_error(err: &RepoError) -> Self {
        Self::failure(err.code(), err.to_string())
    }
}

/// Import response envelope; counts are always present on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub imported: usize,
    pub duplicates: usize,
    pub invalid: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportResponse {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            imported: 0,
            duplicates: 0,
            invalid: 0,
            error: Some(error.into()),
        }
    }
}

/// Lists all contacts, starred first.
pub fn list_contacts<R: ContactRepository + ?Sized>(
    repo: &R,
) -> Result<Vec<Contact>, ActionResponse> {
    repo.list().map_err(|err| ActionResponse::from_repo_error(&err))
}

/// Searches contacts by case-insensitive substring.
pub fn search_contacts<R: ContactRepository + ?Sized>(
    repo: &R,
    term: &str,
) -> Result<Vec<Contact>, ActionResponse> {
    repo.search(term)
        .map_err(|err| ActionResponse::from_repo_error(&err))
}

/// Adds a contact from its flat mapping.
pub fn add_contact<R: ContactRepository + ?Sized>(
    repo: &R,
    input: &Map<String, Value>,
) -> ActionResponse {
    let contact = match Contact::from_map(input) {
        Ok(contact) => contact,
        Err(err) => return ActionResponse::failure("invalid_input", err.to_string()),
    };

    match repo.add(&contact) {
        Ok(()) => {
            ActionResponse::success(format!("Contact {} added successfully", contact.key()))
        }
        Err(err) => ActionResponse::from_repo_error(&err),
    }
}

/// Replaces the contact stored under `(old_first_name, old_last_name)`.
pub fn update_contact<R: ContactRepository + ?Sized>(
    repo: &R,
    old_first_name: &str,
    old_last_name: &str,
    input: &Map<String, Value>,
) -> ActionResponse {
    let contact = match Contact::from_map(input) {
        Ok(contact) => contact,
        Err(err) => return ActionResponse::failure("invalid_input", err.to_string()),
    };
    let old_key = ContactKey::new(old_first_name, old_last_name);

    match repo.update(&old_key, &contact) {
        Ok(()) if contact.key() != old_key => ActionResponse::success(format!(
            "Contact '{old_key}' has been renamed to '{}' successfully",
            contact.key()
        )),
        Ok(()) => ActionResponse::success(format!("Contact {old_key} updated successfully")),
        Err(err) => ActionResponse::from_repo_error(&err),
    }
}

/// Deletes one contact by key.
pub fn delete_contact<R: ContactRepository + ?Sized>(
    repo: &R,
    first_name: &str,
    last_name: &str,
) -> ActionResponse {
    let key = ContactKey::new(first_name, last_name);
    match repo.delete(&key) {
        Ok(()) => ActionResponse::success(format!("Contact {key} deleted successfully")),
        Err(err) => ActionResponse::from_repo_error(&err),
    }
}

/// Flips the starred flag of one contact.
pub fn toggle_star<R: ContactRepository + ?Sized>(
    repo: &R,
    first_name: &str,
    last_name: &str,
) -> ActionResponse {
    let key = ContactKey::new(first_name, last_name);
    match repo.toggle_star(&key) {
        Ok(true) => ActionResponse::success(format!("Contact {key} starred")),
        Ok(false) => ActionResponse::success(format!("Contact {key} unstarred")),
        Err(err) => ActionResponse::from_repo_error(&err),
    }
}

/// Imports an uploaded spreadsheet.
///
/// A document with no data rows at all reports `success=false`.
pub fn import_contacts<R: ContactRepository + ?Sized>(
    repo: &R,
    file_name: &str,
    bytes: &[u8],
) -> ImportResponse {
    match import_inner(repo, file_name, bytes) {
        Ok(report) if report.imported + report.duplicates == 0 && report.invalid == 0 => {
            ImportResponse::failure("No valid contacts found in the spreadsheet")
        }
        Ok(report) => ImportResponse {
            success: true,
            imported: report.imported,
            duplicates: report.duplicates,
            invalid: report.invalid,
            error: None,
        },
        Err(err) => ImportResponse::failure(err.to_string()),
    }
}

/// Exports all contacts; defaults to xlsx when `format` is `None`.
pub fn export_contacts<R: ContactRepository + ?Sized>(
    repo: &R,
    format: Option<SpreadsheetFormat>,
) -> Result<ExportFile, ActionResponse> {
    let format = format.unwrap_or(SpreadsheetFormat::Xlsx);
    export_inner(repo, format).map_err(|err| {
        let code = if err.is_invalid_input() {
            "invalid_input"
        } else {
            "storage_failure"
        };
        ActionResponse::failure(code, err.to_string())
    })
}
