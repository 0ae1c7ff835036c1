//! Contact import from spreadsheet documents.
//!
//! # Invariants
//! - No header row is assumed: row 0 is data. The one exception is a first
//!   row identical to the export header, which is skipped so exported files
//!   import cleanly.
//! - Per-row problems are counted, never fatal; structural problems reject
//!   the document before any row is stored.

use super::sheet::read_table;
use super::{
    is_header_row, row_to_contact, SpreadsheetFormat, TransferError, TransferResult, COLUMN_COUNT,
};
use crate::model::contact::Contact;
use crate::repo::contact_repo::ContactRepository;
use log::{info, warn};
use serde::Serialize;

/// Row-level outcome of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Rows stored as new contacts.
    pub imported: usize,
    /// Rows whose key already existed.
    pub duplicates: usize,
    /// Rows skipped for missing names or failed validation.
    pub invalid: usize,
}

/// Rows extracted from a document, before they touch storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedImport {
    pub contacts: Vec<Contact>,
    /// Rows with neither a first nor a last name.
    pub invalid_rows: usize,
}

/// Parses and validates a document without storing anything.
///
/// # Errors
/// - `MissingFileName` / `UnsupportedFileType` when the name is blank or the
///   extension is not `.xlsx`, `.xls` or `.csv`.
/// - `Malformed` when the bytes are not a readable document.
/// - `ColumnCount` when the document is not exactly eight columns wide.
pub fn parse_import(file_name: &str, bytes: &[u8]) -> TransferResult<ParsedImport> {
    let format = detect_format(file_name)?;
    let table = read_table(format, bytes)?;

    if table.width != COLUMN_COUNT {
        warn!(
            "event=contacts_import module=transfer status=rejected reason=column_count found={}",
            table.width
        );
        return Err(TransferError::ColumnCount {
            expected: COLUMN_COUNT,
            found: table.width,
        });
    }

    let mut rows = table.rows.as_slice();
    if rows.first().is_some_and(|first| is_header_row(first)) {
        rows = &rows[1..];
    }

    let mut parsed = ParsedImport::default();
    for row in rows {
        match row_to_contact(row) {
            Some(contact) => parsed.contacts.push(contact),
            None => parsed.invalid_rows += 1,
        }
    }

    Ok(parsed)
}

/// Imports a document into `repo` through its bulk insert.
///
/// Partial success is the normal outcome; the report itemizes every row.
pub fn import_contacts<R>(repo: &R, file_name: &str, bytes: &[u8]) -> TransferResult<ImportReport>
where
    R: ContactRepository + ?Sized,
{
    let parsed = parse_import(file_name, bytes)?;

    let mut report = ImportReport {
        invalid: parsed.invalid_rows,
        ..ImportReport::default()
    };
    if !parsed.contacts.is_empty() {
        let bulk = repo.bulk_add(&parsed.contacts)?;
        report.imported = bulk.inserted;
        report.duplicates = bulk.duplicates.len();
        report.invalid += bulk.invalid.len();
    }

    info!(
        "event=contacts_import module=transfer status=ok imported={} duplicates={} invalid={}",
        report.imported, report.duplicates, report.invalid
    );
    Ok(report)
}

fn detect_format(file_name: &str) -> TransferResult<SpreadsheetFormat> {
    let trimmed = file_name.trim();
    if trimmed.is_empty() {
        return Err(TransferError::MissingFileName);
    }
    SpreadsheetFormat::from_file_name(trimmed)
        .ok_or_else(|| TransferError::UnsupportedFileType(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::parse_import;
    use crate::transfer::TransferError;

    #[test]
    fn blank_file_name_is_rejected() {
        let err = parse_import("  ", b"").unwrap_err();
        assert!(matches!(err, TransferError::MissingFileName));
    }

    #[test]
    fn unknown_extension_is_rejected_before_parsing() {
        let err = parse_import("contacts.txt", b"not even a spreadsheet").unwrap_err();
        assert!(matches!(err, TransferError::UnsupportedFileType(name) if name == "contacts.txt"));
    }

    #[test]
    fn csv_without_header_treats_first_row_as_data() {
        let csv = "★,Ada,Lovelace,Family,,555,ada@example.com,London\n,,,,,,,\n";
        let parsed = parse_import("people.csv", csv.as_bytes()).unwrap();
        assert_eq!(parsed.contacts.len(), 1);
        assert!(parsed.contacts[0].is_starred);
        assert_eq!(parsed.contacts[0].phone_number, "555");
        assert_eq!(parsed.invalid_rows, 1);
    }

    #[test]
    fn seven_column_csv_is_rejected() {
        let err = parse_import("people.csv", b",Ada,Lovelace,,,,\n").unwrap_err();
        assert!(matches!(
            err,
            TransferError::ColumnCount {
                expected: 8,
                found: 7
            }
        ));
    }

    #[test]
    fn garbage_workbook_is_malformed() {
        let err = parse_import("people.xlsx", b"definitely not a zip").unwrap_err();
        assert!(matches!(err, TransferError::Malformed(_)));
    }
}
