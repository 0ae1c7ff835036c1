//! Spreadsheet import/export pipeline.
//!
//! # Responsibility
//! - Map contacts to and from the fixed eight-column tabular layout.
//! - Detect the spreadsheet format from the file name.
//! - Talk to storage only through [`ContactRepository`].
//!
//! # Invariants
//! - Column order is part of the external contract; import accepts exactly
//!   what export produces.
//! - Structural problems (file type, column count) reject the whole document
//!   before any row is processed.
//!
//! [`ContactRepository`]: crate::repo::contact_repo::ContactRepository

use crate::model::contact::Contact;
use crate::repo::contact_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod export;
pub mod import;
mod sheet;

/// Marker written to (and recognized in) column 0 for starred contacts.
pub const STAR_GLYPH: &str = "★";

/// Number of columns in the tabular layout.
pub const COLUMN_COUNT: usize = 8;

/// Header titles written by export, in column order.
pub const COLUMN_TITLES: [&str; COLUMN_COUNT] = [
    "Starred",
    "First Name",
    "Last Name",
    "Category",
    "Institution",
    "Phone Number",
    "Email",
    "Address",
];

/// File stem of exported attachments.
pub const EXPORT_FILE_STEM: &str = "contacts_export";

pub type TransferResult<T> = Result<T, TransferError>;

/// Spreadsheet formats recognized by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    /// Office Open XML workbook; read and write.
    Xlsx,
    /// Legacy Excel 97-2003 workbook; read only.
    Xls,
    /// Comma-separated values; read and write.
    Csv,
}

impl SpreadsheetFormat {
    /// Detects the format from a file name's extension, case-insensitively.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, extension) = file_name.trim().rsplit_once('.')?;
        match extension.to_ascii_lowercase().as_str() {
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Xls => "xls",
            Self::Csv => "csv",
        }
    }

    /// MIME type used for download responses.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Xls => "application/vnd.ms-excel",
            Self::Csv => "text/csv; charset=utf-8",
        }
    }

    /// Whether export can produce this format.
    pub fn is_writable(self) -> bool {
        !matches!(self, Self::Xls)
    }
}

/// Import/export pipeline error.
#[derive(Debug)]
pub enum TransferError {
    /// Upload carried no file name.
    MissingFileName,
    /// File name does not end in a recognized spreadsheet extension, or the
    /// format cannot be written.
    UnsupportedFileType(String),
    /// Document width differs from [`COLUMN_COUNT`].
    ColumnCount { expected: usize, found: usize },
    /// Document bytes could not be parsed.
    Malformed(String),
    /// Document could not be rendered.
    Write(String),
    Repo(RepoError),
}

impl TransferError {
    /// Structural input problems the caller can fix by sending another file.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::MissingFileName
                | Self::UnsupportedFileType(_)
                | Self::ColumnCount { .. }
                | Self::Malformed(_)
        )
    }
}

impl Display for TransferError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFileName => write!(f, "no file selected for uploading"),
            Self::UnsupportedFileType(name) => write!(
                f,
                "unsupported file type `{name}`; only .xlsx, .xls and .csv files are allowed"
            ),
            Self::ColumnCount { expected, found } => write!(
                f,
                "spreadsheet must have exactly {expected} columns, but found {found} columns"
            ),
            Self::Malformed(message) => write!(f, "error reading spreadsheet: {message}"),
            Self::Write(message) => write!(f, "error writing spreadsheet: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TransferError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Renders one contact as a row in column order.
pub(crate) fn contact_to_row(contact: &Contact) -> [String; COLUMN_COUNT] {
    [
        if contact.is_starred {
            STAR_GLYPH.to_string()
        } else {
            String::new()
        },
        contact.first_name.clone(),
        contact.last_name.clone(),
        contact.category.clone(),
        contact.institution.clone(),
        contact.phone_number.clone(),
        contact.email.clone(),
        contact.address.clone(),
    ]
}

/// Maps a row back to a contact; `None` when both names are empty.
///
/// Only a cell that is exactly [`STAR_GLYPH`] marks a contact as starred.
/// Missing trailing cells read as empty strings.
pub(crate) fn row_to_contact(cells: &[String]) -> Option<Contact> {
    let cell = |index: usize| cells.get(index).cloned().unwrap_or_default();

    let contact = Contact {
        is_starred: cells.first().is_some_and(|marker| marker == STAR_GLYPH),
        first_name: cell(1),
        last_name: cell(2),
        category: cell(3),
        institution: cell(4),
        phone_number: cell(5),
        email: cell(6),
        address: cell(7),
    };

    if contact.first_name.is_empty() && contact.last_name.is_empty() {
        return None;
    }
    Some(contact)
}

/// Whether a row is exactly the header written by export.
pub(crate) fn is_header_row(cells: &[String]) -> bool {
    cells.len() == COLUMN_COUNT
        && cells
            .iter()
            .zip(COLUMN_TITLES)
            .all(|(cell, title)| cell.trim().eq_ignore_ascii_case(title))
}

#[cfg(test)]
mod tests {
    use super::{
        contact_to_row, is_header_row, row_to_contact, SpreadsheetFormat, COLUMN_TITLES,
        STAR_GLYPH,
    };
    use crate::model::contact::Contact;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn format_detection_is_case_insensitive() {
        assert_eq!(
            SpreadsheetFormat::from_file_name("book.XLSX"),
            Some(SpreadsheetFormat::Xlsx)
        );
        assert_eq!(
            SpreadsheetFormat::from_file_name("old.xls"),
            Some(SpreadsheetFormat::Xls)
        );
        assert_eq!(
            SpreadsheetFormat::from_file_name("people.csv"),
            Some(SpreadsheetFormat::Csv)
        );
        assert_eq!(SpreadsheetFormat::from_file_name("notes.txt"), None);
        assert_eq!(SpreadsheetFormat::from_file_name("xlsx"), None);
    }

    #[test]
    fn row_mapping_follows_column_contract() {
        let mut contact = Contact::new("Ada", "Lovelace");
        contact.category = "Family".to_string();
        contact.institution = "Analytical Society".to_string();
        contact.phone_number = "555-0100".to_string();
        contact.email = "ada@example.com".to_string();
        contact.address = "London".to_string();
        contact.is_starred = true;

        let row = contact_to_row(&contact);
        assert_eq!(row[0], STAR_GLYPH);
        assert_eq!(row[4], "Analytical Society");
        assert_eq!(row[5], "555-0100");
        assert_eq!(row_to_contact(&row), Some(contact));
    }

    #[test]
    fn row_without_names_is_rejected() {
        assert_eq!(row_to_contact(&cells(&["★", "", "", "Work"])), None);
    }

    #[test]
    fn star_marker_must_match_exactly() {
        let padded = row_to_contact(&cells(&[" ★ ", "Prince"])).unwrap();
        assert!(!padded.is_starred);
        let doubled = row_to_contact(&cells(&["★★", "Prince"])).unwrap();
        assert!(!doubled.is_starred);
        let exact = row_to_contact(&cells(&["★", "Prince"])).unwrap();
        assert!(exact.is_starred);
    }

    #[test]
    fn short_row_fills_missing_cells() {
        let contact = row_to_contact(&cells(&["x", "Prince"])).unwrap();
        assert_eq!(contact.first_name, "Prince");
        assert_eq!(contact.last_name, "");
        assert_eq!(contact.address, "");
        assert!(!contact.is_starred);
    }

    #[test]
    fn header_row_is_recognized() {
        let header = COLUMN_TITLES.iter().map(|t| t.to_uppercase()).collect::<Vec<_>>();
        assert!(is_header_row(&header));
        assert!(!is_header_row(&cells(&["★", "Ada", "Lovelace", "", "", "", "", ""])));
    }
}
