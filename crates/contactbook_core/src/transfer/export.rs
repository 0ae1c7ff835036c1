//! Contact export to spreadsheet documents.

use super::sheet::write_table;
use super::{
    contact_to_row, SpreadsheetFormat, TransferError, TransferResult, EXPORT_FILE_STEM,
};
use crate::model::contact::Contact;
use crate::repo::contact_repo::ContactRepository;
use log::info;

/// Rendered export ready to be sent as an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    /// `contacts_export.<ext>`.
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Exports every stored contact, starred first, as `format`.
///
/// # Errors
/// - `UnsupportedFileType` for formats that cannot be written (`xls`).
/// - Repository failures while listing contacts.
pub fn export_contacts<R>(repo: &R, format: SpreadsheetFormat) -> TransferResult<ExportFile>
where
    R: ContactRepository + ?Sized,
{
    if !format.is_writable() {
        return Err(TransferError::UnsupportedFileType(format!(
            "{} (export supports xlsx and csv)",
            format.extension()
        )));
    }

    let contacts = repo.list()?;
    let bytes = render_contacts(&contacts, format)?;

    info!(
        "event=contacts_export module=transfer status=ok format={} rows={} bytes={}",
        format.extension(),
        contacts.len(),
        bytes.len()
    );

    Ok(ExportFile {
        file_name: format!("{EXPORT_FILE_STEM}.{}", format.extension()),
        content_type: format.content_type(),
        bytes,
    })
}

/// Renders contacts in the given order: header row, then one row per contact.
pub fn render_contacts(contacts: &[Contact], format: SpreadsheetFormat) -> TransferResult<Vec<u8>> {
    let rows = contacts.iter().map(contact_to_row).collect::<Vec<_>>();
    write_table(format, &rows)
}
