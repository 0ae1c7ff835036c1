//! Format-specific spreadsheet readers and writers.
//!
//! Readers normalize every format to rows of text cells measured from
//! column A, so an all-blank leading column still counts toward the width.

use super::{SpreadsheetFormat, TransferError, TransferResult, COLUMN_COUNT, COLUMN_TITLES};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::io::Cursor;

const SHEET_NAME: &str = "Contact List";
const COLUMN_WIDTHS: [f64; COLUMN_COUNT] = [10.0, 15.0, 15.0, 15.0, 30.0, 20.0, 30.0, 40.0];
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parsed document: text cells plus the width of the used area.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Table {
    pub width: usize,
    pub rows: Vec<Vec<String>>,
}

pub(crate) fn read_table(format: SpreadsheetFormat, bytes: &[u8]) -> TransferResult<Table> {
    match format {
        SpreadsheetFormat::Xlsx | SpreadsheetFormat::Xls => read_workbook(bytes),
        SpreadsheetFormat::Csv => read_csv(bytes),
    }
}

pub(crate) fn write_table(
    format: SpreadsheetFormat,
    rows: &[[String; COLUMN_COUNT]],
) -> TransferResult<Vec<u8>> {
    match format {
        SpreadsheetFormat::Xlsx => {
            write_xlsx(rows).map_err(|err| TransferError::Write(err.to_string()))
        }
        SpreadsheetFormat::Csv => write_csv(rows),
        SpreadsheetFormat::Xls => Err(TransferError::UnsupportedFileType(
            "xls (export supports xlsx and csv)".to_string(),
        )),
    }
}

/// Reads the first worksheet of an xlsx/xls workbook.
fn read_workbook(bytes: &[u8]) -> TransferResult<Table> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|err| TransferError::Malformed(err.to_string()))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|err| TransferError::Malformed(err.to_string()))?,
        None => return Ok(Table::default()),
    };

    let Some((end_row, end_col)) = range.end() else {
        return Ok(Table::default());
    };
    let start_row = range.start().map_or(0, |(row, _)| row);

    let rows = (start_row..=end_row)
        .map(|row| {
            (0..=end_col)
                .map(|col| range.get_value((row, col)).map(cell_text).unwrap_or_default())
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    Ok(Table {
        width: end_col as usize + 1,
        rows,
    })
}

fn read_csv(bytes: &[u8]) -> TransferResult<Table> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| TransferError::Malformed(err.to_string()))?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    Ok(Table { width, rows })
}

fn write_xlsx(rows: &[[String; COLUMN_COUNT]]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, (title, width)) in COLUMN_TITLES.iter().zip(COLUMN_WIDTHS).enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, *title, &header_format)?;
        worksheet.set_column_width(col, width)?;
    }

    for (row_num, row) in (1u32..).zip(rows) {
        for (col, value) in row.iter().enumerate() {
            // Blank cells stay unwritten; readers treat them as empty text.
            if !value.is_empty() {
                worksheet.write_string(row_num, col as u16, value)?;
            }
        }
    }

    workbook.save_to_buffer()
}

fn write_csv(rows: &[[String; COLUMN_COUNT]]) -> TransferResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let write_err = |err: csv::Error| TransferError::Write(err.to_string());

    writer.write_record(COLUMN_TITLES).map_err(write_err)?;
    for row in rows {
        writer.write_record(row).map_err(write_err)?;
    }

    writer
        .into_inner()
        .map_err(|err| TransferError::Write(err.to_string()))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.clone(),
        Data::Int(number) => number.to_string(),
        Data::Float(number) => float_text(*number),
        Data::Bool(flag) => flag.to_string(),
        other => other.to_string(),
    }
}

/// Whole numbers (typically phone numbers typed into a numeric cell) lose
/// their `.0` suffix.
fn float_text(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}
