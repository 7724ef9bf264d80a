//! Table Loader: delimited bytes in, raw text [`Table`] out.
//!
//! Stock exports open with a fixed-format cover block above the real header
//! row, so loading takes a `header_offset`: that many records are skipped,
//! the next record becomes the column labels, and everything below is data.
//! Cells stay untyped text here; coercion belongs to the normalizer.

use std::path::Path;

use encoding_rs::Encoding;
use log::debug;

use crate::errors::PipelineError;
use crate::io_utils;
use crate::table::Table;
use crate::value::Value;

/// File name used in error messages and as the table label.
fn source_label(path: &Path) -> String {
    if io_utils::is_dash(path) {
        return "stdin".to_string();
    }
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn load_error(path: &Path, reason: impl ToString) -> PipelineError {
    PipelineError::Load {
        file: source_label(path),
        reason: reason.to_string(),
    }
}

pub fn load_table(
    path: &Path,
    header_offset: usize,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<Table, PipelineError> {
    let delimiter = io_utils::resolve_input_delimiter(path, delimiter);
    let mut reader =
        io_utils::open_sheet_reader(path, delimiter).map_err(|err| load_error(path, err))?;

    let mut records = reader.byte_records().enumerate();
    let mut header: Option<Vec<String>> = None;
    for (row_idx, record) in records.by_ref() {
        let record = record.map_err(|err| load_error(path, format!("row {}: {err}", row_idx + 1)))?;
        if row_idx < header_offset {
            continue;
        }
        let decoded =
            io_utils::decode_record(&record, encoding).map_err(|err| load_error(path, err))?;
        header = Some(decoded.iter().map(|label| label.trim().to_string()).collect());
        break;
    }
    let columns = header.ok_or_else(|| {
        load_error(
            path,
            format!("header offset {header_offset} is beyond the end of the file"),
        )
    })?;

    let mut table = Table::new(source_label(path), columns.clone());
    for (row_idx, record) in records {
        let record = record.map_err(|err| load_error(path, format!("row {}: {err}", row_idx + 1)))?;
        let decoded =
            io_utils::decode_record(&record, encoding).map_err(|err| load_error(path, err))?;
        let mut row: Vec<_> = decoded
            .into_iter()
            .take(columns.len())
            .map(|field| {
                if field.trim().is_empty() {
                    None
                } else {
                    Some(Value::Text(field))
                }
            })
            .collect();
        row.resize(columns.len(), None);
        table.push_row(row);
    }
    debug!(
        "Loaded '{}': {} column(s), {} row(s) below offset {header_offset}",
        table.label(),
        table.columns().len(),
        table.row_count()
    );
    Ok(table)
}

/// Concatenates sheets of one logical registry. Column lists must match
/// exactly; the first table is the reference.
pub fn concat_tables(tables: Vec<Table>) -> Result<Table, PipelineError> {
    let mut tables = tables.into_iter();
    let mut combined = tables.next().ok_or_else(|| PipelineError::Load {
        file: "<none>".to_string(),
        reason: "no sheets to concatenate".to_string(),
    })?;
    for table in tables {
        if table.columns() != combined.columns() {
            return Err(PipelineError::SheetMismatch {
                file: table.label().to_string(),
                reference: combined.label().to_string(),
            });
        }
        for row in table.rows() {
            combined.push_row(row.clone());
        }
    }
    Ok(combined)
}

/// Loads several files that must share one schema and concatenates them.
pub fn load_concat(
    paths: &[std::path::PathBuf],
    header_offset: usize,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<Table, PipelineError> {
    let tables = paths
        .iter()
        .map(|path| load_table(path, header_offset, delimiter, encoding))
        .collect::<Result<Vec<_>, _>>()?;
    concat_tables(tables)
}
