#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tempfile::{TempDir, tempdir};

use apuracao::table::Table;
use apuracao::value::{Cell, Value};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

pub fn text(value: &str) -> Cell {
    Some(Value::text(value))
}

pub fn num(value: f64) -> Cell {
    Some(Value::Number(value))
}

pub fn date(year: i32, month: u32, day: u32) -> Cell {
    Some(Value::Date(
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date"),
    ))
}

pub fn unknown() -> Cell {
    None
}

pub fn table(label: &str, columns: &[&str], rows: Vec<Vec<Cell>>) -> Table {
    Table::with_rows(
        label,
        columns.iter().map(|c| c.to_string()).collect(),
        rows,
    )
}

/// Display text of a cell by column name, empty string for unknown.
pub fn cell_text(table: &Table, row: usize, column: &str) -> String {
    let idx = table.column_index(column).expect("column exists");
    apuracao::value::cell_display(table.cell(row, idx))
}

pub fn cell_is_unknown(table: &Table, row: usize, column: &str) -> bool {
    let idx = table.column_index(column).expect("column exists");
    table.cell(row, idx).is_none()
}
