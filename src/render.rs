//! Rendering and delivery: CSV artifacts, preview tables, run summaries.
//!
//! Artifact file names embed the current date, which comes from an
//! injected [`Clock`] so tests can pin it.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use log::info;
use serde::Serialize;

use crate::errors::CoercionWarning;
use crate::io_utils;
use crate::reconcile::VarianceSummary;
use crate::report::Report;
use crate::table::Table;
use crate::value::cell_display;

pub trait Clock {
    fn today(&self) -> NaiveDate;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// `{list}_{artifact}_{YYYYMMDD}.csv`, or without the list prefix when no
/// list name was given.
pub fn artifact_file_name(list_name: &str, artifact: &str, today: NaiveDate) -> String {
    let stamp = today.format("%Y%m%d");
    if list_name.is_empty() {
        format!("{artifact}_{stamp}.csv")
    } else {
        format!("{list_name}_{artifact}_{stamp}.csv")
    }
}

pub fn write_table(table: &Table, path: &Path, delimiter: u8) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(Some(path), delimiter)?;
    writer
        .write_record(table.columns())
        .context("Writing header row")?;
    for row in table.rows() {
        writer
            .write_record(row.iter().map(cell_display))
            .context("Writing data row")?;
    }
    writer.flush().context("Flushing output")?;
    Ok(())
}

/// Writes every artifact of a finished report into `out_dir` and returns
/// the paths, in artifact order.
pub fn write_artifacts(
    report: &Report,
    out_dir: &Path,
    list_name: &str,
    delimiter: u8,
    clock: &dyn Clock,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Creating output directory {out_dir:?}"))?;
    let today = clock.today();
    let mut paths = Vec::with_capacity(report.artifacts.len());
    for artifact in &report.artifacts {
        let path = out_dir.join(artifact_file_name(list_name, &artifact.name, today));
        write_table(&artifact.table, &path, delimiter)
            .with_context(|| format!("Writing artifact '{}'", artifact.name))?;
        info!(
            "Wrote '{}' ({} row(s)) to {:?}",
            artifact.name,
            artifact.table.row_count(),
            path
        );
        paths.push(path);
    }
    Ok(paths)
}

#[derive(Debug, Serialize)]
pub struct ArtifactSummary {
    pub name: String,
    pub rows: usize,
    pub file: PathBuf,
}

/// Machine-readable account of a run, written next to the artifacts on
/// request.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub artifacts: Vec<ArtifactSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variance: Option<VarianceSummary>,
    pub warnings: Vec<CoercionWarning>,
}

impl RunSummary {
    pub fn new(report: &Report, paths: &[PathBuf]) -> Self {
        Self {
            artifacts: report
                .artifacts
                .iter()
                .zip(paths)
                .map(|(artifact, path)| ArtifactSummary {
                    name: artifact.name.clone(),
                    rows: artifact.table.row_count(),
                    file: path.clone(),
                })
                .collect(),
            variance: report.summary.clone(),
            warnings: report.warnings.clone().into_inner(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Serializing run summary")?;
        fs::write(path, json).with_context(|| format!("Writing run summary to {path:?}"))?;
        Ok(())
    }
}

/// Renders the first `limit` rows as an elastic text table for terminal
/// preview.
pub fn render_preview(table: &Table, limit: usize) -> String {
    let rows: Vec<Vec<String>> = table
        .rows()
        .iter()
        .take(limit)
        .map(|row| row.iter().map(|cell| sanitize(&cell_display(cell))).collect())
        .collect();

    let mut widths: Vec<usize> = table.columns().iter().map(|c| c.chars().count()).collect();
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count()).max(3);
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(table.columns(), &widths));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(output, "{}", format_row(&rule, &widths));
    for row in &rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn format_row<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    let mut line = String::new();
    for (idx, cell) in cells.iter().enumerate() {
        let cell = cell.as_ref();
        if idx > 0 {
            line.push_str("  ");
        }
        line.push_str(cell);
        let padding = widths[idx].saturating_sub(cell.chars().count());
        line.push_str(&" ".repeat(padding));
    }
    line.trim_end().to_string()
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|ch| match ch {
            '\n' | '\r' | '\t' => ' ',
            other => other,
        })
        .collect()
}
