//! Column Normalizer: canonical names, typed cells, explicit unknowns.
//!
//! A [`NormalizePlan`] lists the source columns a recipe requires, the
//! canonical name each is published under, and the coercion applied to its
//! cells. A missing source column is a hard error naming the column and the
//! offending file; a cell that fails numeric or date parsing becomes
//! unknown and is recorded as a [`CoercionWarning`], never a failure.

use regex::Regex;

use crate::errors::{CoercionWarning, PipelineError, Warnings};
use crate::table::Table;
use crate::value::{self, Cell, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Keep the cell as text.
    Text,
    /// Trim + upper-case; lot codes are identifiers, never numbers.
    LotCode,
    Number,
    Date,
}

impl Coercion {
    fn expected(self) -> &'static str {
        match self {
            Coercion::Text | Coercion::LotCode => "text",
            Coercion::Number => "number",
            Coercion::Date => "date",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColumnSpec {
    /// Header label in the uploaded file.
    pub source: String,
    /// Canonical name, when it differs from the source label.
    pub rename: Option<String>,
    pub coercion: Coercion,
}

impl ColumnSpec {
    pub fn new(source: &str, coercion: Coercion) -> Self {
        Self {
            source: source.to_string(),
            rename: None,
            coercion,
        }
    }

    pub fn renamed(source: &str, canonical: &str, coercion: Coercion) -> Self {
        Self {
            source: source.to_string(),
            rename: Some(canonical.to_string()),
            coercion,
        }
    }

    pub fn canonical(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.source)
    }
}

/// Copies `fallback` into `primary` wherever `primary` is unknown. Address
/// registries split the location across merged header cells, leaving part
/// of the column under a spill-over label.
#[derive(Debug, Clone)]
pub struct FillFallback {
    pub primary: String,
    pub fallback: String,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizePlan {
    pub columns: Vec<ColumnSpec>,
    pub fill_fallback: Option<FillFallback>,
    pub drop_unknown_rows: bool,
}

pub fn apply(
    table: &Table,
    plan: &NormalizePlan,
    warnings: &mut Warnings,
) -> Result<Table, PipelineError> {
    let indices = plan
        .columns
        .iter()
        .map(|spec| table.require_column(&spec.source))
        .collect::<Result<Vec<_>, _>>()?;
    let fallback = plan
        .fill_fallback
        .as_ref()
        .map(|fill| {
            Ok::<_, PipelineError>((
                table.require_column(&fill.primary)?,
                table.require_column(&fill.fallback)?,
            ))
        })
        .transpose()?;

    let columns = plan
        .columns
        .iter()
        .map(|spec| spec.canonical().to_string())
        .collect();
    let mut normalized = Table::new(table.label().to_string(), columns);
    for (row_idx, row) in table.rows().iter().enumerate() {
        let cells = plan
            .columns
            .iter()
            .zip(&indices)
            .map(|(spec, idx)| {
                let mut cell = &row[*idx];
                if let Some((primary, fb)) = fallback {
                    if *idx == primary && cell.is_none() {
                        cell = &row[fb];
                    }
                }
                coerce(cell, spec.coercion).unwrap_or_else(|raw| {
                    warnings.push(CoercionWarning {
                        source: table.label().to_string(),
                        column: spec.canonical().to_string(),
                        row: row_idx + 1,
                        raw,
                        expected: spec.coercion.expected(),
                    });
                    None
                })
            })
            .collect::<Vec<_>>();
        if plan.drop_unknown_rows && cells.iter().any(Option::is_none) {
            continue;
        }
        normalized.push_row(cells);
    }
    Ok(normalized)
}

/// `Err` carries the raw text of a cell that failed parsing.
fn coerce(cell: &Cell, coercion: Coercion) -> Result<Cell, String> {
    let Some(value) = cell else {
        return Ok(None);
    };
    let coerced = match coercion {
        Coercion::Text => Some(Value::Text(value.as_display())),
        Coercion::LotCode => Some(Value::Text(value::normalize_lot(&value.as_display()))),
        Coercion::Number => match value {
            Value::Number(n) => Some(Value::Number(*n)),
            other => {
                let raw = other.as_display();
                Some(Value::Number(
                    value::parse_number(&raw).ok_or(raw)?,
                ))
            }
        },
        Coercion::Date => match value {
            Value::Date(d) => Some(Value::Date(*d)),
            other => {
                let raw = other.as_display();
                Some(Value::Date(value::parse_date(&raw).ok_or(raw)?))
            }
        },
    };
    Ok(coerced)
}

/// Adds an all-unknown column when the table does not already carry it.
/// The count column starts unknown: a quantity nobody counted yet is not a
/// zero.
pub fn ensure_column(table: &Table, name: &str) -> Table {
    if table.column_index(name).is_some() {
        return table.clone();
    }
    table.with_column(name, vec![None; table.row_count()])
}

/// Drops every row still holding at least one unknown cell.
pub fn drop_unknown_rows(table: &Table) -> Table {
    let rows = table
        .rows()
        .iter()
        .filter(|row| row.iter().all(Option::is_some))
        .cloned()
        .collect();
    Table::with_rows(
        table.label().to_string(),
        table.columns().to_vec(),
        rows,
    )
}

/// Derives `new_column` from the first capture group of `pattern` applied
/// to the display text of `source` (drug name out of the auxiliary-code
/// column). No match leaves the cell unknown and records a warning.
pub fn extract_pattern(
    table: &Table,
    source: &str,
    pattern: &Regex,
    new_column: &str,
    warnings: &mut Warnings,
) -> Result<Table, PipelineError> {
    let source_idx = table.require_column(source)?;
    let cells = table
        .rows()
        .iter()
        .enumerate()
        .map(|(row_idx, row)| match &row[source_idx] {
            Some(value) => {
                let raw = value.as_display();
                match pattern.captures(&raw).and_then(|caps| caps.get(1)) {
                    Some(hit) => Some(Value::text(hit.as_str())),
                    None => {
                        warnings.push(CoercionWarning {
                            source: table.label().to_string(),
                            column: new_column.to_string(),
                            row: row_idx + 1,
                            raw,
                            expected: "pattern match",
                        });
                        None
                    }
                }
            }
            None => None,
        })
        .collect();
    Ok(table.with_column(new_column, cells))
}

/// Coerces only the named columns, leaving the rest of the table untouched.
/// Used when one side of a join arrives with a free-form schema and only
/// the key columns need identical normalization.
pub fn coerce_columns(
    table: &Table,
    specs: &[(&str, Coercion)],
    warnings: &mut Warnings,
) -> Result<Table, PipelineError> {
    let targets = specs
        .iter()
        .map(|(name, coercion)| Ok((table.require_column(name)?, *name, *coercion)))
        .collect::<Result<Vec<_>, PipelineError>>()?;
    let rows = table
        .rows()
        .iter()
        .enumerate()
        .map(|(row_idx, row)| {
            let mut row = row.clone();
            for (idx, name, coercion) in &targets {
                row[*idx] = coerce(&row[*idx], *coercion).unwrap_or_else(|raw| {
                    warnings.push(CoercionWarning {
                        source: table.label().to_string(),
                        column: name.to_string(),
                        row: row_idx + 1,
                        raw,
                        expected: coercion.expected(),
                    });
                    None
                });
            }
            row
        })
        .collect();
    Ok(Table::with_rows(
        table.label().to_string(),
        table.columns().to_vec(),
        rows,
    ))
}
