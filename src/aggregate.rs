//! Aggregator: collapse duplicate composite keys before any join.
//!
//! Joining on a key with surviving duplicates is an ambiguity error in the
//! reconciler, so every recipe funnels its tables through here first.
//! [`Aggregation::Sum`] is the usual group-and-sum; unknown
//! quantities count as zero in the sum, which makes an aggregated unknown
//! indistinguishable from a true zero — an accepted limitation of the
//! source process, not something to fix silently here.

use std::collections::HashMap;

use itertools::Itertools;

use crate::errors::PipelineError;
use crate::table::Table;
use crate::value::{Cell, cell_display, cell_number};

/// Separator that cannot appear in cell text.
const KEY_SEPARATOR: &str = "\u{1f}";

#[derive(Debug, Clone)]
pub enum Aggregation {
    /// One row per key: key columns plus the arithmetic sum of this column.
    Sum(String),
    /// One full row per key, first occurrence wins. Used to make a join
    /// key unique when there is nothing meaningful to sum.
    KeepFirst,
}

pub(crate) fn composite_key(row: &[Cell], indices: &[usize]) -> String {
    indices
        .iter()
        .map(|idx| cell_display(&row[*idx]))
        .join(KEY_SEPARATOR)
}

pub fn aggregate(
    table: &Table,
    key: &[&str],
    aggregation: &Aggregation,
) -> Result<Table, PipelineError> {
    let key_indices = table.column_indices(key)?;
    match aggregation {
        Aggregation::Sum(column) => {
            let sum_idx = table.require_column(column)?;
            let mut order: Vec<(Vec<Cell>, f64)> = Vec::new();
            let mut seen: HashMap<String, usize> = HashMap::new();
            for row in table.rows() {
                let key_value = composite_key(row, &key_indices);
                let amount = cell_number(&row[sum_idx]).unwrap_or(0.0);
                match seen.get(&key_value) {
                    Some(slot) => order[*slot].1 += amount,
                    None => {
                        seen.insert(key_value, order.len());
                        let key_cells = key_indices.iter().map(|idx| row[*idx].clone()).collect();
                        order.push((key_cells, amount));
                    }
                }
            }
            let mut columns: Vec<String> = key.iter().map(|name| name.to_string()).collect();
            columns.push(column.clone());
            let rows = order
                .into_iter()
                .map(|(mut cells, sum)| {
                    cells.push(Some(crate::value::Value::Number(sum)));
                    cells
                })
                .collect();
            Ok(Table::with_rows(table.label().to_string(), columns, rows))
        }
        Aggregation::KeepFirst => {
            let mut seen: HashMap<String, ()> = HashMap::new();
            let rows = table
                .rows()
                .iter()
                .filter(|row| {
                    let key_value = composite_key(row, &key_indices);
                    seen.insert(key_value, ()).is_none()
                })
                .cloned()
                .collect();
            Ok(Table::with_rows(
                table.label().to_string(),
                table.columns().to_vec(),
                rows,
            ))
        }
    }
}
