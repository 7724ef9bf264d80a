//! Reconciler: composite-key joins and the variance arithmetic.
//!
//! Both inputs must already be aggregated to unique join keys. A duplicate
//! key on the lookup (right) side always fans out and is rejected; a full
//! outer join additionally rejects duplicates on the left so that every
//! row of either side appears in the output exactly once.

use std::collections::HashMap;

use itertools::Itertools;
use serde::Serialize;

use crate::aggregate::composite_key;
use crate::errors::PipelineError;
use crate::recipe::col;
use crate::table::Table;
use crate::value::{Cell, Value, cell_display, cell_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    /// Keep every left row; unmatched right columns stay unknown.
    Left,
    /// Keep every row of both sides, merged only on exact key match.
    FullOuter,
}

pub fn join(
    left: &Table,
    right: &Table,
    key: &[&str],
    mode: JoinMode,
) -> Result<Table, PipelineError> {
    let left_key = left.column_indices(key)?;
    let right_key = right.column_indices(key)?;

    let right_lookup = unique_key_lookup(right, &right_key, "right")?;
    if mode == JoinMode::FullOuter {
        unique_key_lookup(left, &left_key, "left")?;
    }

    // Right key columns are redundant after the merge; carry the rest.
    let right_extra: Vec<usize> = (0..right.columns().len())
        .filter(|idx| !right_key.contains(idx))
        .collect();
    let mut columns = left.columns().to_vec();
    columns.extend(right_extra.iter().map(|idx| right.columns()[*idx].clone()));

    let mut matched = vec![false; right.row_count()];
    let mut out = Table::new(left.label().to_string(), columns);
    for row in left.rows() {
        let key_value = composite_key(row, &left_key);
        let mut combined = row.clone();
        match right_lookup.get(&key_value) {
            Some(right_idx) => {
                matched[*right_idx] = true;
                let right_row = &right.rows()[*right_idx];
                combined.extend(right_extra.iter().map(|idx| right_row[*idx].clone()));
            }
            None => combined.extend(right_extra.iter().map(|_| None::<Value>)),
        }
        out.push_row(combined);
    }

    if mode == JoinMode::FullOuter {
        for (right_idx, right_row) in right.rows().iter().enumerate() {
            if matched[right_idx] {
                continue;
            }
            let mut combined: Vec<Cell> = vec![None; left.columns().len()];
            for (left_idx, r_idx) in left_key.iter().zip(&right_key) {
                combined[*left_idx] = right_row[*r_idx].clone();
            }
            combined.extend(right_extra.iter().map(|idx| right_row[*idx].clone()));
            out.push_row(combined);
        }
    }
    Ok(out)
}

fn unique_key_lookup(
    table: &Table,
    key_indices: &[usize],
    side: &'static str,
) -> Result<HashMap<String, usize>, PipelineError> {
    let mut lookup = HashMap::with_capacity(table.row_count());
    for (idx, row) in table.rows().iter().enumerate() {
        let key_value = composite_key(row, key_indices);
        if lookup.insert(key_value, idx).is_some() {
            let shown = key_indices
                .iter()
                .map(|i| cell_display(&row[*i]))
                .join(", ");
            return Err(PipelineError::AmbiguousJoinKey { side, key: shown });
        }
    }
    Ok(lookup)
}

/// How unknown operands behave in the derived columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticPolicy {
    /// Any unknown operand makes every dependent derived cell unknown.
    Strict,
    /// Unknown operands count as zero, for running financial totals that
    /// must survive partial matches.
    ZeroFill,
}

#[derive(Debug, Clone)]
pub struct VarianceSpec {
    /// Physically counted quantity column.
    pub counted: String,
    /// System-of-record quantity column.
    pub system: String,
    pub unit_value: String,
    pub policy: ArithmeticPolicy,
}

/// Appends `Diferença`, `Vlr Total`, and `Vlr Divergencia`.
pub fn compute_variance(table: &Table, spec: &VarianceSpec) -> Result<Table, PipelineError> {
    let counted_idx = table.require_column(&spec.counted)?;
    let system_idx = table.require_column(&spec.system)?;
    let unit_idx = table.require_column(&spec.unit_value)?;

    let mut columns = table.columns().to_vec();
    columns.extend(
        [col::DIFERENCA, col::VLR_TOTAL, col::VLR_DIVERGENCIA]
            .iter()
            .map(|name| name.to_string()),
    );
    let mut out = Table::new(table.label().to_string(), columns);
    for row in table.rows() {
        let counted = operand(&row[counted_idx], spec.policy);
        let system = operand(&row[system_idx], spec.policy);
        let unit = operand(&row[unit_idx], spec.policy);

        let difference = binary(counted, system, |a, b| a - b);
        let total = binary(counted, unit, |a, b| a * b);
        let divergence = binary(difference.clone().and_then(cell_number_owned), unit, |a, b| a * b);

        let mut combined = row.clone();
        combined.push(difference);
        combined.push(total);
        combined.push(divergence);
        out.push_row(combined);
    }
    Ok(out)
}

fn operand(cell: &Cell, policy: ArithmeticPolicy) -> Option<f64> {
    match (cell_number(cell), policy) {
        (Some(n), _) => Some(n),
        (None, ArithmeticPolicy::ZeroFill) => Some(0.0),
        (None, ArithmeticPolicy::Strict) => None,
    }
}

fn binary(a: Option<f64>, b: Option<f64>, op: impl Fn(f64, f64) -> f64) -> Cell {
    match (a, b) {
        (Some(a), Some(b)) => Some(Value::Number(op(a, b))),
        _ => None,
    }
}

fn cell_number_owned(value: Value) -> Option<f64> {
    value.as_number()
}

/// Precomputed totals the rendering layer embeds under the variance sheet:
/// sum of `Vlr Total`, sum of `Vlr Divergencia`, and their ratio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarianceSummary {
    pub total_value: f64,
    pub total_divergence: f64,
    pub divergence_ratio: Option<f64>,
}

pub fn summarize_variance(table: &Table) -> Result<VarianceSummary, PipelineError> {
    let total_idx = table.require_column(col::VLR_TOTAL)?;
    let divergence_idx = table.require_column(col::VLR_DIVERGENCIA)?;
    let mut total_value = 0.0;
    let mut total_divergence = 0.0;
    for row in table.rows() {
        total_value += cell_number(&row[total_idx]).unwrap_or(0.0);
        total_divergence += cell_number(&row[divergence_idx]).unwrap_or(0.0);
    }
    let divergence_ratio = if total_value == 0.0 {
        None
    } else {
        Some(total_divergence / total_value)
    };
    Ok(VarianceSummary {
        total_value,
        total_divergence,
        divergence_ratio,
    })
}
