//! The immutable table every pipeline stage consumes and produces.
//!
//! A [`Table`] is an ordered list of column names plus row-major cells, and
//! a `label` naming where the data came from (file name or artifact name)
//! so schema errors can point the operator at the right upload. Every
//! transformation returns a new table; nothing mutates in place once a
//! stage has handed its output on.

use crate::errors::PipelineError;
use crate::value::{Cell, ComparableCell};

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    label: String,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone)]
pub struct SortDirective {
    pub column: String,
    pub ascending: bool,
}

impl SortDirective {
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            ascending: true,
        }
    }

    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            ascending: false,
        }
    }
}

impl Table {
    pub fn new(label: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            label: label.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(
        label: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<Cell>>,
    ) -> Self {
        let table = Self {
            label: label.into(),
            columns,
            rows,
        };
        debug_assert!(
            table.rows.iter().all(|r| r.len() == table.columns.len()),
            "row width must match column count"
        );
        table
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        &self.rows[row][column]
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, PipelineError> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::MissingColumn {
                column: name.to_string(),
                source: self.label.clone(),
            })
    }

    pub fn column_indices(&self, names: &[&str]) -> Result<Vec<usize>, PipelineError> {
        names.iter().map(|name| self.require_column(name)).collect()
    }

    /// Returns a table holding exactly `names`, in that order.
    pub fn project(&self, names: &[&str]) -> Result<Table, PipelineError> {
        let indices = self.column_indices(names)?;
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|idx| row[*idx].clone()).collect())
            .collect();
        Ok(Table::with_rows(
            self.label.clone(),
            names.iter().map(|n| n.to_string()).collect(),
            rows,
        ))
    }

    /// Renames columns per `(old, new)` pairs; absent old names are ignored
    /// so one rename map can serve recipe variants with differing inputs.
    pub fn renamed(&self, map: &[(&str, &str)]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|name| {
                map.iter()
                    .find(|(old, _)| old == name)
                    .map(|(_, new)| new.to_string())
                    .unwrap_or_else(|| name.clone())
            })
            .collect();
        Table {
            label: self.label.clone(),
            columns,
            rows: self.rows.clone(),
        }
    }

    /// Appends a column; `cells` must have one entry per row.
    pub fn with_column(&self, name: &str, cells: Vec<Cell>) -> Table {
        debug_assert_eq!(cells.len(), self.rows.len());
        let mut columns = self.columns.clone();
        columns.push(name.to_string());
        let rows = self
            .rows
            .iter()
            .zip(cells)
            .map(|(row, cell)| {
                let mut row = row.clone();
                row.push(cell);
                row
            })
            .collect();
        Table {
            label: self.label.clone(),
            columns,
            rows,
        }
    }

    /// Stable multi-column sort; unknown cells order first within a column.
    pub fn sorted_by(&self, directives: &[SortDirective]) -> Result<Table, PipelineError> {
        let keys: Vec<(usize, bool)> = directives
            .iter()
            .map(|d| Ok((self.require_column(&d.column)?, d.ascending)))
            .collect::<Result<_, PipelineError>>()?;
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| {
            for (idx, ascending) in &keys {
                let ordering = ComparableCell(&a[*idx]).cmp(&ComparableCell(&b[*idx]));
                let ordering = if *ascending {
                    ordering
                } else {
                    ordering.reverse()
                };
                if !ordering.is_eq() {
                    return ordering;
                }
            }
            std::cmp::Ordering::Equal
        });
        Ok(Table {
            label: self.label.clone(),
            columns: self.columns.clone(),
            rows,
        })
    }

    pub fn relabeled(&self, label: impl Into<String>) -> Table {
        let mut table = self.clone();
        table.label = label.into();
        table
    }
}
