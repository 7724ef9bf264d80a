//! Error and warning types shared by every pipeline stage.
//!
//! Structural problems (unreadable file, missing column, ambiguous join
//! key) are hard errors; a single cell that fails coercion is only a
//! [`CoercionWarning`], collected and reported after the run.

use std::fmt;

use serde::Serialize;

#[derive(Debug)]
pub enum PipelineError {
    Load { file: String, reason: String },

    SheetMismatch { file: String, reference: String },

    MissingColumn { column: String, source: String },

    AmbiguousJoinKey { side: &'static str, key: String },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load { file, reason } => {
                write!(f, "failed to load '{file}': {reason}")
            }
            Self::SheetMismatch { file, reference } => {
                write!(f, "sheet '{file}' does not share the columns of '{reference}'")
            }
            Self::MissingColumn { column, source } => {
                write!(f, "required column '{column}' is missing from '{source}'")
            }
            Self::AmbiguousJoinKey { side, key } => {
                write!(
                    f,
                    "duplicate join key ({key}) on the {side} side; aggregate that sheet first"
                )
            }
        }
    }
}

impl std::error::Error for PipelineError {}

/// One cell that could not be coerced and was treated as unknown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoercionWarning {
    /// File the cell came from.
    pub source: String,
    /// Canonical column name.
    pub column: String,
    /// 1-based data row.
    pub row: usize,
    /// Raw cell text as uploaded.
    pub raw: String,
    pub expected: &'static str,
}

impl fmt::Display for CoercionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' row {}, column '{}': '{}' is not a valid {}",
            self.source, self.row, self.column, self.raw, self.expected
        )
    }
}

/// Coercion warnings accumulated across a whole run.
#[derive(Debug, Clone, Default)]
pub struct Warnings(Vec<CoercionWarning>);

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: CoercionWarning) {
        self.0.push(warning);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CoercionWarning> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<CoercionWarning> {
        self.0
    }
}
