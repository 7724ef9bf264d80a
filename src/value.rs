//! Cell values and the parsers for Brazilian-formatted numbers and dates.
//!
//! A cell is `Option<Value>`: `None` is an explicit unknown, distinct from
//! zero and from empty text. Unknowns come from empty fields, failed
//! coercions, and unmatched join rows, and they survive projection and
//! sorting untouched.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

pub type Cell = Option<Value>;

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    /// Display text: whole-number floats drop the trailing `.0`, dates
    /// render day-first.
    pub fn as_display(&self) -> String {
        match self {
            Value::Text(text) => text.clone(),
            Value::Number(number) => format_number(*number),
            Value::Date(date) => date.format("%d/%m/%Y").to_string(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            Value::Text(text) => parse_number(text),
            Value::Date(_) => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Number(_) => 0,
            Value::Date(_) => 1,
            Value::Text(_) => 2,
        }
    }
}

fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        format!("{number}")
    }
}

fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Value::Date(x), Value::Date(y)) => x.cmp(y),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        _ => a.rank().cmp(&b.rank()),
    }
}

/// Total order over cells for sorting: unknowns first, then numbers,
/// dates, and text, each compared within its own kind.
#[derive(Debug)]
pub struct ComparableCell<'a>(pub &'a Cell);

impl Ord for ComparableCell<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => cmp_values(a, b),
        }
    }
}

impl PartialOrd for ComparableCell<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ComparableCell<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ComparableCell<'_> {}

/// Display text of a cell; the empty string for an unknown.
pub fn cell_display(cell: &Cell) -> String {
    cell.as_ref().map(Value::as_display).unwrap_or_default()
}

pub fn cell_number(cell: &Cell) -> Option<f64> {
    cell.as_ref().and_then(Value::as_number)
}

/// Lot codes compare case- and whitespace-insensitively across systems;
/// the canonical form is trimmed and upper-cased. Idempotent.
pub fn normalize_lot(lot: &str) -> String {
    lot.trim().to_uppercase()
}

/// Parses a quantity or money amount. A comma marks the Brazilian
/// convention (`1.234,56`); without one the text is read as-is.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".").parse().ok()
    } else {
        trimmed.parse().ok()
    }
}

/// Accepted date layouts, day-first where ambiguous. Exports sometimes
/// append a timestamp; everything after the first blank is ignored.
pub const DATE_FORMATS: [&str; 4] = ["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y", "%d/%m/%y"];

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().split_whitespace().next()?;
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}
