//! FILENAME: core/treegrid-engine/src/value.rs
//! Row values and row keys.
//!
//! A row is an ordered map from field name to `RowValue`. Nested hierarchies
//! carry their child rows inside a `RowValue::Children` field. Keys are the
//! hashable subset of values used to identify rows across pipeline stages.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// ROW VALUES
// ============================================================================

/// A single field value in a data row.
/// Serialized untagged, so plain JSON objects deserialize directly into rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowValue {
    Empty,
    Boolean(bool),
    Number(f64),
    Text(String),
    /// Nested child rows (used by the `child_data_key` field).
    Children(Vec<DataRow>),
}

/// The payload of one row: field name -> value.
/// A `BTreeMap` keeps serialization order deterministic.
pub type DataRow = BTreeMap<String, RowValue>;

impl Default for RowValue {
    fn default() -> Self {
        RowValue::Empty
    }
}

impl RowValue {
    pub fn text(s: impl Into<String>) -> Self {
        RowValue::Text(s.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RowValue::Empty => true,
            RowValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Truthiness used for flag fields such as `has_children_key`.
    pub fn is_truthy(&self) -> bool {
        match self {
            RowValue::Empty => false,
            RowValue::Boolean(b) => *b,
            RowValue::Number(n) => *n != 0.0 && !n.is_nan(),
            RowValue::Text(s) => !s.is_empty(),
            RowValue::Children(rows) => !rows.is_empty(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            RowValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_children(&self) -> Option<&[DataRow]> {
        match self {
            RowValue::Children(rows) => Some(rows),
            _ => None,
        }
    }

    /// Display string used by text conditions (contains, starts with, ...).
    pub fn display_text(&self) -> String {
        match self {
            RowValue::Empty => String::new(),
            RowValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            RowValue::Number(n) => format!("{}", n),
            RowValue::Text(s) => s.clone(),
            RowValue::Children(rows) => format!("[{} rows]", rows.len()),
        }
    }

    /// Rank of the value kind in the total value ordering.
    fn kind_rank(&self) -> u8 {
        match self {
            RowValue::Empty => 0,
            RowValue::Number(_) => 1,
            RowValue::Text(_) => 2,
            RowValue::Boolean(_) => 3,
            RowValue::Children(_) => 4,
        }
    }

    /// Whether two values are of the same kind (both numbers, both text, ...).
    pub fn same_kind(&self, other: &RowValue) -> bool {
        self.kind_rank() == other.kind_rank()
    }
}

impl From<f64> for RowValue {
    fn from(value: f64) -> Self {
        RowValue::Number(value)
    }
}

impl From<i32> for RowValue {
    fn from(value: i32) -> Self {
        RowValue::Number(value as f64)
    }
}

impl From<bool> for RowValue {
    fn from(value: bool) -> Self {
        RowValue::Boolean(value)
    }
}

impl From<&str> for RowValue {
    fn from(value: &str) -> Self {
        RowValue::Text(value.to_string())
    }
}

impl From<String> for RowValue {
    fn from(value: String) -> Self {
        RowValue::Text(value)
    }
}

impl From<Vec<DataRow>> for RowValue {
    fn from(value: Vec<DataRow>) -> Self {
        RowValue::Children(value)
    }
}

/// Compares two row values.
/// Order: Empty < Number < Text < Boolean < Children.
pub fn compare_values(a: &RowValue, b: &RowValue, ignore_case: bool) -> Ordering {
    match (a, b) {
        (RowValue::Empty, RowValue::Empty) => Ordering::Equal,
        (RowValue::Number(na), RowValue::Number(nb)) => OrderedFloat(*na).cmp(&OrderedFloat(*nb)),
        (RowValue::Text(ta), RowValue::Text(tb)) => {
            if ignore_case {
                ta.to_lowercase().cmp(&tb.to_lowercase())
            } else {
                ta.cmp(tb)
            }
        }
        (RowValue::Boolean(ba), RowValue::Boolean(bb)) => ba.cmp(bb),
        (RowValue::Children(ca), RowValue::Children(cb)) => ca.len().cmp(&cb.len()),
        _ => a.kind_rank().cmp(&b.kind_rank()),
    }
}

// ============================================================================
// ORDERED FLOAT
// ============================================================================

/// Wrapper around f64 that implements Eq, Ord and Hash for use as map keys.
/// NaN values are equal to each other and sort after every number;
/// -0.0 and 0.0 are the same key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderedFloat(pub f64);

impl OrderedFloat {
    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderedFloat {}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.is_nan(), other.0.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal),
        }
    }
}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            u64::MAX.hash(state);
        } else if self.0 == 0.0 {
            0u64.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

// ============================================================================
// ROW KEYS
// ============================================================================

/// Identity of a row.
/// Built from the primary-key field, or from the row's position in the
/// input when no primary key is configured.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RowKey {
    Number(OrderedFloat),
    Text(String),
    Boolean(bool),
    /// Pre-order ordinal of a row in a collection without a primary key.
    Position(usize),
}

impl RowKey {
    /// Builds a key from a field value. Empty and nested values are not keys.
    pub fn from_value(value: &RowValue) -> Option<RowKey> {
        match value {
            RowValue::Number(n) => Some(RowKey::Number(OrderedFloat(*n))),
            RowValue::Text(s) if !s.is_empty() => Some(RowKey::Text(s.clone())),
            RowValue::Boolean(b) => Some(RowKey::Boolean(*b)),
            _ => None,
        }
    }

    /// Reads the key stored under `field` in `row`.
    pub fn from_field(row: &DataRow, field: &str) -> Option<RowKey> {
        row.get(field).and_then(RowKey::from_value)
    }

    /// The value written into a foreign-key field to reference this key.
    pub fn to_value(&self) -> RowValue {
        match self {
            RowKey::Number(n) => RowValue::Number(n.as_f64()),
            RowKey::Text(s) => RowValue::Text(s.clone()),
            RowKey::Boolean(b) => RowValue::Boolean(*b),
            RowKey::Position(p) => RowValue::Number(*p as f64),
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Number(n) => write!(f, "{}", n.as_f64()),
            RowKey::Text(s) => write!(f, "'{}'", s),
            RowKey::Boolean(b) => write!(f, "{}", b),
            RowKey::Position(p) => write!(f, "#{}", p),
        }
    }
}

impl From<i32> for RowKey {
    fn from(value: i32) -> Self {
        RowKey::Number(OrderedFloat(value as f64))
    }
}

impl From<f64> for RowKey {
    fn from(value: f64) -> Self {
        RowKey::Number(OrderedFloat(value))
    }
}

impl From<&str> for RowKey {
    fn from(value: &str) -> Self {
        RowKey::Text(value.to_string())
    }
}

impl From<String> for RowKey {
    fn from(value: String) -> Self {
        RowKey::Text(value)
    }
}
