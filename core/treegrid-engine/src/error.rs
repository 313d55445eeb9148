//! FILENAME: core/treegrid-engine/src/error.rs

use thiserror::Error;

use crate::value::RowKey;

#[derive(Error, Debug)]
pub enum TreeGridError {
    #[error("Row {row} has no usable value for primary key '{field}'")]
    MissingKey { row: usize, field: String },

    #[error("Row {key} has a cyclic parent chain and was re-rooted")]
    CyclicParent { key: RowKey },

    #[error("Duplicate row key {key}, later row dropped")]
    DuplicateKey { key: RowKey },

    #[error("Invalid tree grid definition: {0}")]
    InvalidDefinition(String),

    #[error("Filter predicate failed: {0}")]
    Predicate(String),

    #[error("Sort comparator failed: {0}")]
    Comparator(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type TreeGridResult<T> = Result<T, TreeGridError>;
