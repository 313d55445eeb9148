//! FILENAME: core/treegrid-engine/src/sort.rs
//! Tree Sorter - Hierarchy-preserving sorting.
//!
//! Siblings are compared only with siblings. The same comparator chain is
//! applied to the root list and to every child list, and the sort is stable,
//! so rows comparing equal keep their input order.

use std::borrow::Cow;
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{TreeGridError, TreeGridResult};
use crate::record::{Forest, Record, RecordId, RecordStore};
use crate::value::{compare_values, RowValue};

// ============================================================================
// SORT EXPRESSIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Ascending
    }
}

/// Sort by one field. A list of expressions forms a comparator chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortExpression {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
    #[serde(default)]
    pub ignore_case: bool,
}

impl SortExpression {
    pub fn ascending(field: &str) -> Self {
        SortExpression {
            field: field.to_string(),
            direction: SortDirection::Ascending,
            ignore_case: false,
        }
    }

    pub fn descending(field: &str) -> Self {
        SortExpression {
            field: field.to_string(),
            direction: SortDirection::Descending,
            ignore_case: false,
        }
    }

    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let empty = RowValue::Empty;
        let va = a.data.get(&self.field).unwrap_or(&empty);
        let vb = b.data.get(&self.field).unwrap_or(&empty);
        let ordering = compare_values(va, vb, self.ignore_case);
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

// ============================================================================
// COMPARATORS
// ============================================================================

/// Orders two sibling records.
pub trait RowComparator {
    fn compare(&self, a: &Record, b: &Record) -> TreeGridResult<Ordering>;

    /// An empty comparator leaves the forest as it is.
    fn is_empty(&self) -> bool {
        false
    }
}

impl RowComparator for Vec<SortExpression> {
    fn compare(&self, a: &Record, b: &Record) -> TreeGridResult<Ordering> {
        Ok(self
            .iter()
            .map(|expr| expr.compare(a, b))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal))
    }

    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

/// Adapts a fallible closure into a `RowComparator`.
pub struct ComparatorFn<F>(pub F);

impl<F> RowComparator for ComparatorFn<F>
where
    F: Fn(&Record, &Record) -> TreeGridResult<Ordering>,
{
    fn compare(&self, a: &Record, b: &Record) -> TreeGridResult<Ordering> {
        (self.0)(a, b)
    }
}

// ============================================================================
// TREE SORTER
// ============================================================================

/// Sorts every sibling list of `forest`.
/// An empty comparator returns the input forest itself, not a copy.
pub fn sort_forest<'a>(
    store: &RecordStore,
    forest: &'a Forest,
    comparator: &dyn RowComparator,
) -> TreeGridResult<Cow<'a, Forest>> {
    if comparator.is_empty() {
        return Ok(Cow::Borrowed(forest));
    }

    let mut sorted = forest.clone();
    sort_siblings(sorted.roots_mut(), store, comparator)?;

    // Every child list is sorted independently; no recursion needed
    for id in forest.preorder() {
        if let Some(children) = sorted.children_mut(id) {
            sort_siblings(children, store, comparator)?;
        }
    }

    log_debug!("SORT", "sorted {} records", forest.len());
    Ok(Cow::Owned(sorted))
}

/// Stable sort of one sibling list. The first comparator error wins.
fn sort_siblings(
    ids: &mut [RecordId],
    store: &RecordStore,
    comparator: &dyn RowComparator,
) -> TreeGridResult<()> {
    let mut failure: Option<TreeGridError> = None;
    ids.sort_by(|&a, &b| {
        if failure.is_some() {
            return Ordering::Equal;
        }
        match comparator.compare(store.record(a), store.record(b)) {
            Ok(ordering) => ordering,
            Err(e) => {
                failure = Some(e);
                Ordering::Equal
            }
        }
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
