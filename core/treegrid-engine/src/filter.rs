//! FILENAME: core/treegrid-engine/src/filter.rs
//! Tree Filter - Hierarchy-preserving filtering.
//!
//! A record is kept when it matches the predicate or when any of its
//! descendants is kept. Kept records that do not match themselves are
//! reported as forced expansions so the matching descendants stay visible.
//!
//! The filter never touches the store or the input forest: it builds a new
//! forest, so a predicate failing half-way leaves nothing half-filtered.

use std::borrow::Cow;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::TreeGridResult;
use crate::record::{ChildIds, Forest, Record, RecordId, RecordStore};
use crate::value::{compare_values, DataRow, RowKey, RowValue};

// ============================================================================
// FILTER EXPRESSIONS
// ============================================================================

/// How the operands of a filter tree are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterLogic {
    And,
    Or,
}

impl Default for FilterLogic {
    fn default() -> Self {
        FilterLogic::And
    }
}

/// Supported condition operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterConditionKind {
    Equals,
    DoesNotEqual,
    Contains,
    DoesNotContain,
    StartsWith,
    EndsWith,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Empty,
    NotEmpty,
    True,
    False,
}

/// A single condition on one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub field: String,
    pub condition: FilterConditionKind,
    /// Operand for comparing conditions (ignored by Empty/NotEmpty/True/False).
    #[serde(default)]
    pub search: RowValue,
    #[serde(default)]
    pub ignore_case: bool,
}

impl FilterCondition {
    pub fn new(field: &str, condition: FilterConditionKind, search: impl Into<RowValue>) -> Self {
        FilterCondition {
            field: field.to_string(),
            condition,
            search: search.into(),
            ignore_case: false,
        }
    }

    pub fn matches(&self, row: &DataRow) -> bool {
        let empty = RowValue::Empty;
        let value = row.get(&self.field).unwrap_or(&empty);
        let text = |v: &RowValue| {
            let t = v.display_text();
            if self.ignore_case {
                t.to_lowercase()
            } else {
                t
            }
        };

        match self.condition {
            FilterConditionKind::Equals => {
                compare_values(value, &self.search, self.ignore_case).is_eq()
            }
            FilterConditionKind::DoesNotEqual => {
                !compare_values(value, &self.search, self.ignore_case).is_eq()
            }
            FilterConditionKind::Contains => text(value).contains(&text(&self.search)),
            FilterConditionKind::DoesNotContain => !text(value).contains(&text(&self.search)),
            FilterConditionKind::StartsWith => text(value).starts_with(&text(&self.search)),
            FilterConditionKind::EndsWith => text(value).ends_with(&text(&self.search)),
            FilterConditionKind::GreaterThan => self.ranged(value, |o| o.is_gt()),
            FilterConditionKind::GreaterThanOrEqual => self.ranged(value, |o| o.is_ge()),
            FilterConditionKind::LessThan => self.ranged(value, |o| o.is_lt()),
            FilterConditionKind::LessThanOrEqual => self.ranged(value, |o| o.is_le()),
            FilterConditionKind::Empty => value.is_empty(),
            FilterConditionKind::NotEmpty => !value.is_empty(),
            FilterConditionKind::True => matches!(value, RowValue::Boolean(true)),
            FilterConditionKind::False => matches!(value, RowValue::Boolean(false)),
        }
    }

    /// Range comparisons only hold between values of the same kind.
    fn ranged(&self, value: &RowValue, accept: impl Fn(std::cmp::Ordering) -> bool) -> bool {
        value.same_kind(&self.search) && accept(compare_values(value, &self.search, self.ignore_case))
    }
}

/// An operand of a filter tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterOperand {
    Condition(FilterCondition),
    Tree(FilterTree),
}

/// A boolean combination of conditions. The empty tree matches everything.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterTree {
    #[serde(default)]
    pub operator: FilterLogic,
    #[serde(default)]
    pub operands: Vec<FilterOperand>,
}

impl FilterTree {
    pub fn new(operator: FilterLogic) -> Self {
        FilterTree {
            operator,
            operands: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: FilterCondition) -> Self {
        self.operands.push(FilterOperand::Condition(condition));
        self
    }

    pub fn with_tree(mut self, tree: FilterTree) -> Self {
        self.operands.push(FilterOperand::Tree(tree));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.operands.is_empty()
    }

    pub fn matches(&self, row: &DataRow) -> bool {
        if self.operands.is_empty() {
            return true;
        }
        let mut results = self.operands.iter().map(|operand| match operand {
            FilterOperand::Condition(c) => c.matches(row),
            FilterOperand::Tree(t) => t.matches(row),
        });
        match self.operator {
            FilterLogic::And => results.all(|r| r),
            FilterLogic::Or => results.any(|r| r),
        }
    }
}

// ============================================================================
// PREDICATES
// ============================================================================

/// Decides whether a record matches on its own.
pub trait RowPredicate {
    fn evaluate(&self, record: &Record) -> TreeGridResult<bool>;

    /// An empty predicate matches everything; the filter stage is skipped.
    fn is_empty(&self) -> bool {
        false
    }
}

impl RowPredicate for FilterTree {
    fn evaluate(&self, record: &Record) -> TreeGridResult<bool> {
        Ok(self.matches(&record.data))
    }

    fn is_empty(&self) -> bool {
        FilterTree::is_empty(self)
    }
}

/// Adapts a fallible closure into a `RowPredicate`.
pub struct PredicateFn<F>(pub F);

impl<F> RowPredicate for PredicateFn<F>
where
    F: Fn(&Record) -> TreeGridResult<bool>,
{
    fn evaluate(&self, record: &Record) -> TreeGridResult<bool> {
        (self.0)(record)
    }
}

// ============================================================================
// TREE FILTER
// ============================================================================

/// Output of the filter stage.
#[derive(Debug, Clone)]
pub struct FilterOutcome<'a> {
    pub forest: Cow<'a, Forest>,
    /// Kept records that did not match themselves.
    pub forced_expansions: FxHashSet<RowKey>,
}

/// Filters `forest` with `predicate`, keeping ancestors of every match.
/// An empty predicate returns the input forest untouched.
pub fn filter_forest<'a>(
    store: &RecordStore,
    forest: &'a Forest,
    predicate: &dyn RowPredicate,
) -> TreeGridResult<FilterOutcome<'a>> {
    if predicate.is_empty() {
        return Ok(FilterOutcome {
            forest: Cow::Borrowed(forest),
            forced_expansions: FxHashSet::default(),
        });
    }

    let mut kept: FxHashSet<RecordId> = FxHashSet::default();
    let mut kept_children: FxHashMap<RecordId, ChildIds> = FxHashMap::default();
    let mut forced = FxHashSet::default();

    // Post-order: a record is decided after all of its children
    let mut stack: Vec<(RecordId, bool)> = forest.roots().iter().rev().map(|&id| (id, false)).collect();
    while let Some((id, children_done)) = stack.pop() {
        if !children_done {
            stack.push((id, true));
            stack.extend(forest.children(id).iter().rev().map(|&child| (child, false)));
            continue;
        }

        let children: ChildIds = forest
            .children(id)
            .iter()
            .copied()
            .filter(|child| kept.contains(child))
            .collect();
        let record = store.record(id);
        let matched = predicate.evaluate(record)?;

        if matched || !children.is_empty() {
            kept.insert(id);
            if !matched {
                forced.insert(record.key.clone());
            }
            if !children.is_empty() {
                kept_children.insert(id, children);
            }
        }
    }

    let roots: Vec<RecordId> = forest
        .roots()
        .iter()
        .copied()
        .filter(|id| kept.contains(id))
        .collect();

    log_debug!(
        "FILTER",
        "kept {} of {} records, {} forced open",
        kept.len(),
        forest.len(),
        forced.len()
    );

    Ok(FilterOutcome {
        forest: Cow::Owned(Forest::from_parts(roots, kept_children)),
        forced_expansions: forced,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TreeGridError;
    use crate::hierarchize::{hierarchize, Hierarchy, KeyFields};
    use serde_json::json;

    fn sample() -> Hierarchy {
        let rows: Vec<DataRow> = serde_json::from_value(json!([
            {"id": 1, "pid": null, "name": "Alpha"},
            {"id": 2, "pid": 1, "name": "Beta"},
            {"id": 3, "pid": 1, "name": "Gamma"},
            {"id": 4, "pid": 2, "name": "Delta"},
            {"id": 5, "pid": null, "name": "Epsilon"},
        ]))
        .unwrap();
        hierarchize(
            &rows,
            KeyFields {
                primary_key: Some("id"),
                foreign_key: Some("pid"),
                ..KeyFields::default()
            },
        )
    }

    fn kept_keys(h: &Hierarchy, forest: &Forest) -> Vec<RowKey> {
        forest
            .preorder()
            .iter()
            .map(|&id| h.store.record(id).key.clone())
            .collect()
    }

    #[test]
    fn test_match_keeps_and_forces_ancestors() {
        let h = sample();
        let tree = FilterTree::new(FilterLogic::And)
            .with_condition(FilterCondition::new("id", FilterConditionKind::Equals, 4));
        let outcome = filter_forest(&h.store, &h.forest, &tree).unwrap();

        assert_eq!(
            kept_keys(&h, &outcome.forest),
            vec![RowKey::from(1), RowKey::from(2), RowKey::from(4)]
        );
        let mut forced: Vec<RowKey> = outcome.forced_expansions.into_iter().collect();
        forced.sort();
        assert_eq!(forced, vec![RowKey::from(1), RowKey::from(2)]);
    }

    #[test]
    fn test_matching_parent_keeps_only_matching_children() {
        let h = sample();
        let tree = FilterTree::new(FilterLogic::Or)
            .with_condition(FilterCondition::new("name", FilterConditionKind::Equals, "Alpha"))
            .with_condition(FilterCondition::new("name", FilterConditionKind::Equals, "Gamma"));
        let outcome = filter_forest(&h.store, &h.forest, &tree).unwrap();

        assert_eq!(kept_keys(&h, &outcome.forest), vec![RowKey::from(1), RowKey::from(3)]);
        assert!(outcome.forced_expansions.is_empty());
    }

    #[test]
    fn test_empty_tree_short_circuits() {
        let h = sample();
        let outcome = filter_forest(&h.store, &h.forest, &FilterTree::default()).unwrap();
        assert!(matches!(outcome.forest, Cow::Borrowed(_)));
        assert!(outcome.forced_expansions.is_empty());
    }

    #[test]
    fn test_filter_completeness() {
        let h = sample();
        let tree = FilterTree::new(FilterLogic::And).with_condition(FilterCondition {
            ignore_case: true,
            ..FilterCondition::new("name", FilterConditionKind::Contains, "TA")
        });
        let outcome = filter_forest(&h.store, &h.forest, &tree).unwrap();
        let kept: FxHashSet<RecordId> = outcome.forest.preorder().into_iter().collect();

        for (id, record) in h.store.iter() {
            let matched = tree.matches(&record.data);
            let has_kept_descendant = h.store.descendants(id).iter().any(|d| kept.contains(d));
            assert_eq!(kept.contains(&id), matched || has_kept_descendant, "{}", record.key);
        }
    }

    #[test]
    fn test_failing_predicate_propagates() {
        let h = sample();
        let predicate = PredicateFn(|record: &Record| {
            if record.key == RowKey::from(3) {
                Err(TreeGridError::Predicate("boom".to_string()))
            } else {
                Ok(true)
            }
        });
        let err = filter_forest(&h.store, &h.forest, &predicate).unwrap_err();
        assert!(matches!(err, TreeGridError::Predicate(ref m) if m == "boom"));
        assert_eq!(h.forest.len(), 5);
    }

    #[test]
    fn test_conditions() {
        let row: DataRow = serde_json::from_value(json!({
            "n": 5, "s": "Hello", "b": true, "e": null
        }))
        .unwrap();
        let check = |field: &str, kind, search: RowValue| {
            FilterCondition::new(field, kind, search).matches(&row)
        };

        assert!(check("n", FilterConditionKind::GreaterThan, 4.into()));
        assert!(!check("n", FilterConditionKind::GreaterThan, "4".into()));
        assert!(check("n", FilterConditionKind::LessThanOrEqual, 5.into()));
        assert!(check("s", FilterConditionKind::StartsWith, "He".into()));
        assert!(check("s", FilterConditionKind::EndsWith, "llo".into()));
        assert!(check("s", FilterConditionKind::DoesNotContain, "xyz".into()));
        assert!(check("b", FilterConditionKind::True, RowValue::Empty));
        assert!(check("e", FilterConditionKind::Empty, RowValue::Empty));
        assert!(check("missing", FilterConditionKind::Empty, RowValue::Empty));
        assert!(check("s", FilterConditionKind::DoesNotEqual, "hello".into()));
    }

    #[test]
    fn test_filter_tree_from_json() {
        let tree: FilterTree = serde_json::from_value(json!({
            "operator": "Or",
            "operands": [
                {"Condition": {"field": "id", "condition": "Equals", "search": 4}},
                {"Tree": {"operands": [
                    {"Condition": {"field": "name", "condition": "NotEmpty"}}
                ]}}
            ]
        }))
        .unwrap();
        assert_eq!(tree.operands.len(), 2);
        assert_eq!(tree.operator, FilterLogic::Or);
    }
}
