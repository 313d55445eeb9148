//! FILENAME: tests/test_pipeline.rs
//! Integration tests for the full hierarchize -> filter -> sort -> flatten pipeline.

mod common;

use common::{ids, record_keys, rows, TestHarness};
use serde_json::json;
use treegrid_engine::{
    calculate_tree_grid, ExpansionEntry, FilterCondition, FilterConditionKind, FilterLogic,
    FilterTree, RowKey, RowValue, SortExpression, TreeGridDefinition, TreeGridError,
    TreeGridState, TreeGridView,
};

/// Every visible non-root row has its parent earlier in the sequence, and
/// every ancestor on the way up is expanded.
fn assert_ancestors_visible(view: &TreeGridView) {
    for (pos, row) in view.rows.iter().enumerate().filter(|(_, r)| r.is_record()) {
        let record = view.store.get(&row.key).expect("visible row should be in the store");
        if let Some(parent) = record.parent {
            let parent_key = &view.store.record(parent).key;
            let parent_pos = view.rows[..pos]
                .iter()
                .position(|r| r.is_record() && &r.key == parent_key)
                .expect("parent should precede child");
            assert!(view.rows[parent_pos].expanded, "parent {} should be expanded", parent_key);
            assert_eq!(view.rows[parent_pos].level + 1, row.level);
        } else {
            assert_eq!(row.level, 0);
        }
    }
}

// ============================================================================
// BASIC SCENARIOS
// ============================================================================

#[test]
fn test_flat_rows_render_in_preorder() {
    let harness = TestHarness::with_sample_data();
    let view = harness.view();

    assert_eq!(view.row_keys(), ids(&[1, 2, 4, 3]));
    let levels: Vec<usize> = view.rows.iter().map(|r| r.level).collect();
    assert_eq!(levels, vec![0, 1, 2, 1]);
    assert_eq!(view.root_count, 1);
    assert_eq!(view.total_count, 4);
}

#[test]
fn test_collapsed_row_hides_descendants_but_keeps_them_processed() {
    let harness = TestHarness::with_sample_data().expand(1, true).expand(2, false);
    let view = harness.view();

    assert_eq!(view.row_keys(), ids(&[1, 2, 3]));
    assert!(view.processed.contains_key(&RowKey::from(4)));
    assert_eq!(view.total_count, 4);
    assert_eq!(view.visible_count, 3);
}

#[test]
fn test_filter_keeps_ancestors_of_matches() {
    let harness = TestHarness::with_sample_data().filter_equals("id", 4);
    let view = harness.view();

    assert_eq!(view.row_keys(), ids(&[1, 2, 4]));
    assert_eq!(view.forced_expansions, ids(&[1, 2]));
    assert_ancestors_visible(&view);
}

#[test]
fn test_filter_forces_collapsed_ancestors_open() {
    let harness = TestHarness::with_sample_data()
        .filter_equals("id", 4)
        .expand(1, false)
        .expand(2, false);
    let view = harness.view();
    assert_eq!(view.row_keys(), ids(&[1, 2, 4]));
}

#[test]
fn test_filter_without_matches_is_empty() {
    let harness = TestHarness::with_sample_data().filter_equals("name", "Nobody");
    let view = harness.view();

    assert!(view.rows.is_empty());
    assert_eq!(view.root_count, 0);
    assert_eq!(view.page.page_count, 1);
}

#[test]
fn test_empty_input() {
    let harness = TestHarness::flat(Vec::new());
    let view = harness.view();
    assert!(view.rows.is_empty());
    assert_eq!(view.total_count, 0);
}

// ============================================================================
// PROPERTIES
// ============================================================================

#[test]
fn test_ancestor_visibility_under_mixed_expansion() {
    let harness = TestHarness::with_company_data().expand(2, false).expand(7, true);
    let view = harness.view();
    assert_ancestors_visible(&view);
    assert_eq!(view.row_keys(), ids(&[1, 2, 3, 6, 7, 8, 9]));
}

#[test]
fn test_filter_completeness() {
    let mut harness = TestHarness::with_company_data();
    harness.state.filter = FilterTree::new(FilterLogic::Or)
        .with_condition(FilterCondition::new("name", FilterConditionKind::StartsWith, "A"))
        .with_condition(FilterCondition::new("budget", FilterConditionKind::GreaterThan, 100));
    let view = harness.view();

    // Every matching record is in the filtered set
    let filtered: Vec<RowKey> = view.filtered_data.iter().map(|&id| view.store.record(id).key.clone()).collect();
    for (_, record) in view.store.iter() {
        if harness.state.filter.matches(&record.data) {
            assert!(filtered.contains(&record.key), "{} should survive the filter", record.key);
        }
    }
    // Non-matching survivors are exactly the forced ancestors
    for key in &filtered {
        let record = view.store.get(key).unwrap();
        if !harness.state.filter.matches(&record.data) {
            assert!(view.forced_expansions.contains(key));
        }
    }
    // Ken (5) and Barbara (15) are excluded; Sales itself matches on budget
    assert!(!filtered.contains(&RowKey::from(8)));
    assert!(!filtered.contains(&RowKey::from(9)));
    assert!(filtered.contains(&RowKey::from(7)));
}

#[test]
fn test_sort_is_stable_within_siblings() {
    let mut harness = TestHarness::with_generated_data(5, 6);
    harness.state.sorting = vec![SortExpression::ascending("rank")];
    let view = harness.view();
    assert_ancestors_visible(&view);

    // Siblings are ordered by rank, ties by input order (ids grow with input order)
    let mut by_parent: std::collections::BTreeMap<Option<RowKey>, Vec<(f64, f64)>> = Default::default();
    for row in &view.rows {
        let record = view.store.get(&row.key).unwrap();
        let parent = record.parent.map(|p| view.store.record(p).key.clone());
        let rank = row.data["rank"].as_number().unwrap();
        let id = row.data["id"].as_number().unwrap();
        by_parent.entry(parent).or_default().push((rank, id));
    }
    for siblings in by_parent.values() {
        for pair in siblings.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert!(a.0 < b.0 || (a.0 == b.0 && a.1 < b.1), "{:?} before {:?}", a, b);
        }
    }
}

#[test]
fn test_descending_sort_applies_at_every_level() {
    let mut harness = TestHarness::with_company_data();
    harness.state.sorting = vec![SortExpression::descending("budget")];
    let view = harness.view();
    assert_eq!(view.row_keys(), ids(&[1, 3, 6, 2, 4, 5, 7, 9, 8]));
}

#[test]
fn test_round_trip_identity_without_transforms() {
    let harness = TestHarness::with_company_data();
    let view = harness.view();
    let input: Vec<RowValue> = harness.rows.iter().map(|r| r["id"].clone()).collect();
    let output: Vec<RowValue> = view.rows.iter().map(|r| r.data["id"].clone()).collect();
    // The company fixture is listed in pre-order already
    assert_eq!(input, output);
}

#[test]
fn test_idempotent_runs_produce_identical_output() {
    let mut harness = TestHarness::with_generated_data(4, 3).filter_equals("rank", 1);
    harness.state.sorting = vec![SortExpression::descending("name")];
    let first = serde_json::to_string(&harness.view()).unwrap();
    let second = serde_json::to_string(&harness.view()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_defaulted_expansions_can_be_fed_back() {
    let mut harness = TestHarness::with_sample_data();
    harness.definition.expansion_depth = Some(1);
    let first = harness.view();
    assert_eq!(first.row_keys(), ids(&[1, 2, 3]));
    assert!(first.defaulted_expansions.contains(&ExpansionEntry { key: RowKey::from(2), expanded: false }));

    harness.state.expansion.apply(&first.defaulted_expansions);
    let second = harness.view();
    assert_eq!(first.rows, second.rows);
    assert!(second.defaulted_expansions.is_empty());
}

// ============================================================================
// HIERARCHY EDGE CASES
// ============================================================================

#[test]
fn test_orphans_become_roots() {
    let harness = TestHarness::flat(rows(json!([
        {"id": 1, "pid": null},
        {"id": 2, "pid": 99},
    ])));
    let view = harness.view();
    assert_eq!(view.row_keys(), ids(&[1, 2]));
    assert_eq!(view.root_count, 2);
}

#[test]
fn test_cycles_are_reported_not_fatal() {
    let harness = TestHarness::flat(rows(json!([
        {"id": 1, "pid": 2},
        {"id": 2, "pid": 1},
    ])));
    let view = harness.view();
    assert_eq!(view.total_count, 2);
    assert!(view
        .diagnostics
        .iter()
        .any(|e| matches!(e, TreeGridError::CyclicParent { .. })));
}

#[test]
fn test_nested_rows() {
    let harness = TestHarness::nested(rows(json!([
        {"id": 1, "name": "a", "items": [
            {"id": 2, "name": "b", "items": [{"id": 4, "name": "d"}]},
            {"id": 3, "name": "c"}
        ]},
    ])));
    let view = harness.view();
    assert_eq!(view.row_keys(), ids(&[1, 2, 4, 3]));
    assert!(!view.rows[0].data.contains_key("items"));
}

#[test]
fn test_rows_without_primary_key_use_positions() {
    let definition = TreeGridDefinition::nested(1, None, "items");
    let data = rows(json!([
        {"name": "a", "items": [{"name": "b"}]},
        {"name": "c"},
    ]));
    let view = calculate_tree_grid(&definition, &TreeGridState::default(), &data).unwrap();
    assert_eq!(
        view.row_keys(),
        vec![RowKey::Position(0), RowKey::Position(1), RowKey::Position(2)]
    );
}

#[test]
fn test_has_children_hint_shows_expander() {
    let mut harness = TestHarness::flat(rows(json!([
        {"id": 1, "pid": null, "lazy": true},
        {"id": 2, "pid": null},
    ])));
    harness.definition.has_children_key = Some("lazy".to_string());
    let view = harness.view();
    assert!(view.rows[0].has_children);
    assert!(!view.rows[1].has_children);
    assert_eq!(record_keys(&view), ids(&[1, 2]));
}
