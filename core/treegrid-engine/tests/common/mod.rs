//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for tree grid pipeline integration tests.

#![allow(dead_code)]

use serde_json::json;
use treegrid_engine::{
    calculate_tree_grid, DataRow, FilterCondition, FilterConditionKind, FilterLogic, FilterTree,
    PagingConfig, PagingMode, RowKey, TreeGridDefinition, TreeGridState, TreeGridView,
};

/// Test harness holding one grid's configuration, intent and data.
pub struct TestHarness {
    pub definition: TreeGridDefinition,
    pub state: TreeGridState,
    pub rows: Vec<DataRow>,
}

impl TestHarness {
    /// Create a harness over flat rows keyed by "id" and linked by "pid".
    pub fn flat(rows: Vec<DataRow>) -> Self {
        TestHarness {
            definition: TreeGridDefinition::flat(1, "id", "pid"),
            state: TreeGridState::default(),
            rows,
        }
    }

    /// Create a harness over rows nesting their children under "items".
    pub fn nested(rows: Vec<DataRow>) -> Self {
        TestHarness {
            definition: TreeGridDefinition::nested(1, Some("id"), "items"),
            state: TreeGridState::default(),
            rows,
        }
    }

    /// Create a harness with the small flat sample: 1 > (2 > 4), 3.
    pub fn with_sample_data() -> Self {
        Self::flat(sample_rows())
    }

    /// Create a harness with the company sample (two roots, three levels).
    pub fn with_company_data() -> Self {
        Self::flat(company_rows())
    }

    /// Create a harness with `roots` roots, each with `children` children
    /// and one grandchild per child.
    pub fn with_generated_data(roots: usize, children: usize) -> Self {
        Self::flat(generated_rows(roots, children))
    }

    pub fn paged(mut self, mode: PagingMode, page_size: usize) -> Self {
        self.definition.paging = Some(PagingConfig::new(mode, page_size));
        self
    }

    pub fn filter_equals(mut self, field: &str, value: impl Into<treegrid_engine::RowValue>) -> Self {
        self.state.filter = FilterTree::new(FilterLogic::And)
            .with_condition(FilterCondition::new(field, FilterConditionKind::Equals, value));
        self
    }

    pub fn expand(mut self, key: i32, expanded: bool) -> Self {
        self.state.expansion.set(RowKey::from(key), expanded);
        self
    }

    /// Run the pipeline, panicking on error.
    pub fn view(&self) -> TreeGridView {
        calculate_tree_grid(&self.definition, &self.state, &self.rows)
            .expect("pipeline should succeed")
    }

    /// Run the pipeline for page `page_index`.
    pub fn view_page(&mut self, page_index: usize) -> TreeGridView {
        self.state.page_index = page_index;
        self.view()
    }

    /// Concatenate every page of the current state.
    pub fn all_pages(&mut self) -> Vec<TreeGridView> {
        let count = self.view_page(0).page.page_count;
        (0..count).map(|p| self.view_page(p)).collect()
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub fn rows(value: serde_json::Value) -> Vec<DataRow> {
    serde_json::from_value(value).expect("fixture rows should deserialize")
}

pub fn row(value: serde_json::Value) -> DataRow {
    serde_json::from_value(value).expect("fixture row should deserialize")
}

pub fn sample_rows() -> Vec<DataRow> {
    rows(json!([
        {"id": 1, "pid": null, "name": "Root"},
        {"id": 2, "pid": 1, "name": "Child A"},
        {"id": 3, "pid": 1, "name": "Child B"},
        {"id": 4, "pid": 2, "name": "Grandchild"},
    ]))
}

/// Two departments with teams and people.
pub fn company_rows() -> Vec<DataRow> {
    rows(json!([
        {"id": 1, "pid": null, "name": "Engineering", "budget": 500},
        {"id": 2, "pid": 1, "name": "Platform", "budget": 200},
        {"id": 3, "pid": 1, "name": "Apps", "budget": 300},
        {"id": 4, "pid": 2, "name": "Ada", "budget": 10},
        {"id": 5, "pid": 2, "name": "Linus", "budget": 10},
        {"id": 6, "pid": 3, "name": "Grace", "budget": 20},
        {"id": 7, "pid": null, "name": "Sales", "budget": 150},
        {"id": 8, "pid": 7, "name": "Ken", "budget": 5},
        {"id": 9, "pid": 7, "name": "Barbara", "budget": 15},
    ]))
}

pub fn generated_rows(roots: usize, children: usize) -> Vec<DataRow> {
    let mut out = Vec::new();
    let mut next = 1;
    for r in 0..roots {
        let root = next;
        next += 1;
        out.push(row(json!({"id": root, "pid": null, "name": format!("root {}", r), "rank": (r * 7) % 5})));
        for c in 0..children {
            let child = next;
            next += 1;
            out.push(row(json!({"id": child, "pid": root, "name": format!("child {}.{}", r, c), "rank": (c * 3) % 4})));
            let grandchild = next;
            next += 1;
            out.push(row(json!({"id": grandchild, "pid": child, "name": format!("leaf {}.{}", r, c), "rank": c % 2})));
        }
    }
    out
}

pub fn ids(ids: &[i32]) -> Vec<RowKey> {
    ids.iter().map(|&i| RowKey::from(i)).collect()
}

/// Keys of the data rows only (summary and add rows skipped).
pub fn record_keys(view: &TreeGridView) -> Vec<RowKey> {
    view.rows
        .iter()
        .filter(|r| r.is_record())
        .map(|r| r.key.clone())
        .collect()
}
