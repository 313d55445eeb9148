//! FILENAME: core/treegrid-engine/src/view.rs
//! Tree Grid View - Renderable output for the frontend.
//!
//! The view is the current page of flattened rows plus the lookups other
//! subsystems need (selection cascading, scroll-to-row, pager UI).

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::definition::{ExpansionEntry, PinnedRows, SummaryPosition, TreeGridId};
use crate::error::TreeGridError;
use crate::paging::PageInfo;
use crate::record::{RecordId, RecordStore};
use crate::value::{DataRow, RowKey};
use crate::view_index::view_index;

// ============================================================================
// VIEW ROW
// ============================================================================

/// What a rendered row stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewRowKind {
    /// A data record.
    Record,
    /// Placeholder for the summary of `owner`'s children.
    Summary { owner: RowKey, position: SummaryPosition },
    /// An uncommitted row being added under `anchor` (or at the top).
    AddRow { anchor: Option<RowKey> },
}

/// One row the grid draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRow {
    pub key: RowKey,
    pub data: DataRow,
    /// Indentation level (0 = root).
    pub level: usize,
    pub expanded: bool,
    /// Whether an expander is shown (loaded children or load-on-demand flag).
    pub has_children: bool,
    pub kind: ViewRowKind,
}

impl ViewRow {
    pub fn is_record(&self) -> bool {
        matches!(self.kind, ViewRowKind::Record)
    }

    pub fn is_summary(&self) -> bool {
        matches!(self.kind, ViewRowKind::Summary { .. })
    }

    pub fn is_add_row(&self) -> bool {
        matches!(self.kind, ViewRowKind::AddRow { .. })
    }

    /// A summary placeholder for the children of `owner`.
    pub fn summary(owner: RowKey, level: usize, position: SummaryPosition) -> Self {
        ViewRow {
            key: owner.clone(),
            data: DataRow::new(),
            level,
            expanded: false,
            has_children: false,
            kind: ViewRowKind::Summary { owner, position },
        }
    }
}

// ============================================================================
// TREE GRID VIEW
// ============================================================================

/// The complete output of one pipeline run.
#[derive(Debug, Serialize)]
pub struct TreeGridView {
    pub tree_grid_id: TreeGridId,

    /// Rows of the current page, in render order.
    pub rows: Vec<ViewRow>,

    /// Page position and the counts needed to compute absolute row indices.
    pub page: PageInfo,

    /// Number of root records after filtering.
    pub root_count: usize,

    /// Number of visible data rows across all pages (before paging).
    pub visible_count: usize,

    /// Number of records after filtering, visible or collapsed.
    pub total_count: usize,

    /// Keys forced open for this run: non-matching ancestors kept by the
    /// filter, and anchors of pending add rows.
    pub forced_expansions: Vec<RowKey>,

    /// Keys the default expansion rule decided on this run.
    pub defaulted_expansions: Vec<ExpansionEntry>,

    /// Every record of this pass, for O(1) lookups by key.
    #[serde(skip)]
    pub store: RecordStore,

    /// Filtered and sorted records in pre-order, ignoring expansion and paging.
    #[serde(skip)]
    pub filtered_data: Vec<RecordId>,

    /// Every record the flattener visited (visible or collapsed away).
    #[serde(skip)]
    pub processed: FxHashMap<RowKey, RecordId>,

    /// Rows dropped or re-rooted while building the hierarchy.
    #[serde(skip)]
    pub diagnostics: Vec<TreeGridError>,

    /// Pinned rows of the state this view was calculated from.
    pub pinned: PinnedRows,
}

impl TreeGridView {
    /// Filtered and sorted row payloads (e.g. for "select all filtered rows").
    pub fn filtered_rows(&self) -> impl Iterator<Item = &DataRow> + '_ {
        self.filtered_data.iter().map(|&id| &self.store.record(id).data)
    }

    /// Keys of the rendered rows, in order.
    pub fn row_keys(&self) -> Vec<RowKey> {
        self.rows.iter().map(|r| r.key.clone()).collect()
    }

    /// Absolute position of the page-local row `local_index` in the
    /// unpaginated sequence, or None if the page has no such row.
    pub fn view_index_of(&self, local_index: usize) -> Option<usize> {
        let row = self.rows.get(local_index)?;
        Some(view_index(
            local_index,
            self.page.page_index,
            self.page.page_size.unwrap_or(0),
            self.page.preceding_summary_rows,
            self.page.preceding_descendant_rows,
            self.pinned.offset_for(&row.key),
        ))
    }
}
