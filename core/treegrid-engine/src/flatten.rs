//! FILENAME: core/treegrid-engine/src/flatten.rs
//! Flattener - Expansion-aware pre-order traversal.
//!
//! Each record ends up in one of three states during the walk:
//! - Visible: appended to the output; children visited as visible when expanded
//! - Hidden: below a collapsed ancestor; not appended, but still registered
//! - Depth-limited: at or below `max_depth`, so the default rule collapses it
//!
//! Every visited record is registered in `processed`, visible or not, so
//! selection and navigation can reach any record of the filtered forest.
//!
//! The expansion state is only read. Keys the default rule decided are
//! returned as an explicit delta instead of being written back.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::definition::{ExpansionEntry, ExpansionState};
use crate::record::{Forest, RecordId, RecordStore};
use crate::value::RowKey;
use crate::view::{ViewRow, ViewRowKind};

/// Inputs that decide whether a record is expanded.
#[derive(Debug, Clone, Copy)]
pub struct FlattenOptions<'a> {
    pub expansion: &'a ExpansionState,
    /// Keys the filter forced open; they win over `expansion`.
    pub forced: &'a FxHashSet<RowKey>,
    /// Default expansion depth. None = unlimited.
    pub max_depth: Option<usize>,
}

/// Output of the flattener.
#[derive(Debug, Clone, Default)]
pub struct Flattened {
    /// Visible rows in render order.
    pub rows: Vec<ViewRow>,
    /// Every visited record by key, visible or hidden.
    pub processed: FxHashMap<RowKey, RecordId>,
    /// Keys absent from the expansion state and the value the default rule gave them.
    pub defaulted: Vec<ExpansionEntry>,
}

/// Default expansion for a record without an explicit state.
pub fn default_expanded(has_children: bool, level: usize, max_depth: Option<usize>) -> bool {
    has_children && max_depth.map_or(true, |depth| level < depth)
}

/// Flattens `forest` into the visible row sequence.
pub fn flatten(store: &RecordStore, forest: &Forest, options: FlattenOptions<'_>) -> Flattened {
    let mut out = Flattened {
        rows: Vec::with_capacity(forest.roots().len()),
        processed: FxHashMap::default(),
        defaulted: Vec::new(),
    };

    // (record, visible)
    let mut stack: Vec<(RecordId, bool)> = forest.roots().iter().rev().map(|&id| (id, true)).collect();
    while let Some((id, visible)) = stack.pop() {
        let record = store.record(id);
        let children = forest.children(id);
        let has_loaded_children = !children.is_empty();

        let expanded = if options.forced.contains(&record.key) {
            true
        } else {
            match options.expansion.get(&record.key) {
                Some(state) => state,
                None => {
                    let state = default_expanded(has_loaded_children, record.level, options.max_depth);
                    if has_loaded_children {
                        out.defaulted.push(ExpansionEntry {
                            key: record.key.clone(),
                            expanded: state,
                        });
                    }
                    state
                }
            }
        };

        out.processed.insert(record.key.clone(), id);

        if visible {
            out.rows.push(ViewRow {
                key: record.key.clone(),
                data: record.data.clone(),
                level: record.level,
                expanded,
                has_children: has_loaded_children || record.has_children_hint,
                kind: ViewRowKind::Record,
            });
        }

        let children_visible = visible && expanded;
        stack.extend(children.iter().rev().map(|&child| (child, children_visible)));
    }

    log_debug!(
        "FLATTEN",
        "visible {} of {} records, {} defaulted",
        out.rows.len(),
        out.processed.len(),
        out.defaulted.len()
    );
    out
}
