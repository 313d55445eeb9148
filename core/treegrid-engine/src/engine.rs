//! FILENAME: core/treegrid-engine/src/engine.rs
//! Tree Grid Engine - The pipeline that turns raw rows into a renderable view.
//!
//! This module takes a TreeGridDefinition (configuration), a TreeGridState
//! (user intent) and the raw rows, and produces a TreeGridView.
//!
//! Algorithm:
//! 1. Overlay pending updates/deletes onto the rows (adds go aside)
//! 2. Build the record store and natural forest
//! 3. Filter the forest, keeping ancestors of matches
//! 4. Sort every sibling list
//! 5. Flatten with expansion state and expansion depth (filter matches and
//!    add-row anchors forced open)
//! 6. Splice add rows after their parent rows
//! 7. Position summary rows
//! 8. Cut the current page
//!
//! Every run rebuilds everything from scratch; nothing from a previous run
//! is reused, so no record can point into a stale graph.

use rustc_hash::FxHashSet;

use crate::definition::{TreeGridDefinition, TreeGridState};
use crate::error::TreeGridResult;
use crate::filter::{filter_forest, FilterOutcome, RowPredicate};
use crate::flatten::{flatten, FlattenOptions};
use crate::hierarchize::hierarchize;
use crate::overlay::{apply_pending, splice_pending_adds};
use crate::record::RecordId;
use crate::paging::page;
use crate::sort::{sort_forest, RowComparator};
use crate::summary::inject_summary_rows;
use crate::value::{DataRow, RowKey};
use crate::view::TreeGridView;

// ============================================================================
// TREE GRID CALCULATOR
// ============================================================================

/// Runs the view pipeline for one tree grid.
///
/// The filter and sort come from the state by default; a caller with a
/// custom predicate or comparator can plug it in instead.
pub struct TreeGridCalculator<'a> {
    definition: &'a TreeGridDefinition,
    state: &'a TreeGridState,
    predicate: Option<&'a dyn RowPredicate>,
    comparator: Option<&'a dyn RowComparator>,
    total_hint: Option<usize>,
}

impl<'a> TreeGridCalculator<'a> {
    /// Creates a new calculator instance.
    pub fn new(definition: &'a TreeGridDefinition, state: &'a TreeGridState) -> Self {
        TreeGridCalculator {
            definition,
            state,
            predicate: None,
            comparator: None,
            total_hint: None,
        }
    }

    /// Replaces the state's filter tree.
    pub fn with_predicate(mut self, predicate: &'a dyn RowPredicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Replaces the state's sort expressions.
    pub fn with_comparator(mut self, comparator: &'a dyn RowComparator) -> Self {
        self.comparator = Some(comparator);
        self
    }

    /// Page count is derived from this total instead of the loaded rows.
    pub fn with_total_hint(mut self, total: usize) -> Self {
        self.total_hint = Some(total);
        self
    }

    /// Executes the full pipeline and returns the rendered view.
    pub fn calculate(&self, rows: &[DataRow]) -> TreeGridResult<TreeGridView> {
        log_enter!(
            "TREEGRID",
            "calculate",
            "id={} rows={} pending={}",
            self.definition.id,
            rows.len(),
            self.state.pending.len()
        );
        self.definition.validate()?;

        // Step 1: Overlay pending edits
        let overlay = apply_pending(rows, &self.state.pending, self.definition)?;

        // Step 2: Build the hierarchy
        let hierarchy = hierarchize(&overlay.rows, self.definition.key_fields());

        // Step 3: Filter
        let predicate: &dyn RowPredicate = self.predicate.unwrap_or(&self.state.filter);
        let FilterOutcome {
            forest: filtered,
            mut forced_expansions,
        } = filter_forest(&hierarchy.store, &hierarchy.forest, predicate)?;

        // Step 4: Sort
        let comparator: &dyn RowComparator = self.comparator.unwrap_or(&self.state.sorting);
        let sorted = sort_forest(&hierarchy.store, &filtered, comparator)?;
        let filtered_data = sorted.preorder();
        let root_count = sorted.roots().len();

        // An add row is drawn as a child of its anchor, so the anchor opens
        let kept: FxHashSet<RecordId> = filtered_data.iter().copied().collect();
        for anchor in overlay.pending_adds.iter().filter_map(|add| add.parent.as_ref()) {
            let in_view = hierarchy.store.id_of(anchor).map_or(false, |id| kept.contains(&id));
            if in_view && forced_expansions.insert(anchor.clone()) {
                log_debug!("TREEGRID", "add row anchor {} forced open", anchor);
            }
        }

        // Step 5: Flatten
        let flattened = flatten(
            &hierarchy.store,
            &sorted,
            FlattenOptions {
                expansion: &self.state.expansion,
                forced: &forced_expansions,
                max_depth: self.definition.expansion_depth,
            },
        );
        let visible_count = flattened.rows.len();
        let total_count = flattened.processed.len();

        // Step 6: Add rows next to their parents
        let visible = splice_pending_adds(
            flattened.rows,
            &overlay.pending_adds,
            self.definition.primary_key.as_deref(),
        );

        // Step 7: Summary rows
        let visible = inject_summary_rows(visible, &self.definition.summaries);

        // Step 8: Current page
        let window = page(
            visible,
            self.state.page_index,
            self.definition.paging.as_ref(),
            self.total_hint,
        );

        let mut forced: Vec<RowKey> = forced_expansions.into_iter().collect();
        forced.sort();

        // Drop the forest borrows before handing the store over
        drop(sorted);
        drop(filtered);

        let view = TreeGridView {
            tree_grid_id: self.definition.id,
            rows: window.rows,
            page: window.info,
            root_count,
            visible_count,
            total_count,
            forced_expansions: forced,
            defaulted_expansions: flattened.defaulted,
            store: hierarchy.store,
            filtered_data,
            processed: flattened.processed,
            diagnostics: hierarchy.diagnostics,
            pinned: self.state.pinned.clone(),
        };

        log_exit!(
            "TREEGRID",
            "calculate",
            "page={}/{} rows={} visible={} roots={}",
            view.page.page_index + 1,
            view.page.page_count,
            view.rows.len(),
            view.visible_count,
            view.root_count
        );
        Ok(view)
    }
}

/// Calculates a tree grid view from definition, state and raw rows.
/// This is the main entry point for the pipeline.
pub fn calculate_tree_grid(
    definition: &TreeGridDefinition,
    state: &TreeGridState,
    rows: &[DataRow],
) -> TreeGridResult<TreeGridView> {
    TreeGridCalculator::new(definition, state).calculate(rows)
}

/// Whether two runs rendered the same page. Hosts use it to skip a redraw.
pub fn same_rows(a: &TreeGridView, b: &TreeGridView) -> bool {
    a.rows == b.rows && a.page == b.page
}
