//! FILENAME: core/treegrid-engine/src/paging.rs
//! Pager - Slices the visible sequence into the current page window.
//!
//! Every row is assigned a paging unit:
//! - Flattened mode: each data row is one unit
//! - Root-only mode: each root plus its visible descendants is one unit
//!
//! Summary rows and add rows are never units of their own. They join the
//! unit of the row they stick to: Bottom summaries and add rows the row
//! before them, Top summaries the row after them (or the unit before them
//! when a follower comes first, so units never decrease). A page holds the rows
//! whose unit is in `[page * size, (page + 1) * size)`.

use serde::{Deserialize, Serialize};

use crate::definition::{PagingConfig, PagingMode, SummaryPosition};
use crate::view::{ViewRow, ViewRowKind};

/// Where the current page sits in the whole sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageInfo {
    /// Current page after clamping.
    pub page_index: usize,
    /// None when paging is off.
    pub page_size: Option<usize>,
    /// Always at least 1.
    pub page_count: usize,
    /// Rows (flattened mode) or roots (root-only mode) across all pages.
    pub total_units: usize,
    /// Summary rows on earlier pages.
    pub preceding_summary_rows: usize,
    /// Rows on earlier pages beyond one per unit: expanded descendants in
    /// root-only mode, plus add rows.
    pub preceding_descendant_rows: usize,
}

/// One page of rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageWindow {
    pub rows: Vec<ViewRow>,
    pub info: PageInfo,
}

/// Number of pages for `total_units`. An empty sequence still has one page.
pub fn page_count(total_units: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    total_units.div_ceil(page_size).max(1)
}

/// Clamps `page_index` to the last valid page.
pub fn clamp_page_index(page_index: usize, total_units: usize, page_size: usize) -> usize {
    page_index.min(page_count(total_units, page_size) - 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitRole {
    /// Starts a new unit.
    Opens,
    /// Belongs to the unit before it.
    Follows,
    /// Belongs to the unit after it.
    Precedes,
}

fn unit_role(row: &ViewRow, mode: PagingMode) -> UnitRole {
    match (&row.kind, mode) {
        (ViewRowKind::Record, PagingMode::Flattened) => UnitRole::Opens,
        (ViewRowKind::Record, PagingMode::RootOnly) if row.level == 0 => UnitRole::Opens,
        (ViewRowKind::Record, PagingMode::RootOnly) => UnitRole::Follows,
        (ViewRowKind::Summary { position: SummaryPosition::Top, .. }, _) => UnitRole::Precedes,
        (ViewRowKind::Summary { .. }, _) => UnitRole::Follows,
        (ViewRowKind::AddRow { .. }, _) => UnitRole::Follows,
    }
}

/// Assigns every row its unit. Returns (units, total unit count).
fn assign_units(rows: &[ViewRow], mode: PagingMode) -> (Vec<usize>, usize) {
    let mut units = vec![0usize; rows.len()];
    let mut waiting: Vec<usize> = Vec::new();
    let mut current: Option<usize> = None;
    let mut next_unit = 0usize;

    for (i, row) in rows.iter().enumerate() {
        match unit_role(row, mode) {
            UnitRole::Opens => {
                let unit = next_unit;
                next_unit += 1;
                for w in waiting.drain(..) {
                    units[w] = unit;
                }
                units[i] = unit;
                current = Some(unit);
            }
            UnitRole::Follows => match current {
                Some(unit) => {
                    // Rows waiting in front of a follower stay in sequence order
                    for w in waiting.drain(..) {
                        units[w] = unit;
                    }
                    units[i] = unit;
                }
                None => waiting.push(i),
            },
            UnitRole::Precedes => waiting.push(i),
        }
    }

    // Trailing rows that wait for a unit join the last one
    let last = current.unwrap_or(0);
    for w in waiting {
        units[w] = last;
    }
    (units, next_unit)
}

/// Cuts the current page out of `rows`.
///
/// `total_hint` overrides the unit count when the caller knows the full size
/// (e.g. remote data with only the current page loaded). Without `config`
/// the whole sequence is one page.
pub fn page(
    rows: Vec<ViewRow>,
    page_index: usize,
    config: Option<&PagingConfig>,
    total_hint: Option<usize>,
) -> PageWindow {
    let mode = config.map(|c| c.mode).unwrap_or(PagingMode::Flattened);
    let (units, unit_count) = assign_units(&rows, mode);
    let total_units = total_hint.unwrap_or(unit_count);

    let config = match config {
        Some(config) if config.page_size > 0 => config,
        _ => {
            return PageWindow {
                info: PageInfo {
                    page_index: 0,
                    page_size: None,
                    page_count: 1,
                    total_units,
                    preceding_summary_rows: 0,
                    preceding_descendant_rows: 0,
                },
                rows,
            };
        }
    };

    let page_size = config.page_size;
    let clamped = clamp_page_index(page_index, total_units, page_size);
    if clamped != page_index {
        log_debug!("PAGING", "page {} out of range, clamped to {}", page_index, clamped);
    }
    let start = clamped.saturating_mul(page_size);
    let end = start.saturating_add(page_size);

    let mut window = Vec::with_capacity(page_size.min(rows.len()));
    let mut preceding_summary_rows = 0;
    let mut preceding_descendant_rows = 0;
    for (row, unit) in rows.into_iter().zip(units) {
        if unit < start {
            match unit_role(&row, mode) {
                UnitRole::Opens => {}
                _ if row.is_summary() => preceding_summary_rows += 1,
                _ => preceding_descendant_rows += 1,
            }
        } else if unit < end {
            window.push(row);
        }
    }

    PageWindow {
        rows: window,
        info: PageInfo {
            page_index: clamped,
            page_size: Some(page_size),
            page_count: page_count(total_units, page_size),
            total_units,
            preceding_summary_rows,
            preceding_descendant_rows,
        },
    }
}
