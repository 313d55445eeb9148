//! FILENAME: core/treegrid-engine/src/summary.rs
//! Summary row positioning.
//!
//! Summary values are computed elsewhere; this module only decides where the
//! summary rows go. Every expanded record with visible children owns one
//! summary row at its children's level: right after the owner (Top) or after
//! the owner's last visible descendant (Bottom). Root-level summaries live in
//! the grid footer and add no rows.

use crate::definition::{SummaryOptions, SummaryPosition};
use crate::value::RowKey;
use crate::view::ViewRow;

/// Returns `rows` with summary placeholder rows inserted.
pub fn inject_summary_rows(rows: Vec<ViewRow>, options: &SummaryOptions) -> Vec<ViewRow> {
    if !options.injects_child_summaries() || rows.is_empty() {
        return rows;
    }

    let position = options.position;
    let mut out = Vec::with_capacity(rows.len() + rows.len() / 4);
    // Owners whose Bottom summary is still to be emitted: (key, level)
    let mut open: Vec<(RowKey, usize)> = Vec::new();

    let mut iter = rows.into_iter().peekable();
    while let Some(row) = iter.next() {
        while let Some((_, level)) = open.last() {
            if row.level > *level {
                break;
            }
            if let Some((owner, level)) = open.pop() {
                out.push(ViewRow::summary(owner, level + 1, position));
            }
        }

        let opens_children = row.is_record()
            && row.expanded
            && iter.peek().map_or(false, |next| next.level > row.level);
        let owner = (row.key.clone(), row.level);
        out.push(row);

        if opens_children {
            match position {
                SummaryPosition::Top => {
                    out.push(ViewRow::summary(owner.0, owner.1 + 1, position));
                }
                SummaryPosition::Bottom => open.push(owner),
            }
        }
    }

    while let Some((owner, level)) = open.pop() {
        out.push(ViewRow::summary(owner, level + 1, position));
    }
    out
}
