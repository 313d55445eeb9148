//! FILENAME: core/treegrid-engine/src/view_index.rs
//! View index arithmetic.
//!
//! Maps a row's position on its page to the position it would have in one
//! unpaginated, unpinned sequence. Used by scroll-to-row and keyboard
//! navigation.

/// Absolute index of the row at `local_index` on page `page`.
///
/// - `page * page_size` units precede the page
/// - `preceding_summary_rows` summary rows were rendered on earlier pages
/// - `preceding_expanded_descendant_rows` rows on earlier pages were not
///   units of their own (root-only paging, add rows)
/// - `pinned_offset` pinned rows are drawn above this (unpinned) row
pub fn view_index(
    local_index: usize,
    page: usize,
    page_size: usize,
    preceding_summary_rows: usize,
    preceding_expanded_descendant_rows: usize,
    pinned_offset: usize,
) -> usize {
    page.saturating_mul(page_size)
        .saturating_add(preceding_summary_rows)
        .saturating_add(preceding_expanded_descendant_rows)
        .saturating_add(pinned_offset)
        .saturating_add(local_index)
}
