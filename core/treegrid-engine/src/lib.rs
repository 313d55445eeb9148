//! FILENAME: core/treegrid-engine/src/lib.rs
//! Tree Grid view materialization for Calcula.
//!
//! This crate turns a raw row collection (flat rows linked by a foreign key,
//! or naturally nested rows) plus pending edits, a filter, a sort order and
//! per-row expansion state into the exact ordered sequence of rows a
//! virtualized grid draws.
//!
//! Layers:
//! - `definition`: Serializable configuration and per-run user intent
//! - `record`: Arena-backed record store and forest shapes
//! - `overlay` / `hierarchize`: Raw rows -> records (WHAT the data is)
//! - `filter` / `sort` / `flatten`: Forest transforms (HOW it is arranged)
//! - `summary` / `paging` / `view_index`: Page window and positions
//! - `view`: Renderable output for the frontend (WHAT we display)
//! - `engine`: The pipeline that runs every stage in order

#[macro_use]
pub mod logging;

pub mod error;
pub mod value;
pub mod record;
pub mod definition;
pub mod overlay;
pub mod hierarchize;
pub mod filter;
pub mod sort;
pub mod flatten;
pub mod summary;
pub mod paging;
pub mod view_index;
pub mod view;
pub mod engine;

pub use error::{TreeGridError, TreeGridResult};
pub use value::*;
pub use record::*;
pub use definition::*;
pub use overlay::{apply_pending, splice_pending_adds, OverlayResult, PendingAdd, PendingOp};
pub use hierarchize::{hierarchize, Hierarchy, HierarchyMode, KeyFields};
pub use filter::*;
pub use sort::*;
pub use flatten::{default_expanded, flatten, FlattenOptions, Flattened};
pub use summary::inject_summary_rows;
pub use paging::{clamp_page_index, page, page_count, PageInfo, PageWindow};
pub use view_index::view_index;
pub use view::*;
pub use engine::{calculate_tree_grid, same_rows, TreeGridCalculator};
