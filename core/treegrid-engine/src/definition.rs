//! FILENAME: core/treegrid-engine/src/definition.rs
//! Tree Grid Definition - The serializable configuration.
//!
//! This module contains the types needed to DESCRIBE a tree grid:
//! - `TreeGridDefinition`: how rows are keyed and linked, paging and
//!   summary layout (stable across interactions)
//! - `TreeGridState`: the user's current intent (filter, sort, expansion,
//!   page, pending edits), replaced on every interaction
//!
//! Both are plain serde structs so they can be stored with a workbook or
//! sent over the frontend bridge as JSON.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{TreeGridError, TreeGridResult};
use crate::filter::FilterTree;
use crate::hierarchize::KeyFields;
use crate::overlay::PendingOp;
use crate::sort::SortExpression;
use crate::value::RowKey;

/// Unique identifier for a tree grid within a workbook.
pub type TreeGridId = u32;

// ============================================================================
// PAGING
// ============================================================================

/// What a page counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PagingMode {
    /// Pages count visible rows; expanding a row moves page boundaries.
    Flattened,
    /// Pages count root records; expanded descendants ride along with their root.
    RootOnly,
}

impl Default for PagingMode {
    fn default() -> Self {
        PagingMode::Flattened
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingConfig {
    #[serde(default)]
    pub mode: PagingMode,
    pub page_size: usize,
}

impl PagingConfig {
    pub fn new(mode: PagingMode, page_size: usize) -> Self {
        PagingConfig { mode, page_size }
    }
}

// ============================================================================
// SUMMARIES
// ============================================================================

/// Which hierarchy levels get a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryCalculationMode {
    /// Only the grid footer summary (no rows injected).
    RootLevelOnly,
    /// Only per-parent summaries inside the row sequence.
    ChildLevelsOnly,
    /// Footer summary plus per-parent summaries.
    RootAndChildLevels,
}

impl Default for SummaryCalculationMode {
    fn default() -> Self {
        SummaryCalculationMode::RootAndChildLevels
    }
}

/// Where a child-level summary row sits relative to its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryPosition {
    /// Directly after the owner row, before its first child.
    Top,
    /// After the owner's last visible descendant.
    Bottom,
}

impl Default for SummaryPosition {
    fn default() -> Self {
        SummaryPosition::Bottom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SummaryOptions {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub calculation_mode: SummaryCalculationMode,
    #[serde(default)]
    pub position: SummaryPosition,
}

impl SummaryOptions {
    /// Whether summary rows are injected into the visible row sequence.
    pub fn injects_child_summaries(&self) -> bool {
        self.enabled
            && !matches!(self.calculation_mode, SummaryCalculationMode::RootLevelOnly)
    }
}

// ============================================================================
// PINNED ROWS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinnedPosition {
    Top,
    Bottom,
}

impl Default for PinnedPosition {
    fn default() -> Self {
        PinnedPosition::Top
    }
}

/// Rows the user pinned. They are rendered in a separate area above or below
/// the scrolling body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PinnedRows {
    #[serde(default)]
    pub keys: Vec<RowKey>,
    #[serde(default)]
    pub position: PinnedPosition,
}

impl PinnedRows {
    /// Offset added to the view index of the row identified by `key`.
    /// Unpinned rows are pushed down by pinned rows rendered above them.
    pub fn offset_for(&self, key: &RowKey) -> usize {
        let is_pinned = self.keys.contains(key);
        if !is_pinned && self.position == PinnedPosition::Top {
            self.keys.len()
        } else {
            0
        }
    }
}

// ============================================================================
// EXPANSION STATE
// ============================================================================

/// A single expansion entry (key -> expanded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionEntry {
    pub key: RowKey,
    pub expanded: bool,
}

/// Caller-owned key -> expanded mapping.
/// Serialized as a sorted entry list since JSON object keys must be strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ExpansionEntry>", into = "Vec<ExpansionEntry>")]
pub struct ExpansionState {
    states: FxHashMap<RowKey, bool>,
}

impl ExpansionState {
    pub fn new() -> Self {
        ExpansionState::default()
    }

    pub fn get(&self, key: &RowKey) -> Option<bool> {
        self.states.get(key).copied()
    }

    pub fn set(&mut self, key: RowKey, expanded: bool) {
        self.states.insert(key, expanded);
    }

    pub fn remove(&mut self, key: &RowKey) -> Option<bool> {
        self.states.remove(key)
    }

    /// Flips a row. Rows without an entry are treated as collapsed.
    pub fn toggle(&mut self, key: RowKey) {
        let entry = self.states.entry(key).or_insert(false);
        *entry = !*entry;
    }

    /// Merges a delta (e.g. the defaulted keys returned by the flattener).
    pub fn apply(&mut self, delta: &[ExpansionEntry]) {
        for entry in delta {
            self.states.insert(entry.key.clone(), entry.expanded);
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RowKey, bool)> {
        self.states.iter().map(|(k, v)| (k, *v))
    }
}

impl From<Vec<ExpansionEntry>> for ExpansionState {
    fn from(entries: Vec<ExpansionEntry>) -> Self {
        let mut state = ExpansionState::new();
        state.apply(&entries);
        state
    }
}

impl From<ExpansionState> for Vec<ExpansionEntry> {
    fn from(state: ExpansionState) -> Self {
        let mut entries: Vec<ExpansionEntry> = state
            .states
            .into_iter()
            .map(|(key, expanded)| ExpansionEntry { key, expanded })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }
}

impl FromIterator<(RowKey, bool)> for ExpansionState {
    fn from_iter<T: IntoIterator<Item = (RowKey, bool)>>(iter: T) -> Self {
        ExpansionState {
            states: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// TREE GRID DEFINITION
// ============================================================================

fn default_true() -> bool {
    true
}

/// Configuration of one tree grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeGridDefinition {
    pub id: TreeGridId,

    /// Field holding the row identity. Without it rows are keyed by position.
    #[serde(default)]
    pub primary_key: Option<String>,

    /// Field holding the parent's primary key (flat hierarchy).
    #[serde(default)]
    pub foreign_key: Option<String>,

    /// Field holding nested child rows (nested hierarchy).
    #[serde(default)]
    pub child_data_key: Option<String>,

    /// Field flagging rows whose children are loaded on demand.
    #[serde(default)]
    pub has_children_key: Option<String>,

    /// Rows at this level or deeper default to collapsed. None = unlimited.
    #[serde(default)]
    pub expansion_depth: Option<usize>,

    #[serde(default)]
    pub paging: Option<PagingConfig>,

    #[serde(default)]
    pub summaries: SummaryOptions,

    /// Deleting a flat-mode row also deletes the rows below it.
    #[serde(default = "default_true")]
    pub cascade_on_delete: bool,

    /// Write pending adds into the data instead of carrying them aside.
    #[serde(default)]
    pub commit_pending_adds: bool,
}

impl TreeGridDefinition {
    /// A grid where every row is a root.
    pub fn new(id: TreeGridId) -> Self {
        TreeGridDefinition {
            id,
            primary_key: None,
            foreign_key: None,
            child_data_key: None,
            has_children_key: None,
            expansion_depth: None,
            paging: None,
            summaries: SummaryOptions::default(),
            cascade_on_delete: true,
            commit_pending_adds: false,
        }
    }

    /// A grid over flat rows linked by `foreign_key` -> `primary_key`.
    pub fn flat(id: TreeGridId, primary_key: &str, foreign_key: &str) -> Self {
        let mut definition = TreeGridDefinition::new(id);
        definition.primary_key = Some(primary_key.to_string());
        definition.foreign_key = Some(foreign_key.to_string());
        definition
    }

    /// A grid over rows nesting their children under `child_data_key`.
    pub fn nested(id: TreeGridId, primary_key: Option<&str>, child_data_key: &str) -> Self {
        let mut definition = TreeGridDefinition::new(id);
        definition.primary_key = primary_key.map(|k| k.to_string());
        definition.child_data_key = Some(child_data_key.to_string());
        definition
    }

    pub fn key_fields(&self) -> KeyFields<'_> {
        KeyFields {
            primary_key: self.primary_key.as_deref(),
            foreign_key: self.foreign_key.as_deref(),
            child_data_key: self.child_data_key.as_deref(),
            has_children_key: self.has_children_key.as_deref(),
        }
    }

    /// Checks that the settings describe a single, consistent hierarchy.
    pub fn validate(&self) -> TreeGridResult<()> {
        if self.foreign_key.is_some() && self.child_data_key.is_some() {
            return Err(TreeGridError::InvalidDefinition(
                "foreign_key and child_data_key are mutually exclusive".to_string(),
            ));
        }
        if self.foreign_key.is_some() && self.primary_key.is_none() {
            return Err(TreeGridError::InvalidDefinition(
                "a foreign_key requires a primary_key".to_string(),
            ));
        }
        if let Some(paging) = &self.paging {
            if paging.page_size == 0 {
                return Err(TreeGridError::InvalidDefinition(
                    "page_size must be greater than zero".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Parses and validates a JSON definition.
    pub fn from_json(json: &str) -> TreeGridResult<Self> {
        let definition: TreeGridDefinition = serde_json::from_str(json)?;
        definition.validate()?;
        Ok(definition)
    }

    pub fn to_json(&self) -> TreeGridResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// TREE GRID STATE
// ============================================================================

/// The user's current intent. Replaced wholesale on every interaction and
/// fed to the pipeline together with the raw rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeGridState {
    #[serde(default)]
    pub filter: FilterTree,

    #[serde(default)]
    pub sorting: Vec<SortExpression>,

    #[serde(default)]
    pub expansion: ExpansionState,

    #[serde(default)]
    pub page_index: usize,

    #[serde(default)]
    pub pending: Vec<PendingOp>,

    #[serde(default)]
    pub pinned: PinnedRows,
}
