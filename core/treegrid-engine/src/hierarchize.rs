//! FILENAME: core/treegrid-engine/src/hierarchize.rs
//! Hierarchizer - Builds the record store and root forest from raw rows.
//!
//! Algorithm (flat mode, primary key + foreign key):
//! 1. Create a record per row; attach it to its parent if the parent was
//!    already seen, otherwise defer it
//! 2. Re-resolve every deferred record against the complete store; records
//!    whose parent still does not exist become roots (in input order)
//! 3. Break any parent cycle by re-rooting the record that closes it
//! 4. Assign levels top-down
//!
//! Nested mode walks the `child_data_key` arrays depth-first with an
//! explicit stack, so pathological depths cannot overflow the call stack.

use crate::error::TreeGridError;
use crate::record::{Forest, Record, RecordId, RecordStore};
use crate::value::{DataRow, RowKey};

// ============================================================================
// KEY FIELDS
// ============================================================================

/// Field names that identify and link rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyFields<'a> {
    pub primary_key: Option<&'a str>,
    pub foreign_key: Option<&'a str>,
    pub child_data_key: Option<&'a str>,
    pub has_children_key: Option<&'a str>,
}

/// How rows are linked into a hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyMode {
    /// Rows reference their parent through a foreign key.
    Flat,
    /// Rows carry their children in a nested array field.
    Nested,
    /// No hierarchy: every row is a root.
    Plain,
}

impl<'a> KeyFields<'a> {
    pub fn mode(&self) -> HierarchyMode {
        if self.foreign_key.is_some() && self.primary_key.is_some() {
            HierarchyMode::Flat
        } else if self.child_data_key.is_some() {
            HierarchyMode::Nested
        } else {
            HierarchyMode::Plain
        }
    }

    fn has_children_hint(&self, row: &DataRow) -> bool {
        self.has_children_key
            .and_then(|field| row.get(field))
            .map(|v| v.is_truthy())
            .unwrap_or(false)
    }

    /// Resolves the key of a row; `ordinal` is used when no primary key is set.
    fn key_of(&self, row: &DataRow, ordinal: usize) -> Result<RowKey, TreeGridError> {
        match self.primary_key {
            Some(field) => RowKey::from_field(row, field).ok_or_else(|| TreeGridError::MissingKey {
                row: ordinal,
                field: field.to_string(),
            }),
            None => Ok(RowKey::Position(ordinal)),
        }
    }
}

// ============================================================================
// HIERARCHY
// ============================================================================

/// Result of one Hierarchizer run.
#[derive(Debug, Default)]
pub struct Hierarchy {
    pub store: RecordStore,

    /// Natural forest in input order.
    pub forest: Forest,

    /// Every record in pre-order, regardless of expansion.
    pub flat_data: Vec<RecordId>,

    /// Rows that were dropped or re-rooted, with the reason.
    pub diagnostics: Vec<TreeGridError>,
}

impl Hierarchy {
    /// Raw row payloads in pre-order.
    pub fn flat_rows(&self) -> impl Iterator<Item = &DataRow> + '_ {
        self.flat_data.iter().map(|&id| &self.store.record(id).data)
    }
}

/// Builds a fresh record store and forest from `rows`.
/// Rows that cannot be identified are dropped and reported in `diagnostics`.
pub fn hierarchize(rows: &[DataRow], keys: KeyFields<'_>) -> Hierarchy {
    log_enter!("HIERARCHY", "hierarchize", "rows={} mode={:?}", rows.len(), keys.mode());

    let mut hierarchy = match keys.mode() {
        HierarchyMode::Flat => hierarchize_flat(rows, &keys),
        HierarchyMode::Nested => hierarchize_nested(rows, &keys),
        HierarchyMode::Plain => hierarchize_plain(rows, &keys),
    };

    assign_levels(&mut hierarchy.store, &hierarchy.forest);
    hierarchy.flat_data = hierarchy.forest.preorder();

    for issue in &hierarchy.diagnostics {
        log_warn!("HIERARCHY", "{}", issue);
    }
    log_exit!(
        "HIERARCHY",
        "hierarchize",
        "records={} roots={} issues={}",
        hierarchy.store.len(),
        hierarchy.forest.roots().len(),
        hierarchy.diagnostics.len()
    );
    hierarchy
}

fn hierarchize_flat(rows: &[DataRow], keys: &KeyFields<'_>) -> Hierarchy {
    let mut store = RecordStore::with_capacity(rows.len());
    let mut diagnostics = Vec::new();
    let foreign_key = keys.foreign_key.unwrap_or_default();

    // First pass: attach to parents seen so far, defer the rest
    let mut deferred: Vec<(RecordId, Option<RowKey>)> = Vec::new();
    for (row_index, row) in rows.iter().enumerate() {
        let key = match keys.key_of(row, row_index) {
            Ok(key) => key,
            Err(e) => {
                diagnostics.push(e);
                continue;
            }
        };
        let parent_key = RowKey::from_field(row, foreign_key);

        let mut record = Record::new(key, row.clone());
        record.has_children_hint = keys.has_children_hint(row);
        let id = match store.insert(record) {
            Ok(id) => id,
            Err(e) => {
                diagnostics.push(e);
                continue;
            }
        };

        match parent_key.as_ref().and_then(|pk| store.id_of(pk)) {
            Some(parent) if parent != id => store.attach(parent, id),
            _ => deferred.push((id, parent_key)),
        }
    }

    // Second pass: the store is complete now
    let mut roots = Vec::new();
    for (id, parent_key) in deferred {
        match parent_key.as_ref().and_then(|pk| store.id_of(pk)) {
            Some(parent) if store.is_ancestor_or_self(id, parent) => {
                diagnostics.push(TreeGridError::CyclicParent {
                    key: store.record(id).key.clone(),
                });
                roots.push(id);
            }
            Some(parent) => store.attach(parent, id),
            None => roots.push(id),
        }
    }

    let forest = Forest::natural(&store, roots);
    Hierarchy {
        store,
        forest,
        flat_data: Vec::new(),
        diagnostics,
    }
}

fn hierarchize_nested(rows: &[DataRow], keys: &KeyFields<'_>) -> Hierarchy {
    let mut store = RecordStore::with_capacity(rows.len());
    let mut diagnostics = Vec::new();
    let child_key = keys.child_data_key.unwrap_or_default();

    let mut roots = Vec::new();
    let mut ordinal = 0usize;
    let mut stack: Vec<(&DataRow, Option<RecordId>)> =
        rows.iter().rev().map(|row| (row, None)).collect();

    while let Some((row, parent)) = stack.pop() {
        let row_ordinal = ordinal;
        ordinal += 1;

        // A row that cannot be identified takes its whole subtree with it
        let key = match keys.key_of(row, row_ordinal) {
            Ok(key) => key,
            Err(e) => {
                diagnostics.push(e);
                continue;
            }
        };

        let mut data = row.clone();
        data.remove(child_key);
        let mut record = Record::new(key, data);
        record.has_children_hint = keys.has_children_hint(row);
        let id = match store.insert(record) {
            Ok(id) => id,
            Err(e) => {
                diagnostics.push(e);
                continue;
            }
        };

        match parent {
            Some(parent) => store.attach(parent, id),
            None => roots.push(id),
        }

        if let Some(children) = row.get(child_key).and_then(|v| v.as_children()) {
            stack.extend(children.iter().rev().map(|child| (child, Some(id))));
        }
    }

    let forest = Forest::natural(&store, roots);
    Hierarchy {
        store,
        forest,
        flat_data: Vec::new(),
        diagnostics,
    }
}

fn hierarchize_plain(rows: &[DataRow], keys: &KeyFields<'_>) -> Hierarchy {
    let mut store = RecordStore::with_capacity(rows.len());
    let mut diagnostics = Vec::new();
    let mut roots = Vec::with_capacity(rows.len());

    for (row_index, row) in rows.iter().enumerate() {
        let inserted = keys.key_of(row, row_index).and_then(|key| {
            let mut record = Record::new(key, row.clone());
            record.has_children_hint = keys.has_children_hint(row);
            store.insert(record)
        });
        match inserted {
            Ok(id) => roots.push(id),
            Err(e) => diagnostics.push(e),
        }
    }

    let forest = Forest::natural(&store, roots);
    Hierarchy {
        store,
        forest,
        flat_data: Vec::new(),
        diagnostics,
    }
}

/// Sets `level = parent level + 1` (0 for roots) across the forest.
fn assign_levels(store: &mut RecordStore, forest: &Forest) {
    let mut stack: Vec<(RecordId, usize)> = forest.roots().iter().map(|&id| (id, 0)).collect();
    while let Some((id, level)) = stack.pop() {
        store.record_mut(id).level = level;
        stack.extend(forest.children(id).iter().map(|&child| (child, level + 1)));
    }
}
