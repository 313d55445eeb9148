//! FILENAME: core/treegrid-engine/src/overlay.rs
//! Edit Overlay - Merges pending edits onto the raw rows before hierarchizing.
//!
//! Updates and deletes rewrite the collection. Adds stay out of it by default
//! and travel as a side channel: the add row is spliced into the visible
//! sequence right after its parent row, without being filtered or sorted
//! like committed data.

use std::borrow::Cow;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::definition::TreeGridDefinition;
use crate::error::{TreeGridError, TreeGridResult};
use crate::hierarchize::HierarchyMode;
use crate::value::{DataRow, RowKey, RowValue};
use crate::view::{ViewRow, ViewRowKind};

// ============================================================================
// PENDING OPERATIONS
// ============================================================================

/// An uncommitted edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PendingOp {
    /// A new row, optionally under the row identified by `parent`.
    Add { row: DataRow, parent: Option<RowKey> },
    /// Field values to merge into an existing row.
    Update { key: RowKey, patch: DataRow },
    Delete { key: RowKey },
}

/// An add that was not written into the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAdd {
    pub row: DataRow,
    pub parent: Option<RowKey>,
}

#[derive(Debug, Clone)]
pub struct OverlayResult<'a> {
    /// The collection with updates and deletes applied.
    pub rows: Cow<'a, [DataRow]>,
    /// Adds carried aside for the flattener.
    pub pending_adds: Vec<PendingAdd>,
}

/// Net effect of all ops on one key.
#[derive(Debug, Clone)]
enum KeyEdit {
    Patch(DataRow),
    Deleted,
}

/// Applies `ops` to `rows`. Pure: the same inputs always give the same output.
pub fn apply_pending<'a>(
    rows: &'a [DataRow],
    ops: &[PendingOp],
    definition: &TreeGridDefinition,
) -> TreeGridResult<OverlayResult<'a>> {
    if ops.is_empty() {
        return Ok(OverlayResult {
            rows: Cow::Borrowed(rows),
            pending_adds: Vec::new(),
        });
    }

    let primary_key = definition.primary_key.as_deref().ok_or_else(|| {
        TreeGridError::InvalidDefinition("pending edits require a primary_key".to_string())
    })?;

    // Fold the op list into one net edit per key, in sequence order
    let mut edits: FxHashMap<RowKey, KeyEdit> = FxHashMap::default();
    let mut adds: Vec<PendingAdd> = Vec::new();
    for op in ops {
        match op {
            PendingOp::Update { key, patch } => match edits.get_mut(key) {
                Some(KeyEdit::Deleted) => {
                    log_debug!("OVERLAY", "update of deleted row {} ignored", key);
                }
                Some(KeyEdit::Patch(existing)) => {
                    existing.extend(patch.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                None => {
                    edits.insert(key.clone(), KeyEdit::Patch(patch.clone()));
                }
            },
            PendingOp::Delete { key } => {
                edits.insert(key.clone(), KeyEdit::Deleted);
            }
            PendingOp::Add { row, parent } => adds.push(PendingAdd {
                row: row.clone(),
                parent: parent.clone(),
            }),
        }
    }

    let keys = definition.key_fields();
    let mut result = match keys.mode() {
        HierarchyMode::Nested => {
            let child_key = keys.child_data_key.unwrap_or_default();
            overlay_nested(rows, primary_key, child_key, &edits)
        }
        HierarchyMode::Flat if definition.cascade_on_delete => {
            let foreign_key = keys.foreign_key.unwrap_or_default();
            overlay_flat_cascading(rows, primary_key, foreign_key, &edits)
        }
        _ => overlay_rows(rows, primary_key, &edits),
    };

    let pending_adds = if definition.commit_pending_adds {
        commit_adds(&mut result, adds, definition);
        Vec::new()
    } else {
        adds
    };

    log_debug!(
        "OVERLAY",
        "applied {} ops: rows {} -> {}, pending adds {}",
        ops.len(),
        rows.len(),
        result.len(),
        pending_adds.len()
    );

    Ok(OverlayResult {
        rows: Cow::Owned(result),
        pending_adds,
    })
}

fn patched(row: &DataRow, edit: Option<&KeyEdit>) -> Option<DataRow> {
    match edit {
        Some(KeyEdit::Deleted) => None,
        Some(KeyEdit::Patch(patch)) => {
            let mut row = row.clone();
            row.extend(patch.iter().map(|(k, v)| (k.clone(), v.clone())));
            Some(row)
        }
        None => Some(row.clone()),
    }
}

fn edit_for<'e>(
    row: &DataRow,
    primary_key: &str,
    edits: &'e FxHashMap<RowKey, KeyEdit>,
) -> Option<&'e KeyEdit> {
    RowKey::from_field(row, primary_key).and_then(|key| edits.get(&key))
}

fn overlay_rows(
    rows: &[DataRow],
    primary_key: &str,
    edits: &FxHashMap<RowKey, KeyEdit>,
) -> Vec<DataRow> {
    rows.iter()
        .filter_map(|row| patched(row, edit_for(row, primary_key, edits)))
        .collect()
}

/// Flat rows: a deleted row takes every row below it along.
/// Parent links are read after updates, so a re-parenting update counts.
fn overlay_flat_cascading(
    rows: &[DataRow],
    primary_key: &str,
    foreign_key: &str,
    edits: &FxHashMap<RowKey, KeyEdit>,
) -> Vec<DataRow> {
    let updated: Vec<(Option<RowKey>, Option<DataRow>)> = rows
        .iter()
        .map(|row| {
            let out = patched(row, edit_for(row, primary_key, edits));
            (RowKey::from_field(row, primary_key), out)
        })
        .collect();

    let mut children_of: FxHashMap<RowKey, Vec<RowKey>> = FxHashMap::default();
    for (key, row) in &updated {
        if let (Some(key), Some(row)) = (key, row) {
            if let Some(parent) = RowKey::from_field(row, foreign_key) {
                children_of.entry(parent).or_default().push(key.clone());
            }
        }
    }

    let mut removed: FxHashSet<RowKey> = FxHashSet::default();
    let mut queue: Vec<RowKey> = edits
        .iter()
        .filter(|(_, edit)| matches!(edit, KeyEdit::Deleted))
        .map(|(key, _)| key.clone())
        .collect();
    while let Some(key) = queue.pop() {
        if !removed.insert(key.clone()) {
            continue;
        }
        if let Some(children) = children_of.get(&key) {
            queue.extend(children.iter().cloned());
        }
    }

    updated
        .into_iter()
        .filter_map(|(key, row)| match key {
            Some(key) if removed.contains(&key) => None,
            _ => row,
        })
        .collect()
}

/// Nested rows: deleting a row drops its nested children with it.
fn overlay_nested(
    rows: &[DataRow],
    primary_key: &str,
    child_key: &str,
    edits: &FxHashMap<RowKey, KeyEdit>,
) -> Vec<DataRow> {
    rows.iter()
        .filter_map(|row| {
            let mut out = patched(row, edit_for(row, primary_key, edits))?;
            if let Some(RowValue::Children(children)) = out.get(child_key) {
                let children = overlay_nested(children, primary_key, child_key, edits);
                out.insert(child_key.to_string(), RowValue::Children(children));
            }
            Some(out)
        })
        .collect()
}

/// Writes adds into the collection (`commit_pending_adds`).
fn commit_adds(rows: &mut Vec<DataRow>, adds: Vec<PendingAdd>, definition: &TreeGridDefinition) {
    let keys = definition.key_fields();
    match keys.mode() {
        HierarchyMode::Nested => {
            let primary_key = keys.primary_key.unwrap_or_default();
            let child_key = keys.child_data_key.unwrap_or_default();
            for add in adds {
                let placed = match &add.parent {
                    Some(parent) => insert_nested_child(rows, primary_key, child_key, parent, &add.row),
                    None => false,
                };
                if !placed {
                    if add.parent.is_some() {
                        log_warn!("OVERLAY", "parent of added row not found, adding as root");
                    }
                    rows.push(add.row);
                }
            }
        }
        HierarchyMode::Flat => {
            let foreign_key = keys.foreign_key.unwrap_or_default();
            for add in adds {
                let mut row = add.row;
                let parent = add.parent.map(|p| p.to_value()).unwrap_or(RowValue::Empty);
                row.insert(foreign_key.to_string(), parent);
                rows.push(row);
            }
        }
        HierarchyMode::Plain => rows.extend(adds.into_iter().map(|add| add.row)),
    }
}

fn insert_nested_child(
    rows: &mut [DataRow],
    primary_key: &str,
    child_key: &str,
    parent: &RowKey,
    new_row: &DataRow,
) -> bool {
    for row in rows.iter_mut() {
        if RowKey::from_field(row, primary_key).as_ref() == Some(parent) {
            match row.get_mut(child_key) {
                Some(RowValue::Children(children)) => children.push(new_row.clone()),
                _ => {
                    row.insert(child_key.to_string(), RowValue::Children(vec![new_row.clone()]));
                }
            }
            return true;
        }
        if let Some(RowValue::Children(children)) = row.get_mut(child_key) {
            if insert_nested_child(children, primary_key, child_key, parent, new_row) {
                return true;
            }
        }
    }
    false
}

// ============================================================================
// ADD ROW SPLICING
// ============================================================================

/// Inserts pending add rows into a flattened sequence.
/// Adds under a parent go right after the parent row (and after earlier adds
/// for the same parent); adds without a parent go to the top. Adds whose
/// parent is not visible, or visible but collapsed, are not rendered.
pub fn splice_pending_adds(
    rows: Vec<ViewRow>,
    adds: &[PendingAdd],
    primary_key: Option<&str>,
) -> Vec<ViewRow> {
    if adds.is_empty() {
        return rows;
    }

    let add_row = |index: usize, add: &PendingAdd, level: usize| ViewRow {
        key: primary_key
            .and_then(|field| RowKey::from_field(&add.row, field))
            .unwrap_or(RowKey::Position(index)),
        data: add.row.clone(),
        level,
        expanded: false,
        has_children: false,
        kind: ViewRowKind::AddRow {
            anchor: add.parent.clone(),
        },
    };

    let mut by_parent: FxHashMap<&RowKey, Vec<usize>> = FxHashMap::default();
    let mut out = Vec::with_capacity(rows.len() + adds.len());
    for (index, add) in adds.iter().enumerate() {
        match &add.parent {
            Some(parent) => by_parent.entry(parent).or_default().push(index),
            None => out.push(add_row(index, add, 0)),
        }
    }

    let mut placed = FxHashSet::default();
    for mut row in rows {
        let anchored = match row.kind {
            ViewRowKind::Record => by_parent.get(&row.key).map(|indices| (indices, row.level + 1)),
            _ => None,
        };
        if anchored.is_some() && !row.expanded {
            log_debug!("OVERLAY", "add row anchor {} is collapsed, add row not rendered", row.key);
            placed.insert(row.key.clone());
            out.push(row);
            continue;
        }
        if anchored.is_some() {
            row.has_children = true;
        }
        let key = row.key.clone();
        out.push(row);
        if let Some((indices, level)) = anchored {
            placed.insert(key);
            out.extend(indices.iter().map(|&i| add_row(i, &adds[i], level)));
        }
    }

    for parent in by_parent.keys() {
        if !placed.contains(*parent) {
            log_debug!("OVERLAY", "add row anchor {} is not visible, add row not rendered", parent);
        }
    }
    out
}
