//! FILENAME: core/treegrid-engine/src/record.rs
//! Record Store - Arena of hierarchical records for one pipeline pass.
//!
//! Records are referenced by dense `RecordId` indices instead of pointers.
//! The parent link is an index back into the store, never an ownership edge,
//! so parent and child never hold each other alive.
//!
//! A `Forest` is a shape over the store: an ordered root list plus an ordered
//! child list per record. The store keeps the natural hierarchy; filtering and
//! sorting produce new forests without touching the records themselves.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::error::{TreeGridError, TreeGridResult};
use crate::value::{DataRow, RowKey};

// ============================================================================
// RECORD
// ============================================================================

/// Index of a record inside its `RecordStore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub u32);

impl RecordId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Ordered child list. Most tree grid nodes have only a handful of children.
pub type ChildIds = SmallVec<[RecordId; 4]>;

/// One data row plus its hierarchy metadata.
#[derive(Debug, Clone)]
pub struct Record {
    /// Row identity.
    pub key: RowKey,

    /// The underlying row payload (nested child rows are not duplicated here).
    pub data: DataRow,

    /// Owning record, `None` for roots.
    pub parent: Option<RecordId>,

    /// Natural children in input order.
    pub children: ChildIds,

    /// Depth in the hierarchy (0 = root).
    pub level: usize,

    /// Load-on-demand flag: the row declares children that are not loaded yet.
    pub has_children_hint: bool,
}

impl Record {
    pub fn new(key: RowKey, data: DataRow) -> Self {
        Record {
            key,
            data,
            parent: None,
            children: ChildIds::new(),
            level: 0,
            has_children_hint: false,
        }
    }
}

// ============================================================================
// RECORD STORE
// ============================================================================

/// Canonical map from row key to record, backed by an arena.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    index: FxHashMap<RowKey, RecordId>,
}

impl RecordStore {
    pub fn new() -> Self {
        RecordStore::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        RecordStore {
            records: Vec::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Adds a record. A key that is already stored is rejected.
    pub fn insert(&mut self, record: Record) -> TreeGridResult<RecordId> {
        if self.index.contains_key(&record.key) {
            return Err(TreeGridError::DuplicateKey { key: record.key });
        }
        let id = RecordId(self.records.len() as u32);
        self.index.insert(record.key.clone(), id);
        self.records.push(record);
        Ok(id)
    }

    /// Attaches `child` as the last child of `parent`.
    pub(crate) fn attach(&mut self, parent: RecordId, child: RecordId) {
        self.records[child.index()].parent = Some(parent);
        self.records[parent.index()].children.push(child);
    }

    pub(crate) fn record_mut(&mut self, id: RecordId) -> &mut Record {
        &mut self.records[id.index()]
    }

    pub fn record(&self, id: RecordId) -> &Record {
        &self.records[id.index()]
    }

    pub fn get(&self, key: &RowKey) -> Option<&Record> {
        self.index.get(key).map(|id| &self.records[id.index()])
    }

    pub fn id_of(&self, key: &RowKey) -> Option<RecordId> {
        self.index.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RecordId, &Record)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| (RecordId(i as u32), r))
    }

    /// Returns `[id, parent, grandparent, ..., root]`.
    /// A parent chain that revisits a record is reported as `CyclicParent`.
    pub fn path_to_root(&self, id: RecordId) -> TreeGridResult<Vec<RecordId>> {
        let mut path = vec![id];
        let mut visited = FxHashSet::default();
        visited.insert(id);
        let mut current = id;
        while let Some(parent) = self.records[current.index()].parent {
            if !visited.insert(parent) {
                return Err(TreeGridError::CyclicParent {
                    key: self.records[id.index()].key.clone(),
                });
            }
            path.push(parent);
            current = parent;
        }
        Ok(path)
    }

    /// All natural descendants of `id` in pre-order (excluding `id`).
    pub fn descendants(&self, id: RecordId) -> Vec<RecordId> {
        let mut out = Vec::new();
        let mut stack: Vec<RecordId> = self.records[id.index()].children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.records[current.index()].children.iter().rev().copied());
        }
        out
    }

    /// Whether `ancestor` appears on the parent chain of `id` (or is `id`).
    /// Stops on a revisited record instead of looping forever.
    pub fn is_ancestor_or_self(&self, ancestor: RecordId, id: RecordId) -> bool {
        let mut visited = FxHashSet::default();
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            if !visited.insert(c) {
                return false;
            }
            current = self.records[c.index()].parent;
        }
        false
    }
}

// ============================================================================
// FOREST
// ============================================================================

/// Ordered root list plus per-record ordered child lists.
/// Only records with at least one child have an entry in `children`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forest {
    roots: Vec<RecordId>,
    children: FxHashMap<RecordId, ChildIds>,
}

impl Forest {
    pub fn from_parts(roots: Vec<RecordId>, children: FxHashMap<RecordId, ChildIds>) -> Self {
        Forest { roots, children }
    }

    /// The natural hierarchy of `store` below `roots`.
    pub fn natural(store: &RecordStore, roots: Vec<RecordId>) -> Self {
        let mut children = FxHashMap::default();
        let mut stack: Vec<RecordId> = roots.clone();
        while let Some(id) = stack.pop() {
            let kids = &store.record(id).children;
            if !kids.is_empty() {
                stack.extend(kids.iter().copied());
                children.insert(id, kids.clone());
            }
        }
        Forest { roots, children }
    }

    pub fn roots(&self) -> &[RecordId] {
        &self.roots
    }

    pub fn children(&self, id: RecordId) -> &[RecordId] {
        self.children.get(&id).map(|c| c.as_slice()).unwrap_or(&[])
    }

    pub(crate) fn roots_mut(&mut self) -> &mut Vec<RecordId> {
        &mut self.roots
    }

    pub(crate) fn children_mut(&mut self, id: RecordId) -> Option<&mut ChildIds> {
        self.children.get_mut(&id)
    }

    pub fn has_children(&self, id: RecordId) -> bool {
        self.children.contains_key(&id)
    }

    /// Every record of the forest in depth-first pre-order.
    pub fn preorder(&self) -> Vec<RecordId> {
        let mut out = Vec::new();
        let mut stack: Vec<RecordId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Number of records reachable from the roots.
    pub fn len(&self) -> usize {
        self.roots.len() + self.children.values().map(|c| c.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}
