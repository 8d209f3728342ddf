//! In-memory table storage.
//!
//! Rows live in a `BTreeMap` keyed by record id; each index is an ordered
//! map from key values to record ids. Cursors take a snapshot of matching
//! ids when opened and hold no lock between calls, so a DML operator may
//! modify a table while a scan over it is still open.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use nexus_common::{PageId, RecordId, TxnId};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use super::{KeyRange, LockMode, RecordCursor, StorageError, StorageResult, TableStorage};
use crate::catalog::{IndexMeta, TableMeta};
use crate::txn::Transaction;
use crate::value::Value;

/// Records per page when allocating record ids.
const SLOTS_PER_PAGE: u64 = 64;

/// Row fetches kept by default; older ones are dropped first.
pub const DEFAULT_LOCK_LOG_CAPACITY: usize = 4096;

/// A row fetch recorded by [`MemoryStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRequest {
    /// Requesting transaction.
    pub txn: TxnId,
    /// Table name.
    pub table: String,
    /// Fetched record.
    pub rid: RecordId,
    /// Requested intent.
    pub mode: LockMode,
}

/// The most recent row fetches, oldest first.
#[derive(Debug)]
struct LockLog {
    entries: VecDeque<LockRequest>,
    capacity: usize,
}

impl LockLog {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    fn push(&mut self, request: LockRequest) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(request);
    }
}

impl Default for LockLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOCK_LOG_CAPACITY)
    }
}

type IndexTree = BTreeMap<Vec<Value>, BTreeSet<RecordId>>;

#[derive(Debug)]
struct IndexData {
    positions: Vec<usize>,
    tree: IndexTree,
}

impl IndexData {
    fn key(&self, values: &[Value]) -> Vec<Value> {
        self.positions.iter().map(|&p| values[p].clone()).collect()
    }

    fn add(&mut self, values: &[Value], rid: RecordId) {
        let key = self.key(values);
        self.tree.entry(key).or_default().insert(rid);
    }

    fn remove(&mut self, values: &[Value], rid: RecordId) {
        let key = self.key(values);
        if let Some(rids) = self.tree.get_mut(&key) {
            rids.remove(&rid);
            if rids.is_empty() {
                self.tree.remove(&key);
            }
        }
    }
}

#[derive(Debug)]
struct TableData {
    meta: Arc<TableMeta>,
    rows: BTreeMap<RecordId, Vec<Value>>,
    indexes: HashMap<String, IndexData>,
    next_slot: u64,
}

impl TableData {
    fn new(meta: Arc<TableMeta>) -> StorageResult<Self> {
        let mut indexes = HashMap::new();
        for index in &meta.indexes {
            let positions = index
                .fields
                .iter()
                .map(|f| {
                    meta.field_index(f).ok_or_else(|| {
                        StorageError::SchemaMismatch(format!(
                            "index {} references unknown field {}",
                            index.name, f
                        ))
                    })
                })
                .collect::<StorageResult<Vec<_>>>()?;
            indexes.insert(
                index.name.clone(),
                IndexData {
                    positions,
                    tree: IndexTree::new(),
                },
            );
        }
        Ok(Self {
            meta,
            rows: BTreeMap::new(),
            indexes,
            next_slot: 0,
        })
    }

    fn check_arity(&self, values: &[Value]) -> StorageResult<()> {
        if values.len() != self.meta.field_num() {
            return Err(StorageError::SchemaMismatch(format!(
                "table {} has {} fields, got {} values",
                self.meta.name,
                self.meta.field_num(),
                values.len()
            )));
        }
        Ok(())
    }

    fn allocate_rid(&mut self) -> RecordId {
        let slot = self.next_slot;
        self.next_slot += 1;
        RecordId::new(
            PageId::new(slot / SLOTS_PER_PAGE),
            (slot % SLOTS_PER_PAGE) as u32,
        )
    }
}

/// Counts live cursors; the count drops when the cursor is dropped.
#[derive(Debug)]
struct CursorGuard {
    open: Arc<AtomicUsize>,
}

impl CursorGuard {
    fn new(open: &Arc<AtomicUsize>) -> Self {
        open.fetch_add(1, Ordering::SeqCst);
        Self { open: open.clone() }
    }
}

impl Drop for CursorGuard {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct SnapshotCursor {
    rids: std::vec::IntoIter<RecordId>,
    _guard: CursorGuard,
}

impl RecordCursor for SnapshotCursor {
    fn next_rid(&mut self) -> StorageResult<Option<RecordId>> {
        Ok(self.rids.next())
    }
}

/// Table storage held entirely in memory.
///
/// Thread-safe; also records recent row fetches so callers can check which
/// lock intent a plan requested. Only the last
/// [`DEFAULT_LOCK_LOG_CAPACITY`] fetches are kept unless
/// [`MemoryStorage::with_lock_log_capacity`] says otherwise.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: RwLock<HashMap<String, TableData>>,
    open_cursors: Arc<AtomicUsize>,
    lock_log: Mutex<LockLog>,
}

impl MemoryStorage {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates empty storage that keeps at most `capacity` row fetches.
    /// Zero turns recording off.
    pub fn with_lock_log_capacity(capacity: usize) -> Self {
        Self {
            lock_log: Mutex::new(LockLog::with_capacity(capacity)),
            ..Self::default()
        }
    }

    /// Registers a table and builds its empty indexes.
    pub fn create_table(&self, meta: Arc<TableMeta>) -> StorageResult<()> {
        let mut tables = self.tables.write();
        if tables.contains_key(&meta.name) {
            return Err(StorageError::TableExists(meta.name.clone()));
        }
        debug!(table = %meta.name, indexes = meta.indexes.len(), "creating table");
        let name = meta.name.clone();
        tables.insert(name, TableData::new(meta)?);
        Ok(())
    }

    /// Returns the number of rows in a table.
    pub fn row_count(&self, table: &str) -> StorageResult<usize> {
        let tables = self.tables.read();
        tables
            .get(table)
            .map(|t| t.rows.len())
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))
    }

    /// Returns every row of a table in record id order.
    pub fn rows(&self, table: &str) -> StorageResult<Vec<Vec<Value>>> {
        let tables = self.tables.read();
        tables
            .get(table)
            .map(|t| t.rows.values().cloned().collect())
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))
    }

    /// Returns the number of cursors not yet dropped.
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    /// Returns the recorded row fetches, oldest first.
    pub fn lock_requests(&self) -> Vec<LockRequest> {
        self.lock_log.lock().entries.iter().cloned().collect()
    }

    /// Forgets recorded row fetches.
    pub fn clear_lock_requests(&self) {
        self.lock_log.lock().entries.clear();
    }

    fn cursor(&self, rids: Vec<RecordId>) -> Box<dyn RecordCursor> {
        Box::new(SnapshotCursor {
            rids: rids.into_iter(),
            _guard: CursorGuard::new(&self.open_cursors),
        })
    }
}

impl TableStorage for MemoryStorage {
    fn scan(&self, table: &TableMeta, _txn: &Transaction) -> StorageResult<Box<dyn RecordCursor>> {
        let tables = self.tables.read();
        let data = tables
            .get(&table.name)
            .ok_or_else(|| StorageError::TableNotFound(table.name.clone()))?;
        let rids = data.rows.keys().copied().collect();
        Ok(self.cursor(rids))
    }

    fn index_scan(
        &self,
        table: &TableMeta,
        index: &IndexMeta,
        range: &KeyRange,
        _txn: &Transaction,
    ) -> StorageResult<Box<dyn RecordCursor>> {
        let tables = self.tables.read();
        let data = tables
            .get(&table.name)
            .ok_or_else(|| StorageError::TableNotFound(table.name.clone()))?;
        let index_data = data
            .indexes
            .get(&index.name)
            .ok_or_else(|| StorageError::IndexNotFound {
                table: table.name.clone(),
                index: index.name.clone(),
            })?;

        // Keys sharing the lower bound's prefix sort at or after it.
        let start = match &range.lower {
            Some(bound) if !bound.values.is_empty() => Bound::Included(bound.values.as_slice()),
            _ => Bound::Unbounded,
        };
        let rids: Vec<RecordId> = index_data
            .tree
            .range::<[Value], _>((start, Bound::Unbounded))
            .skip_while(|(key, _)| range.is_below(key))
            .take_while(|(key, _)| !range.is_above(key))
            .flat_map(|(_, rids)| rids.iter().copied())
            .collect();
        trace!(index = %index.name, matches = rids.len(), "index range scan");
        Ok(self.cursor(rids))
    }

    fn fetch(
        &self,
        table: &TableMeta,
        rid: RecordId,
        mode: LockMode,
        txn: &Transaction,
    ) -> StorageResult<Option<Vec<Value>>> {
        let row = {
            let tables = self.tables.read();
            let data = tables
                .get(&table.name)
                .ok_or_else(|| StorageError::TableNotFound(table.name.clone()))?;
            data.rows.get(&rid).cloned()
        };
        self.lock_log.lock().push(LockRequest {
            txn: txn.id(),
            table: table.name.clone(),
            rid,
            mode,
        });
        Ok(row)
    }

    fn insert(
        &self,
        table: &TableMeta,
        values: Vec<Value>,
        _txn: &Transaction,
    ) -> StorageResult<RecordId> {
        let mut tables = self.tables.write();
        let data = tables
            .get_mut(&table.name)
            .ok_or_else(|| StorageError::TableNotFound(table.name.clone()))?;
        data.check_arity(&values)?;

        let rid = data.allocate_rid();
        for index in data.indexes.values_mut() {
            index.add(&values, rid);
        }
        data.rows.insert(rid, values);
        Ok(rid)
    }

    fn update(
        &self,
        table: &TableMeta,
        rid: RecordId,
        values: Vec<Value>,
        _txn: &Transaction,
    ) -> StorageResult<()> {
        let mut tables = self.tables.write();
        let data = tables
            .get_mut(&table.name)
            .ok_or_else(|| StorageError::TableNotFound(table.name.clone()))?;
        data.check_arity(&values)?;

        let old = data
            .rows
            .get_mut(&rid)
            .ok_or(StorageError::RecordNotFound(rid))?;
        let old_values = std::mem::replace(old, values.clone());
        for index in data.indexes.values_mut() {
            index.remove(&old_values, rid);
            index.add(&values, rid);
        }
        Ok(())
    }

    fn delete(&self, table: &TableMeta, rid: RecordId, _txn: &Transaction) -> StorageResult<()> {
        let mut tables = self.tables.write();
        let data = tables
            .get_mut(&table.name)
            .ok_or_else(|| StorageError::TableNotFound(table.name.clone()))?;
        let values = data
            .rows
            .remove(&rid)
            .ok_or(StorageError::RecordNotFound(rid))?;
        for index in data.indexes.values_mut() {
            index.remove(&values, rid);
        }
        Ok(())
    }
}
