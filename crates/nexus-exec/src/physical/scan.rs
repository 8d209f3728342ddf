//! Row fetching shared by the table and index scans.

use std::sync::Arc;

use crate::catalog::TableMeta;
use crate::error::{ExecError, ExecResult};
use crate::expr::Expression;
use crate::storage::{LockMode, RecordCursor, TableStorage};
use crate::tuple::{RowTuple, TupleCellSpec, TupleRef};
use crate::txn::Transaction;

/// A cursor plus the reusable row buffer it fills.
#[derive(Debug)]
pub(crate) struct ScanCore {
    pub storage: Arc<dyn TableStorage>,
    pub table: Arc<TableMeta>,
    pub alias: String,
    pub readonly: bool,
    pub predicates: Vec<Expression>,
    cursor: Option<Box<dyn RecordCursor>>,
    txn: Option<Transaction>,
    buffer: RowTuple,
    has_row: bool,
    exhausted: bool,
}

impl ScanCore {
    pub fn new(storage: Arc<dyn TableStorage>, table: Arc<TableMeta>, readonly: bool) -> Self {
        let alias = table.name.clone();
        let buffer = RowTuple::empty(TupleCellSpec::for_table(&table, &alias));
        Self {
            storage,
            table,
            alias,
            readonly,
            predicates: Vec::new(),
            cursor: None,
            txn: None,
            buffer,
            has_row: false,
            exhausted: false,
        }
    }

    /// Renames the table in the cells this scan produces.
    pub fn set_alias(&mut self, alias: String) {
        self.buffer = RowTuple::empty(TupleCellSpec::for_table(&self.table, &alias));
        self.alias = alias;
    }

    pub fn start(&mut self, cursor: Box<dyn RecordCursor>, txn: &Transaction) {
        self.cursor = Some(cursor);
        self.txn = Some(txn.clone());
        self.has_row = false;
        self.exhausted = false;
    }

    /// Fetches rows until one passes every predicate.
    pub fn advance(&mut self, is_delete: bool) -> ExecResult<bool> {
        if self.exhausted {
            return Ok(false);
        }
        let (Some(cursor), Some(txn)) = (self.cursor.as_mut(), self.txn.as_ref()) else {
            return Err(ExecError::internal(format!(
                "scan of {} used before open",
                self.table.name
            )));
        };
        let mode = LockMode::for_scan(self.readonly && !is_delete);

        self.has_row = false;
        while let Some(rid) = cursor.next_rid()? {
            let Some(values) = self.storage.fetch(&self.table, rid, mode, txn)? else {
                // Removed since the cursor was opened.
                continue;
            };
            self.buffer.set_record(rid, values);

            let mut passed = true;
            for predicate in &self.predicates {
                if !predicate.passes(&self.buffer)? {
                    passed = false;
                    break;
                }
            }
            if passed {
                self.has_row = true;
                return Ok(true);
            }
        }
        self.exhausted = true;
        Ok(false)
    }

    pub fn release(&mut self) {
        self.cursor = None;
        self.txn = None;
        self.has_row = false;
        self.exhausted = false;
    }

    pub fn current(&self) -> Option<TupleRef<'_>> {
        self.has_row.then(|| TupleRef::row(&self.buffer))
    }
}
