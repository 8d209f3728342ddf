//! Index range scan.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::trace;

use super::scan::ScanCore;
use super::{OperatorBase, OperatorKind, PhysicalOperator};
use crate::catalog::{IndexMeta, TableMeta};
use crate::error::{ExecError, ExecResult};
use crate::expr::Expression;
use crate::storage::{KeyBound, KeyRange, TableStorage};
use crate::tuple::TupleRef;
use crate::txn::Transaction;
use crate::value::Value;

/// Reads the rows whose index key lies in a composite key range.
///
/// Every fetched row is re-checked against the residual predicates, so the
/// range may be looser than the query's filter but never tighter.
#[derive(Debug)]
pub struct IndexScanPhysicalOperator {
    base: OperatorBase,
    core: ScanCore,
    index: IndexMeta,
    range: KeyRange,
}

impl IndexScanPhysicalOperator {
    /// Creates a scan of `index` over `range`.
    ///
    /// Each bound lists values in index field order and may cover a leading
    /// prefix of the fields; `None` or an empty list leaves that end open.
    pub fn new(
        storage: Arc<dyn TableStorage>,
        table: Arc<TableMeta>,
        index: IndexMeta,
        range: KeyRange,
        readonly: bool,
    ) -> ExecResult<Self> {
        for bound in [&range.lower, &range.upper].into_iter().flatten() {
            if bound.values.len() > index.field_num() {
                return Err(ExecError::invalid_argument(format!(
                    "bound has {} values but index {} has {} fields",
                    bound.values.len(),
                    index.name,
                    index.field_num()
                )));
            }
        }
        Ok(Self {
            base: OperatorBase::new(),
            core: ScanCore::new(storage, table, readonly),
            index,
            range,
        })
    }

    /// Creates a scan bounded by single values on the leading index field.
    #[allow(clippy::too_many_arguments)]
    pub fn with_single_bounds(
        storage: Arc<dyn TableStorage>,
        table: Arc<TableMeta>,
        index: IndexMeta,
        readonly: bool,
        left: Option<Value>,
        left_inclusive: bool,
        right: Option<Value>,
        right_inclusive: bool,
    ) -> ExecResult<Self> {
        let bound = |value: Option<Value>, inclusive| {
            value.map(|v| KeyBound {
                values: vec![v],
                inclusive,
            })
        };
        let range = KeyRange::new(bound(left, left_inclusive), bound(right, right_inclusive));
        Self::new(storage, table, index, range, readonly)
    }

    /// Sets the name rows are qualified with.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.core.set_alias(alias.into());
        self
    }

    /// Sets the residual predicates.
    pub fn with_predicates(mut self, predicates: Vec<Expression>) -> Self {
        self.core.predicates = predicates;
        self
    }

    /// Returns the scanned index.
    pub fn index(&self) -> &IndexMeta {
        &self.index
    }

    /// Returns the key range.
    pub fn range(&self) -> &KeyRange {
        &self.range
    }

    /// Returns the residual predicates.
    pub fn predicates(&self) -> &[Expression] {
        &self.core.predicates
    }

    /// Returns true if the scan only reads.
    pub fn readonly(&self) -> bool {
        self.core.readonly
    }
}

fn write_bound(out: &mut String, bound: &Option<KeyBound>) {
    match bound {
        Some(b) if !b.values.is_empty() => {
            let values: Vec<String> = b.values.iter().map(ToString::to_string).collect();
            let _ = write!(out, "{}", values.join(", "));
        }
        _ => out.push('*'),
    }
}

impl PhysicalOperator for IndexScanPhysicalOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::IndexScan
    }

    fn param(&self) -> String {
        let mut out = format!("{} ON {}", self.index.name, self.core.alias);
        out.push_str(", ");
        out.push(match &self.range.lower {
            Some(b) if b.inclusive => '[',
            _ => '(',
        });
        write_bound(&mut out, &self.range.lower);
        out.push_str(" .. ");
        write_bound(&mut out, &self.range.upper);
        out.push(match &self.range.upper {
            Some(b) if b.inclusive => ']',
            _ => ')',
        });
        out
    }

    fn base(&self) -> &OperatorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OperatorBase {
        &mut self.base
    }

    fn open(&mut self, txn: &Transaction) -> ExecResult<()> {
        trace!(index = %self.index.name, table = %self.core.table.name, "opening index scan");
        let cursor = self
            .core
            .storage
            .index_scan(&self.core.table, &self.index, &self.range, txn)?;
        self.core.start(cursor, txn);
        Ok(())
    }

    fn next(&mut self) -> ExecResult<bool> {
        let is_delete = self.base.is_delete;
        self.core.advance(is_delete)
    }

    fn close(&mut self) -> ExecResult<()> {
        self.core.release();
        Ok(())
    }

    fn current_tuple(&self) -> Option<TupleRef<'_>> {
        self.core.current()
    }
}
