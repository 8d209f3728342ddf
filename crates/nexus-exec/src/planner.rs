//! Physical plan generator.
//!
//! Translates a logical plan into a tree of physical operators in one
//! recursive pass. The two decisions made here:
//!
//! - **Access path**: a table access whose predicates pin every field of an
//!   index with `field = literal` becomes a point lookup on that index;
//!   otherwise it becomes a full scan. Among qualifying indexes the one with
//!   the most fields wins, and ties go to the index listed first in the
//!   catalog. This is a structural best fit, not a cost estimate.
//! - **Join strategy**: a join whose condition is exactly `field = field`,
//!   with one field naming a column of each input, runs as a hash join;
//!   anything else runs as a nested loop.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::catalog::{IndexMeta, TableMeta};
use crate::config::ExecutorConfig;
use crate::error::{ExecError, ExecResult};
use crate::expr::{Expression, FieldRef};
use crate::logical::{
    extract_conjuncts, AggregateNode, DeleteNode, ExplainNode, InsertNode, JoinNode,
    LogicalNode, LogicalNodeKind, OrderByNode, PredicateNode, ProjectionNode, TableGetNode,
    UpdateNode,
};
use crate::physical::{
    output_spec, AggregatePhysicalOperator, BoxedOperator, DeletePhysicalOperator, ExplainPhysicalOperator,
    IndexScanPhysicalOperator, InsertPhysicalOperator, JoinPhysicalOperator,
    OrderByPhysicalOperator, PhysicalOperator, PredicatePhysicalOperator,
    ProjectPhysicalOperator, TableScanPhysicalOperator, UpdatePhysicalOperator,
};
use crate::storage::{KeyRange, TableStorage};
use crate::tuple::TupleCellSpec;
use crate::value::Value;

/// An index chosen for a table access, with the lookup key in index field
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSelection {
    /// Chosen index.
    pub index: IndexMeta,
    /// One literal per index field.
    pub key: Vec<Value>,
}

/// Picks the index to look rows up with, if any.
///
/// Only `field = literal` predicates (either operand order, possibly inside
/// an AND) whose field is unqualified or qualified by `alias` count. When a
/// field is pinned twice, the first literal wins; the predicates are still
/// re-checked on every row, so the result stays correct.
pub fn select_index(
    table: &TableMeta,
    alias: &str,
    predicates: &[Expression],
) -> Option<IndexSelection> {
    let mut pinned: HashMap<&str, &Value> = HashMap::new();
    for conjunct in predicates.iter().flat_map(extract_conjuncts) {
        let Some((field, value)) = conjunct.as_field_value_equality() else {
            continue;
        };
        if field.table_name().map_or(true, |t| t == alias) {
            pinned.entry(field.field_name()).or_insert(value);
        }
    }
    if pinned.is_empty() {
        return None;
    }

    let mut best: Option<&IndexMeta> = None;
    for index in &table.indexes {
        let covered = index.field_num() > 0
            && index
                .fields
                .iter()
                .all(|f| pinned.contains_key(f.as_str()));
        if covered && best.map_or(true, |b| index.field_num() > b.field_num()) {
            best = Some(index);
        }
    }

    best.map(|index| IndexSelection {
        key: index
            .fields
            .iter()
            .filter_map(|f| pinned.get(f.as_str()).map(|v| (*v).clone()))
            .collect(),
        index: index.clone(),
    })
}

/// Unpacks a node's children, failing unless there are exactly `N`.
fn take_children<const N: usize>(
    kind: LogicalNodeKind,
    children: Vec<LogicalNode>,
) -> ExecResult<[LogicalNode; N]> {
    let len = children.len();
    <[LogicalNode; N]>::try_from(children).map_err(|_| {
        ExecError::invalid_argument(format!(
            "{} node expects {} children, got {}",
            kind, N, len
        ))
    })
}

/// Builds physical operator trees from logical plans.
#[derive(Debug, Clone)]
pub struct PhysicalOperatorGenerator {
    storage: Arc<dyn TableStorage>,
    config: ExecutorConfig,
}

impl PhysicalOperatorGenerator {
    /// Creates a generator with the default configuration.
    pub fn new(storage: Arc<dyn TableStorage>) -> Self {
        Self {
            storage,
            config: ExecutorConfig::default(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Translates a logical plan into a physical operator tree.
    ///
    /// Fails with `InvalidArgument` on a node with the wrong number of
    /// children and with `Unimplemented` on GROUP BY.
    pub fn create(&self, plan: LogicalNode) -> ExecResult<BoxedOperator> {
        self.create_node(plan, false)
    }

    /// `is_delete` marks a subtree whose rows a DELETE or UPDATE will
    /// modify.
    fn create_node(&self, node: LogicalNode, is_delete: bool) -> ExecResult<BoxedOperator> {
        let mut op = match node {
            LogicalNode::TableGet(n) => self.create_table_get(n, is_delete)?,
            LogicalNode::Predicate(n) => self.create_predicate(n, is_delete)?,
            LogicalNode::Projection(n) => self.create_projection(n, is_delete)?,
            LogicalNode::Aggregate(n) => self.create_aggregate(n)?,
            LogicalNode::OrderBy(n) => self.create_order_by(n)?,
            LogicalNode::Insert(n) => self.create_insert(n),
            LogicalNode::Delete(n) => self.create_delete(n)?,
            LogicalNode::Update(n) => self.create_update(n)?,
            LogicalNode::Explain(n) => self.create_explain(n, is_delete)?,
            LogicalNode::Join(n) => self.create_join(n)?,
            LogicalNode::GroupBy(_) => return Err(ExecError::unimplemented("group by")),
        };
        op.set_delete(is_delete);
        Ok(op)
    }

    fn create_table_get(&self, node: TableGetNode, is_delete: bool) -> ExecResult<BoxedOperator> {
        let TableGetNode {
            table,
            alias,
            readonly,
            predicates,
        } = node;
        let alias = alias.unwrap_or_else(|| table.name.clone());
        let readonly = readonly && !is_delete;

        let selection = if self.config.enable_index_scan {
            select_index(&table, &alias, &predicates)
        } else {
            None
        };

        match selection {
            Some(IndexSelection { index, key }) => {
                debug!(
                    table = %table.name,
                    index = %index.name,
                    fields = index.field_num(),
                    "using index lookup"
                );
                let scan = IndexScanPhysicalOperator::new(
                    self.storage.clone(),
                    table,
                    index,
                    KeyRange::point(key),
                    readonly,
                )?
                .with_alias(alias)
                .with_predicates(predicates);
                Ok(Box::new(scan))
            }
            None => {
                debug!(table = %table.name, predicates = predicates.len(), "using table scan");
                let scan = TableScanPhysicalOperator::new(self.storage.clone(), table, readonly)
                    .with_alias(alias)
                    .with_predicates(predicates);
                Ok(Box::new(scan))
            }
        }
    }

    fn create_predicate(&self, node: PredicateNode, is_delete: bool) -> ExecResult<BoxedOperator> {
        let PredicateNode {
            expressions,
            children,
        } = node;
        let [child] = take_children(LogicalNodeKind::Predicate, children)?;
        let [expression] = <[Expression; 1]>::try_from(expressions).map_err(|e| {
            ExecError::invalid_argument(format!(
                "Predicate node expects 1 expression, got {}",
                e.len()
            ))
        })?;

        let mut op = PredicatePhysicalOperator::new(expression);
        op.add_child(self.create_node(child, is_delete)?);
        Ok(Box::new(op))
    }

    fn create_projection(
        &self,
        node: ProjectionNode,
        is_delete: bool,
    ) -> ExecResult<BoxedOperator> {
        if node.children.len() > 1 {
            return Err(ExecError::invalid_argument(format!(
                "Projection node expects at most 1 child, got {}",
                node.children.len()
            )));
        }
        let mut op = ProjectPhysicalOperator::new(node.expressions);
        for child in node.children {
            op.add_child(self.create_node(child, is_delete)?);
        }
        Ok(Box::new(op))
    }

    fn create_aggregate(&self, node: AggregateNode) -> ExecResult<BoxedOperator> {
        let [child] = take_children(LogicalNodeKind::Aggregate, node.children)?;
        let mut op = AggregatePhysicalOperator::new(node.aggregates)?;
        op.add_child(self.create_node(child, false)?);
        Ok(Box::new(op))
    }

    fn create_order_by(&self, node: OrderByNode) -> ExecResult<BoxedOperator> {
        let [child] = take_children(LogicalNodeKind::OrderBy, node.children)?;
        let mut op = OrderByPhysicalOperator::new(node.units);
        op.add_child(self.create_node(child, false)?);
        Ok(Box::new(op))
    }

    fn create_insert(&self, node: InsertNode) -> BoxedOperator {
        Box::new(InsertPhysicalOperator::new(
            self.storage.clone(),
            node.table,
            node.rows,
        ))
    }

    fn create_delete(&self, node: DeleteNode) -> ExecResult<BoxedOperator> {
        let [child] = take_children(LogicalNodeKind::Delete, node.children)?;
        let mut op = DeletePhysicalOperator::new(self.storage.clone(), node.table);
        op.add_child(self.create_node(child, true)?);
        Ok(Box::new(op))
    }

    fn create_update(&self, node: UpdateNode) -> ExecResult<BoxedOperator> {
        let [child] = take_children(LogicalNodeKind::Update, node.children)?;
        let mut op =
            UpdatePhysicalOperator::new(self.storage.clone(), node.table, node.assignments)?;
        op.add_child(self.create_node(child, true)?);
        Ok(Box::new(op))
    }

    fn create_explain(&self, node: ExplainNode, is_delete: bool) -> ExecResult<BoxedOperator> {
        let [child] = take_children(LogicalNodeKind::Explain, node.children)?;
        let mut op = ExplainPhysicalOperator::new(self.config.explain_header.clone());
        op.add_child(self.create_node(child, is_delete)?);
        Ok(Box::new(op))
    }

    fn create_join(&self, node: JoinNode) -> ExecResult<BoxedOperator> {
        let JoinNode {
            condition,
            children,
        } = node;
        let [left, right] = take_children(LogicalNodeKind::Join, children)?;
        let hashable = match condition.as_ref().and_then(Expression::as_equi_join) {
            Some((l, r)) if keys_split(&left, &right, l, r) => true,
            Some(_) => {
                debug!("join keys do not split across inputs");
                false
            }
            None => false,
        };
        let left = self.create_node(left, false)?;
        let right = self.create_node(right, false)?;

        let join = match condition {
            Some(cond) if hashable && self.config.enable_hash_join => {
                debug!(condition = %cond, "using hash join");
                JoinPhysicalOperator::hash(left, right, cond)?
            }
            condition => JoinPhysicalOperator::nested_loop(left, right, condition),
        };
        Ok(Box::new(join))
    }
}

/// Columns a logical subtree produces, when they can be named without
/// building it.
fn output_columns(node: &LogicalNode) -> Option<Vec<TupleCellSpec>> {
    match node {
        LogicalNode::TableGet(n) => {
            let alias = n.alias.as_deref().unwrap_or(&n.table.name);
            Some(TupleCellSpec::for_table(&n.table, alias).to_vec())
        }
        LogicalNode::Predicate(n) => n.children.first().and_then(output_columns),
        LogicalNode::OrderBy(n) => n.children.first().and_then(output_columns),
        LogicalNode::Projection(n) => Some(n.expressions.iter().map(output_spec).collect()),
        LogicalNode::Join(n) => {
            let mut columns = Vec::new();
            for child in &n.children {
                columns.extend(output_columns(child)?);
            }
            Some(columns)
        }
        _ => None,
    }
}

/// Whether `l` and `r` each name columns of one input only, on opposite
/// sides. Inputs whose columns are unknown here are checked at `open`.
fn keys_split(left: &LogicalNode, right: &LogicalNode, l: &FieldRef, r: &FieldRef) -> bool {
    let (Some(left), Some(right)) = (output_columns(left), output_columns(right)) else {
        return true;
    };
    let side = |field: &FieldRef| {
        (
            left.iter().any(|c| c.matches(field)),
            right.iter().any(|c| c.matches(field)),
        )
    };
    matches!(
        (side(l), side(r)),
        ((true, false), (false, true)) | ((false, true), (true, false))
    )
}
