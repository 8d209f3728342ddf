//! Logical plan nodes consumed by the physical plan generator.
//!
//! Nodes carry their children by value. The generator takes the whole tree
//! by value and moves expressions into the physical operators it builds.

use std::fmt;
use std::sync::Arc;

use crate::catalog::TableMeta;
use crate::expr::{ConjunctionType, Expression};
use crate::value::Value;

/// A logical plan node.
#[derive(Debug, Clone)]
pub enum LogicalNode {
    /// Read a table, optionally filtered by pushed-down predicates.
    TableGet(TableGetNode),
    /// Filter rows (WHERE).
    Predicate(PredicateNode),
    /// Compute output columns (SELECT list).
    Projection(ProjectionNode),
    /// Aggregate the whole input into one row.
    Aggregate(AggregateNode),
    /// Sort rows (ORDER BY).
    OrderBy(OrderByNode),
    /// Insert literal rows.
    Insert(InsertNode),
    /// Delete the rows produced by the child.
    Delete(DeleteNode),
    /// Update the rows produced by the child.
    Update(UpdateNode),
    /// Describe the physical plan instead of running it.
    Explain(ExplainNode),
    /// Join two inputs.
    Join(JoinNode),
    /// Grouped aggregation (GROUP BY).
    GroupBy(GroupByNode),
}

/// Kind of a logical node, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalNodeKind {
    /// Table access.
    TableGet,
    /// Filter.
    Predicate,
    /// Projection.
    Projection,
    /// Aggregation.
    Aggregate,
    /// Sort.
    OrderBy,
    /// Insert.
    Insert,
    /// Delete.
    Delete,
    /// Update.
    Update,
    /// Explain.
    Explain,
    /// Join.
    Join,
    /// Group by.
    GroupBy,
}

impl fmt::Display for LogicalNodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogicalNodeKind::TableGet => "TableGet",
            LogicalNodeKind::Predicate => "Predicate",
            LogicalNodeKind::Projection => "Projection",
            LogicalNodeKind::Aggregate => "Aggregate",
            LogicalNodeKind::OrderBy => "OrderBy",
            LogicalNodeKind::Insert => "Insert",
            LogicalNodeKind::Delete => "Delete",
            LogicalNodeKind::Update => "Update",
            LogicalNodeKind::Explain => "Explain",
            LogicalNodeKind::Join => "Join",
            LogicalNodeKind::GroupBy => "GroupBy",
        };
        f.write_str(name)
    }
}

impl LogicalNode {
    /// Returns the node kind.
    pub fn kind(&self) -> LogicalNodeKind {
        match self {
            LogicalNode::TableGet(_) => LogicalNodeKind::TableGet,
            LogicalNode::Predicate(_) => LogicalNodeKind::Predicate,
            LogicalNode::Projection(_) => LogicalNodeKind::Projection,
            LogicalNode::Aggregate(_) => LogicalNodeKind::Aggregate,
            LogicalNode::OrderBy(_) => LogicalNodeKind::OrderBy,
            LogicalNode::Insert(_) => LogicalNodeKind::Insert,
            LogicalNode::Delete(_) => LogicalNodeKind::Delete,
            LogicalNode::Update(_) => LogicalNodeKind::Update,
            LogicalNode::Explain(_) => LogicalNodeKind::Explain,
            LogicalNode::Join(_) => LogicalNodeKind::Join,
            LogicalNode::GroupBy(_) => LogicalNodeKind::GroupBy,
        }
    }

    /// Returns the child nodes.
    pub fn children(&self) -> &[LogicalNode] {
        match self {
            LogicalNode::TableGet(_) | LogicalNode::Insert(_) => &[],
            LogicalNode::Predicate(n) => &n.children,
            LogicalNode::Projection(n) => &n.children,
            LogicalNode::Aggregate(n) => &n.children,
            LogicalNode::OrderBy(n) => &n.children,
            LogicalNode::Delete(n) => &n.children,
            LogicalNode::Update(n) => &n.children,
            LogicalNode::Explain(n) => &n.children,
            LogicalNode::Join(n) => &n.children,
            LogicalNode::GroupBy(n) => &n.children,
        }
    }
}

/// Table access.
#[derive(Debug, Clone)]
pub struct TableGetNode {
    /// Table to read.
    pub table: Arc<TableMeta>,
    /// Name the query uses for the table; defaults to the table name.
    pub alias: Option<String>,
    /// False when the rows read will be modified.
    pub readonly: bool,
    /// Filters pushed down to the access.
    pub predicates: Vec<Expression>,
}

impl TableGetNode {
    /// Creates a read-only access with no predicates.
    pub fn new(table: Arc<TableMeta>) -> Self {
        Self {
            table,
            alias: None,
            readonly: true,
            predicates: Vec::new(),
        }
    }

    /// Sets the alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Adds a pushed-down predicate.
    pub fn with_predicate(mut self, predicate: Expression) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Sets whether the access is read-only.
    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }
}

/// Filter.
#[derive(Debug, Clone)]
pub struct PredicateNode {
    /// Filter expressions; exactly one is expected.
    pub expressions: Vec<Expression>,
    /// Input; exactly one is expected.
    pub children: Vec<LogicalNode>,
}

impl PredicateNode {
    /// Creates a filter over `input`.
    pub fn new(expression: Expression, input: LogicalNode) -> Self {
        Self {
            expressions: vec![expression],
            children: vec![input],
        }
    }
}

/// One output column of a projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectExpr {
    /// Computed expression.
    pub expr: Expression,
    /// Output name; defaults to the expression's name.
    pub alias: Option<String>,
}

impl ProjectExpr {
    /// Creates an unaliased output column.
    pub fn new(expr: Expression) -> Self {
        Self { expr, alias: None }
    }

    /// Creates an aliased output column.
    pub fn aliased(expr: Expression, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }
}

/// Projection.
#[derive(Debug, Clone)]
pub struct ProjectionNode {
    /// Output columns.
    pub expressions: Vec<ProjectExpr>,
    /// Input; none for a constant select.
    pub children: Vec<LogicalNode>,
}

impl ProjectionNode {
    /// Creates a projection over `input`.
    pub fn new(expressions: Vec<ProjectExpr>, input: LogicalNode) -> Self {
        Self {
            expressions,
            children: vec![input],
        }
    }

    /// Creates a projection with no input.
    pub fn constant(expressions: Vec<ProjectExpr>) -> Self {
        Self {
            expressions,
            children: Vec::new(),
        }
    }
}

/// Aggregate function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunc {
    /// COUNT(*), or COUNT(expr) counting non-null values.
    Count,
    /// SUM(expr).
    Sum,
    /// AVG(expr).
    Avg,
    /// MIN(expr).
    Min,
    /// MAX(expr).
    Max,
}

impl fmt::Display for AggregateFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggregateFunc::Count => "COUNT",
            AggregateFunc::Sum => "SUM",
            AggregateFunc::Avg => "AVG",
            AggregateFunc::Min => "MIN",
            AggregateFunc::Max => "MAX",
        };
        f.write_str(name)
    }
}

/// One aggregate output column.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateExpr {
    /// Function.
    pub func: AggregateFunc,
    /// Argument; `None` means `*` and is only valid for COUNT.
    pub arg: Option<Expression>,
    /// Output name.
    pub alias: Option<String>,
}

impl AggregateExpr {
    /// Creates `func(arg)`.
    pub fn new(func: AggregateFunc, arg: Expression) -> Self {
        Self {
            func,
            arg: Some(arg),
            alias: None,
        }
    }

    /// Creates `COUNT(*)`.
    pub fn count_star() -> Self {
        Self {
            func: AggregateFunc::Count,
            arg: None,
            alias: None,
        }
    }

    /// Sets the output name.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Returns the output name.
    pub fn output_name(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        match &self.arg {
            Some(arg) => format!("{}({})", self.func, arg),
            None => format!("{}(*)", self.func),
        }
    }
}

/// Aggregation without grouping.
#[derive(Debug, Clone)]
pub struct AggregateNode {
    /// Aggregates to compute.
    pub aggregates: Vec<AggregateExpr>,
    /// Input; exactly one is expected.
    pub children: Vec<LogicalNode>,
}

impl AggregateNode {
    /// Creates an aggregation over `input`.
    pub fn new(aggregates: Vec<AggregateExpr>, input: LogicalNode) -> Self {
        Self {
            aggregates,
            children: vec![input],
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderUnit {
    /// Sort key expression.
    pub expr: Expression,
    /// Ascending when true.
    pub ascending: bool,
}

impl OrderUnit {
    /// Creates an ascending key.
    pub fn asc(expr: Expression) -> Self {
        Self {
            expr,
            ascending: true,
        }
    }

    /// Creates a descending key.
    pub fn desc(expr: Expression) -> Self {
        Self {
            expr,
            ascending: false,
        }
    }
}

/// Sort.
#[derive(Debug, Clone)]
pub struct OrderByNode {
    /// Sort keys, most significant first.
    pub units: Vec<OrderUnit>,
    /// Input; exactly one is expected.
    pub children: Vec<LogicalNode>,
}

impl OrderByNode {
    /// Creates a sort over `input`.
    pub fn new(units: Vec<OrderUnit>, input: LogicalNode) -> Self {
        Self {
            units,
            children: vec![input],
        }
    }
}

/// Insert.
#[derive(Debug, Clone)]
pub struct InsertNode {
    /// Target table.
    pub table: Arc<TableMeta>,
    /// Rows of literal values in column order.
    pub rows: Vec<Vec<Value>>,
}

impl InsertNode {
    /// Creates an insert.
    pub fn new(table: Arc<TableMeta>, rows: Vec<Vec<Value>>) -> Self {
        Self { table, rows }
    }
}

/// Delete.
#[derive(Debug, Clone)]
pub struct DeleteNode {
    /// Target table.
    pub table: Arc<TableMeta>,
    /// Rows to delete; exactly one input is expected.
    pub children: Vec<LogicalNode>,
}

impl DeleteNode {
    /// Creates a delete of the rows produced by `input`.
    pub fn new(table: Arc<TableMeta>, input: LogicalNode) -> Self {
        Self {
            table,
            children: vec![input],
        }
    }
}

/// `SET field = expr`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateAssignment {
    /// Column to change.
    pub field: String,
    /// New value, evaluated against the old row.
    pub value: Expression,
}

impl UpdateAssignment {
    /// Creates an assignment.
    pub fn new(field: impl Into<String>, value: Expression) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }
}

/// Update.
#[derive(Debug, Clone)]
pub struct UpdateNode {
    /// Target table.
    pub table: Arc<TableMeta>,
    /// Assignments.
    pub assignments: Vec<UpdateAssignment>,
    /// Rows to update; exactly one input is expected.
    pub children: Vec<LogicalNode>,
}

impl UpdateNode {
    /// Creates an update of the rows produced by `input`.
    pub fn new(
        table: Arc<TableMeta>,
        assignments: Vec<UpdateAssignment>,
        input: LogicalNode,
    ) -> Self {
        Self {
            table,
            assignments,
            children: vec![input],
        }
    }
}

/// Explain.
#[derive(Debug, Clone)]
pub struct ExplainNode {
    /// Plan to describe.
    pub children: Vec<LogicalNode>,
}

impl ExplainNode {
    /// Creates an explain of `input`.
    pub fn new(input: LogicalNode) -> Self {
        Self {
            children: vec![input],
        }
    }
}

/// Inner join.
#[derive(Debug, Clone)]
pub struct JoinNode {
    /// Join condition; `None` for a cross product.
    pub condition: Option<Expression>,
    /// Left and right inputs; exactly two are expected.
    pub children: Vec<LogicalNode>,
}

impl JoinNode {
    /// Creates a join of `left` and `right`.
    pub fn new(left: LogicalNode, right: LogicalNode, condition: Option<Expression>) -> Self {
        Self {
            condition,
            children: vec![left, right],
        }
    }
}

/// Grouped aggregation.
#[derive(Debug, Clone)]
pub struct GroupByNode {
    /// Grouping keys.
    pub group_by: Vec<Expression>,
    /// Aggregates per group.
    pub aggregates: Vec<AggregateExpr>,
    /// Input.
    pub children: Vec<LogicalNode>,
}

/// Splits a predicate into its AND-ed parts.
pub fn extract_conjuncts(expr: &Expression) -> Vec<&Expression> {
    match expr {
        Expression::Conjunction {
            kind: ConjunctionType::And,
            children,
        } => children.iter().flat_map(extract_conjuncts).collect(),
        _ => vec![expr],
    }
}
