//! EXPLAIN.

use std::sync::Arc;

use super::{OperatorBase, OperatorKind, PhysicalOperator};
use crate::error::ExecResult;
use crate::tuple::{RowTuple, TupleCellSpec, TupleRef};
use crate::txn::Transaction;
use crate::value::Value;

/// Renders an operator tree, one operator per line.
///
/// ```text
/// OPERATOR(NAME)
/// PROJECT(t.a)
/// └─JOIN(HASH, t.a = u.a)
///   ├─TABLE_SCAN(t)
///   └─TABLE_SCAN(u)
/// ```
pub fn explain_tree(root: &dyn PhysicalOperator) -> String {
    let mut out = String::from("OPERATOR(NAME)\n");
    write_node(&mut out, root, "", "");
    out
}

fn write_node(out: &mut String, op: &dyn PhysicalOperator, first: &str, rest: &str) {
    out.push_str(first);
    out.push_str(op.name());
    let param = op.param();
    if !param.is_empty() {
        out.push('(');
        out.push_str(&param);
        out.push(')');
    }
    out.push('\n');

    let children = op.children();
    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        let (branch, indent) = if last { ("└─", "  ") } else { ("├─", "│ ") };
        write_node(
            out,
            &**child,
            &format!("{}{}", rest, branch),
            &format!("{}{}", rest, indent),
        );
    }
}

/// Produces one row holding the rendered plan of its child.
///
/// The child is described but never opened.
#[derive(Debug)]
pub struct ExplainPhysicalOperator {
    base: OperatorBase,
    buffer: RowTuple,
    emitted: bool,
    has_row: bool,
}

impl ExplainPhysicalOperator {
    /// Creates an explain whose output column is named `header`.
    pub fn new(header: impl Into<String>) -> Self {
        let specs: Arc<[TupleCellSpec]> = Arc::from(vec![TupleCellSpec::unqualified(header)]);
        Self {
            base: OperatorBase::new(),
            buffer: RowTuple::empty(specs),
            emitted: false,
            has_row: false,
        }
    }
}

impl PhysicalOperator for ExplainPhysicalOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Explain
    }

    fn base(&self) -> &OperatorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OperatorBase {
        &mut self.base
    }

    fn open(&mut self, _txn: &Transaction) -> ExecResult<()> {
        self.base.expect_children(OperatorKind::Explain, 1)?;
        self.emitted = false;
        self.has_row = false;
        Ok(())
    }

    fn next(&mut self) -> ExecResult<bool> {
        self.has_row = false;
        if self.emitted {
            return Ok(false);
        }
        let child = self.base.child(0)?;
        let text = explain_tree(&**child);
        self.buffer.set_values(vec![Value::String(text)]);
        self.emitted = true;
        self.has_row = true;
        Ok(true)
    }

    fn close(&mut self) -> ExecResult<()> {
        self.emitted = false;
        self.has_row = false;
        Ok(())
    }

    fn current_tuple(&self) -> Option<TupleRef<'_>> {
        self.has_row.then(|| TupleRef::row(&self.buffer))
    }
}
