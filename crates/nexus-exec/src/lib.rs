//! # nexus-exec
//!
//! Physical execution layer for NexusDB.
//!
//! This crate turns a logical plan into a tree of physical operators and
//! runs that tree with the pull-based iterator protocol:
//!
//! - **Tuples**: owned rows produced by leaves and borrowed views passed upward
//! - **Operators**: scans, joins, filters, projections, sorts, aggregates, DML
//! - **Planner**: `PhysicalOperatorGenerator` with index and join-strategy selection
//! - **Storage**: the `TableStorage` seam and an in-memory implementation
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use nexus_exec::catalog::{AttrType, FieldMeta, IndexMeta, TableMeta};
//! use nexus_exec::expr::Expression;
//! use nexus_exec::logical::{LogicalNode, TableGetNode};
//! use nexus_exec::planner::PhysicalOperatorGenerator;
//! use nexus_exec::storage::{MemoryStorage, TableStorage};
//! use nexus_exec::txn::Transaction;
//! use nexus_exec::value::Value;
//!
//! # fn main() -> nexus_exec::ExecResult<()> {
//! let table = Arc::new(
//!     TableMeta::new("t")
//!         .with_field(FieldMeta::new("a", AttrType::Int))
//!         .with_index(IndexMeta::new("idx_a", ["a"])),
//! );
//! let storage = Arc::new(MemoryStorage::new());
//! storage.create_table(table.clone())?;
//! let txn = Transaction::new(1);
//! storage.insert(&table, vec![Value::int(7)], &txn)?;
//!
//! let plan = LogicalNode::TableGet(
//!     TableGetNode::new(table).with_predicate(Expression::eq(
//!         Expression::field("t", "a"),
//!         Expression::value(Value::int(7)),
//!     )),
//! );
//! let generator = PhysicalOperatorGenerator::new(storage);
//! let mut root = generator.create(plan)?;
//! root.open(&txn)?;
//! let mut rows = 0;
//! while root.next()? {
//!     rows += 1;
//! }
//! root.close()?;
//! assert_eq!(rows, 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod expr;
pub mod logical;
pub mod physical;
pub mod planner;
pub mod storage;
pub mod tuple;
pub mod txn;
pub mod value;

pub use config::ExecutorConfig;
pub use error::{ExecError, ExecResult};
pub use physical::{BoxedOperator, PhysicalOperator};
pub use planner::PhysicalOperatorGenerator;
pub use tuple::{RowTuple, Tuple, TupleRef};
pub use value::Value;
