//! Logical plan representation.
//!
//! The logical tree is produced by the planner front end and consumed once
//! by [`crate::planner::PhysicalOperatorGenerator`].

mod operator;

pub use operator::*;
