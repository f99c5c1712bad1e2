//! Compiled expression nodes.
//!
//! A parsed and validated MDX expression compiles to a tree of typed calcs. The root is wrapped in
//! a [`CompiledNode`] that records the source text and declared type, and exposes a uniform
//! [`CompiledNode::evaluate`] returning an [`EvalValue`]. Typed callers skip the wrapper and call
//! e.g. [`DoubleCalc::evaluate`] directly, getting `Option<f64>` back.
//!
//! Nodes are stateless: everything they read or write goes through the [`Evaluator`], so one tree
//! can be evaluated concurrently against separate evaluators.
mod evaluator;
mod member;
mod node;
mod scalar;
mod set;
mod types;
mod value;

pub use evaluator::{CellReader, Evaluator, RolapEvaluator};
pub use member::MemberCalc;
pub use node::{Calc, CalcRef, CompiledNode};
pub use scalar::{Aggregation, ArithOp, DoubleCalc, IntegerCalc, StringCalc, VoidCalc};
pub use set::{TupleIterableCalc, TupleListCalc};
pub use types::{ExprType, ResultKind, ResultStyle};
pub use value::{EvalValue, Tuple, TupleIter, TupleIterable, TupleList};
