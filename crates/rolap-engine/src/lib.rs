//! Execution core of a relational OLAP engine: compiled expression nodes, the per-hierarchy member
//! cache they navigate, and SQL generation for drill-through and cell-loading requests.
#![forbid(unsafe_code)]

mod calc;
mod error;
mod member;
mod schema;
mod sql;
mod value;

pub use crate::error::{OlapError, OlapResult};
pub use crate::schema::{Hierarchy, Level, Member, MemberKey, MemberKind, NULL_ORDINAL};
pub use crate::value::Value;

pub use crate::member::{
    FlatMemberCache, InMemoryMemberSource, IncrementalMemberCache, MemberCacheWriter, MemberData,
    MemberReader, MemberSource,
};

pub use crate::calc::{
    Aggregation, ArithOp, Calc, CalcRef, CellReader, CompiledNode, DoubleCalc, EvalValue,
    Evaluator, ExprType, IntegerCalc, MemberCalc, ResultKind, ResultStyle, RolapEvaluator,
    StringCalc, Tuple, TupleIter, TupleIterable, TupleIterableCalc, TupleList, TupleListCalc,
    VoidCalc,
};

pub use crate::sql::{
    Aggregator, Bound, ColumnExpr, ColumnPredicate, CompoundPredicate, ConstrainedColumn, Dialect,
    DialectConfig, DrillThroughQuerySpec, DrillThroughRequest, GenericDialect, QuerySpec,
    SegmentQuerySpec, SegmentRequest, SqlQuery, SqlType, Star, StarColumn, StarJoin, StarMeasure,
    StarPredicate, StarTable,
};
