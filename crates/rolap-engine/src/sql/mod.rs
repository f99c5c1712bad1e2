//! SQL generation for drill-through and cell-loading requests against a star schema.
mod dialect;
mod predicate;
mod query;
mod query_spec;
mod star;

pub use dialect::{Dialect, DialectConfig, GenericDialect};
pub use predicate::{Bound, ColumnPredicate, CompoundPredicate, StarPredicate};
pub use query::{SqlQuery, SqlType};
pub use query_spec::{
    ConstrainedColumn, DrillThroughQuerySpec, DrillThroughRequest, QuerySpec, SegmentQuerySpec,
    SegmentRequest,
};
pub use star::{Aggregator, ColumnExpr, Star, StarColumn, StarJoin, StarMeasure, StarTable};
