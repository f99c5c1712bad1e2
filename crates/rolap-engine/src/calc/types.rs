use std::fmt;

/// Declared type of a compiled expression, as reported by the (external) validator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExprType {
    Numeric,
    Integer,
    Boolean,
    String,
    Member { hierarchy: Option<String> },
    Tuple { arity: usize },
    Set { arity: usize },
    Empty,
}

impl ExprType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ExprType::Numeric | ExprType::Integer)
    }

    pub fn is_set(&self) -> bool {
        matches!(self, ExprType::Set { .. })
    }
}

impl fmt::Display for ExprType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprType::Numeric => f.write_str("NUMERIC"),
            ExprType::Integer => f.write_str("INTEGER"),
            ExprType::Boolean => f.write_str("BOOLEAN"),
            ExprType::String => f.write_str("STRING"),
            ExprType::Member { hierarchy: None } => f.write_str("MEMBER"),
            ExprType::Member {
                hierarchy: Some(h),
            } => write!(f, "MEMBER<{h}>"),
            ExprType::Tuple { arity } => write!(f, "TUPLE<{arity}>"),
            ExprType::Set { arity } => write!(f, "SET<{arity}>"),
            ExprType::Empty => f.write_str("EMPTY"),
        }
    }
}

/// Shape of the value a compiled node produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResultKind {
    Double,
    Integer,
    Member,
    String,
    Void,
    TupleList,
    TupleIterable,
}

/// How a node's output may be consumed.
///
/// `List` outputs are shared and must be copied before any in-place change; `MutableList` outputs
/// belong to the caller, which may sort or truncate them directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResultStyle {
    /// Single-pass (or restartable) lazy sequence.
    Iterable,
    List,
    MutableList,
    /// Scalar that may be null.
    Value,
    /// Scalar that is never null.
    ValueNotNull,
}

impl ResultStyle {
    pub fn is_list(self) -> bool {
        matches!(self, ResultStyle::List | ResultStyle::MutableList)
    }
}
