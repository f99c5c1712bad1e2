use crate::value::Value;

pub type OlapResult<T> = Result<T, OlapError>;

#[derive(Debug, thiserror::Error)]
pub enum OlapError {
    /// A compiler or caller broke a construction-time contract (wrong declared type for a node
    /// kind, mismatched levels in a range query, ...).
    #[error("contract violation: {0}")]
    Contract(String),

    #[error("evaluation error: {0}")]
    Eval(String),

    #[error("division by zero")]
    DivideByZero,

    #[error("no binding for variable {0}")]
    MissingBinding(String),

    #[error("no current member for hierarchy {0}")]
    MissingContext(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("hierarchy {hierarchy} has no root members")]
    EmptyHierarchy { hierarchy: String },

    #[error("unknown level depth {depth} in hierarchy {hierarchy}")]
    UnknownLevel { hierarchy: String, depth: usize },

    #[error("member {member} in hierarchy {hierarchy} references a parent that was not loaded before it")]
    UnknownParent { hierarchy: String, member: String },

    #[error(
        "ragged hierarchy {hierarchy}: member {member} is at depth {depth}, expected {expected}"
    )]
    RaggedHierarchy {
        hierarchy: String,
        member: String,
        depth: usize,
        expected: usize,
    },

    #[error("duplicate member key {key} in hierarchy {hierarchy}")]
    DuplicateMemberKey { hierarchy: String, key: Value },

    #[error("cannot derive a column alias from {candidate:?} within {max_length} characters")]
    InvalidAlias {
        candidate: String,
        max_length: usize,
    },

    #[error("measure index {index} out of range ({count} measures declared)")]
    UnknownMeasureIndex { index: usize, count: usize },

    #[error("configuration error: {0}")]
    Config(String),
}

impl OlapError {
    /// Dialect/configuration faults, as opposed to errors caused by the data being queried.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            OlapError::InvalidAlias { .. }
                | OlapError::UnknownMeasureIndex { .. }
                | OlapError::Config(_)
        )
    }

    pub(crate) fn contract(message: impl Into<String>) -> Self {
        OlapError::Contract(message.into())
    }
}

impl From<serde_json::Error> for OlapError {
    fn from(err: serde_json::Error) -> Self {
        OlapError::Config(err.to_string())
    }
}
