use crate::error::{OlapError, OlapResult};
use crate::schema::Member;
use std::fmt;
use std::sync::Arc;

/// One member per hierarchy of a set; the arity is fixed within a set.
pub type Tuple = Vec<Arc<Member>>;

/// A materialized, ordered list of tuples.
///
/// No rows is an empty list, never an absent one. Whether the caller may reuse the storage is
/// part of the type: a `Shared` list must be copied before it is changed.
#[derive(Clone, Debug, PartialEq)]
pub enum TupleList {
    Shared(Arc<[Tuple]>),
    Mutable(Vec<Tuple>),
}

impl TupleList {
    pub fn empty() -> Self {
        TupleList::Mutable(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn is_mutable(&self) -> bool {
        matches!(self, TupleList::Mutable(_))
    }

    pub fn as_slice(&self) -> &[Tuple] {
        match self {
            TupleList::Shared(tuples) => tuples,
            TupleList::Mutable(tuples) => tuples,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tuple> {
        self.as_slice().iter()
    }

    /// Takes ownership of the tuples, copying only when the list is shared.
    pub fn into_mutable(self) -> Vec<Tuple> {
        match self {
            TupleList::Shared(tuples) => tuples.to_vec(),
            TupleList::Mutable(tuples) => tuples,
        }
    }

    /// Members of a list of 1-tuples.
    pub fn members(&self) -> Vec<Arc<Member>> {
        self.iter().filter_map(|t| t.first().cloned()).collect()
    }
}

impl From<Vec<Tuple>> for TupleList {
    fn from(tuples: Vec<Tuple>) -> Self {
        TupleList::Mutable(tuples)
    }
}

impl IntoIterator for TupleList {
    type Item = Tuple;
    type IntoIter = std::vec::IntoIter<Tuple>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_mutable().into_iter()
    }
}

pub type TupleIter = Box<dyn Iterator<Item = Tuple> + Send>;

/// A finite sequence of tuples that may be computed lazily.
///
/// Every list is iterable; a lazy iterable only becomes a list through [`TupleIterable::into_list`].
pub enum TupleIterable {
    List(TupleList),
    Lazy(TupleIter),
}

impl TupleIterable {
    pub fn into_list(self) -> TupleList {
        match self {
            TupleIterable::List(list) => list,
            TupleIterable::Lazy(iter) => TupleList::Mutable(iter.collect()),
        }
    }
}

impl IntoIterator for TupleIterable {
    type Item = Tuple;
    type IntoIter = TupleIter;

    fn into_iter(self) -> Self::IntoIter {
        match self {
            TupleIterable::List(list) => Box::new(list.into_iter()),
            TupleIterable::Lazy(iter) => iter,
        }
    }
}

impl fmt::Debug for TupleIterable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TupleIterable::List(list) => f.debug_tuple("List").field(list).finish(),
            TupleIterable::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// Result of the generic [`CompiledNode::evaluate`](crate::CompiledNode::evaluate) entry point.
///
/// A scalar node that has no value yields `Null`; null is never encoded as a number here.
#[derive(Debug)]
pub enum EvalValue {
    Null,
    Double(f64),
    Integer(i64),
    Member(Arc<Member>),
    String(String),
    Void,
    TupleList(TupleList),
    TupleIterable(TupleIterable),
}

impl EvalValue {
    pub fn from_double(value: Option<f64>) -> Self {
        value.map_or(EvalValue::Null, EvalValue::Double)
    }

    pub fn from_integer(value: Option<i64>) -> Self {
        value.map_or(EvalValue::Null, EvalValue::Integer)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, EvalValue::Null)
    }

    pub fn as_double(&self) -> OlapResult<Option<f64>> {
        match self {
            EvalValue::Null => Ok(None),
            EvalValue::Double(v) => Ok(Some(*v)),
            EvalValue::Integer(v) => Ok(Some(*v as f64)),
            other => Err(OlapError::Eval(format!("expected a number, got {other:?}"))),
        }
    }

    pub fn as_integer(&self) -> OlapResult<Option<i64>> {
        match self {
            EvalValue::Null => Ok(None),
            EvalValue::Integer(v) => Ok(Some(*v)),
            other => Err(OlapError::Eval(format!(
                "expected an integer, got {other:?}"
            ))),
        }
    }

    pub fn into_member(self) -> OlapResult<Arc<Member>> {
        match self {
            EvalValue::Member(member) => Ok(member),
            other => Err(OlapError::Eval(format!("expected a member, got {other:?}"))),
        }
    }

    /// Any tuple-valued result as a list.
    pub fn into_tuple_list(self) -> OlapResult<TupleList> {
        match self {
            EvalValue::TupleList(list) => Ok(list),
            EvalValue::TupleIterable(iterable) => Ok(iterable.into_list()),
            other => Err(OlapError::Eval(format!("expected a set, got {other:?}"))),
        }
    }
}
