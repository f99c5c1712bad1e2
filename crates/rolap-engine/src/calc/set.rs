//! Tuple-list and tuple-iterable nodes.
use crate::calc::evaluator::Evaluator;
use crate::calc::member::MemberCalc;
use crate::calc::node::{with_context, CalcRef};
use crate::calc::scalar::DoubleCalc;
use crate::calc::types::ResultStyle;
use crate::calc::value::{Tuple, TupleIterable, TupleList};
use crate::error::{OlapError, OlapResult};
use crate::member::MemberReader;
use crate::schema::{Level, Member};
use std::cmp::Ordering;
use std::sync::Arc;

/// Node producing a materialized list of tuples.
#[derive(Clone, Debug)]
pub enum TupleListCalc {
    /// Precomputed tuples shared by every evaluation.
    Literal(Arc<[Tuple]>),
    LevelMembers {
        hierarchy: String,
        depth: usize,
    },
    Children(Box<MemberCalc>),
    /// `start : end`, both members of the same level.
    Range {
        start: Box<MemberCalc>,
        end: Box<MemberCalc>,
    },
    /// Stable sort by `key`; null keys sort lowest.
    Order {
        set: Box<TupleListCalc>,
        key: Box<DoubleCalc>,
        descending: bool,
    },
    Materialize(Box<TupleIterableCalc>),
}

impl TupleListCalc {
    pub fn result_style(&self) -> ResultStyle {
        match self {
            TupleListCalc::Literal(_) => ResultStyle::List,
            _ => ResultStyle::MutableList,
        }
    }

    pub fn evaluate(&self, ev: &mut dyn Evaluator) -> OlapResult<TupleList> {
        match self {
            TupleListCalc::Literal(tuples) => Ok(TupleList::Shared(tuples.clone())),
            TupleListCalc::LevelMembers { hierarchy, depth } => {
                let reader = ev.member_reader(hierarchy)?;
                let level = level_at(reader.as_ref(), *depth)?;
                Ok(one_tuples(reader.get_members_in_level(&level)))
            }
            TupleListCalc::Children(calc) => {
                let member = calc.evaluate(ev)?;
                if member.is_null() {
                    return Ok(TupleList::empty());
                }
                let reader = ev.member_reader(member.hierarchy())?;
                Ok(one_tuples(reader.get_member_children(&member)))
            }
            TupleListCalc::Range { start, end } => {
                let start = start.evaluate(ev)?;
                let end = end.evaluate(ev)?;
                if start.is_null() || end.is_null() {
                    return Ok(TupleList::empty());
                }
                if start.hierarchy() != end.hierarchy() {
                    return Err(OlapError::contract(format!(
                        "range {start}:{end} spans two hierarchies"
                    )));
                }
                let reader = ev.member_reader(start.hierarchy())?;
                let level = level_at(reader.as_ref(), start.depth())?;
                Ok(one_tuples(reader.get_member_range(&level, &start, &end)?))
            }
            TupleListCalc::Order {
                set,
                key,
                descending,
            } => {
                let tuples = set.evaluate(ev)?.into_mutable();
                let mut keyed = Vec::with_capacity(tuples.len());
                for tuple in tuples {
                    let k = with_context(ev, &tuple, |ev| key.evaluate(ev))?;
                    keyed.push((k, tuple));
                }
                if *descending {
                    keyed.sort_by(|a, b| cmp_sort_key(b.0, a.0));
                } else {
                    keyed.sort_by(|a, b| cmp_sort_key(a.0, b.0));
                }
                Ok(TupleList::Mutable(
                    keyed.into_iter().map(|(_, tuple)| tuple).collect(),
                ))
            }
            TupleListCalc::Materialize(calc) => Ok(calc.evaluate(ev)?.into_list()),
        }
    }

    pub(crate) fn children(&self) -> Vec<CalcRef<'_>> {
        match self {
            TupleListCalc::Literal(_) | TupleListCalc::LevelMembers { .. } => Vec::new(),
            TupleListCalc::Children(calc) => vec![CalcRef::Member(calc)],
            TupleListCalc::Range { start, end } => {
                vec![CalcRef::Member(start), CalcRef::Member(end)]
            }
            TupleListCalc::Order { set, key, .. } => {
                vec![CalcRef::TupleList(set), CalcRef::Double(key)]
            }
            TupleListCalc::Materialize(calc) => vec![CalcRef::TupleIterable(calc)],
        }
    }
}

/// Node producing a possibly lazy sequence of tuples.
#[derive(Clone, Debug)]
pub enum TupleIterableCalc {
    FromList(Box<TupleListCalc>),
    /// Lazily scans the members of one level.
    LevelMembers {
        hierarchy: String,
        depth: usize,
    },
    /// Tuples for which `condition` is non-null and non-zero.
    Filter {
        set: Box<TupleIterableCalc>,
        condition: Box<DoubleCalc>,
    },
}

impl TupleIterableCalc {
    pub fn result_style(&self) -> ResultStyle {
        match self {
            TupleIterableCalc::FromList(calc) => calc.result_style(),
            TupleIterableCalc::LevelMembers { .. } => ResultStyle::Iterable,
            TupleIterableCalc::Filter { .. } => ResultStyle::MutableList,
        }
    }

    pub fn evaluate(&self, ev: &mut dyn Evaluator) -> OlapResult<TupleIterable> {
        match self {
            TupleIterableCalc::FromList(calc) => Ok(TupleIterable::List(calc.evaluate(ev)?)),
            TupleIterableCalc::LevelMembers { hierarchy, depth } => {
                let reader = ev.member_reader(hierarchy)?;
                level_at(reader.as_ref(), *depth)?;
                let depth = *depth;
                let members = reader.all_members();
                Ok(TupleIterable::Lazy(Box::new(
                    (0..members.len()).filter_map(move |i| {
                        let member = &members[i];
                        (member.depth() == depth).then(|| vec![Arc::clone(member)])
                    }),
                )))
            }
            TupleIterableCalc::Filter { set, condition } => {
                let mut kept = Vec::new();
                for tuple in set.evaluate(ev)? {
                    let keep = with_context(ev, &tuple, |ev| condition.evaluate(ev))?;
                    if keep.is_some_and(|v| v != 0.0) {
                        kept.push(tuple);
                    }
                }
                Ok(TupleIterable::List(TupleList::Mutable(kept)))
            }
        }
    }

    pub(crate) fn children(&self) -> Vec<CalcRef<'_>> {
        match self {
            TupleIterableCalc::FromList(calc) => vec![CalcRef::TupleList(calc)],
            TupleIterableCalc::LevelMembers { .. } => Vec::new(),
            TupleIterableCalc::Filter { set, condition } => {
                vec![CalcRef::TupleIterable(set), CalcRef::Double(condition)]
            }
        }
    }
}

fn level_at(reader: &dyn MemberReader, depth: usize) -> OlapResult<Level> {
    let hierarchy = reader.hierarchy();
    hierarchy
        .level(depth)
        .cloned()
        .ok_or_else(|| OlapError::UnknownLevel {
            hierarchy: hierarchy.name().to_string(),
            depth,
        })
}

fn one_tuples(members: Vec<Arc<Member>>) -> TupleList {
    TupleList::Mutable(members.into_iter().map(|m| vec![m]).collect())
}

fn cmp_sort_key(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.total_cmp(&b),
    }
}
