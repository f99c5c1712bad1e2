use crate::calc::evaluator::Evaluator;
use crate::calc::node::CalcRef;
use crate::calc::scalar::IntegerCalc;
use crate::calc::set::TupleListCalc;
use crate::error::{OlapError, OlapResult};
use crate::schema::Member;
use std::sync::Arc;

/// Member-valued node. There is no null sentinel to translate: a hierarchy's null member is an
/// ordinary result.
#[derive(Clone, Debug)]
pub enum MemberCalc {
    Constant(Arc<Member>),
    CurrentMember {
        hierarchy: String,
    },
    DefaultMember {
        hierarchy: String,
    },
    Parent(Box<MemberCalc>),
    /// `Lead(n)`; `Lag(n)` compiles to a negated offset.
    Lead {
        member: Box<MemberCalc>,
        offset: Box<IntegerCalc>,
    },
    /// Member of `hierarchy` in the `index`-th tuple of `set`.
    Item {
        hierarchy: String,
        set: Box<TupleListCalc>,
        index: Box<IntegerCalc>,
    },
}

impl MemberCalc {
    pub fn evaluate(&self, ev: &mut dyn Evaluator) -> OlapResult<Arc<Member>> {
        match self {
            MemberCalc::Constant(member) => Ok(member.clone()),
            MemberCalc::CurrentMember { hierarchy } => ev.current_member(hierarchy),
            MemberCalc::DefaultMember { hierarchy } => {
                ev.member_reader(hierarchy)?.get_default_member()
            }
            MemberCalc::Parent(calc) => {
                let member = calc.evaluate(ev)?;
                let reader = ev.member_reader(member.hierarchy())?;
                Ok(reader.get_member_parent(&member))
            }
            MemberCalc::Lead { member, offset } => {
                let member = member.evaluate(ev)?;
                let offset = offset
                    .evaluate(ev)?
                    .ok_or_else(|| OlapError::Eval("lead/lag offset is null".to_string()))?;
                let reader = ev.member_reader(member.hierarchy())?;
                Ok(reader.get_lead_member(&member, offset))
            }
            MemberCalc::Item {
                hierarchy,
                set,
                index,
            } => {
                let list = set.evaluate(ev)?;
                let index = index.evaluate(ev)?;
                let tuple = index
                    .and_then(|i| usize::try_from(i).ok())
                    .and_then(|i| list.as_slice().get(i));
                match tuple {
                    None => Ok(ev.member_reader(hierarchy)?.null_member()),
                    Some(tuple) => tuple
                        .iter()
                        .find(|m| m.hierarchy() == hierarchy)
                        .cloned()
                        .ok_or_else(|| {
                            OlapError::Eval(format!("tuple has no member of hierarchy {hierarchy}"))
                        }),
                }
            }
        }
    }

    pub(crate) fn children(&self) -> Vec<CalcRef<'_>> {
        match self {
            MemberCalc::Constant(_)
            | MemberCalc::CurrentMember { .. }
            | MemberCalc::DefaultMember { .. } => Vec::new(),
            MemberCalc::Parent(calc) => vec![CalcRef::Member(calc)],
            MemberCalc::Lead { member, offset } => {
                vec![CalcRef::Member(member), CalcRef::Integer(offset)]
            }
            MemberCalc::Item { set, index, .. } => {
                vec![CalcRef::TupleList(set), CalcRef::Integer(index)]
            }
        }
    }
}
