use crate::calc::evaluator::Evaluator;
use crate::calc::member::MemberCalc;
use crate::calc::scalar::{DoubleCalc, IntegerCalc, StringCalc, VoidCalc};
use crate::calc::set::{TupleIterableCalc, TupleListCalc};
use crate::calc::types::{ExprType, ResultKind, ResultStyle};
use crate::calc::value::EvalValue;
use crate::error::{OlapError, OlapResult};
use crate::schema::Member;
use std::sync::Arc;

/// Typed body of a compiled node; one variant per result kind.
#[derive(Clone, Debug)]
pub enum Calc {
    Double(DoubleCalc),
    Integer(IntegerCalc),
    Member(MemberCalc),
    String(StringCalc),
    Void(VoidCalc),
    TupleList(TupleListCalc),
    TupleIterable(TupleIterableCalc),
}

impl Calc {
    pub fn as_calc_ref(&self) -> CalcRef<'_> {
        match self {
            Calc::Double(c) => CalcRef::Double(c),
            Calc::Integer(c) => CalcRef::Integer(c),
            Calc::Member(c) => CalcRef::Member(c),
            Calc::String(c) => CalcRef::String(c),
            Calc::Void(c) => CalcRef::Void(c),
            Calc::TupleList(c) => CalcRef::TupleList(c),
            Calc::TupleIterable(c) => CalcRef::TupleIterable(c),
        }
    }
}

/// Borrowed view of any calc, used to walk a compiled tree without knowing its node kinds.
#[derive(Clone, Copy, Debug)]
pub enum CalcRef<'a> {
    Double(&'a DoubleCalc),
    Integer(&'a IntegerCalc),
    Member(&'a MemberCalc),
    String(&'a StringCalc),
    Void(&'a VoidCalc),
    TupleList(&'a TupleListCalc),
    TupleIterable(&'a TupleIterableCalc),
}

impl<'a> CalcRef<'a> {
    pub fn result_kind(self) -> ResultKind {
        match self {
            CalcRef::Double(_) => ResultKind::Double,
            CalcRef::Integer(_) => ResultKind::Integer,
            CalcRef::Member(_) => ResultKind::Member,
            CalcRef::String(_) => ResultKind::String,
            CalcRef::Void(_) => ResultKind::Void,
            CalcRef::TupleList(_) => ResultKind::TupleList,
            CalcRef::TupleIterable(_) => ResultKind::TupleIterable,
        }
    }

    pub fn result_style(self) -> ResultStyle {
        match self {
            CalcRef::Double(_) | CalcRef::Integer(_) | CalcRef::Void(_) => ResultStyle::Value,
            CalcRef::Member(_) | CalcRef::String(_) => ResultStyle::ValueNotNull,
            CalcRef::TupleList(c) => c.result_style(),
            CalcRef::TupleIterable(c) => c.result_style(),
        }
    }

    /// Direct operands, in evaluation order.
    pub fn children(self) -> Vec<CalcRef<'a>> {
        match self {
            CalcRef::Double(c) => c.children(),
            CalcRef::Integer(c) => c.children(),
            CalcRef::Member(c) => c.children(),
            CalcRef::String(c) => c.children(),
            CalcRef::Void(c) => c.children(),
            CalcRef::TupleList(c) => c.children(),
            CalcRef::TupleIterable(c) => c.children(),
        }
    }
}

/// Root of a compiled expression.
///
/// Immutable after construction. The constructor checks that the declared type fits the node kind;
/// a mismatch means the compiler is broken and is reported as [`OlapError::Contract`].
#[derive(Clone, Debug)]
pub struct CompiledNode {
    source: Arc<str>,
    expr_type: ExprType,
    calc: Calc,
}

impl CompiledNode {
    pub fn new(source: impl Into<Arc<str>>, expr_type: ExprType, calc: Calc) -> OlapResult<Self> {
        let source = source.into();
        let fits = match &calc {
            Calc::Double(_) | Calc::Integer(_) => expr_type.is_numeric(),
            Calc::Member(_) => matches!(expr_type, ExprType::Member { .. }),
            Calc::String(_) => expr_type == ExprType::String,
            Calc::Void(_) => true,
            Calc::TupleList(_) | Calc::TupleIterable(_) => expr_type.is_set(),
        };
        if !fits {
            return Err(OlapError::contract(format!(
                "{:?}-valued node for `{source}` cannot have declared type {expr_type}",
                calc.as_calc_ref().result_kind()
            )));
        }
        Ok(Self {
            source,
            expr_type,
            calc,
        })
    }

    pub fn double(
        source: impl Into<Arc<str>>,
        expr_type: ExprType,
        calc: DoubleCalc,
    ) -> OlapResult<Self> {
        Self::new(source, expr_type, Calc::Double(calc))
    }

    pub fn integer(
        source: impl Into<Arc<str>>,
        expr_type: ExprType,
        calc: IntegerCalc,
    ) -> OlapResult<Self> {
        Self::new(source, expr_type, Calc::Integer(calc))
    }

    pub fn member(
        source: impl Into<Arc<str>>,
        expr_type: ExprType,
        calc: MemberCalc,
    ) -> OlapResult<Self> {
        Self::new(source, expr_type, Calc::Member(calc))
    }

    pub fn string(source: impl Into<Arc<str>>, calc: StringCalc) -> OlapResult<Self> {
        Self::new(source, ExprType::String, Calc::String(calc))
    }

    pub fn void(source: impl Into<Arc<str>>, calc: VoidCalc) -> OlapResult<Self> {
        Self::new(source, ExprType::Empty, Calc::Void(calc))
    }

    pub fn tuple_list(
        source: impl Into<Arc<str>>,
        expr_type: ExprType,
        calc: TupleListCalc,
    ) -> OlapResult<Self> {
        Self::new(source, expr_type, Calc::TupleList(calc))
    }

    pub fn tuple_iterable(
        source: impl Into<Arc<str>>,
        expr_type: ExprType,
        calc: TupleIterableCalc,
    ) -> OlapResult<Self> {
        Self::new(source, expr_type, Calc::TupleIterable(calc))
    }

    /// Expression text the node was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr_type(&self) -> &ExprType {
        &self.expr_type
    }

    pub fn calc(&self) -> &Calc {
        &self.calc
    }

    pub fn result_kind(&self) -> ResultKind {
        self.calc.as_calc_ref().result_kind()
    }

    pub fn result_style(&self) -> ResultStyle {
        self.calc.as_calc_ref().result_style()
    }

    pub fn children(&self) -> Vec<CalcRef<'_>> {
        self.calc.as_calc_ref().children()
    }

    /// Evaluates the node. Scalar nulls come back as [`EvalValue::Null`].
    pub fn evaluate(&self, ev: &mut dyn Evaluator) -> OlapResult<EvalValue> {
        match &self.calc {
            Calc::Double(c) => Ok(EvalValue::from_double(c.evaluate(ev)?)),
            Calc::Integer(c) => Ok(EvalValue::from_integer(c.evaluate(ev)?)),
            Calc::Member(c) => Ok(EvalValue::Member(c.evaluate(ev)?)),
            Calc::String(c) => Ok(EvalValue::String(c.evaluate(ev)?)),
            Calc::Void(c) => {
                c.evaluate(ev)?;
                Ok(EvalValue::Void)
            }
            Calc::TupleList(c) => Ok(EvalValue::TupleList(c.evaluate(ev)?)),
            Calc::TupleIterable(c) => Ok(EvalValue::TupleIterable(c.evaluate(ev)?)),
        }
    }
}

/// Runs `f` with `members` made current, restoring the previous context afterwards (also when `f`
/// fails).
pub(crate) fn with_context<T>(
    ev: &mut dyn Evaluator,
    members: &[Arc<Member>],
    f: impl FnOnce(&mut dyn Evaluator) -> OlapResult<T>,
) -> OlapResult<T> {
    let mut saved = Vec::with_capacity(members.len());
    for member in members {
        match ev.set_context(member.clone()) {
            Ok(previous) => saved.push(previous),
            Err(err) => {
                restore_context(ev, saved);
                return Err(err);
            }
        }
    }
    let result = f(&mut *ev);
    restore_context(ev, saved);
    result
}

fn restore_context(ev: &mut dyn Evaluator, saved: Vec<Arc<Member>>) {
    for previous in saved.into_iter().rev() {
        // Each hierarchy was accepted by `set_context` a moment ago.
        if let Err(err) = ev.set_context(previous) {
            log::warn!("failed to restore evaluation context: {err}");
        }
    }
}
