//! Numeric, string and void-valued nodes.
use crate::calc::evaluator::Evaluator;
use crate::calc::member::MemberCalc;
use crate::calc::node::{with_context, CalcRef};
use crate::calc::set::TupleIterableCalc;
use crate::error::{OlapError, OlapResult};
use crate::value::{format_number, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aggregation {
    Sum,
    Count,
    Avg,
    Min,
    Max,
}

/// Double-valued node. `None` is the logical null.
#[derive(Clone, Debug)]
pub enum DoubleCalc {
    Constant(Option<f64>),
    FromInteger(Box<IntegerCalc>),
    Negate(Box<DoubleCalc>),
    Arithmetic {
        op: ArithOp,
        left: Box<DoubleCalc>,
        right: Box<DoubleCalc>,
    },
    /// Value of the cell at the current context overridden by `members`.
    CellValue { members: Vec<MemberCalc> },
    Variable(String),
    /// First non-null operand.
    CoalesceEmpty(Vec<DoubleCalc>),
    /// `fallback` when `calc` fails with an evaluation error. Contract violations still propagate.
    IfError {
        calc: Box<DoubleCalc>,
        fallback: Box<DoubleCalc>,
    },
    /// Aggregates `value` evaluated with each tuple of `set` as context.
    Aggregate {
        func: Aggregation,
        set: Box<TupleIterableCalc>,
        value: Box<DoubleCalc>,
    },
}

impl DoubleCalc {
    pub fn evaluate(&self, ev: &mut dyn Evaluator) -> OlapResult<Option<f64>> {
        match self {
            DoubleCalc::Constant(value) => Ok(*value),
            DoubleCalc::FromInteger(calc) => Ok(calc.evaluate(ev)?.map(|v| v as f64)),
            DoubleCalc::Negate(calc) => Ok(calc.evaluate(ev)?.map(|v| -v)),
            DoubleCalc::Arithmetic { op, left, right } => {
                let left = left.evaluate(ev)?;
                let right = right.evaluate(ev)?;
                double_arithmetic(*op, left, right)
            }
            DoubleCalc::CellValue { members } => {
                let members = members
                    .iter()
                    .map(|m| m.evaluate(ev))
                    .collect::<OlapResult<Vec<_>>>()?;
                with_context(ev, &members, |ev| ev.cell_value())
            }
            DoubleCalc::Variable(name) => match ev.variable(name) {
                None => Err(OlapError::MissingBinding(name.clone())),
                Some(Value::Null) => Ok(None),
                Some(Value::Number(n)) => Ok(Some(n.0)),
                Some(other) => Err(OlapError::Eval(format!(
                    "variable {name} holds non-numeric value {other}"
                ))),
            },
            DoubleCalc::CoalesceEmpty(calcs) => {
                for calc in calcs {
                    if let Some(value) = calc.evaluate(ev)? {
                        return Ok(Some(value));
                    }
                }
                Ok(None)
            }
            DoubleCalc::IfError { calc, fallback } => match calc.evaluate(ev) {
                Err(err) if matches!(err, OlapError::Contract(_)) || err.is_configuration() => {
                    Err(err)
                }
                Err(err) => {
                    log::trace!("substituting fallback after evaluation error: {err}");
                    fallback.evaluate(ev)
                }
                ok => ok,
            },
            DoubleCalc::Aggregate { func, set, value } => {
                let tuples = set.evaluate(ev)?;
                let mut acc = Accumulator::new(*func);
                for tuple in tuples {
                    acc.push(with_context(ev, &tuple, |ev| value.evaluate(ev))?);
                }
                Ok(acc.finish())
            }
        }
    }

    pub(crate) fn children(&self) -> Vec<CalcRef<'_>> {
        match self {
            DoubleCalc::Constant(_) | DoubleCalc::Variable(_) => Vec::new(),
            DoubleCalc::FromInteger(calc) => vec![CalcRef::Integer(calc)],
            DoubleCalc::Negate(calc) => vec![CalcRef::Double(calc)],
            DoubleCalc::Arithmetic { left, right, .. } => {
                vec![CalcRef::Double(left), CalcRef::Double(right)]
            }
            DoubleCalc::CellValue { members } => members.iter().map(CalcRef::Member).collect(),
            DoubleCalc::CoalesceEmpty(calcs) => calcs.iter().map(CalcRef::Double).collect(),
            DoubleCalc::IfError { calc, fallback } => {
                vec![CalcRef::Double(calc), CalcRef::Double(fallback)]
            }
            DoubleCalc::Aggregate { set, value, .. } => {
                vec![CalcRef::TupleIterable(set), CalcRef::Double(value)]
            }
        }
    }
}

/// Null handling follows MDX: a null operand of `+`/`-` counts as zero unless both are null, and
/// any null operand of `*`/`/` makes the result null.
fn double_arithmetic(
    op: ArithOp,
    left: Option<f64>,
    right: Option<f64>,
) -> OlapResult<Option<f64>> {
    match op {
        ArithOp::Add | ArithOp::Sub => {
            if left.is_none() && right.is_none() {
                return Ok(None);
            }
            let (l, r) = (left.unwrap_or(0.0), right.unwrap_or(0.0));
            Ok(Some(if op == ArithOp::Add { l + r } else { l - r }))
        }
        ArithOp::Mul => Ok(left.zip(right).map(|(l, r)| l * r)),
        ArithOp::Div => match (left, right) {
            (Some(_), Some(r)) if r == 0.0 => Err(OlapError::DivideByZero),
            (Some(l), Some(r)) => Ok(Some(l / r)),
            _ => Ok(None),
        },
    }
}

struct Accumulator {
    func: Aggregation,
    count: usize,
    sum: f64,
    extreme: Option<f64>,
}

impl Accumulator {
    fn new(func: Aggregation) -> Self {
        Self {
            func,
            count: 0,
            sum: 0.0,
            extreme: None,
        }
    }

    fn push(&mut self, value: Option<f64>) {
        let Some(value) = value else {
            return;
        };
        self.count += 1;
        self.sum += value;
        self.extreme = Some(match (self.func, self.extreme) {
            (_, None) => value,
            (Aggregation::Min, Some(cur)) => cur.min(value),
            (Aggregation::Max, Some(cur)) => cur.max(value),
            (_, Some(cur)) => cur,
        });
    }

    fn finish(self) -> Option<f64> {
        match self.func {
            Aggregation::Count => Some(self.count as f64),
            _ if self.count == 0 => None,
            Aggregation::Sum => Some(self.sum),
            Aggregation::Avg => Some(self.sum / self.count as f64),
            Aggregation::Min | Aggregation::Max => self.extreme,
        }
    }
}

/// Integer-valued node. `None` is the logical null.
#[derive(Clone, Debug)]
pub enum IntegerCalc {
    Constant(Option<i64>),
    Arithmetic {
        op: ArithOp,
        left: Box<IntegerCalc>,
        right: Box<IntegerCalc>,
    },
    /// Truncates toward zero.
    FromDouble(Box<DoubleCalc>),
    /// Ordinal of a member within its cache; null for the null member.
    Ordinal(Box<MemberCalc>),
    LevelDepth(Box<MemberCalc>),
    Count(Box<TupleIterableCalc>),
}

impl IntegerCalc {
    pub fn evaluate(&self, ev: &mut dyn Evaluator) -> OlapResult<Option<i64>> {
        match self {
            IntegerCalc::Constant(value) => Ok(*value),
            IntegerCalc::Arithmetic { op, left, right } => {
                let left = left.evaluate(ev)?;
                let right = right.evaluate(ev)?;
                integer_arithmetic(*op, left, right)
            }
            IntegerCalc::FromDouble(calc) => match calc.evaluate(ev)? {
                None => Ok(None),
                Some(v) if v.is_finite() && v.abs() < i64::MAX as f64 => Ok(Some(v.trunc() as i64)),
                Some(v) => Err(OlapError::Eval(format!("{v} is not representable as an integer"))),
            },
            IntegerCalc::Ordinal(calc) => {
                let member = calc.evaluate(ev)?;
                Ok((!member.is_null()).then(|| member.ordinal() as i64))
            }
            IntegerCalc::LevelDepth(calc) => {
                let member = calc.evaluate(ev)?;
                Ok((!member.is_null()).then(|| member.depth() as i64))
            }
            IntegerCalc::Count(set) => Ok(Some(set.evaluate(ev)?.into_iter().count() as i64)),
        }
    }

    pub(crate) fn children(&self) -> Vec<CalcRef<'_>> {
        match self {
            IntegerCalc::Constant(_) => Vec::new(),
            IntegerCalc::Arithmetic { left, right, .. } => {
                vec![CalcRef::Integer(left), CalcRef::Integer(right)]
            }
            IntegerCalc::FromDouble(calc) => vec![CalcRef::Double(calc)],
            IntegerCalc::Ordinal(calc) | IntegerCalc::LevelDepth(calc) => {
                vec![CalcRef::Member(calc)]
            }
            IntegerCalc::Count(set) => vec![CalcRef::TupleIterable(set)],
        }
    }
}

fn integer_arithmetic(
    op: ArithOp,
    left: Option<i64>,
    right: Option<i64>,
) -> OlapResult<Option<i64>> {
    let overflow = || OlapError::Eval(format!("integer overflow in {op:?}"));
    match op {
        ArithOp::Add | ArithOp::Sub => {
            if left.is_none() && right.is_none() {
                return Ok(None);
            }
            let (l, r) = (left.unwrap_or(0), right.unwrap_or(0));
            let result = if op == ArithOp::Add {
                l.checked_add(r)
            } else {
                l.checked_sub(r)
            };
            result.map(Some).ok_or_else(overflow)
        }
        ArithOp::Mul => match left.zip(right) {
            None => Ok(None),
            Some((l, r)) => l.checked_mul(r).map(Some).ok_or_else(overflow),
        },
        ArithOp::Div => match left.zip(right) {
            None => Ok(None),
            Some((_, 0)) => Err(OlapError::DivideByZero),
            Some((l, r)) => l.checked_div(r).map(Some).ok_or_else(overflow),
        },
    }
}

#[derive(Clone, Debug)]
pub enum StringCalc {
    Constant(String),
    Name(Box<MemberCalc>),
    UniqueName(Box<MemberCalc>),
    Concat(Vec<StringCalc>),
    /// Formats a number; a null number formats as the empty string.
    FormatNumber(Box<DoubleCalc>),
}

impl StringCalc {
    pub fn evaluate(&self, ev: &mut dyn Evaluator) -> OlapResult<String> {
        match self {
            StringCalc::Constant(s) => Ok(s.clone()),
            StringCalc::Name(calc) => Ok(calc.evaluate(ev)?.name().to_string()),
            StringCalc::UniqueName(calc) => Ok(calc.evaluate(ev)?.unique_name().to_string()),
            StringCalc::Concat(parts) => {
                let mut out = String::new();
                for part in parts {
                    out.push_str(&part.evaluate(ev)?);
                }
                Ok(out)
            }
            StringCalc::FormatNumber(calc) => {
                Ok(calc.evaluate(ev)?.map(format_number).unwrap_or_default())
            }
        }
    }

    pub(crate) fn children(&self) -> Vec<CalcRef<'_>> {
        match self {
            StringCalc::Constant(_) => Vec::new(),
            StringCalc::Name(calc) | StringCalc::UniqueName(calc) => vec![CalcRef::Member(calc)],
            StringCalc::Concat(parts) => parts.iter().map(CalcRef::String).collect(),
            StringCalc::FormatNumber(calc) => vec![CalcRef::Double(calc)],
        }
    }
}

/// Statement-like node evaluated for its side effects on the context.
#[derive(Clone, Debug)]
pub enum VoidCalc {
    Assign {
        variable: String,
        value: Box<DoubleCalc>,
    },
    Sequence(Vec<VoidCalc>),
}

impl VoidCalc {
    pub fn evaluate(&self, ev: &mut dyn Evaluator) -> OlapResult<()> {
        match self {
            VoidCalc::Assign { variable, value } => {
                let value = value.evaluate(ev)?.map_or(Value::Null, Value::from);
                ev.set_variable(variable, value);
                Ok(())
            }
            VoidCalc::Sequence(statements) => {
                for statement in statements {
                    statement.evaluate(ev)?;
                }
                Ok(())
            }
        }
    }

    pub(crate) fn children(&self) -> Vec<CalcRef<'_>> {
        match self {
            VoidCalc::Assign { value, .. } => vec![CalcRef::Double(value)],
            VoidCalc::Sequence(statements) => statements.iter().map(CalcRef::Void).collect(),
        }
    }
}
