//! Column constraints rendered into WHERE clauses.
use crate::sql::dialect::Dialect;
use crate::sql::star::StarColumn;
use crate::value::Value;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bound {
    pub value: Value,
    pub inclusive: bool,
}

impl Bound {
    pub fn inclusive(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            inclusive: true,
        }
    }

    pub fn exclusive(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            inclusive: false,
        }
    }
}

/// Constraint on the value of a single column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StarPredicate {
    True,
    False,
    /// `Equals(Value::Null)` renders as `is null`.
    Equals(Value),
    In(Vec<Value>),
    Range {
        lower: Option<Bound>,
        upper: Option<Bound>,
    },
    Not(Box<StarPredicate>),
    And(Vec<StarPredicate>),
    Or(Vec<StarPredicate>),
}

impl StarPredicate {
    pub fn is_true(&self) -> bool {
        matches!(self, StarPredicate::True)
    }

    pub fn is_false(&self) -> bool {
        matches!(self, StarPredicate::False)
    }

    /// Conjunction, dropping `True` operands and collapsing to `False` if any operand is `False`.
    pub fn and(predicates: impl IntoIterator<Item = StarPredicate>) -> StarPredicate {
        let mut kept = Vec::new();
        for predicate in predicates {
            match predicate {
                StarPredicate::True => {}
                StarPredicate::False => return StarPredicate::False,
                StarPredicate::And(inner) => kept.extend(inner),
                other => kept.push(other),
            }
        }
        match kept.len() {
            0 => StarPredicate::True,
            1 => kept.pop().unwrap_or(StarPredicate::True),
            _ => StarPredicate::And(kept),
        }
    }

    /// Disjunction, dropping `False` operands and collapsing to `True` if any operand is `True`.
    pub fn or(predicates: impl IntoIterator<Item = StarPredicate>) -> StarPredicate {
        let mut kept = Vec::new();
        for predicate in predicates {
            match predicate {
                StarPredicate::False => {}
                StarPredicate::True => return StarPredicate::True,
                StarPredicate::Or(inner) => kept.extend(inner),
                other => kept.push(other),
            }
        }
        match kept.len() {
            0 => StarPredicate::False,
            1 => kept.pop().unwrap_or(StarPredicate::False),
            _ => StarPredicate::Or(kept),
        }
    }

    /// Renders the predicate applied to the SQL expression `expr`.
    pub fn to_sql(&self, expr: &str, dialect: &dyn Dialect) -> String {
        match self {
            StarPredicate::True => "1 = 1".to_string(),
            StarPredicate::False => "1 = 0".to_string(),
            StarPredicate::Equals(Value::Null) => format!("{expr} is null"),
            StarPredicate::Equals(value) => {
                format!("{expr} = {}", dialect.quote_literal(value))
            }
            StarPredicate::In(values) => {
                let has_null = values.iter().any(Value::is_null);
                let literals: Vec<String> = values
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(|v| dialect.quote_literal(v))
                    .collect();
                let list = match literals.len() {
                    0 => None,
                    1 => Some(format!("{expr} = {}", literals[0])),
                    _ => Some(format!("{expr} in ({})", literals.join(", "))),
                };
                match (list, has_null) {
                    (None, false) => StarPredicate::False.to_sql(expr, dialect),
                    (None, true) => format!("{expr} is null"),
                    (Some(list), false) => list,
                    (Some(list), true) => format!("({list} or {expr} is null)"),
                }
            }
            StarPredicate::Range { lower, upper } => {
                let mut parts = Vec::new();
                if let Some(bound) = lower {
                    let op = if bound.inclusive { ">=" } else { ">" };
                    parts.push(format!("{expr} {op} {}", dialect.quote_literal(&bound.value)));
                }
                if let Some(bound) = upper {
                    let op = if bound.inclusive { "<=" } else { "<" };
                    parts.push(format!("{expr} {op} {}", dialect.quote_literal(&bound.value)));
                }
                match parts.len() {
                    0 => StarPredicate::True.to_sql(expr, dialect),
                    1 => parts.remove(0),
                    _ => format!("({})", parts.join(" and ")),
                }
            }
            StarPredicate::Not(inner) => format!("not ({})", inner.to_sql(expr, dialect)),
            StarPredicate::And(items) => join(items, " and ", expr, dialect),
            StarPredicate::Or(items) => join(items, " or ", expr, dialect),
        }
    }
}

fn join(items: &[StarPredicate], sep: &str, expr: &str, dialect: &dyn Dialect) -> String {
    let parts: Vec<String> = items.iter().map(|p| p.to_sql(expr, dialect)).collect();
    format!("({})", parts.join(sep))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnPredicate {
    pub column: StarColumn,
    pub predicate: StarPredicate,
}

impl ColumnPredicate {
    pub fn new(column: StarColumn, predicate: StarPredicate) -> Self {
        Self { column, predicate }
    }

    pub fn to_sql(&self, dialect: &dyn Dialect) -> String {
        self.predicate.to_sql(&self.column.to_sql(dialect), dialect)
    }
}

/// Predicate spanning several columns, such as a slicer over a compound member set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompoundPredicate {
    Column(ColumnPredicate),
    And(Vec<CompoundPredicate>),
    Or(Vec<CompoundPredicate>),
}

impl CompoundPredicate {
    /// Calls `f` with every column referenced, so the caller can register its table.
    pub fn for_each_column<'a>(&'a self, f: &mut dyn FnMut(&'a StarColumn)) {
        match self {
            CompoundPredicate::Column(p) => f(&p.column),
            CompoundPredicate::And(items) | CompoundPredicate::Or(items) => {
                for item in items {
                    item.for_each_column(f);
                }
            }
        }
    }

    pub fn to_sql(&self, dialect: &dyn Dialect) -> String {
        match self {
            CompoundPredicate::Column(p) => p.to_sql(dialect),
            CompoundPredicate::And(items) if items.is_empty() => "1 = 1".to_string(),
            CompoundPredicate::Or(items) if items.is_empty() => "1 = 0".to_string(),
            CompoundPredicate::And(items) => {
                let parts: Vec<String> = items.iter().map(|p| p.to_sql(dialect)).collect();
                format!("({})", parts.join(" and "))
            }
            CompoundPredicate::Or(items) => {
                let parts: Vec<String> = items.iter().map(|p| p.to_sql(dialect)).collect();
                format!("({})", parts.join(" or "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::dialect::GenericDialect;

    fn render(p: &StarPredicate) -> String {
        p.to_sql("x", &GenericDialect::default())
    }

    #[test]
    fn renders_null_aware_in_lists() {
        assert_eq!(render(&StarPredicate::Equals(Value::Null)), "x is null");
        assert_eq!(render(&StarPredicate::In(vec![Value::from(1)])), "x = 1");
        assert_eq!(
            render(&StarPredicate::In(vec![Value::from("a"), Value::from("b'c")])),
            "x in ('a', 'b''c')"
        );
        assert_eq!(
            render(&StarPredicate::In(vec![Value::from(1), Value::from(2), Value::Null])),
            "(x in (1, 2) or x is null)"
        );
        assert_eq!(render(&StarPredicate::In(Vec::new())), "1 = 0");
    }

    #[test]
    fn renders_ranges() {
        let p = StarPredicate::Range {
            lower: Some(Bound::inclusive(1)),
            upper: Some(Bound::exclusive(2.5)),
        };
        assert_eq!(render(&p), "(x >= 1 and x < 2.5)");
        let p = StarPredicate::Range {
            lower: None,
            upper: Some(Bound::inclusive(10)),
        };
        assert_eq!(render(&p), "x <= 10");
    }

    #[test]
    fn simplifies_literals() {
        let eq = StarPredicate::Equals(Value::from(1));
        assert_eq!(
            StarPredicate::and([StarPredicate::True, eq.clone()]),
            eq.clone()
        );
        assert_eq!(
            StarPredicate::and([eq.clone(), StarPredicate::False]),
            StarPredicate::False
        );
        assert_eq!(StarPredicate::or([eq.clone(), StarPredicate::True]), StarPredicate::True);
        assert_eq!(StarPredicate::or(Vec::new()), StarPredicate::False);
        assert_eq!(render(&StarPredicate::Not(Box::new(eq))), "not (x = 1)");
    }
}
