mod common;

use common::{by_name, names, sales_evaluator};
use pretty_assertions::assert_eq;
use rolap_engine::{
    Aggregation, ArithOp, CompiledNode, DoubleCalc, EvalValue, Evaluator, ExprType, FlatMemberCache,
    IntegerCalc, MemberCalc, OlapError, ResultKind, ResultStyle, StringCalc, TupleIterableCalc,
    TupleList, TupleListCalc, Value, VoidCalc,
};
use std::sync::Arc;

fn constant(cache: &FlatMemberCache, name: &str) -> Box<MemberCalc> {
    Box::new(MemberCalc::Constant(by_name(cache, name)))
}

fn num(v: f64) -> Box<DoubleCalc> {
    Box::new(DoubleCalc::Constant(Some(v)))
}

fn null() -> Box<DoubleCalc> {
    Box::new(DoubleCalc::Constant(None))
}

fn arith(op: ArithOp, left: Box<DoubleCalc>, right: Box<DoubleCalc>) -> DoubleCalc {
    DoubleCalc::Arithmetic { op, left, right }
}

fn cities() -> TupleListCalc {
    TupleListCalc::LevelMembers {
        hierarchy: "Geography".to_string(),
        depth: 2,
    }
}

fn current_cell() -> Box<DoubleCalc> {
    Box::new(DoubleCalc::CellValue {
        members: Vec::new(),
    })
}

fn set_of(list: TupleListCalc) -> Box<TupleIterableCalc> {
    Box::new(TupleIterableCalc::FromList(Box::new(list)))
}

#[test]
fn null_double_comes_back_as_null() {
    let (mut ev, _, _) = sales_evaluator();
    let node =
        CompiledNode::double("[Measures].[Missing]", ExprType::Numeric, DoubleCalc::Constant(None))
            .unwrap();
    assert_eq!(node.source(), "[Measures].[Missing]");
    assert_eq!(node.result_kind(), ResultKind::Double);
    assert_eq!(node.result_style(), ResultStyle::Value);

    let value = node.evaluate(&mut ev).unwrap();
    assert!(value.is_null());
    let unwrapped = value.as_double().unwrap();
    assert_eq!(unwrapped, None);
    assert!(EvalValue::from_double(unwrapped).is_null());
}

#[test]
fn null_integer_comes_back_as_null() {
    let (mut ev, geography, _) = sales_evaluator();
    let node = CompiledNode::integer(
        "Geography.Parent.Ordinal",
        ExprType::Integer,
        IntegerCalc::Ordinal(Box::new(MemberCalc::Parent(constant(
            &geography,
            "All Geography",
        )))),
    )
    .unwrap();
    let value = node.evaluate(&mut ev).unwrap();
    assert!(value.is_null());
    assert_eq!(value.as_integer().unwrap(), None);
}

#[test]
fn declared_type_must_fit_the_node_kind() {
    let err = CompiledNode::double("1", ExprType::String, DoubleCalc::Constant(Some(1.0)))
        .unwrap_err();
    assert!(matches!(err, OlapError::Contract(_)), "{err}");

    let err = CompiledNode::member(
        "[Geography].CurrentMember",
        ExprType::Numeric,
        MemberCalc::CurrentMember {
            hierarchy: "Geography".to_string(),
        },
    )
    .unwrap_err();
    assert!(matches!(err, OlapError::Contract(_)), "{err}");

    let err = CompiledNode::tuple_list(
        "{}",
        ExprType::Integer,
        TupleListCalc::Literal(Arc::from(Vec::new())),
    )
    .unwrap_err();
    assert!(matches!(err, OlapError::Contract(_)), "{err}");

    assert!(CompiledNode::double("1", ExprType::Integer, DoubleCalc::Constant(Some(1.0))).is_ok());
    assert!(CompiledNode::member(
        "[Geography].CurrentMember",
        ExprType::Member { hierarchy: None },
        MemberCalc::CurrentMember {
            hierarchy: "Geography".to_string(),
        },
    )
    .is_ok());
}

#[test]
fn cell_value_reads_the_current_context() {
    let (mut ev, geography, _) = sales_evaluator();
    assert_eq!(DoubleCalc::CellValue { members: Vec::new() }.evaluate(&mut ev).unwrap(), None);

    let la = DoubleCalc::CellValue {
        members: vec![*constant(&geography, "LA")],
    };
    assert_eq!(la.evaluate(&mut ev).unwrap(), Some(20.0));
    // The tuple override is undone afterwards.
    assert_eq!(ev.current_member("Geography").unwrap().name(), "All Geography");
}

#[test]
fn arithmetic_null_rules() {
    let (mut ev, _, _) = sales_evaluator();
    let cases = [
        (arith(ArithOp::Add, null(), num(2.0)), Some(2.0)),
        (arith(ArithOp::Sub, num(5.0), null()), Some(5.0)),
        (arith(ArithOp::Add, null(), null()), None),
        (arith(ArithOp::Mul, null(), num(2.0)), None),
        (arith(ArithOp::Div, num(1.0), null()), None),
        (arith(ArithOp::Div, num(9.0), num(3.0)), Some(3.0)),
        (DoubleCalc::Negate(num(4.0)), Some(-4.0)),
        (DoubleCalc::Negate(null()), None),
    ];
    for (calc, expected) in cases {
        assert_eq!(calc.evaluate(&mut ev).unwrap(), expected, "{calc:?}");
    }
}

#[test]
fn division_by_zero_is_an_error_that_if_error_recovers() {
    let (mut ev, _, _) = sales_evaluator();
    let div = arith(ArithOp::Div, num(1.0), num(0.0));
    let err = div.evaluate(&mut ev).unwrap_err();
    assert!(matches!(err, OlapError::DivideByZero));

    let guarded = DoubleCalc::IfError {
        calc: Box::new(div),
        fallback: num(-1.0),
    };
    assert_eq!(guarded.evaluate(&mut ev).unwrap(), Some(-1.0));

    let err = IntegerCalc::Arithmetic {
        op: ArithOp::Div,
        left: Box::new(IntegerCalc::Constant(Some(1))),
        right: Box::new(IntegerCalc::Constant(Some(0))),
    }
    .evaluate(&mut ev)
    .unwrap_err();
    assert!(matches!(err, OlapError::DivideByZero));
}

#[test]
fn if_error_does_not_hide_contract_violations() {
    let (mut ev, geography, years) = sales_evaluator();
    let bad_range = TupleListCalc::Range {
        start: constant(&geography, "NYC"),
        end: constant(&years, "2022"),
    };
    let guarded = DoubleCalc::IfError {
        calc: Box::new(DoubleCalc::Aggregate {
            func: Aggregation::Sum,
            set: set_of(bad_range),
            value: current_cell(),
        }),
        fallback: num(0.0),
    };
    let err = guarded.evaluate(&mut ev).unwrap_err();
    assert!(matches!(err, OlapError::Contract(_)), "{err}");
}

#[test]
fn integer_nodes() {
    let (mut ev, geography, _) = sales_evaluator();
    let overflow = IntegerCalc::Arithmetic {
        op: ArithOp::Mul,
        left: Box::new(IntegerCalc::Constant(Some(i64::MAX))),
        right: Box::new(IntegerCalc::Constant(Some(2))),
    };
    assert!(matches!(overflow.evaluate(&mut ev).unwrap_err(), OlapError::Eval(_)));

    assert_eq!(
        IntegerCalc::FromDouble(num(2.7)).evaluate(&mut ev).unwrap(),
        Some(2)
    );
    assert!(IntegerCalc::FromDouble(num(f64::NAN)).evaluate(&mut ev).is_err());
    assert_eq!(
        IntegerCalc::LevelDepth(constant(&geography, "Toronto"))
            .evaluate(&mut ev)
            .unwrap(),
        Some(2)
    );

    let count = CompiledNode::integer(
        "Count([Geography].[City].Members)",
        ExprType::Integer,
        IntegerCalc::Count(set_of(cities())),
    )
    .unwrap();
    assert!(matches!(count.evaluate(&mut ev).unwrap(), EvalValue::Integer(3)));
    assert_eq!(
        DoubleCalc::FromInteger(Box::new(IntegerCalc::Count(set_of(cities()))))
            .evaluate(&mut ev)
            .unwrap(),
        Some(3.0)
    );
}

#[test]
fn empty_list_is_an_empty_list() {
    let (mut ev, geography, _) = sales_evaluator();
    let node = CompiledNode::tuple_list(
        "[Geography].[NYC].Children",
        ExprType::Set { arity: 1 },
        TupleListCalc::Children(constant(&geography, "NYC")),
    )
    .unwrap();
    let value = node.evaluate(&mut ev).unwrap();
    assert!(!value.is_null());
    let list = value.into_tuple_list().unwrap();
    assert!(list.is_empty());
    assert_eq!(list.len(), 0);
    assert_eq!(list.into_iter().count(), 0);

    let children_of_null = TupleListCalc::Children(Box::new(MemberCalc::Parent(constant(
        &geography,
        "All Geography",
    ))));
    assert!(children_of_null.evaluate(&mut ev).unwrap().is_empty());
}

#[test]
fn list_styles_are_declared_by_node_kind() {
    let (mut ev, geography, _) = sales_evaluator();
    let usa = by_name(&geography, "USA");
    let canada = by_name(&geography, "Canada");
    let literal = TupleListCalc::Literal(Arc::from(vec![vec![usa], vec![canada]]));
    assert_eq!(literal.result_style(), ResultStyle::List);
    let shared = literal.evaluate(&mut ev).unwrap();
    assert!(!shared.is_mutable());
    let copy = shared.clone().into_mutable();
    assert_eq!(names(&TupleList::from(copy).members()), vec!["USA", "Canada"]);
    assert_eq!(names(&shared.members()), vec!["USA", "Canada"]);

    assert_eq!(cities().result_style(), ResultStyle::MutableList);
    assert!(cities().evaluate(&mut ev).unwrap().is_mutable());

    let lazy = TupleIterableCalc::LevelMembers {
        hierarchy: "Geography".to_string(),
        depth: 1,
    };
    assert_eq!(lazy.result_style(), ResultStyle::Iterable);
    let node = CompiledNode::tuple_iterable(
        "[Geography].[Country].Members",
        ExprType::Set { arity: 1 },
        lazy,
    )
    .unwrap();
    assert_eq!(node.result_kind(), ResultKind::TupleIterable);
    let list = node.evaluate(&mut ev).unwrap().into_tuple_list().unwrap();
    assert_eq!(names(&list.members()), vec!["USA", "Canada"]);

    assert!(ResultStyle::List.is_list());
    assert!(!ResultStyle::Iterable.is_list());
}

#[test]
fn order_sorts_by_key_and_restores_context() {
    let (mut ev, _, _) = sales_evaluator();
    let order = TupleListCalc::Order {
        set: Box::new(cities()),
        key: current_cell(),
        descending: true,
    };
    let sorted = order.evaluate(&mut ev).unwrap();
    assert_eq!(names(&sorted.members()), vec!["LA", "NYC", "Toronto"]);
    assert_eq!(ev.current_member("Geography").unwrap().name(), "All Geography");

    // Cities without 2023 data tie at null and keep their order ahead of NYC.
    let (mut ev, _, years) = sales_evaluator();
    ev.set_context(by_name(&years, "2023")).unwrap();
    let ascending = TupleListCalc::Order {
        set: Box::new(cities()),
        key: current_cell(),
        descending: false,
    };
    assert_eq!(
        names(&ascending.evaluate(&mut ev).unwrap().members()),
        vec!["LA", "Toronto", "NYC"]
    );
}

#[test]
fn range_node_spans_branches() {
    let (mut ev, geography, _) = sales_evaluator();
    let range = TupleListCalc::Range {
        start: constant(&geography, "NYC"),
        end: constant(&geography, "Toronto"),
    };
    assert_eq!(names(&range.evaluate(&mut ev).unwrap().members()), vec!["NYC", "LA", "Toronto"]);
}

#[test]
fn member_navigation() {
    let (mut ev, geography, years) = sales_evaluator();
    let lead = MemberCalc::Lead {
        member: constant(&geography, "NYC"),
        offset: Box::new(IntegerCalc::Constant(Some(2))),
    };
    assert_eq!(lead.evaluate(&mut ev).unwrap().name(), "Toronto");

    let lag_off_end = MemberCalc::Lead {
        member: constant(&years, "2020"),
        offset: Box::new(IntegerCalc::Constant(Some(-1))),
    };
    assert!(lag_off_end.evaluate(&mut ev).unwrap().is_null());

    let null_offset = MemberCalc::Lead {
        member: constant(&years, "2020"),
        offset: Box::new(IntegerCalc::Constant(None)),
    };
    assert!(matches!(null_offset.evaluate(&mut ev).unwrap_err(), OlapError::Eval(_)));

    let parent = MemberCalc::Parent(constant(&geography, "LA"));
    assert_eq!(parent.evaluate(&mut ev).unwrap().name(), "USA");

    let default = MemberCalc::DefaultMember {
        hierarchy: "Time".to_string(),
    };
    assert_eq!(default.evaluate(&mut ev).unwrap().name(), "2022");

    let missing = MemberCalc::CurrentMember {
        hierarchy: "Product".to_string(),
    };
    assert!(matches!(
        missing.evaluate(&mut ev).unwrap_err(),
        OlapError::MissingContext(_)
    ));
}

#[test]
fn item_picks_a_tuple_or_the_null_member() {
    let (mut ev, _, _) = sales_evaluator();
    let item = |index: Option<i64>| MemberCalc::Item {
        hierarchy: "Geography".to_string(),
        set: Box::new(cities()),
        index: Box::new(IntegerCalc::Constant(index)),
    };
    assert_eq!(item(Some(1)).evaluate(&mut ev).unwrap().name(), "LA");
    assert!(item(Some(3)).evaluate(&mut ev).unwrap().is_null());
    assert!(item(Some(-1)).evaluate(&mut ev).unwrap().is_null());
    assert!(item(None).evaluate(&mut ev).unwrap().is_null());
}

#[test]
fn aggregates_over_sets() {
    let (mut ev, geography, _) = sales_evaluator();
    let aggregate = |func: Aggregation, set: TupleListCalc| DoubleCalc::Aggregate {
        func,
        set: set_of(set),
        value: current_cell(),
    };
    assert_eq!(aggregate(Aggregation::Sum, cities()).evaluate(&mut ev).unwrap(), Some(35.0));
    assert_eq!(aggregate(Aggregation::Count, cities()).evaluate(&mut ev).unwrap(), Some(3.0));
    assert_eq!(aggregate(Aggregation::Min, cities()).evaluate(&mut ev).unwrap(), Some(5.0));
    assert_eq!(aggregate(Aggregation::Max, cities()).evaluate(&mut ev).unwrap(), Some(20.0));
    let avg = aggregate(Aggregation::Avg, cities()).evaluate(&mut ev).unwrap().unwrap();
    assert!((avg - 35.0 / 3.0).abs() < 1e-12);

    let none = || TupleListCalc::Children(constant(&geography, "NYC"));
    assert_eq!(aggregate(Aggregation::Sum, none()).evaluate(&mut ev).unwrap(), None);
    assert_eq!(aggregate(Aggregation::Count, none()).evaluate(&mut ev).unwrap(), Some(0.0));
}

#[test]
fn filter_keeps_tuples_with_a_non_zero_condition() {
    let (mut ev, _, years) = sales_evaluator();
    let filter = TupleIterableCalc::Filter {
        set: set_of(cities()),
        condition: Box::new(DoubleCalc::CellValue {
            members: vec![MemberCalc::Constant(by_name(&years, "2023"))],
        }),
    };
    assert_eq!(filter.result_style(), ResultStyle::MutableList);
    let kept = TupleListCalc::Materialize(Box::new(filter))
        .evaluate(&mut ev)
        .unwrap();
    assert_eq!(names(&kept.members()), vec!["NYC"]);
    assert_eq!(ev.current_member("Time").unwrap().name(), "2022");
}

#[test]
fn strings() {
    let (mut ev, geography, _) = sales_evaluator();
    let calc = StringCalc::Concat(vec![
        StringCalc::Name(Box::new(MemberCalc::CurrentMember {
            hierarchy: "Geography".to_string(),
        })),
        StringCalc::Constant(": ".to_string()),
        StringCalc::FormatNumber(num(2.0)),
        StringCalc::FormatNumber(null()),
    ]);
    let node = CompiledNode::string("Name & \": \" & Format(2)", calc).unwrap();
    assert_eq!(node.result_style(), ResultStyle::ValueNotNull);
    match node.evaluate(&mut ev).unwrap() {
        EvalValue::String(s) => assert_eq!(s, "All Geography: 2"),
        other => panic!("expected a string, got {other:?}"),
    }

    let unique = StringCalc::UniqueName(constant(&geography, "Toronto"));
    assert_eq!(
        unique.evaluate(&mut ev).unwrap(),
        "[Geography].[All Geography].[Canada].[Toronto]"
    );
}

#[test]
fn assignments_bind_variables() {
    let (mut ev, _, _) = sales_evaluator();
    let program = CompiledNode::void(
        "x = 1 + NULL; y = NULL * 2",
        VoidCalc::Sequence(vec![
            VoidCalc::Assign {
                variable: "x".to_string(),
                value: Box::new(arith(ArithOp::Add, num(1.0), null())),
            },
            VoidCalc::Assign {
                variable: "y".to_string(),
                value: Box::new(arith(ArithOp::Mul, null(), num(2.0))),
            },
        ]),
    )
    .unwrap();
    assert!(matches!(program.evaluate(&mut ev).unwrap(), EvalValue::Void));
    assert_eq!(ev.variable("x"), Some(Value::from(1.0)));
    assert_eq!(ev.variable("y"), Some(Value::Null));

    assert_eq!(DoubleCalc::Variable("x".to_string()).evaluate(&mut ev).unwrap(), Some(1.0));
    assert_eq!(DoubleCalc::Variable("y".to_string()).evaluate(&mut ev).unwrap(), None);
    assert!(matches!(
        DoubleCalc::Variable("z".to_string()).evaluate(&mut ev).unwrap_err(),
        OlapError::MissingBinding(_)
    ));

    let coalesced = DoubleCalc::CoalesceEmpty(vec![
        DoubleCalc::Variable("y".to_string()),
        DoubleCalc::Variable("x".to_string()),
    ]);
    assert_eq!(coalesced.evaluate(&mut ev).unwrap(), Some(1.0));
}

#[test]
fn children_expose_the_operand_tree() {
    let node = CompiledNode::double(
        "Sum([Geography].[City].Members, [Measures].[Sales]) / 2",
        ExprType::Numeric,
        arith(
            ArithOp::Div,
            Box::new(DoubleCalc::Aggregate {
                func: Aggregation::Sum,
                set: set_of(cities()),
                value: current_cell(),
            }),
            num(2.0),
        ),
    )
    .unwrap();
    let kinds: Vec<ResultKind> = node.children().iter().map(|c| c.result_kind()).collect();
    assert_eq!(kinds, vec![ResultKind::Double, ResultKind::Double]);

    let aggregate = node.children()[0];
    let grandchildren: Vec<ResultKind> = aggregate
        .children()
        .iter()
        .map(|c| c.result_kind())
        .collect();
    assert_eq!(
        grandchildren,
        vec![ResultKind::TupleIterable, ResultKind::Double]
    );
    let set = aggregate.children()[0];
    assert_eq!(set.result_style(), ResultStyle::MutableList);
    assert_eq!(set.children()[0].result_kind(), ResultKind::TupleList);
    assert!(set.children()[0].children().is_empty());
}
