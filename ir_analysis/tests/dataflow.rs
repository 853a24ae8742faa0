use ir_analysis::{
    dataflow::{
        AvailableExpressions, ConstantPropagation, ConstantValue, DefinedVariables, Dominators,
        InitializedVariables, LiveVariables, ReachingDefinitions,
    },
    run, Analysis, DataFlowAnalysis,
};
use ir::Literal;
use pretty_assertions::assert_eq;

fn text<A: DataFlowAnalysis>(fixture: &str) -> String {
    let program = test_utility::load_program(fixture);
    let function = &program.functions[0];
    let analysis = Analysis::new(function.clone());
    let data = run::<A>(function, &analysis).unwrap();
    data.text(analysis.cfg().unwrap())
}

#[test]
fn test_reaching_definitions() {
    assert_eq!(
        text::<ReachingDefinitions>("cond-args"),
        "\
b1:
  in:  [arg.cond]
  out: [b1.a, b1.b, arg.cond]
left:
  in:  [b1.a, b1.b, arg.cond]
  out: [b1.a, left.b, left.c, arg.cond]
right:
  in:  [b1.a, b1.b, arg.cond]
  out: [right.a, b1.b, right.c, arg.cond]
end:
  in:  [b1.a, right.a, b1.b, left.b, left.c, right.c, arg.cond]
  out: [b1.a, right.a, b1.b, left.b, left.c, right.c, arg.cond, end.d]
"
    );
}

#[test]
fn test_live_variables() {
    assert_eq!(
        text::<LiveVariables>("cond-args"),
        "\
b1:
  in:  cond
  out: a
left:
  in:  a
  out: a, c
right:
  in:  ∅
  out: a, c
end:
  in:  a, c
  out: ∅
"
    );
}

#[test]
fn test_constant_propagation() {
    assert_eq!(
        text::<ConstantPropagation>("fact"),
        "\
b1:
  in:  ∅
  out: i: 8, result: 1
header:
  in:  cond: ?, i: ?, one: 1, result: ?, zero: 0
  out: cond: ?, i: ?, one: 1, result: ?, zero: 0
body:
  in:  cond: ?, i: ?, one: 1, result: ?, zero: 0
  out: cond: ?, i: ?, one: 1, result: ?, zero: 0
end:
  in:  cond: ?, i: ?, one: 1, result: ?, zero: 0
  out: cond: ?, i: ?, one: 1, result: ?, zero: 0
"
    );
}

#[test]
fn test_constant_propagation_dictionary() {
    let program = test_utility::load_program("fact");
    let function = &program.functions[0];
    let analysis = Analysis::new(function.clone());
    let data = ConstantPropagation::run(function, &analysis).unwrap();
    let dictionary = data.dictionary(analysis.cfg().unwrap());
    assert_eq!(
        dictionary["b1"].get("result"),
        Some(&ConstantValue::Constant(Literal::Int(1)))
    );
    assert_eq!(dictionary["end"].get("i"), Some(&ConstantValue::NonConstant));
    assert_eq!(dictionary.len(), 4);
}

#[test]
fn test_defined_and_initialized_variables() {
    assert_eq!(
        text::<DefinedVariables>("cond-args"),
        "\
b1:
  in:  ∅
  out: a, b
left:
  in:  a, b
  out: a, b, c
right:
  in:  a, b
  out: a, b, c
end:
  in:  a, b, c
  out: a, b, c, d
"
    );
    assert_eq!(
        text::<InitializedVariables>("cond-args"),
        "\
b1:
  in:  cond
  out: a, b, cond
left:
  in:  a, b, cond
  out: a, b, c, cond
right:
  in:  a, b, cond
  out: a, b, c, cond
end:
  in:  a, b, c, cond
  out: a, b, c, cond, d
"
    );
}

#[test]
fn test_available_expressions() {
    assert_eq!(
        text::<AvailableExpressions>("cond-args"),
        "\
b1:
  in:  ∅
  out: ∅
left:
  in:  ∅
  out: ∅
right:
  in:  ∅
  out: ∅
end:
  in:  ∅
  out: sub(a, c)
"
    );
}

#[test]
fn test_available_expressions_are_killed_by_redefinition() {
    let program = test_utility::load_program("loopcond+unreachable");
    let function = &program.functions[0];
    let analysis = Analysis::new(function.clone());
    let data = AvailableExpressions::run(function, &analysis).unwrap();
    let cfg = analysis.cfg().unwrap();
    let expressions = |value: Option<&std::collections::BTreeSet<_>>| -> Vec<String> {
        value.unwrap().iter().map(ToString::to_string).collect()
    };
    let id = |label: &str| cfg.block_id(label).unwrap();

    assert_eq!(expressions(data.in_value(id("then"))), ["lt(i, max)", "lt(i, mid)"]);
    // `then` redefines `x` right after computing `add x one`, `endif`
    // redefines `i`.
    assert_eq!(expressions(data.out_value(id("then"))), ["lt(i, max)", "lt(i, mid)"]);
    assert!(expressions(data.out_value(id("endif"))).is_empty());
    assert!(expressions(data.in_value(id("loop"))).is_empty());
}

#[test]
fn test_dominators_skip_unreachable_blocks() {
    let program = test_utility::load_program("loopcond+unreachable");
    let function = &program.functions[0];
    let analysis = Analysis::new(function.clone());
    let data = Dominators::run(function, &analysis).unwrap();
    let cfg = analysis.cfg().unwrap();
    let dictionary = data.dictionary(cfg);
    assert!(!dictionary.contains_key("unreachable"));
    assert_eq!(
        data.format_value(cfg, &dictionary["then"]),
        "body, entry, loop, then"
    );
    assert_eq!(data.format_value(cfg, &dictionary["exit"]), "entry, exit, loop");
}
