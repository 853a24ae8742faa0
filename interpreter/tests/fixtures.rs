use interpreter::{run, Interpreter, RuntimeError, Value};
use ir::Program;
use pretty_assertions::assert_eq;

fn output(program: &Program, arguments: &[&str]) -> String {
    let arguments: Vec<String> = arguments.iter().map(|argument| argument.to_string()).collect();
    let mut output = Vec::new();
    run(program, &arguments, &mut output).unwrap();
    String::from_utf8(output).unwrap()
}

fn fixture(name: &str, arguments: &[&str]) -> String {
    output(&test_utility::load_program(name), arguments)
}

#[test]
fn test_straight_line_and_branches() {
    assert_eq!(fixture("ssa-straight", &[]), "6 12\n");
    assert_eq!(fixture("ssa-diamond", &["true"]), "94\n");
    assert_eq!(fixture("ssa-diamond", &["false"]), "2209\n");
    assert_eq!(fixture("cond-args", &["true"]), "42\n");
    assert_eq!(fixture("cond-args", &["false"]), "-8\n");
    assert_eq!(fixture("cfg-program", &[]), "4\n");
}

#[test]
fn test_loops() {
    assert_eq!(fixture("ssa-loop", &["5"]), "10\n");
    assert_eq!(fixture("ssa-loop", &["0"]), "0\n");
    assert_eq!(fixture("while", &["3"]), "0\n");
    assert_eq!(fixture("fact", &[]), "40320\n");
    assert_eq!(fixture("loopcond+unreachable", &[]), "1984\n");
}

#[test]
fn test_calls_and_memory() {
    assert_eq!(fixture("calls", &[]), "10\n10\n");
    assert_eq!(fixture("dce-chain", &[]), "2\n");
    assert_eq!(fixture("memory", &[]), "10\n1\n");
}

#[test]
fn test_return_value_of_main() {
    let program = Program::from_json(
        r#"{"functions":[{"name":"main","args":[{"name":"x","type":"int"}],"type":"int","instrs":[
            {"op":"const","dest":"one","type":"int","value":1},
            {"op":"add","dest":"y","type":"int","args":["x","one"]},
            {"op":"ret","args":["y"]}
        ]}]}"#,
    )
    .unwrap();
    let mut sink = Vec::new();
    let result = run(&program, &["41".to_string()], &mut sink).unwrap();
    assert_eq!(result, Some(Value::Int(42)));
    assert!(sink.is_empty());
}

#[test]
fn test_runtime_errors() {
    let program = test_utility::load_program("ssa-diamond");
    let mut sink = Vec::new();
    assert!(matches!(
        run(&program, &[], &mut sink),
        Err(RuntimeError::ArgumentCount { expected: 1, found: 0, .. })
    ));
    assert!(matches!(
        run(&program, &["maybe".to_string()], &mut sink),
        Err(RuntimeError::BadArgument { .. })
    ));

    let program = Program::from_json(
        r#"{"functions":[{"name":"main","instrs":[
            {"op":"const","dest":"zero","type":"int","value":0},
            {"op":"div","dest":"x","type":"int","args":["zero","zero"]}
        ]}]}"#,
    )
    .unwrap();
    assert!(matches!(run(&program, &[], &mut sink), Err(RuntimeError::DivisionByZero)));

    let program = Program::from_json(
        r#"{"functions":[{"name":"main","instrs":[{"op":"print","args":["ghost"]}]}]}"#,
    )
    .unwrap();
    assert!(matches!(
        run(&program, &[], &mut sink),
        Err(RuntimeError::UndefinedVariable(variable)) if variable == "ghost"
    ));

    let program = Program::from_json(r#"{"functions":[{"name":"helper","instrs":[]}]}"#).unwrap();
    assert!(matches!(
        run(&program, &[], &mut sink),
        Err(RuntimeError::UnknownFunction(function)) if function == "main"
    ));
}

#[test]
fn test_block_limit() {
    let program = Program::from_json(
        r#"{"functions":[{"name":"main","instrs":[
            {"label":"spin"},
            {"op":"jmp","labels":["spin"]}
        ]}]}"#,
    )
    .unwrap();
    let mut sink = Vec::new();
    let interpreter = Interpreter::new(&program).unwrap().with_block_limit(100);
    assert!(matches!(interpreter.run(&[], &mut sink), Err(RuntimeError::BlockLimit(100))));

    // A limit that is never reached leaves the output alone.
    let program = test_utility::load_program("ssa-loop");
    let interpreter = Interpreter::new(&program).unwrap().with_block_limit(100);
    interpreter.run(&["5".to_string()], &mut sink).unwrap();
    assert_eq!(String::from_utf8(sink).unwrap(), fixture("ssa-loop", &["5"]));
}
