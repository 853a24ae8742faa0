use data_structure::FxHashSet;
use ir::{Function, Instruction, Literal, Parameter, Program, Type};
use ir_analysis::Analysis;
use ir_cfg::{verify, Cfg, VerifyLevel};
use interpreter::{Interpreter, RuntimeError};
use ir_passes::{
    DeadCodeElimination, Error, LocalValueNumbering, LvnConfig, NaiveFromSsa, Pass, PassManager,
    ToSsa,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use test_utility::arbitrary_function;

fn interpret(program: &Program, arguments: &[&str]) -> String {
    let arguments: Vec<String> = arguments.iter().map(|argument| argument.to_string()).collect();
    let mut output = Vec::new();
    interpreter::run(program, &arguments, &mut output).unwrap();
    String::from_utf8(output).unwrap()
}

fn to_ssa(function: &Function) -> Function {
    let mut function = function.clone();
    let mut analysis = Analysis::new(function.clone());
    ToSsa.run_pass(&mut function, &mut analysis).unwrap();
    function
}

/// Output of running `function` as `main`, or `None` if it enters more
/// than `limit` blocks.
fn bounded_output(function: &Function, limit: usize) -> Option<String> {
    let program = Program {
        functions: vec![function.clone()],
    };
    let mut output = Vec::new();
    match Interpreter::new(&program)
        .unwrap()
        .with_block_limit(limit)
        .run(&[], &mut output)
    {
        Ok(_) => Some(String::from_utf8(output).unwrap()),
        Err(RuntimeError::BlockLimit(_)) => None,
        Err(error) => panic!("{error} in\n{function}"),
    }
}

fn lower(function: Function) -> Function {
    let mut lowered = function.clone();
    let mut analysis = Analysis::new(function);
    NaiveFromSsa.run_pass(&mut lowered, &mut analysis).unwrap();
    lowered
}

/// Checks that every variable is assigned at most once.
fn assert_single_assignment(function: &Function) {
    let mut defined = FxHashSet::default();
    for dest in function.instructions.iter().filter_map(Instruction::destination) {
        assert!(defined.insert(dest), "`{dest}` is assigned twice in\n{function}");
    }
}

const CASES: &[(&str, &[&str])] = &[
    ("ssa-straight", &[]),
    ("ssa-diamond", &["true"]),
    ("ssa-diamond", &["false"]),
    ("ssa-loop", &["5"]),
    ("ssa-loop", &["0"]),
    ("loopcond+unreachable", &[]),
    ("while", &["3"]),
    ("fact", &[]),
    ("cond-args", &["true"]),
    ("cond-args", &["false"]),
    ("calls", &[]),
    ("memory", &[]),
];

#[test]
fn test_round_trip_preserves_output() {
    for &(name, arguments) in CASES {
        let original = test_utility::load_program(name);
        let expected = interpret(&original, arguments);

        let mut ssa = original.clone();
        PassManager::new()
            .verify(true)
            .add_pass(ToSsa)
            .run(&mut ssa)
            .unwrap();
        for function in &ssa.functions {
            assert_single_assignment(function);
        }
        assert_eq!(interpret(&ssa, arguments), expected, "{name} in SSA form");

        let mut lowered = original.clone();
        PassManager::new()
            .verify(true)
            .add_pass(ToSsa)
            .add_pass(NaiveFromSsa)
            .run(&mut lowered)
            .unwrap();
        assert!(lowered
            .functions
            .iter()
            .flat_map(|function| &function.instructions)
            .all(|instruction| !instruction.is_phi()));
        assert_eq!(interpret(&lowered, arguments), expected, "{name} after the round trip");
    }
}

#[test]
fn test_diamond() {
    let program = test_utility::load_program("ssa-diamond");
    assert_eq!(
        to_ssa(&program.functions[0]).to_string(),
        "\
@main(cond: bool) {
.b1:
  a.0: int = const 47;
  br cond .left .right;
.left:
  a.2: int = add a.0 a.0;
  jmp .end;
.right:
  a.3: int = mul a.0 a.0;
  jmp .end;
.end:
  a.1: int = phi .left a.2 .right a.3;
  print a.1;
  ret;
}
"
    );
}

#[test]
fn test_loop_back_to_entry_gets_a_new_entry() {
    let program = test_utility::load_program("while");
    let ssa = to_ssa(&program.functions[0]);
    assert_eq!(
        ssa.to_string(),
        "\
@main(n: int) {
.entry1:
  jmp .while.cond;
.while.cond:
  is_term.0: bool = phi .entry1 __undefined .while.body is_term.1;
  n.0: int = phi .entry1 n .while.body n.1;
  one.0: int = phi .entry1 __undefined .while.body one.1;
  zero.0: int = phi .entry1 __undefined .while.body zero.1;
  zero.1: int = const 0;
  is_term.1: bool = eq n.0 zero.1;
  br is_term.1 .while.finish .while.body;
.while.body:
  one.1: int = const 1;
  n.1: int = sub n.0 one.1;
  jmp .while.cond;
.while.finish:
  print n.0;
  ret;
}
"
    );

    let mut lowered = ssa.clone();
    let mut analysis = Analysis::new(ssa);
    NaiveFromSsa.run_pass(&mut lowered, &mut analysis).unwrap();
    let entry: Vec<String> = lowered.instructions[..3].iter().map(ToString::to_string).collect();
    // Undefined operands produce no copy.
    assert_eq!(entry, [".entry1:", "n.0: int = id n;", "jmp .while.cond;"]);
}

#[test]
fn test_single_versions_keep_their_name() {
    let program = test_utility::load_program("ssa-loop");
    let ssa = to_ssa(&program.functions[0]);
    let text = ssa.to_string();
    assert!(text.contains("  one: int = const 1;\n"), "{text}");
    assert!(text.contains("acc.1: int = phi .b1 acc.0 .body acc.2;"), "{text}");
    assert_single_assignment(&ssa);
}

#[test]
fn test_phis_cover_unreachable_predecessors() {
    let constant = |value| Instruction::Constant {
        dest: "x".into(),
        ty: Type::Int,
        value: Literal::Int(value),
    };
    let function = Function {
        name: "main".into(),
        parameters: vec![Parameter {
            name: "c".into(),
            ty: Type::Bool,
        }],
        return_type: None,
        instructions: vec![
            constant(1),
            Instruction::Branch {
                cond: "c".into(),
                then_label: "a".into(),
                else_label: "join".into(),
            },
            Instruction::label("a"),
            constant(2),
            Instruction::jump("join"),
            Instruction::label("dead"),
            constant(3),
            Instruction::jump("join"),
            Instruction::label("join"),
            Instruction::Print {
                args: vec!["x".into()],
            },
        ],
    };
    let ssa = to_ssa(&function);
    let cfg = Cfg::new(&ssa).unwrap();
    assert_eq!(verify(&cfg, VerifyLevel::Ssa), Ok(()));
    let join = cfg.block_id("join").unwrap();
    let phis: Vec<String> = cfg[join].phis().map(ToString::to_string).collect();
    assert_eq!(phis, ["x.2: int = phi .b1 x.0 .a x.1 .dead __undefined;"]);
    // The unreachable block is not renamed.
    let dead = cfg.block_id("dead").unwrap();
    assert_eq!(cfg[dead].instructions[0].to_string(), "x: int = const 3;");

    let program = Program {
        functions: vec![ssa],
    };
    assert_eq!(interpret(&program, &["true"]), "2\n");
    assert_eq!(interpret(&program, &["false"]), "1\n");
}

#[test]
fn test_phis_are_rejected_before_conversion() {
    let mut function = to_ssa(&test_utility::load_program("ssa-diamond").functions[0]);
    let mut analysis = Analysis::new(function.clone());
    let error = ToSsa.run_pass(&mut function, &mut analysis).unwrap_err();
    assert!(matches!(error, Error::UnexpectedPhi { block, .. } if block == "end"));
}

#[test]
fn test_untyped_phi() {
    let call = |dest: &str| Instruction::Call {
        function: "f".into(),
        args: vec![],
        dest: Some(dest.into()),
        ty: None,
    };
    let mut function = Function {
        name: "main".into(),
        parameters: vec![Parameter {
            name: "c".into(),
            ty: Type::Bool,
        }],
        return_type: None,
        instructions: vec![
            Instruction::Branch {
                cond: "c".into(),
                then_label: "a".into(),
                else_label: "b".into(),
            },
            Instruction::label("a"),
            call("x"),
            Instruction::jump("join"),
            Instruction::label("b"),
            call("x"),
            Instruction::label("join"),
            Instruction::Print {
                args: vec!["x".into()],
            },
        ],
    };
    let mut analysis = Analysis::new(function.clone());
    let error = ToSsa.run_pass(&mut function, &mut analysis).unwrap_err();
    assert!(matches!(error, Error::UntypedPhi { variable, .. } if variable == "x"));
}

#[test]
fn test_dead_code_after_round_trip() {
    let mut program = test_utility::load_program("ssa-loop");
    PassManager::new()
        .verify(true)
        .add_pass(ToSsa)
        .add_pass(NaiveFromSsa)
        .add_pass(DeadCodeElimination)
        .run(&mut program)
        .unwrap();
    assert_eq!(interpret(&program, &["4"]), "6\n");
    // The phi for `cond` read nothing on entry, so only the loop copy is left
    // and it is dead.
    assert!(!program.functions[0]
        .instructions
        .iter()
        .any(|instruction| matches!(instruction, Instruction::Id { dest, .. } if dest.starts_with("cond."))));
}

proptest! {
    #[test]
    fn ssa_is_well_formed(function in arbitrary_function()) {
        let ssa = to_ssa(&function);
        let cfg = Cfg::new(&ssa).unwrap();
        prop_assert_eq!(verify(&cfg, VerifyLevel::Ssa), Ok(()));

        let lowered = lower(ssa);
        let cfg = Cfg::new(&lowered).unwrap();
        prop_assert_eq!(verify(&cfg, VerifyLevel::Structure), Ok(()));
        prop_assert!(cfg.blocks().all(|(_, block)| block.phis().next().is_none()));
    }

    #[test]
    fn ssa_round_trip_preserves_output(function in arbitrary_function()) {
        let expected = bounded_output(&function, 500);
        if expected.is_none() {
            return Ok(());
        }

        // A fresh entry block runs once more than the original.
        let ssa = to_ssa(&function);
        prop_assert_eq!(bounded_output(&ssa, 501), expected.clone(), "{}", ssa);
        let lowered = lower(ssa);
        prop_assert_eq!(bounded_output(&lowered, 501), expected, "{}", lowered);
    }

    #[test]
    fn value_numbering_preserves_output(function in arbitrary_function()) {
        let expected = bounded_output(&function, 500);
        if expected.is_none() {
            return Ok(());
        }

        let config = LvnConfig {
            canonicalise: true,
            copy_propagation: true,
            constant_propagation: true,
            constant_folding: true,
        };
        let mut program = Program { functions: vec![function] };
        PassManager::new()
            .verify(true)
            .add_pass(LocalValueNumbering::new(config))
            .add_pass(DeadCodeElimination)
            .run(&mut program)
            .unwrap();
        let optimised = &program.functions[0];
        prop_assert_eq!(bounded_output(optimised, 500), expected, "{}", optimised);
    }
}
