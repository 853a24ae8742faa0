//! Fixtures and generators shared by the test suites of the workspace.

use ir::{Function, Instruction, Literal, Operator, Program, Type};
use proptest::{collection::vec, prelude::*};

/// Every fixture under `fixtures/`, by file stem.
pub const FIXTURES: [(&str, &str); 11] = [
    ("calls", include_str!("../../fixtures/calls.json")),
    ("cfg-program", include_str!("../../fixtures/cfg-program.json")),
    ("cond-args", include_str!("../../fixtures/cond-args.json")),
    ("dce-chain", include_str!("../../fixtures/dce-chain.json")),
    ("fact", include_str!("../../fixtures/fact.json")),
    (
        "loopcond+unreachable",
        include_str!("../../fixtures/loopcond+unreachable.json"),
    ),
    ("memory", include_str!("../../fixtures/memory.json")),
    ("ssa-diamond", include_str!("../../fixtures/ssa-diamond.json")),
    ("ssa-loop", include_str!("../../fixtures/ssa-loop.json")),
    ("ssa-straight", include_str!("../../fixtures/ssa-straight.json")),
    ("while", include_str!("../../fixtures/while.json")),
];

/// Decodes the fixture named `name`, panicking if it is missing or malformed.
pub fn load_program(name: &str) -> Program {
    let (_, json) = FIXTURES
        .iter()
        .find(|(fixture, _)| *fixture == name)
        .unwrap_or_else(|| panic!("no fixture named `{name}`"));
    Program::from_json(json).unwrap_or_else(|e| panic!("fixture `{name}`: {e}"))
}

const INT_VARIABLES: &[&str] = &["a", "b", "c"];

fn int_variable() -> impl Strategy<Value = String> {
    prop::sample::select(INT_VARIABLES).prop_map(String::from)
}

fn body_instruction() -> impl Strategy<Value = Instruction> {
    prop_oneof![
        (int_variable(), -4i64..5).prop_map(|(dest, value)| Instruction::Constant {
            dest,
            ty: Type::Int,
            value: Literal::Int(value),
        }),
        (
            prop::sample::select(vec![Operator::Add, Operator::Sub, Operator::Mul]),
            int_variable(),
            int_variable(),
            int_variable(),
        )
            .prop_map(|(op, dest, x, y)| Instruction::Operation {
                op,
                dest,
                ty: Type::Int,
                args: vec![x, y],
            }),
        (int_variable(), int_variable()).prop_map(|(x, y)| Instruction::Operation {
            op: Operator::Lt,
            dest: "p".into(),
            ty: Type::Bool,
            args: vec![x, y],
        }),
        int_variable().prop_map(|x| Instruction::Print { args: vec![x] }),
    ]
}

#[derive(Debug, Clone)]
enum Exit {
    FallThrough,
    Jump(usize),
    Branch(usize, usize),
    Return,
}

fn exit(blocks: usize) -> impl Strategy<Value = Exit> {
    prop_oneof![
        Just(Exit::FallThrough),
        (0..blocks).prop_map(Exit::Jump),
        (0..blocks, 0..blocks).prop_map(|(then, otherwise)| Exit::Branch(then, otherwise)),
        Just(Exit::Return),
    ]
}

/// Definitions of every variable the generator uses, so that each read has
/// a definition on every path.
fn prelude() -> Vec<Instruction> {
    let mut instructions: Vec<_> = INT_VARIABLES
        .iter()
        .map(|name| Instruction::Constant {
            dest: name.to_string(),
            ty: Type::Int,
            value: Literal::Int(0),
        })
        .collect();
    instructions.push(Instruction::Constant {
        dest: "p".into(),
        ty: Type::Bool,
        value: Literal::Bool(false),
    });
    instructions
}

/// Functions made of up to seven labeled blocks `l0`, `l1`, ... with random
/// straight-line bodies and random jumps, branches, returns or fallthroughs.
///
/// The variable definitions either form their own unlabeled entry block or
/// open `l0`, in which case the entry can be the target of a back edge.
pub fn arbitrary_function() -> impl Strategy<Value = Function> {
    (1usize..8, any::<bool>())
        .prop_flat_map(|(blocks, labeled_entry)| {
            (
                vec((vec(body_instruction(), 0..4), exit(blocks)), blocks),
                Just(labeled_entry),
            )
        })
        .prop_map(|(blocks, labeled_entry)| {
            let mut instructions = Vec::new();
            if !labeled_entry {
                instructions.extend(prelude());
            }
            for (index, (body, exit)) in blocks.into_iter().enumerate() {
                instructions.push(Instruction::label(format!("l{index}")));
                if labeled_entry && index == 0 {
                    instructions.extend(prelude());
                }
                instructions.extend(body);
                match exit {
                    Exit::FallThrough => {}
                    Exit::Jump(target) => instructions.push(Instruction::jump(format!("l{target}"))),
                    Exit::Branch(then, otherwise) => instructions.push(Instruction::Branch {
                        cond: "p".into(),
                        then_label: format!("l{then}"),
                        else_label: format!("l{otherwise}"),
                    }),
                    Exit::Return => instructions.push(Instruction::ret(None)),
                }
            }
            Function {
                name: "main".into(),
                parameters: vec![],
                return_type: None,
                instructions,
            }
        })
}
