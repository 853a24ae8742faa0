//! A reference evaluator for [`ir::Program`]s.
//!
//! It serves as the oracle for rewrites: a pass is correct on a program if
//! the program prints the same before and after.

mod heap;
mod interpreter;
mod operation;
mod value;

use std::io::Write;

use ir::{Label, Program, Type, Variable};
use thiserror::Error;

pub use interpreter::Interpreter;
pub use value::{Pointer, Value};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("function `{0}` is not defined")]
    UnknownFunction(String),
    #[error("variable `{0}` is not defined")]
    UndefinedVariable(Variable),
    #[error("block `{block}` was entered from `{predecessor}`, which its phi for `{variable}` does not list")]
    UnknownPredecessor {
        block: Label,
        predecessor: Label,
        variable: Variable,
    },
    #[error("expected a value of type `{expected}`, found `{found}`")]
    TypeMismatch { expected: Type, found: Type },
    #[error("`{op}` cannot be applied to {operands}")]
    BadOperands { op: ir::Operator, operands: String },
    #[error("`{function}` expects {expected} arguments, found {found}")]
    ArgumentCount {
        function: String,
        expected: usize,
        found: usize,
    },
    #[error("cannot read `{argument}` as a `{ty}` argument")]
    BadArgument { argument: String, ty: Type },
    #[error("`{function}` returned without a value")]
    MissingReturnValue { function: String },
    #[error("access at offset {offset} of an allocation of {size} elements")]
    OutOfBounds { offset: i64, size: usize },
    #[error("allocation of {0} elements")]
    BadAllocation(i64),
    #[error("load from a slot that was never stored to")]
    UninitializedLoad,
    #[error("division by zero")]
    DivisionByZero,
    #[error("gave up after entering {0} blocks")]
    BlockLimit(usize),
    #[error(transparent)]
    Cfg(#[from] ir_cfg::Error),
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Runs `main` of `program` with `arguments` parsed against its parameter
/// types, printing to `output`.
pub fn run(program: &Program, arguments: &[String], output: &mut dyn Write) -> Result<Option<Value>> {
    Interpreter::new(program)?.run(arguments, output)
}
