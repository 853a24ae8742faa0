use std::io::Write;

use data_structure::FxHashMap;
use ir::{Instruction, Label, Program, Type, Variable, UNDEFINED};
use ir_cfg::{BlockId, Cfg};

use crate::{heap::Heap, operation::compute, Pointer, Result, RuntimeError, Value};

/// Holds the control-flow graph of every function of a program, each with
/// explicit terminators.
pub struct Interpreter {
    cfgs: FxHashMap<String, Cfg>,
    block_limit: Option<usize>,
}

/// What changes while the program runs.
struct State<'a> {
    heap: Heap,
    output: &'a mut dyn Write,
    /// Blocks entered so far, across all calls.
    blocks: usize,
}

type Environment = FxHashMap<Variable, Value>;

enum Flow {
    Jump(Label),
    Return(Option<Value>),
}

impl Interpreter {
    pub fn new(program: &Program) -> Result<Self> {
        let cfgs = program
            .functions
            .iter()
            .map(|function| {
                let mut cfg = Cfg::new(function)?;
                cfg.add_terminators();
                Ok((function.name.clone(), cfg))
            })
            .collect::<Result<_>>()?;
        Ok(Self {
            cfgs,
            block_limit: None,
        })
    }

    /// Stops a run with [`RuntimeError::BlockLimit`] once it has entered
    /// more than `limit` blocks.
    pub fn with_block_limit(mut self, limit: usize) -> Self {
        self.block_limit = Some(limit);
        self
    }

    /// Calls `main` with `arguments` read as literals of its parameter types.
    pub fn run(&self, arguments: &[String], output: &mut dyn Write) -> Result<Option<Value>> {
        let main = self.cfg("main")?;
        if main.parameters().len() != arguments.len() {
            return Err(RuntimeError::ArgumentCount {
                function: "main".to_string(),
                expected: main.parameters().len(),
                found: arguments.len(),
            });
        }
        let arguments = main
            .parameters()
            .iter()
            .zip(arguments)
            .map(|(parameter, argument)| parse_argument(argument, &parameter.ty))
            .collect::<Result<_>>()?;

        let mut state = State {
            heap: Heap::default(),
            output,
            blocks: 0,
        };
        let result = self.call(&mut state, "main", arguments)?;
        state.output.flush()?;
        Ok(result)
    }

    fn cfg(&self, function: &str) -> Result<&Cfg> {
        self.cfgs
            .get(function)
            .ok_or_else(|| RuntimeError::UnknownFunction(function.to_string()))
    }

    fn call(&self, state: &mut State, function: &str, arguments: Vec<Value>) -> Result<Option<Value>> {
        let cfg = self.cfg(function)?;
        if cfg.parameters().len() != arguments.len() {
            return Err(RuntimeError::ArgumentCount {
                function: function.to_string(),
                expected: cfg.parameters().len(),
                found: arguments.len(),
            });
        }
        tracing::trace!(function, "call");

        let mut environment = Environment::default();
        for (parameter, argument) in cfg.parameters().iter().zip(arguments) {
            check_type(&parameter.ty, &argument)?;
            environment.insert(parameter.name.clone(), argument);
        }

        let mut block = cfg.entry();
        let mut predecessor = None;
        loop {
            state.blocks += 1;
            if let Some(limit) = self.block_limit.filter(|&limit| state.blocks > limit) {
                return Err(RuntimeError::BlockLimit(limit));
            }
            match self.run_block(state, cfg, block, predecessor, &mut environment)? {
                Flow::Jump(target) => {
                    predecessor = Some(block);
                    block = cfg.resolve(&target)?;
                }
                Flow::Return(value) => {
                    if let (Some(expected), Some(value)) = (cfg.return_type(), &value) {
                        check_type(expected, value)?;
                    }
                    return Ok(value);
                }
            }
        }
    }

    fn run_block(
        &self,
        state: &mut State,
        cfg: &Cfg,
        block: BlockId,
        predecessor: Option<BlockId>,
        environment: &mut Environment,
    ) -> Result<Flow> {
        // Phis read their operands before any of them assigns.
        let mut selected = Vec::new();
        for phi in cfg[block].phis() {
            let Instruction::Phi {
                dest, args, labels, ..
            } = phi
            else {
                continue;
            };
            let from = predecessor.map(|predecessor| cfg.label(predecessor));
            let position = labels
                .iter()
                .position(|label| Some(label) == from)
                .ok_or_else(|| RuntimeError::UnknownPredecessor {
                    block: cfg.label(block).clone(),
                    predecessor: from.cloned().unwrap_or_default(),
                    variable: dest.clone(),
                })?;
            let arg = &args[position];
            if arg != UNDEFINED {
                selected.push((dest.clone(), read(environment, arg)?));
            }
        }
        environment.extend(selected);

        for instruction in &cfg[block].instructions {
            match instruction {
                Instruction::Phi { .. } | Instruction::Nop | Instruction::Label { .. } => {}
                Instruction::Constant { dest, value, .. } => {
                    environment.insert(dest.clone(), Value::from(*value));
                }
                Instruction::Operation { op, dest, args, .. } => {
                    let operands = args
                        .iter()
                        .map(|arg| read(environment, arg))
                        .collect::<Result<Vec<_>>>()?;
                    environment.insert(dest.clone(), compute(*op, &operands)?);
                }
                Instruction::Id { dest, arg, .. } => {
                    let value = read(environment, arg)?;
                    environment.insert(dest.clone(), value);
                }
                Instruction::Print { args } => {
                    let values = args
                        .iter()
                        .map(|arg| read(environment, arg).map(|value| value.to_string()))
                        .collect::<Result<Vec<_>>>()?;
                    writeln!(state.output, "{}", values.join(" "))?;
                }
                Instruction::Jump { target } => return Ok(Flow::Jump(target.clone())),
                Instruction::Branch {
                    cond,
                    then_label,
                    else_label,
                } => {
                    let target = if read_bool(environment, cond)? {
                        then_label
                    } else {
                        else_label
                    };
                    return Ok(Flow::Jump(target.clone()));
                }
                Instruction::Return { arg } => {
                    let value = arg.as_ref().map(|arg| read(environment, arg)).transpose()?;
                    return Ok(Flow::Return(value));
                }
                Instruction::Call {
                    function,
                    args,
                    dest,
                    ..
                } => {
                    let arguments = args
                        .iter()
                        .map(|arg| read(environment, arg))
                        .collect::<Result<Vec<_>>>()?;
                    let result = self.call(state, function, arguments)?;
                    match (dest, result) {
                        (Some(dest), Some(result)) => {
                            environment.insert(dest.clone(), result);
                        }
                        (Some(_), None) => {
                            return Err(RuntimeError::MissingReturnValue {
                                function: function.clone(),
                            })
                        }
                        (None, _) => {}
                    }
                }
                Instruction::Alloc { dest, ty, size } => {
                    let Type::Ptr(pointee) = ty else {
                        return Err(RuntimeError::TypeMismatch {
                            expected: Type::ptr(ty.clone()),
                            found: ty.clone(),
                        });
                    };
                    let size = read_int(environment, size)?;
                    let pointer = state.heap.allocate(size, (**pointee).clone())?;
                    environment.insert(dest.clone(), Value::Pointer(pointer));
                }
                Instruction::Store { ptr, value } => {
                    let pointer = read_pointer(environment, ptr)?;
                    let value = read(environment, value)?;
                    state.heap.store(&pointer, value)?;
                }
                Instruction::Load { dest, ty, ptr } => {
                    let pointer = read_pointer(environment, ptr)?;
                    if &pointer.pointee != ty {
                        return Err(RuntimeError::TypeMismatch {
                            expected: ty.clone(),
                            found: pointer.pointee,
                        });
                    }
                    let value = state.heap.load(&pointer)?;
                    environment.insert(dest.clone(), value);
                }
                Instruction::PtrAdd {
                    dest, ptr, offset, ..
                } => {
                    let pointer = read_pointer(environment, ptr)?;
                    let offset = read_int(environment, offset)?;
                    environment.insert(
                        dest.clone(),
                        Value::Pointer(Pointer {
                            offset: pointer.offset.wrapping_add(offset),
                            ..pointer
                        }),
                    );
                }
            }
        }
        unreachable!("every block ends in a terminator after `add_terminators`")
    }
}

fn parse_argument(argument: &str, ty: &Type) -> Result<Value> {
    let value = match ty {
        Type::Int => argument.parse().ok().map(Value::Int),
        Type::Bool => match argument {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        Type::Ptr(_) => None,
    };
    value.ok_or_else(|| RuntimeError::BadArgument {
        argument: argument.to_string(),
        ty: ty.clone(),
    })
}

fn check_type(expected: &Type, value: &Value) -> Result<()> {
    let found = value.ty();
    if &found != expected {
        return Err(RuntimeError::TypeMismatch {
            expected: expected.clone(),
            found,
        });
    }
    Ok(())
}

fn read(environment: &Environment, variable: &str) -> Result<Value> {
    environment
        .get(variable)
        .cloned()
        .ok_or_else(|| RuntimeError::UndefinedVariable(variable.to_string()))
}

fn read_int(environment: &Environment, variable: &str) -> Result<i64> {
    match read(environment, variable)? {
        Value::Int(value) => Ok(value),
        value => Err(RuntimeError::TypeMismatch {
            expected: Type::Int,
            found: value.ty(),
        }),
    }
}

fn read_bool(environment: &Environment, variable: &str) -> Result<bool> {
    match read(environment, variable)? {
        Value::Bool(value) => Ok(value),
        value => Err(RuntimeError::TypeMismatch {
            expected: Type::Bool,
            found: value.ty(),
        }),
    }
}

fn read_pointer(environment: &Environment, variable: &str) -> Result<Pointer> {
    match read(environment, variable)? {
        Value::Pointer(pointer) => Ok(pointer),
        value => Err(RuntimeError::TypeMismatch {
            expected: Type::ptr(Type::Int),
            found: value.ty(),
        }),
    }
}
