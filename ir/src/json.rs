//! The Bril JSON encoding.
//!
//! Every instruction is one flat object; which keys are meaningful depends on
//! `op`. Decoding goes through [`RawInstruction`] so that the typed
//! [`Instruction`] never has to represent a half-formed object.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Instruction, Label, Literal, Operator, Program, Type, Variable};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("instruction has neither `op` nor `label`")]
    MissingOpcode,
    #[error("unknown opcode `{0}`")]
    UnknownOpcode(String),
    #[error("`{op}` requires the `{field}` field")]
    MissingField { op: String, field: &'static str },
    #[error("`{op}` expects {expected} entries in `{field}`, found {found}")]
    Arity {
        op: String,
        field: &'static str,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawInstruction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<Label>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    op: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dest: Option<Variable>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    ty: Option<Type>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    args: Vec<Variable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    funcs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    labels: Vec<Label>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Literal>,
}

struct Fields<'a> {
    op: &'a str,
}

impl Fields<'_> {
    fn required<T>(&self, value: Option<T>, field: &'static str) -> Result<T, DecodeError> {
        value.ok_or_else(|| DecodeError::MissingField {
            op: self.op.to_string(),
            field,
        })
    }

    fn exactly<const N: usize>(
        &self,
        values: Vec<String>,
        field: &'static str,
    ) -> Result<[String; N], DecodeError> {
        let found = values.len();
        values.try_into().map_err(|_| DecodeError::Arity {
            op: self.op.to_string(),
            field,
            expected: N,
            found,
        })
    }
}

impl TryFrom<RawInstruction> for Instruction {
    type Error = DecodeError;

    fn try_from(raw: RawInstruction) -> Result<Self, Self::Error> {
        let Some(op) = raw.op else {
            return match raw.label {
                Some(label) => Ok(Instruction::Label { label }),
                None => Err(DecodeError::MissingOpcode),
            };
        };
        let fields = Fields { op: &op };

        let instruction = match op.as_str() {
            "const" => Instruction::Constant {
                dest: fields.required(raw.dest, "dest")?,
                ty: fields.required(raw.ty, "type")?,
                value: fields.required(raw.value, "value")?,
            },
            "jmp" => {
                let [target] = fields.exactly(raw.labels, "labels")?;
                Instruction::Jump { target }
            }
            "br" => {
                let [cond] = fields.exactly(raw.args, "args")?;
                let [then_label, else_label] = fields.exactly(raw.labels, "labels")?;
                Instruction::Branch {
                    cond,
                    then_label,
                    else_label,
                }
            }
            "call" => {
                let [function] = fields.exactly(raw.funcs, "funcs")?;
                Instruction::Call {
                    function,
                    args: raw.args,
                    dest: raw.dest,
                    ty: raw.ty,
                }
            }
            "ret" => {
                if raw.args.len() > 1 {
                    return Err(DecodeError::Arity {
                        op: op.clone(),
                        field: "args",
                        expected: 1,
                        found: raw.args.len(),
                    });
                }
                Instruction::Return {
                    arg: raw.args.into_iter().next(),
                }
            }
            "id" => {
                let [arg] = fields.exactly(raw.args, "args")?;
                Instruction::Id {
                    dest: fields.required(raw.dest, "dest")?,
                    ty: fields.required(raw.ty, "type")?,
                    arg,
                }
            }
            "print" => Instruction::Print { args: raw.args },
            "nop" => Instruction::Nop,
            // allocations are never reclaimed
            "free" => Instruction::Nop,
            "phi" => {
                if raw.args.len() != raw.labels.len() {
                    return Err(DecodeError::Arity {
                        op: op.clone(),
                        field: "labels",
                        expected: raw.args.len(),
                        found: raw.labels.len(),
                    });
                }
                Instruction::Phi {
                    dest: fields.required(raw.dest, "dest")?,
                    ty: fields.required(raw.ty, "type")?,
                    args: raw.args,
                    labels: raw.labels,
                }
            }
            "alloc" => {
                let [size] = fields.exactly(raw.args, "args")?;
                Instruction::Alloc {
                    dest: fields.required(raw.dest, "dest")?,
                    ty: fields.required(raw.ty, "type")?,
                    size,
                }
            }
            "store" => {
                let [ptr, value] = fields.exactly(raw.args, "args")?;
                Instruction::Store { ptr, value }
            }
            "load" => {
                let [ptr] = fields.exactly(raw.args, "args")?;
                Instruction::Load {
                    dest: fields.required(raw.dest, "dest")?,
                    ty: fields.required(raw.ty, "type")?,
                    ptr,
                }
            }
            "ptradd" => {
                let [ptr, offset] = fields.exactly(raw.args, "args")?;
                Instruction::PtrAdd {
                    dest: fields.required(raw.dest, "dest")?,
                    ty: fields.required(raw.ty, "type")?,
                    ptr,
                    offset,
                }
            }
            name => {
                let op = Operator::from_name(name)
                    .ok_or_else(|| DecodeError::UnknownOpcode(name.to_string()))?;
                if raw.args.len() != op.arity() {
                    return Err(DecodeError::Arity {
                        op: name.to_string(),
                        field: "args",
                        expected: op.arity(),
                        found: raw.args.len(),
                    });
                }
                Instruction::Operation {
                    op,
                    dest: fields.required(raw.dest, "dest")?,
                    ty: fields.required(raw.ty, "type")?,
                    args: raw.args,
                }
            }
        };
        Ok(instruction)
    }
}

impl From<Instruction> for RawInstruction {
    fn from(instruction: Instruction) -> Self {
        let op = |name: &str| Some(name.to_string());
        match instruction {
            Instruction::Label { label } => Self {
                label: Some(label),
                ..Self::default()
            },
            Instruction::Operation { op: o, dest, ty, args } => Self {
                op: op(o.as_str()),
                dest: Some(dest),
                ty: Some(ty),
                args,
                ..Self::default()
            },
            Instruction::Constant { dest, ty, value } => Self {
                op: op("const"),
                dest: Some(dest),
                ty: Some(ty),
                value: Some(value),
                ..Self::default()
            },
            Instruction::Jump { target } => Self {
                op: op("jmp"),
                labels: vec![target],
                ..Self::default()
            },
            Instruction::Branch {
                cond,
                then_label,
                else_label,
            } => Self {
                op: op("br"),
                args: vec![cond],
                labels: vec![then_label, else_label],
                ..Self::default()
            },
            Instruction::Call {
                function,
                args,
                dest,
                ty,
            } => Self {
                op: op("call"),
                funcs: vec![function],
                args,
                dest,
                ty,
                ..Self::default()
            },
            Instruction::Return { arg } => Self {
                op: op("ret"),
                args: arg.into_iter().collect(),
                ..Self::default()
            },
            Instruction::Id { dest, ty, arg } => Self {
                op: op("id"),
                dest: Some(dest),
                ty: Some(ty),
                args: vec![arg],
                ..Self::default()
            },
            Instruction::Print { args } => Self {
                op: op("print"),
                args,
                ..Self::default()
            },
            Instruction::Nop => Self {
                op: op("nop"),
                ..Self::default()
            },
            Instruction::Phi {
                dest,
                ty,
                args,
                labels,
            } => Self {
                op: op("phi"),
                dest: Some(dest),
                ty: Some(ty),
                args,
                labels,
                ..Self::default()
            },
            Instruction::Alloc { dest, ty, size } => Self {
                op: op("alloc"),
                dest: Some(dest),
                ty: Some(ty),
                args: vec![size],
                ..Self::default()
            },
            Instruction::Store { ptr, value } => Self {
                op: op("store"),
                args: vec![ptr, value],
                ..Self::default()
            },
            Instruction::Load { dest, ty, ptr } => Self {
                op: op("load"),
                dest: Some(dest),
                ty: Some(ty),
                args: vec![ptr],
                ..Self::default()
            },
            Instruction::PtrAdd {
                dest,
                ty,
                ptr,
                offset,
            } => Self {
                op: op("ptradd"),
                dest: Some(dest),
                ty: Some(ty),
                args: vec![ptr, offset],
                ..Self::default()
            },
        }
    }
}

impl Program {
    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }

    pub fn from_reader(reader: impl std::io::Read) -> serde_json::Result<Self> {
        serde_json::from_reader(reader)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
