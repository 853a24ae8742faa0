//! Syntax of this IR.

use serde::{Deserialize, Serialize};

pub type Variable = String;
pub type Label = String;

/// Stands for a variable that has no definition on some path, as in the
/// operands of a phi.
pub const UNDEFINED: &str = "__undefined";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Int,
    Bool,
    Ptr(Box<Type>),
}

impl Type {
    pub fn ptr(pointee: Type) -> Self {
        Self::Ptr(Box::new(pointee))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Int(i64),
}

impl Literal {
    pub fn as_int(self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(value),
            Self::Bool(_) => None,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(value),
            Self::Int(_) => None,
        }
    }
}

/// Value operations. Memory and control operations have their own
/// [`Instruction`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    Add,
    Mul,
    Sub,
    Div,
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
    Not,
    And,
    Or,
}

impl Operator {
    pub const ALL: [Self; 12] = [
        Self::Add,
        Self::Mul,
        Self::Sub,
        Self::Div,
        Self::Eq,
        Self::Lt,
        Self::Gt,
        Self::Le,
        Self::Ge,
        Self::Not,
        Self::And,
        Self::Or,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Mul => "mul",
            Self::Sub => "sub",
            Self::Div => "div",
            Self::Eq => "eq",
            Self::Lt => "lt",
            Self::Gt => "gt",
            Self::Le => "le",
            Self::Ge => "ge",
            Self::Not => "not",
            Self::And => "and",
            Self::Or => "or",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }

    pub fn arity(self) -> usize {
        match self {
            Self::Not => 1,
            _ => 2,
        }
    }

    pub fn is_commutative(self) -> bool {
        matches!(self, Self::Add | Self::Mul | Self::Eq | Self::And | Self::Or)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    try_from = "crate::json::RawInstruction",
    into = "crate::json::RawInstruction"
)]
pub enum Instruction {
    /// Marks the start of a basic block.
    Label { label: Label },
    Operation {
        op: Operator,
        dest: Variable,
        ty: Type,
        args: Vec<Variable>,
    },
    Constant {
        dest: Variable,
        ty: Type,
        value: Literal,
    },
    Jump { target: Label },
    Branch {
        cond: Variable,
        then_label: Label,
        else_label: Label,
    },
    Call {
        function: String,
        args: Vec<Variable>,
        dest: Option<Variable>,
        ty: Option<Type>,
    },
    Return { arg: Option<Variable> },
    /// Copy.
    Id {
        dest: Variable,
        ty: Type,
        arg: Variable,
    },
    Print { args: Vec<Variable> },
    Nop,
    /// `args[i]` is the value flowing in from the block labeled `labels[i]`.
    Phi {
        dest: Variable,
        ty: Type,
        args: Vec<Variable>,
        labels: Vec<Label>,
    },
    Alloc {
        dest: Variable,
        ty: Type,
        size: Variable,
    },
    Store { ptr: Variable, value: Variable },
    Load {
        dest: Variable,
        ty: Type,
        ptr: Variable,
    },
    PtrAdd {
        dest: Variable,
        ty: Type,
        ptr: Variable,
        offset: Variable,
    },
}

impl Instruction {
    pub fn label(label: impl Into<Label>) -> Self {
        Self::Label {
            label: label.into(),
        }
    }

    pub fn jump(target: impl Into<Label>) -> Self {
        Self::Jump {
            target: target.into(),
        }
    }

    pub fn ret(arg: Option<Variable>) -> Self {
        Self::Return { arg }
    }

    pub fn id(dest: impl Into<Variable>, ty: Type, arg: impl Into<Variable>) -> Self {
        Self::Id {
            dest: dest.into(),
            ty,
            arg: arg.into(),
        }
    }

    /// A phi without operands, to be filled in while renaming.
    pub fn empty_phi(dest: impl Into<Variable>, ty: Type) -> Self {
        Self::Phi {
            dest: dest.into(),
            ty,
            args: Vec::new(),
            labels: Vec::new(),
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Self::Jump { .. } | Self::Branch { .. } | Self::Return { .. }
        )
    }

    pub fn is_label(&self) -> bool {
        matches!(self, Self::Label { .. })
    }

    pub fn is_phi(&self) -> bool {
        matches!(self, Self::Phi { .. })
    }

    /// The variable this instruction defines, if any.
    pub fn destination(&self) -> Option<&Variable> {
        match self {
            Self::Operation { dest, .. }
            | Self::Constant { dest, .. }
            | Self::Id { dest, .. }
            | Self::Phi { dest, .. }
            | Self::Alloc { dest, .. }
            | Self::Load { dest, .. }
            | Self::PtrAdd { dest, .. } => Some(dest),
            Self::Call { dest, .. } => dest.as_ref(),
            Self::Label { .. }
            | Self::Jump { .. }
            | Self::Branch { .. }
            | Self::Return { .. }
            | Self::Print { .. }
            | Self::Nop
            | Self::Store { .. } => None,
        }
    }

    pub fn destination_mut(&mut self) -> Option<&mut Variable> {
        match self {
            Self::Operation { dest, .. }
            | Self::Constant { dest, .. }
            | Self::Id { dest, .. }
            | Self::Phi { dest, .. }
            | Self::Alloc { dest, .. }
            | Self::Load { dest, .. }
            | Self::PtrAdd { dest, .. } => Some(dest),
            Self::Call { dest, .. } => dest.as_mut(),
            Self::Label { .. }
            | Self::Jump { .. }
            | Self::Branch { .. }
            | Self::Return { .. }
            | Self::Print { .. }
            | Self::Nop
            | Self::Store { .. } => None,
        }
    }

    /// The variables this instruction reads, in operand order.
    pub fn arguments(&self) -> Vec<&Variable> {
        match self {
            Self::Operation { args, .. }
            | Self::Call { args, .. }
            | Self::Print { args }
            | Self::Phi { args, .. } => args.iter().collect(),
            Self::Branch { cond, .. } => vec![cond],
            Self::Return { arg } => arg.iter().collect(),
            Self::Id { arg, .. } => vec![arg],
            Self::Alloc { size, .. } => vec![size],
            Self::Store { ptr, value } => vec![ptr, value],
            Self::Load { ptr, .. } => vec![ptr],
            Self::PtrAdd { ptr, offset, .. } => vec![ptr, offset],
            Self::Label { .. } | Self::Constant { .. } | Self::Jump { .. } | Self::Nop => vec![],
        }
    }

    pub fn arguments_mut(&mut self) -> Vec<&mut Variable> {
        match self {
            Self::Operation { args, .. }
            | Self::Call { args, .. }
            | Self::Print { args }
            | Self::Phi { args, .. } => args.iter_mut().collect(),
            Self::Branch { cond, .. } => vec![cond],
            Self::Return { arg } => arg.iter_mut().collect(),
            Self::Id { arg, .. } => vec![arg],
            Self::Alloc { size, .. } => vec![size],
            Self::Store { ptr, value } => vec![ptr, value],
            Self::Load { ptr, .. } => vec![ptr],
            Self::PtrAdd { ptr, offset, .. } => vec![ptr, offset],
            Self::Label { .. } | Self::Constant { .. } | Self::Jump { .. } | Self::Nop => vec![],
        }
    }

    /// The declared type of the destination, if any.
    pub fn ty(&self) -> Option<&Type> {
        match self {
            Self::Operation { ty, .. }
            | Self::Constant { ty, .. }
            | Self::Id { ty, .. }
            | Self::Phi { ty, .. }
            | Self::Alloc { ty, .. }
            | Self::Load { ty, .. }
            | Self::PtrAdd { ty, .. } => Some(ty),
            Self::Call { ty, .. } => ty.as_ref(),
            Self::Label { .. }
            | Self::Jump { .. }
            | Self::Branch { .. }
            | Self::Return { .. }
            | Self::Print { .. }
            | Self::Nop
            | Self::Store { .. } => None,
        }
    }

    /// Labels this instruction refers to: branch targets and phi sources.
    pub fn referenced_labels(&self) -> Vec<&Label> {
        match self {
            Self::Jump { target } => vec![target],
            Self::Branch {
                then_label,
                else_label,
                ..
            } => vec![then_label, else_label],
            Self::Phi { labels, .. } => labels.iter().collect(),
            _ => vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub name: Variable,
    #[serde(rename = "type")]
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(rename = "args", default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<Type>,
    #[serde(rename = "instrs", default)]
    pub instructions: Vec<Instruction>,
}

impl Function {
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|param| param.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<Function>,
}

impl Program {
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|function| function.name == name)
    }
}
