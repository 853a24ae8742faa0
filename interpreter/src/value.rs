use std::fmt;

use ir::{Literal, Type};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Pointer(Pointer),
}

/// An element of a heap allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pointer {
    pub(crate) allocation: usize,
    pub(crate) offset: i64,
    pub pointee: Type,
}

impl Value {
    pub fn ty(&self) -> Type {
        match self {
            Self::Int(_) => Type::Int,
            Self::Bool(_) => Type::Bool,
            Self::Pointer(pointer) => Type::ptr(pointer.pointee.clone()),
        }
    }

    /// The zero value a fresh allocation of `ty` holds, if it has one.
    pub(crate) fn zero(ty: &Type) -> Option<Self> {
        match ty {
            Type::Int => Some(Self::Int(0)),
            Type::Bool => Some(Self::Bool(false)),
            Type::Ptr(_) => None,
        }
    }
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Int(value) => Self::Int(value),
            Literal::Bool(value) => Self::Bool(value),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Pointer(_) => write!(f, "pointer"),
        }
    }
}
