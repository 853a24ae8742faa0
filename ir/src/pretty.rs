use crate::syntax::*;
use std::fmt::{self, Display, Formatter};

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Bool => write!(f, "bool"),
            Type::Ptr(pointee) => write!(f, "ptr<{pointee}>"),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(value) => write!(f, "{value}"),
            Literal::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn format_args(f: &mut Formatter<'_>, args: &[Variable]) -> fmt::Result {
    args.iter().try_for_each(|arg| write!(f, " {arg}"))
}

fn format_dest(f: &mut Formatter<'_>, dest: &Variable, ty: &Type) -> fmt::Result {
    write!(f, "{dest}: {ty} = ")
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Label { label } => return write!(f, ".{label}:"),
            Instruction::Operation { op, dest, ty, args } => {
                format_dest(f, dest, ty)?;
                write!(f, "{op}")?;
                format_args(f, args)?;
            }
            Instruction::Constant { dest, ty, value } => {
                format_dest(f, dest, ty)?;
                write!(f, "const {value}")?;
            }
            Instruction::Jump { target } => write!(f, "jmp .{target}")?,
            Instruction::Branch {
                cond,
                then_label,
                else_label,
            } => write!(f, "br {cond} .{then_label} .{else_label}")?,
            Instruction::Call {
                function,
                args,
                dest,
                ty,
            } => {
                if let (Some(dest), Some(ty)) = (dest, ty) {
                    format_dest(f, dest, ty)?;
                }
                write!(f, "call @{function}")?;
                format_args(f, args)?;
            }
            Instruction::Return { arg } => {
                write!(f, "ret")?;
                if let Some(arg) = arg {
                    write!(f, " {arg}")?;
                }
            }
            Instruction::Id { dest, ty, arg } => {
                format_dest(f, dest, ty)?;
                write!(f, "id {arg}")?;
            }
            Instruction::Print { args } => {
                write!(f, "print")?;
                format_args(f, args)?;
            }
            Instruction::Nop => write!(f, "nop")?,
            Instruction::Phi {
                dest,
                ty,
                args,
                labels,
            } => {
                format_dest(f, dest, ty)?;
                write!(f, "phi")?;
                labels
                    .iter()
                    .zip(args)
                    .try_for_each(|(label, arg)| write!(f, " .{label} {arg}"))?;
            }
            Instruction::Alloc { dest, ty, size } => {
                format_dest(f, dest, ty)?;
                write!(f, "alloc {size}")?;
            }
            Instruction::Store { ptr, value } => write!(f, "store {ptr} {value}")?,
            Instruction::Load { dest, ty, ptr } => {
                format_dest(f, dest, ty)?;
                write!(f, "load {ptr}")?;
            }
            Instruction::PtrAdd {
                dest,
                ty,
                ptr,
                offset,
            } => {
                format_dest(f, dest, ty)?;
                write!(f, "ptradd {ptr} {offset}")?;
            }
        }
        write!(f, ";")
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)?;
        if !self.parameters.is_empty() {
            write!(f, "(")?;
            for (i, param) in self.parameters.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", param.name, param.ty)?;
            }
            write!(f, ")")?;
        }
        if let Some(ty) = &self.return_type {
            write!(f, ": {ty}")?;
        }
        writeln!(f, " {{")?;
        self.instructions.iter().try_for_each(|instruction| {
            if instruction.is_label() {
                writeln!(f, "{instruction}")
            } else {
                writeln!(f, "  {instruction}")
            }
        })?;
        writeln!(f, "}}")
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.functions
            .iter()
            .try_for_each(|function| write!(f, "{function}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_print_function() {
        let function = Function {
            name: "main".into(),
            parameters: vec![Parameter {
                name: "p".into(),
                ty: Type::ptr(Type::Int),
            }],
            return_type: Some(Type::Bool),
            instructions: vec![
                Instruction::Constant {
                    dest: "one".into(),
                    ty: Type::Int,
                    value: Literal::Int(1),
                },
                Instruction::label("loop"),
                Instruction::Phi {
                    dest: "x".into(),
                    ty: Type::Int,
                    args: vec!["one".into(), "y".into()],
                    labels: vec!["b1".into(), "loop".into()],
                },
                Instruction::Load {
                    dest: "y".into(),
                    ty: Type::Int,
                    ptr: "p".into(),
                },
                Instruction::Call {
                    function: "check".into(),
                    args: vec!["x".into(), "y".into()],
                    dest: Some("c".into()),
                    ty: Some(Type::Bool),
                },
                Instruction::Branch {
                    cond: "c".into(),
                    then_label: "loop".into(),
                    else_label: "done".into(),
                },
                Instruction::label("done"),
                Instruction::ret(Some("c".into())),
            ],
        };
        assert_eq!(
            function.to_string(),
            "@main(p: ptr<int>): bool {
  one: int = const 1;
.loop:
  x: int = phi .b1 one .loop y;
  y: int = load p;
  c: bool = call @check x y;
  br c .loop .done;
.done:
  ret c;
}
"
        );
    }
}
