use crate::*;

macro_rules! overload_mut {
    ($receiver:ident, [arguments],) => {
        $receiver.arguments()
    };
    ($receiver:ident, [arguments], mut) => {
        $receiver.arguments_mut()
    };
    ($receiver:ident, [destination],) => {
        $receiver.destination()
    };
    ($receiver:ident, [destination], mut) => {
        $receiver.destination_mut()
    };
}

macro_rules! declare_visitor {
    ($name:ident, $($mutability:ident)?) => {
        pub trait $name {
            fn visit_program(&mut self, program: & $($mutability)? Program) {
                self.super_program(program);
            }

            fn super_program(&mut self, program: & $($mutability)? Program) {
                for function in & $($mutability)? program.functions {
                    self.visit_function(function);
                }
            }

            fn visit_function(&mut self, function: & $($mutability)? Function) {
                self.super_function(function);
            }

            fn super_function(&mut self, function: & $($mutability)? Function) {
                for parameter in & $($mutability)? function.parameters {
                    self.visit_parameter(parameter);
                }
                for instruction in & $($mutability)? function.instructions {
                    self.visit_instruction(instruction);
                }
            }

            fn visit_parameter(&mut self, parameter: & $($mutability)? Parameter) {
                self.super_parameter(parameter);
            }

            fn super_parameter(&mut self, parameter: & $($mutability)? Parameter) {
                self.visit_variable(& $($mutability)? parameter.name, VariableVisitContext::Define);
            }

            fn visit_instruction(&mut self, instruction: & $($mutability)? Instruction) {
                self.super_instruction(instruction);
            }

            /// Visits the operands first and the destination last, which is
            /// the order they take effect in.
            fn super_instruction(&mut self, instruction: & $($mutability)? Instruction) {
                for arg in overload_mut!(instruction, [arguments], $($mutability)?) {
                    self.visit_variable(arg, VariableVisitContext::Use);
                }
                if let Some(dest) = overload_mut!(instruction, [destination], $($mutability)?) {
                    self.visit_variable(dest, VariableVisitContext::Define);
                }
            }

            fn visit_variable(&mut self, variable: & $($mutability)? Variable, context: VariableVisitContext) {
                self.super_variable(variable, context);
            }

            fn super_variable(&mut self, _variable: & $($mutability)? Variable, _context: VariableVisitContext) {}
        }
    };
}

declare_visitor!(Visitor,);
declare_visitor!(MutVisitor, mut);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableVisitContext {
    Define,
    Use,
}
