use data_structure::{FxHashMap, FxHashSet};
use ir::{
    Function, Instruction, Literal, MutVisitor, Operator, Type, Variable, VariableVisitContext,
    Visitor,
};
use ir_analysis::Analysis;

use crate::{Error, Pass, Result};

/// Optional rewrites on top of plain common subexpression elimination.
#[derive(Debug, Clone, Copy, Default)]
pub struct LvnConfig {
    /// Sort the operands of commutative operators, so `add a b` and
    /// `add b a` get the same number.
    pub canonicalise: bool,
    /// Let a copy share the number of its source.
    pub copy_propagation: bool,
    /// Turn a copy of a constant into the constant itself.
    pub constant_propagation: bool,
    /// Evaluate operations whose result is known at compile time.
    pub constant_folding: bool,
}

/// Value numbering within each basic block.
///
/// A recomputed value becomes a copy of the variable that already holds it.
/// Definitions that are overwritten later in the same block get a fresh
/// name, so a value stays readable after its variable is reassigned.
/// Nothing is carried across blocks.
pub struct LocalValueNumbering {
    config: LvnConfig,
}

impl LocalValueNumbering {
    pub fn new(config: LvnConfig) -> Self {
        Self { config }
    }
}

impl Pass for LocalValueNumbering {
    fn name(&self) -> &'static str {
        "lvn"
    }

    fn run_pass(&mut self, function: &mut Function, analysis: &mut Analysis) -> Result<()> {
        struct NameCollector<'a> {
            taken: &'a mut FxHashSet<Variable>,
        }

        impl Visitor for NameCollector<'_> {
            fn visit_variable(&mut self, variable: &Variable, _context: VariableVisitContext) {
                self.taken.insert(variable.clone());
            }
        }

        let mut taken = FxHashSet::default();
        NameCollector { taken: &mut taken }.visit_function(function);

        let cfg = analysis.cfg_mut()?;
        let mut renamed = 0;
        for id in cfg.layout().to_vec() {
            if cfg[id].phis().next().is_some() {
                return Err(Error::UnexpectedPhi {
                    function: function.name.clone(),
                    block: cfg.label(id).clone(),
                });
            }
            let instructions = std::mem::take(&mut cfg[id].instructions);
            let before = taken.len();
            cfg[id].instructions = BlockNumbering::new(self.config, &mut taken).run(instructions);
            renamed += taken.len() - before;
        }

        tracing::debug!(function = %function.name, renamed, "numbered values");
        *function = cfg.to_function(false);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Expression {
    Constant(Literal),
    Operation(Operator, Vec<usize>),
}

/// One value of the block, with the emitted variables that currently hold it.
struct Row {
    holders: Vec<Variable>,
    constant: Option<Literal>,
}

struct BlockNumbering<'a> {
    config: LvnConfig,
    taken: &'a mut FxHashSet<Variable>,
    rows: Vec<Row>,
    numbers: FxHashMap<Expression, usize>,
    /// Source variable to the row of its current value.
    env: FxHashMap<Variable, usize>,
}

impl<'a> BlockNumbering<'a> {
    fn new(config: LvnConfig, taken: &'a mut FxHashSet<Variable>) -> Self {
        Self {
            config,
            taken,
            rows: Vec::new(),
            numbers: FxHashMap::default(),
            env: FxHashMap::default(),
        }
    }

    fn run(mut self, instructions: Vec<Instruction>) -> Vec<Instruction> {
        let mut last_definition = FxHashMap::default();
        for (index, instruction) in instructions.iter().enumerate() {
            if let Some(dest) = instruction.destination() {
                last_definition.insert(dest.clone(), index);
            }
        }

        let mut output = Vec::with_capacity(instructions.len());
        for (index, instruction) in instructions.into_iter().enumerate() {
            let emitted = |this: &mut Self, dest: &Variable| {
                if last_definition.get(dest) == Some(&index) {
                    dest.clone()
                } else {
                    this.fresh_name(dest)
                }
            };
            let instruction = match instruction {
                Instruction::Constant { dest, ty, value } => {
                    let emitted = emitted(&mut self, &dest);
                    self.kill(&emitted);
                    self.define_constant(dest, emitted, ty, value)
                }
                Instruction::Operation { op, dest, ty, args } => {
                    let mut numbers: Vec<usize> = args.iter().map(|arg| self.number(arg)).collect();
                    if self.config.canonicalise && op.is_commutative() {
                        numbers.sort_unstable();
                    }
                    let args = numbers.iter().map(|&row| self.canonical(row).clone()).collect();
                    let folded = if self.config.constant_folding {
                        fold(op, &numbers, &self.rows)
                    } else {
                        None
                    };
                    let emitted = emitted(&mut self, &dest);
                    self.kill(&emitted);
                    match folded {
                        Some(value) => self.define_constant(dest, emitted, ty, value),
                        None => self.define_operation(op, dest, emitted, ty, numbers, args),
                    }
                }
                Instruction::Id { dest, ty, arg } => {
                    let row = self.number(&arg);
                    let source = self.canonical(row).clone();
                    let emitted = emitted(&mut self, &dest);
                    self.kill(&emitted);
                    let constant = self.rows[row].constant;
                    match constant {
                        Some(value) if self.config.constant_propagation => {
                            self.define_constant(dest, emitted, ty, value)
                        }
                        _ => {
                            if self.config.copy_propagation {
                                self.define(dest, emitted.clone(), row);
                            } else {
                                self.define_opaque(dest, emitted.clone());
                            }
                            Instruction::id(emitted, ty, source)
                        }
                    }
                }
                mut instruction => {
                    self.visit_instruction(&mut instruction);
                    let dest = instruction.destination().cloned();
                    if let Some(dest) = dest {
                        let emitted = emitted(&mut self, &dest);
                        self.kill(&emitted);
                        self.define_opaque(dest, emitted.clone());
                        if let Some(slot) = instruction.destination_mut() {
                            *slot = emitted;
                        }
                    }
                    instruction
                }
            };
            output.push(instruction);
        }
        output
    }

    /// The row of the value `name` holds, creating one for a value that
    /// flows into the block.
    fn number(&mut self, name: &str) -> usize {
        if let Some(&row) = self.env.get(name) {
            return row;
        }
        let row = self.push_row(None);
        self.rows[row].holders.push(name.to_string());
        self.env.insert(name.to_string(), row);
        row
    }

    fn canonical(&self, row: usize) -> &Variable {
        self.rows[row]
            .holders
            .first()
            .expect("the variable a row is read through still holds it")
    }

    fn push_row(&mut self, constant: Option<Literal>) -> usize {
        self.rows.push(Row {
            holders: Vec::new(),
            constant,
        });
        self.rows.len() - 1
    }

    fn fresh_name(&mut self, dest: &str) -> Variable {
        let mut suffix = 0;
        loop {
            let name = format!("{dest}.{suffix}");
            if self.taken.insert(name.clone()) {
                return name;
            }
            suffix += 1;
        }
    }

    /// `emitted` is about to be overwritten.
    fn kill(&mut self, emitted: &str) {
        for row in &mut self.rows {
            row.holders.retain(|holder| holder != emitted);
        }
    }

    fn define(&mut self, dest: Variable, emitted: Variable, row: usize) {
        self.rows[row].holders.push(emitted);
        self.env.insert(dest, row);
    }

    fn define_opaque(&mut self, dest: Variable, emitted: Variable) {
        let row = self.push_row(None);
        self.define(dest, emitted, row);
    }

    fn define_constant(
        &mut self,
        dest: Variable,
        emitted: Variable,
        ty: Type,
        value: Literal,
    ) -> Instruction {
        let row = match self.numbers.get(&Expression::Constant(value)) {
            Some(&row) => row,
            None => {
                let row = self.push_row(Some(value));
                self.numbers.insert(Expression::Constant(value), row);
                row
            }
        };
        self.define(dest, emitted.clone(), row);
        Instruction::Constant {
            dest: emitted,
            ty,
            value,
        }
    }

    fn define_operation(
        &mut self,
        op: Operator,
        dest: Variable,
        emitted: Variable,
        ty: Type,
        numbers: Vec<usize>,
        args: Vec<Variable>,
    ) -> Instruction {
        let expression = Expression::Operation(op, numbers);
        let existing = self.numbers.get(&expression).and_then(|&row| {
            let holder = self.rows[row].holders.first()?.clone();
            Some((row, holder))
        });
        match existing {
            Some((row, holder)) => {
                self.define(dest, emitted.clone(), row);
                Instruction::id(emitted, ty, holder)
            }
            None => {
                let row = self.push_row(None);
                self.numbers.insert(expression, row);
                self.define(dest, emitted.clone(), row);
                Instruction::Operation {
                    op,
                    dest: emitted,
                    ty,
                    args,
                }
            }
        }
    }
}

/// Rewrites every operand to the canonical holder of its value.
impl MutVisitor for BlockNumbering<'_> {
    fn visit_variable(&mut self, variable: &mut Variable, context: VariableVisitContext) {
        if context == VariableVisitContext::Use {
            let row = self.number(variable);
            *variable = self.canonical(row).clone();
        }
    }
}

/// The result of `op` on the values numbered `args`, when it does not
/// depend on anything unknown. Integer arithmetic wraps like the
/// interpreter's, and division by zero is left for run time.
fn fold(op: Operator, args: &[usize], rows: &[Row]) -> Option<Literal> {
    use Literal::{Bool, Int};

    let constants: Vec<Option<Literal>> = args.iter().map(|&row| rows[row].constant).collect();
    match (op, constants.as_slice()) {
        (Operator::And, [Some(Bool(false)), _] | [_, Some(Bool(false))]) => return Some(Bool(false)),
        (Operator::Or, [Some(Bool(true)), _] | [_, Some(Bool(true))]) => return Some(Bool(true)),
        _ => {}
    }
    match (op, args) {
        (Operator::Eq | Operator::Le | Operator::Ge, [a, b]) if a == b => return Some(Bool(true)),
        (Operator::Lt | Operator::Gt, [a, b]) if a == b => return Some(Bool(false)),
        _ => {}
    }

    let constants: Vec<Literal> = constants.into_iter().collect::<Option<_>>()?;
    let value = match (op, constants.as_slice()) {
        (Operator::Add, [Int(a), Int(b)]) => Int(a.wrapping_add(*b)),
        (Operator::Sub, [Int(a), Int(b)]) => Int(a.wrapping_sub(*b)),
        (Operator::Mul, [Int(a), Int(b)]) => Int(a.wrapping_mul(*b)),
        (Operator::Div, [Int(a), Int(b)]) if *b != 0 => Int(a.wrapping_div(*b)),
        (Operator::Eq, [Int(a), Int(b)]) => Bool(a == b),
        (Operator::Eq, [Bool(a), Bool(b)]) => Bool(a == b),
        (Operator::Lt, [Int(a), Int(b)]) => Bool(a < b),
        (Operator::Gt, [Int(a), Int(b)]) => Bool(a > b),
        (Operator::Le, [Int(a), Int(b)]) => Bool(a <= b),
        (Operator::Ge, [Int(a), Int(b)]) => Bool(a >= b),
        (Operator::And, [Bool(a), Bool(b)]) => Bool(*a && *b),
        (Operator::Or, [Bool(a), Bool(b)]) => Bool(*a || *b),
        (Operator::Not, [Bool(a)]) => Bool(!a),
        _ => return None,
    };
    Some(value)
}
