use std::{cmp::Ordering, collections::BTreeSet, fmt};

use ir::{Function, Instruction, Operator, Variable};
use ir_cfg::{BlockId, Cfg};

use super::{
    operators::set_intersection, solve, DataFlowAnalysis, DataFlowData, DataFlowProblem,
    Direction,
};
use crate::{Analysis, Result};

/// A pure operation on named operands, such as `add(a, b)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression {
    pub op: Operator,
    pub args: Vec<Variable>,
}

impl Expression {
    fn of(instruction: &Instruction) -> Option<Self> {
        match instruction {
            Instruction::Operation { op, args, .. } => Some(Self {
                op: *op,
                args: args.clone(),
            }),
            _ => None,
        }
    }

    fn mentions(&self, variable: &Variable) -> bool {
        self.args.contains(variable)
    }
}

// Sorted by operator name so that dumps list them alphabetically.
impl Ord for Expression {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.op.as_str(), &self.args).cmp(&(other.op.as_str(), &other.args))
    }
}

impl PartialOrd for Expression {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.op, self.args.join(", "))
    }
}

/// Expressions computed on every path to each point whose operands have not
/// been reassigned since.
pub struct AvailableExpressions;

impl DataFlowAnalysis for AvailableExpressions {
    type Domain = BTreeSet<Expression>;

    fn run(_function: &Function, analysis: &Analysis) -> Result<DataFlowData<Self::Domain>> {
        let cfg = analysis.cfg()?;
        let expressions = cfg
            .blocks()
            .flat_map(|(_, block)| block.instructions.iter())
            .filter_map(Expression::of)
            .collect();
        Ok(solve(cfg, AvailableExpressionsProblem { expressions }))
    }
}

struct AvailableExpressionsProblem {
    /// Every expression in the function.
    expressions: BTreeSet<Expression>,
}

impl DataFlowProblem for AvailableExpressionsProblem {
    type Domain = BTreeSet<Expression>;

    fn direction(&self) -> Direction {
        Direction::Forward
    }

    fn boundary_value(&self) -> Self::Domain {
        BTreeSet::new()
    }

    fn initial_value(&self) -> Self::Domain {
        self.expressions.clone()
    }

    fn meet(&self, values: &[&Self::Domain]) -> Self::Domain {
        set_intersection(values)
    }

    fn transfer(&mut self, cfg: &Cfg, block: BlockId, value: &Self::Domain) -> Self::Domain {
        let mut value = value.clone();
        for instruction in &cfg[block].instructions {
            if let Some(expression) = Expression::of(instruction) {
                value.insert(expression);
            }
            if let Some(dest) = instruction.destination() {
                value.retain(|expression| !expression.mentions(dest));
            }
        }
        value
    }

    fn format(_cfg: &Cfg, value: &Self::Domain) -> String {
        value
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
