use std::{collections::BTreeMap, fmt};

use ir::{Function, Instruction, Literal, Variable};
use ir_cfg::{BlockId, Cfg};

use super::{solve, DataFlowAnalysis, DataFlowData, DataFlowProblem, Direction};
use crate::{Analysis, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantValue {
    Constant(Literal),
    NonConstant,
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(Literal::Bool(true)) => write!(f, "True"),
            Self::Constant(Literal::Bool(false)) => write!(f, "False"),
            Self::Constant(Literal::Int(value)) => write!(f, "{value}"),
            Self::NonConstant => write!(f, "?"),
        }
    }
}

/// The value of each variable that is assigned a constant on every path
/// that assigns it at all.
pub struct ConstantPropagation;

impl DataFlowAnalysis for ConstantPropagation {
    type Domain = BTreeMap<Variable, ConstantValue>;

    fn run(_function: &Function, analysis: &Analysis) -> Result<DataFlowData<Self::Domain>> {
        Ok(solve(analysis.cfg()?, ConstantPropagationProblem))
    }
}

struct ConstantPropagationProblem;

impl DataFlowProblem for ConstantPropagationProblem {
    type Domain = BTreeMap<Variable, ConstantValue>;

    fn direction(&self) -> Direction {
        Direction::Forward
    }

    fn boundary_value(&self) -> Self::Domain {
        BTreeMap::new()
    }

    fn initial_value(&self) -> Self::Domain {
        BTreeMap::new()
    }

    /// Union by key. Disagreeing values become [`ConstantValue::NonConstant`].
    fn meet(&self, values: &[&Self::Domain]) -> Self::Domain {
        let mut merged = BTreeMap::new();
        for value in values {
            for (variable, constant) in value.iter() {
                merged
                    .entry(variable.clone())
                    .and_modify(|existing| {
                        if existing != constant {
                            *existing = ConstantValue::NonConstant;
                        }
                    })
                    .or_insert(*constant);
            }
        }
        merged
    }

    fn transfer(&mut self, cfg: &Cfg, block: BlockId, value: &Self::Domain) -> Self::Domain {
        let mut value = value.clone();
        for instruction in &cfg[block].instructions {
            match instruction {
                Instruction::Constant {
                    dest, value: literal, ..
                } => {
                    value.insert(dest.clone(), ConstantValue::Constant(*literal));
                }
                Instruction::Id { dest, arg, .. } => {
                    let copied = value
                        .get(arg)
                        .copied()
                        .unwrap_or(ConstantValue::NonConstant);
                    value.insert(dest.clone(), copied);
                }
                _ => {
                    if let Some(dest) = instruction.destination() {
                        value.insert(dest.clone(), ConstantValue::NonConstant);
                    }
                }
            }
        }
        value
    }

    fn format(_cfg: &Cfg, value: &Self::Domain) -> String {
        value
            .iter()
            .map(|(variable, constant)| format!("{variable}: {constant}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
