use std::collections::BTreeSet;

use ir::{Function, Variable};
use ir_cfg::{BlockId, Cfg};

use super::{
    operators::{join_sorted, set_union},
    solve, DataFlowAnalysis, DataFlowData, DataFlowProblem, Direction,
};
use crate::{Analysis, Result};

/// Variables that may be read before being redefined.
pub struct LiveVariables;

impl DataFlowAnalysis for LiveVariables {
    type Domain = BTreeSet<Variable>;

    fn run(_function: &Function, analysis: &Analysis) -> Result<DataFlowData<Self::Domain>> {
        Ok(solve(analysis.cfg()?, LiveVariablesProblem))
    }
}

struct LiveVariablesProblem;

impl DataFlowProblem for LiveVariablesProblem {
    type Domain = BTreeSet<Variable>;

    fn direction(&self) -> Direction {
        Direction::Backward
    }

    fn boundary_value(&self) -> Self::Domain {
        BTreeSet::new()
    }

    fn initial_value(&self) -> Self::Domain {
        BTreeSet::new()
    }

    fn meet(&self, values: &[&Self::Domain]) -> Self::Domain {
        set_union(values)
    }

    fn transfer(&mut self, cfg: &Cfg, block: BlockId, value: &Self::Domain) -> Self::Domain {
        let mut live = value.clone();
        for instruction in cfg[block].instructions.iter().rev() {
            if let Some(dest) = instruction.destination() {
                live.remove(dest);
            }
            live.extend(instruction.arguments().into_iter().cloned());
        }
        live
    }

    fn format(_cfg: &Cfg, value: &Self::Domain) -> String {
        join_sorted(value)
    }
}
