use std::collections::BTreeSet;

use ir::{Function, Variable};
use ir_cfg::{BlockId, Cfg};

use super::{
    operators::{join_sorted, set_intersection},
    solve, DataFlowAnalysis, DataFlowData, DataFlowProblem, Direction,
};
use crate::{Analysis, Result};

/// Variables defined on every path to each point. Parameters count as
/// defined on entry.
pub struct InitializedVariables;

impl DataFlowAnalysis for InitializedVariables {
    type Domain = BTreeSet<Variable>;

    fn run(function: &Function, analysis: &Analysis) -> Result<DataFlowData<Self::Domain>> {
        let parameters = function
            .parameters
            .iter()
            .map(|parameter| parameter.name.clone())
            .collect();
        Ok(solve(
            analysis.cfg()?,
            InitializedVariablesProblem { parameters },
        ))
    }
}

struct InitializedVariablesProblem {
    parameters: BTreeSet<Variable>,
}

impl DataFlowProblem for InitializedVariablesProblem {
    type Domain = BTreeSet<Variable>;

    fn direction(&self) -> Direction {
        Direction::Forward
    }

    fn boundary_value(&self) -> Self::Domain {
        self.parameters.clone()
    }

    fn initial_value(&self) -> Self::Domain {
        BTreeSet::new()
    }

    fn meet(&self, values: &[&Self::Domain]) -> Self::Domain {
        set_intersection(values)
    }

    fn transfer(&mut self, cfg: &Cfg, block: BlockId, value: &Self::Domain) -> Self::Domain {
        let mut value = value.clone();
        value.extend(
            cfg[block]
                .instructions
                .iter()
                .filter_map(|instruction| instruction.destination().cloned()),
        );
        value
    }

    fn format(_cfg: &Cfg, value: &Self::Domain) -> String {
        join_sorted(value)
    }
}
