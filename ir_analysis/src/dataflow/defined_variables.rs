use std::collections::BTreeSet;

use data_structure::FxHashMap;
use ir::{Function, Variable};
use ir_cfg::{BlockId, Cfg};

use super::{
    operators::{join_sorted, set_union},
    solve, DataFlowAnalysis, DataFlowData, DataFlowProblem, Direction,
};
use crate::{Analysis, Result};

/// Variables defined on at least one path to each point.
pub struct DefinedVariables;

impl DataFlowAnalysis for DefinedVariables {
    type Domain = BTreeSet<Variable>;

    fn run(_function: &Function, analysis: &Analysis) -> Result<DataFlowData<Self::Domain>> {
        Ok(solve(
            analysis.cfg()?,
            DefinedVariablesProblem {
                gen: FxHashMap::default(),
            },
        ))
    }
}

struct DefinedVariablesProblem {
    gen: FxHashMap<BlockId, Vec<Variable>>,
}

impl DataFlowProblem for DefinedVariablesProblem {
    type Domain = BTreeSet<Variable>;

    fn direction(&self) -> Direction {
        Direction::Forward
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
        let gen = self.gen.entry(block).or_insert_with(|| {
            cfg[block]
                .instructions
                .iter()
                .filter_map(|instruction| instruction.destination().cloned())
                .collect()
        });
        let mut value = value.clone();
        value.extend(gen.iter().cloned());
        value
    }

    fn format(_cfg: &Cfg, value: &Self::Domain) -> String {
        join_sorted(value)
    }
}
