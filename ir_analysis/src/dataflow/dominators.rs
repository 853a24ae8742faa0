use data_structure::DenseBitSet;
use ir::Function;
use ir_cfg::{BlockId, Cfg};

use super::{operators::join_sorted, solve, DataFlowAnalysis, DataFlowData, DataFlowProblem, Direction};
use crate::{Analysis, Result};

/// The blocks that dominate each block reachable from the entry.
pub struct Dominators;

impl DataFlowAnalysis for Dominators {
    type Domain = DenseBitSet<BlockId>;

    fn run(_function: &Function, analysis: &Analysis) -> Result<DataFlowData<Self::Domain>> {
        Ok(Self::solve(analysis.cfg()?))
    }
}

impl Dominators {
    pub(crate) fn solve(cfg: &Cfg) -> DataFlowData<DenseBitSet<BlockId>> {
        solve(
            cfg,
            DominatorsProblem {
                num_blocks: cfg.num_blocks(),
            },
        )
    }
}

struct DominatorsProblem {
    num_blocks: usize,
}

impl DataFlowProblem for DominatorsProblem {
    type Domain = DenseBitSet<BlockId>;

    fn direction(&self) -> Direction {
        Direction::Forward
    }

    fn iterate_in_dfs_order(&self) -> bool {
        true
    }

    fn boundary_value(&self) -> Self::Domain {
        DenseBitSet::new_empty(self.num_blocks)
    }

    fn initial_value(&self) -> Self::Domain {
        DenseBitSet::new_filled(self.num_blocks)
    }

    fn meet(&self, values: &[&Self::Domain]) -> Self::Domain {
        let Some((first, rest)) = values.split_first() else {
            return DenseBitSet::new_empty(self.num_blocks);
        };
        let mut value = (*first).clone();
        for other in rest {
            value.intersect(other);
        }
        value
    }

    fn transfer(&mut self, _cfg: &Cfg, block: BlockId, value: &Self::Domain) -> Self::Domain {
        let mut value = value.clone();
        value.insert(block);
        value
    }

    fn format(cfg: &Cfg, value: &Self::Domain) -> String {
        join_sorted(value.iter().map(|block| cfg.label(block)))
    }
}
