//! Dominator sets, the dominance tree and dominance frontiers.
//!
//! All three are keyed by the blocks reachable from the entry; unreachable
//! blocks appear in none of them.

mod frontier;
mod tree;

use std::collections::BTreeMap;

use data_structure::{DenseBitSet, FxHashMap};
use ir_cfg::{BlockId, Cfg};

use crate::dataflow::Dominators;

pub use frontier::DominanceFrontier;
pub use tree::DominanceTree;

/// For every reachable block, the blocks that dominate it, itself included.
#[derive(Debug, Clone)]
pub struct DominatorSets {
    /// Reachable blocks in reverse postorder.
    order: Vec<BlockId>,
    sets: FxHashMap<BlockId, DenseBitSet<BlockId>>,
}

impl DominatorSets {
    pub fn new(cfg: &Cfg) -> Self {
        let data = Dominators::solve(cfg);
        let order = data.order().to_vec();
        let sets = order
            .iter()
            .filter_map(|&block| data.out_value(block).map(|set| (block, set.clone())))
            .collect();
        Self { order, sets }
    }

    pub fn blocks(&self) -> &[BlockId] {
        &self.order
    }

    pub fn contains(&self, block: BlockId) -> bool {
        self.sets.contains_key(&block)
    }

    pub fn dominators(&self, block: BlockId) -> Option<&DenseBitSet<BlockId>> {
        self.sets.get(&block)
    }

    /// Whether every path from the entry to `block` passes through
    /// `dominator`. `false` if `block` is unreachable.
    pub fn dominates(&self, dominator: BlockId, block: BlockId) -> bool {
        self.sets
            .get(&block)
            .is_some_and(|set| set.contains(dominator))
    }

    pub fn strictly_dominates(&self, dominator: BlockId, block: BlockId) -> bool {
        dominator != block && self.dominates(dominator, block)
    }

    pub fn to_json(&self, cfg: &Cfg) -> serde_json::Result<String> {
        to_json(
            cfg,
            self.order
                .iter()
                .map(|&block| (block, self.sets[&block].iter())),
        )
    }
}

/// Pretty JSON object from block to blocks, with keys and members sorted by
/// label.
pub(crate) fn to_json<I>(
    cfg: &Cfg,
    entries: impl IntoIterator<Item = (BlockId, I)>,
) -> serde_json::Result<String>
where
    I: IntoIterator<Item = BlockId>,
{
    let map: BTreeMap<&str, Vec<&str>> = entries
        .into_iter()
        .map(|(block, members)| {
            let mut members: Vec<&str> = members
                .into_iter()
                .map(|member| cfg.label(member).as_str())
                .collect();
            members.sort_unstable();
            (cfg.label(block).as_str(), members)
        })
        .collect();
    serde_json::to_string_pretty(&map)
}
