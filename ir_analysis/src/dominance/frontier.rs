use data_structure::FxHashMap;
use ir_cfg::{BlockId, Cfg};

use super::{to_json, DominanceTree};

/// For every reachable block `a`, the blocks `b` such that `a` dominates a
/// predecessor of `b` without strictly dominating `b`.
#[derive(Debug, Clone)]
pub struct DominanceFrontier {
    frontiers: FxHashMap<BlockId, Vec<BlockId>>,
}

impl DominanceFrontier {
    pub fn new(cfg: &Cfg, tree: &DominanceTree) -> Self {
        let mut frontiers: FxHashMap<BlockId, Vec<BlockId>> = tree
            .preorder()
            .into_iter()
            .map(|block| (block, Vec::new()))
            .collect();

        for (block, data) in cfg.blocks() {
            if !tree.contains(block) {
                continue;
            }
            if block != cfg.entry() && data.predecessors().len() < 2 {
                continue;
            }
            let idom = tree.immediate_dominator(block);
            for &predecessor in data.predecessors() {
                if !tree.contains(predecessor) {
                    continue;
                }
                // Walk up from the predecessor until the immediate dominator
                // of `block`, or past the root when `block` is the entry.
                let mut runner = Some(predecessor);
                while let Some(current) = runner.filter(|&current| Some(current) != idom) {
                    let frontier = frontiers.entry(current).or_default();
                    if !frontier.contains(&block) {
                        frontier.push(block);
                    }
                    runner = tree.immediate_dominator(current);
                }
            }
        }
        for frontier in frontiers.values_mut() {
            frontier.sort_by(|a, b| cfg.label(*a).cmp(cfg.label(*b)));
        }
        Self { frontiers }
    }

    pub fn contains(&self, block: BlockId) -> bool {
        self.frontiers.contains_key(&block)
    }

    /// Sorted by label; empty for blocks outside the tree.
    pub fn frontier(&self, block: BlockId) -> &[BlockId] {
        self.frontiers.get(&block).map_or(&[], Vec::as_slice)
    }

    pub fn to_json(&self, cfg: &Cfg) -> serde_json::Result<String> {
        to_json(
            cfg,
            self.frontiers
                .iter()
                .map(|(&block, frontier)| (block, frontier.iter().copied())),
        )
    }
}
