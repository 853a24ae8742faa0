use data_structure::FxHashMap;
use ir_cfg::{BlockId, Cfg};

use super::{to_json, DominatorSets};
use crate::{Error, Result};

/// Immediate-dominator tree over the reachable blocks.
#[derive(Debug, Clone)]
pub struct DominanceTree {
    root: BlockId,
    parent: FxHashMap<BlockId, BlockId>,
    /// Sorted by label.
    children: FxHashMap<BlockId, Vec<BlockId>>,
}

impl DominanceTree {
    /// Visits blocks by increasing number of dominators, which is their depth
    /// in the tree, so every candidate parent already has a depth. The
    /// immediate dominator is the deepest strict dominator; equal depths go to
    /// the lowest label.
    pub fn new(cfg: &Cfg, dominators: &DominatorSets) -> Result<Self> {
        let mut blocks: Vec<(usize, BlockId)> = dominators
            .blocks()
            .iter()
            .filter_map(|&block| Some((dominators.dominators(block)?.count(), block)))
            .collect();
        blocks.sort_by(|(a_depth, a), (b_depth, b)| {
            a_depth.cmp(b_depth).then_with(|| cfg.label(*a).cmp(cfg.label(*b)))
        });

        let mut depth = FxHashMap::default();
        let mut parent = FxHashMap::default();
        let mut children: FxHashMap<BlockId, Vec<BlockId>> = FxHashMap::default();
        let mut root = None;
        for &(count, block) in &blocks {
            depth.insert(block, count);
            children.entry(block).or_default();
            let Some(set) = dominators.dominators(block) else {
                continue;
            };
            let idom = set
                .iter()
                .filter(|&candidate| candidate != block)
                .filter_map(|candidate| Some((*depth.get(&candidate)?, candidate)))
                .max_by(|(a_depth, a), (b_depth, b)| {
                    a_depth
                        .cmp(b_depth)
                        .then_with(|| cfg.label(*b).cmp(cfg.label(*a)))
                });
            match idom {
                Some((_, idom)) => {
                    parent.insert(block, idom);
                    children.entry(idom).or_default().push(block);
                }
                None if root.is_none() => root = Some(block),
                None => unreachable!("the entry is the only block dominated by itself alone"),
            }
        }
        for siblings in children.values_mut() {
            siblings.sort_by(|a, b| cfg.label(*a).cmp(cfg.label(*b)));
        }

        let root = root.ok_or_else(|| Error::EntryNotDominated(cfg.label(cfg.entry()).clone()))?;
        if root != cfg.entry() {
            return Err(Error::EntryNotDominated(cfg.label(cfg.entry()).clone()));
        }
        Ok(Self {
            root,
            parent,
            children,
        })
    }

    pub fn root(&self) -> BlockId {
        self.root
    }

    pub fn contains(&self, block: BlockId) -> bool {
        self.children.contains_key(&block)
    }

    /// `None` for the root and for blocks outside the tree.
    pub fn immediate_dominator(&self, block: BlockId) -> Option<BlockId> {
        self.parent.get(&block).copied()
    }

    pub fn children(&self, block: BlockId) -> &[BlockId] {
        self.children.get(&block).map_or(&[], Vec::as_slice)
    }

    /// The blocks of the tree in preorder, children in label order.
    pub fn preorder(&self) -> Vec<BlockId> {
        let mut order = Vec::with_capacity(self.children.len());
        let mut stack = vec![self.root];
        while let Some(block) = stack.pop() {
            order.push(block);
            stack.extend(self.children(block).iter().rev());
        }
        order
    }

    pub fn to_json(&self, cfg: &Cfg) -> serde_json::Result<String> {
        to_json(
            cfg,
            self.children
                .iter()
                .map(|(&block, children)| (block, children.iter().copied())),
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_dominance_tree() {
        let program = test_utility::load_program("loopcond+unreachable");
        let cfg = Cfg::new(&program.functions[0]).unwrap();
        let tree = DominanceTree::new(&cfg, &DominatorSets::new(&cfg)).unwrap();
        let id = |label: &str| cfg.block_id(label).unwrap();
        let children = |label: &str| -> Vec<&str> {
            tree.children(id(label))
                .iter()
                .map(|&child| cfg.label(child).as_str())
                .collect()
        };

        assert_eq!(tree.root(), cfg.entry());
        assert_eq!(children("entry"), ["loop"]);
        assert_eq!(children("loop"), ["body", "exit"]);
        assert_eq!(children("body"), ["endif", "then"]);
        assert!(children("then").is_empty());
        assert_eq!(tree.immediate_dominator(id("endif")), Some(id("body")));
        assert_eq!(tree.immediate_dominator(id("entry")), None);
        assert!(!tree.contains(id("unreachable")));

        let preorder: Vec<_> = tree
            .preorder()
            .into_iter()
            .map(|block| cfg.label(block).as_str())
            .collect();
        assert_eq!(preorder, ["entry", "loop", "body", "endif", "then", "exit"]);
    }

    #[test]
    fn test_dominance_tree_json() {
        let program = test_utility::load_program("while");
        let cfg = Cfg::new(&program.functions[0]).unwrap();
        let tree = DominanceTree::new(&cfg, &DominatorSets::new(&cfg)).unwrap();
        assert_eq!(
            tree.to_json(&cfg).unwrap(),
            r#"{
  "while.body": [],
  "while.cond": [
    "while.body",
    "while.finish"
  ],
  "while.finish": []
}"#
        );
    }
}
