//! Graph implementation for the CFG.

use data_structure::graph::{self, traversal};

use crate::{BlockId, Cfg};

impl graph::DirectedGraph for Cfg {
    type Node = BlockId;

    fn num_nodes(&self) -> usize {
        self.num_blocks()
    }
}

impl graph::StartNode for Cfg {
    fn start_node(&self) -> Self::Node {
        self.entry()
    }
}

impl graph::Successors for Cfg {
    fn successors(&self, node: Self::Node) -> impl Iterator<Item = Self::Node> {
        self[node].successors().iter().copied()
    }
}

impl Cfg {
    /// Blocks reachable from the entry, in reverse postorder.
    pub fn reverse_postorder(&self) -> Vec<BlockId> {
        traversal::reverse_postorder(self)
    }
}

#[cfg(test)]
mod tests {
    use crate::Cfg;

    #[test]
    fn test_reverse_postorder_skips_unreachable_blocks() {
        let program = test_utility::load_program("loopcond+unreachable");
        let cfg = Cfg::new(&program.functions[0]).unwrap();
        let order: Vec<_> = cfg
            .reverse_postorder()
            .into_iter()
            .map(|id| cfg.label(id).as_str())
            .collect();
        assert_eq!(order, ["entry", "loop", "exit", "body", "then", "endif"]);
    }
}
