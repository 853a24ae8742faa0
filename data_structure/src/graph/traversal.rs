use crate::{index::vec::Idx, BitVec};

use super::{DirectedGraph, StartNode, Successors};

/// Depth-first postorder walk driven by an explicit stack.
///
/// Successors are explored in the order the graph yields them, so the
/// resulting order is deterministic for graphs with ordered edges.
pub struct PostOrder<'graph, G>
where
    G: DirectedGraph + Successors,
{
    graph: &'graph G,
    stack: Vec<(G::Node, std::vec::IntoIter<G::Node>)>,
    visited: BitVec<usize>,
}

impl<'graph, G> PostOrder<'graph, G>
where
    G: DirectedGraph + Successors,
{
    pub fn new(graph: &'graph G) -> Self {
        Self {
            graph,
            stack: Vec::new(),
            visited: BitVec::repeat(false, graph.num_nodes()),
        }
    }

    fn push(&mut self, node: G::Node) {
        self.visited.set(node.index(), true);
        let successors: Vec<_> = self.graph.successors(node).collect();
        self.stack.push((node, successors.into_iter()));
    }

    /// Appends every node reachable from `start` (and not seen by an earlier
    /// call) to `postorder`.
    pub fn run_from(&mut self, start: G::Node, postorder: &mut Vec<G::Node>) {
        if self.visited[start.index()] {
            return;
        }
        self.push(start);
        while let Some((_, successors)) = self.stack.last_mut() {
            let visited = &self.visited;
            match successors.find(|succ| !visited[succ.index()]) {
                Some(succ) => self.push(succ),
                None => {
                    if let Some((node, _)) = self.stack.pop() {
                        postorder.push(node);
                    }
                }
            }
        }
    }
}

/// Nodes reachable from the start node, in reverse postorder.
pub fn reverse_postorder<G>(graph: &G) -> Vec<G::Node>
where
    G: DirectedGraph + Successors + StartNode,
{
    let mut order = Vec::with_capacity(graph.num_nodes());
    PostOrder::new(graph).run_from(graph.start_node(), &mut order);
    order.reverse();
    order
}
