pub mod traversal;

use crate::index;

pub trait DirectedGraph {
    type Node: index::vec::Idx;

    /// Upper bound of the node indices, used to size dense sets.
    fn num_nodes(&self) -> usize;
}

pub trait StartNode: DirectedGraph {
    fn start_node(&self) -> Self::Node;
}

pub trait Successors: DirectedGraph {
    fn successors(&self, node: Self::Node) -> impl Iterator<Item = Self::Node>;
}
