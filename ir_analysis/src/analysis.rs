use ir::Function;
use ir_cfg::Cfg;
use once_cell::unsync::OnceCell;

use crate::{DominanceFrontier, DominanceTree, DominatorSets, Result};

/// Per-function cache of the control-flow graph and the dominance results
/// derived from it.
///
/// Everything is computed on first access. A pass that rewrites the function
/// either edits the graph through [`Analysis::cfg_mut`], which drops the
/// dominance results, or hands back a new function with
/// [`Analysis::reset_all`].
#[derive(Debug)]
pub struct Analysis {
    function: Function,
    cfg: OnceCell<Cfg>,
    dominators: OnceCell<DominatorSets>,
    dominance_tree: OnceCell<DominanceTree>,
    dominance_frontier: OnceCell<DominanceFrontier>,
}

impl Analysis {
    pub fn new(function: Function) -> Self {
        Self {
            function,
            cfg: OnceCell::new(),
            dominators: OnceCell::new(),
            dominance_tree: OnceCell::new(),
            dominance_frontier: OnceCell::new(),
        }
    }

    /// The function as of the last [`Analysis::reset_all`].
    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn cfg(&self) -> Result<&Cfg> {
        Ok(self.cfg.get_or_try_init(|| Cfg::new(&self.function))?)
    }

    /// The graph for in-place rewriting. Dominance results computed so far
    /// are discarded.
    pub fn cfg_mut(&mut self) -> Result<&mut Cfg> {
        self.cfg()?;
        self.reset_dominance();
        Ok(self
            .cfg
            .get_mut()
            .expect("control-flow graph was built above"))
    }

    pub fn dominators(&self) -> Result<&DominatorSets> {
        let cfg = self.cfg()?;
        Ok(self.dominators.get_or_init(|| DominatorSets::new(cfg)))
    }

    pub fn dominance_tree(&self) -> Result<&DominanceTree> {
        let cfg = self.cfg()?;
        let dominators = self.dominators()?;
        self.dominance_tree
            .get_or_try_init(|| DominanceTree::new(cfg, dominators))
    }

    pub fn dominance_frontier(&self) -> Result<&DominanceFrontier> {
        let cfg = self.cfg()?;
        let tree = self.dominance_tree()?;
        Ok(self
            .dominance_frontier
            .get_or_init(|| DominanceFrontier::new(cfg, tree)))
    }

    /// Replaces the function and forgets everything derived from the old one.
    pub fn reset_all(&mut self, function: Function) {
        tracing::trace!(function = %function.name, "analysis reset");
        self.function = function;
        self.cfg = OnceCell::new();
        self.reset_dominance();
    }

    fn reset_dominance(&mut self) {
        self.dominators = OnceCell::new();
        self.dominance_tree = OnceCell::new();
        self.dominance_frontier = OnceCell::new();
    }
}
