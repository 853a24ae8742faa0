//! A direction- and lattice-generic dataflow solver.
//!
//! A concrete analysis describes itself as a [`DataFlowProblem`]; [`solve`]
//! iterates its transfer function over the blocks of a [`Cfg`] until no
//! block's value changes.

mod available_expressions;
mod constant_propagation;
mod defined_variables;
mod dominators;
mod initialized_variables;
mod live_variables;
mod operators;
mod reaching_definitions;

use std::collections::BTreeMap;

use data_structure::{FxHashMap, FxHashSet};
use ir::{Function, Label};
use ir_cfg::{BlockId, Cfg};

use crate::{Analysis, Result};

pub use available_expressions::{AvailableExpressions, Expression};
pub use constant_propagation::{ConstantPropagation, ConstantValue};
pub use defined_variables::DefinedVariables;
pub use dominators::Dominators;
pub use initialized_variables::InitializedVariables;
pub use live_variables::LiveVariables;
pub use operators::{set_intersection, set_union};
pub use reaching_definitions::{Definition, ReachingDefinitions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

pub trait DataFlowProblem {
    type Domain: Clone + PartialEq;

    fn direction(&self) -> Direction;

    /// Visit blocks in reverse postorder instead of layout order. Blocks
    /// unreachable from the entry are then left out entirely.
    fn iterate_in_dfs_order(&self) -> bool {
        false
    }

    /// The value flowing into the entry (forward) or out of the exits
    /// (backward).
    fn boundary_value(&self) -> Self::Domain;

    /// The value every block holds before the first pass.
    fn initial_value(&self) -> Self::Domain;

    fn meet(&self, values: &[&Self::Domain]) -> Self::Domain;

    /// May memoize per-block facts in `self`, hence `&mut`.
    fn transfer(&mut self, cfg: &Cfg, block: BlockId, value: &Self::Domain) -> Self::Domain;

    /// Renders one value for [`DataFlowData::text`]. An empty string is
    /// printed as `∅`.
    fn format(cfg: &Cfg, value: &Self::Domain) -> String;
}

/// Converged per-block values of one analysis run.
///
/// `in_value` and `out_value` follow program order regardless of the
/// direction of the analysis: IN holds before the first instruction of the
/// block, OUT after the last.
pub struct DataFlowData<D> {
    direction: Direction,
    order: Vec<BlockId>,
    in_values: FxHashMap<BlockId, D>,
    out_values: FxHashMap<BlockId, D>,
    format: fn(&Cfg, &D) -> String,
}

impl<D> DataFlowData<D> {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The blocks in the order they were visited.
    pub fn order(&self) -> &[BlockId] {
        &self.order
    }

    pub fn in_value(&self, block: BlockId) -> Option<&D> {
        self.in_values.get(&block)
    }

    pub fn out_value(&self, block: BlockId) -> Option<&D> {
        self.out_values.get(&block)
    }

    /// The value the transfer function produced: OUT for forward analyses
    /// and IN for backward ones.
    pub fn result(&self, block: BlockId) -> Option<&D> {
        match self.direction {
            Direction::Forward => self.out_value(block),
            Direction::Backward => self.in_value(block),
        }
    }

    pub fn format_value(&self, cfg: &Cfg, value: &D) -> String {
        let text = (self.format)(cfg, value);
        if text.is_empty() {
            "∅".to_string()
        } else {
            text
        }
    }

    /// One `label:` paragraph per visited block with its IN and OUT values.
    pub fn text(&self, cfg: &Cfg) -> String {
        let mut text = String::new();
        for &block in &self.order {
            let (Some(in_value), Some(out_value)) = (self.in_value(block), self.out_value(block))
            else {
                continue;
            };
            text.push_str(&format!(
                "{}:\n  in:  {}\n  out: {}\n",
                cfg.label(block),
                self.format_value(cfg, in_value),
                self.format_value(cfg, out_value),
            ));
        }
        text
    }

    /// [`DataFlowData::result`] of every visited block, keyed by label.
    pub fn dictionary(&self, cfg: &Cfg) -> BTreeMap<Label, D>
    where
        D: Clone,
    {
        self.order
            .iter()
            .filter_map(|&block| {
                self.result(block)
                    .map(|value| (cfg.label(block).clone(), value.clone()))
            })
            .collect()
    }
}

/// Runs `problem` on `cfg` to a fixed point.
///
/// The boundary value enters through a virtual edge into the entry (forward)
/// or out of every exit (backward); the graph itself is left untouched.
pub fn solve<P: DataFlowProblem>(cfg: &Cfg, mut problem: P) -> DataFlowData<P::Domain> {
    let direction = problem.direction();
    let order = if problem.iterate_in_dfs_order() {
        cfg.reverse_postorder()
    } else {
        cfg.layout().to_vec()
    };
    let boundary_targets: FxHashSet<BlockId> = match direction {
        Direction::Forward => [cfg.entry()].into_iter().collect(),
        Direction::Backward => cfg.exits().into_iter().collect(),
    };
    let boundary = problem.boundary_value();

    // `input` is what the meet produced, `output` what the transfer produced.
    let mut input = FxHashMap::default();
    let mut output: FxHashMap<BlockId, P::Domain> = order
        .iter()
        .map(|&block| (block, problem.initial_value()))
        .collect();

    let mut passes = 0;
    loop {
        passes += 1;
        let mut changed = false;
        for &block in &order {
            let sources = match direction {
                Direction::Forward => cfg[block].predecessors(),
                Direction::Backward => cfg[block].successors(),
            };
            // Blocks outside `order` are unreachable and contribute nothing.
            let mut values: Vec<&P::Domain> =
                sources.iter().filter_map(|source| output.get(source)).collect();
            if boundary_targets.contains(&block) {
                values.push(&boundary);
            }
            let value = problem.meet(&values);
            let new_value = problem.transfer(cfg, block, &value);
            input.insert(block, value);
            if output.get(&block) != Some(&new_value) {
                output.insert(block, new_value);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    tracing::debug!(
        function = %cfg.function_name(),
        analysis = std::any::type_name::<P>(),
        passes,
        "dataflow converged"
    );

    let (in_values, out_values) = match direction {
        Direction::Forward => (input, output),
        Direction::Backward => (output, input),
    };
    DataFlowData {
        direction,
        order,
        in_values,
        out_values,
        format: P::format,
    }
}

/// An analysis that can be run on a function through its [`Analysis`] cache.
pub trait DataFlowAnalysis {
    type Domain: Clone + PartialEq;

    fn run(function: &Function, analysis: &Analysis) -> Result<DataFlowData<Self::Domain>>;
}

pub fn run<A: DataFlowAnalysis>(
    function: &Function,
    analysis: &Analysis,
) -> Result<DataFlowData<A::Domain>> {
    A::run(function, analysis)
}
