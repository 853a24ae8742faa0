use std::{collections::BTreeSet, fmt};

use data_structure::FxHashMap;
use ir::{Function, Label, Variable};
use ir_cfg::{BlockId, Cfg};

use super::{operators::set_union, solve, DataFlowAnalysis, DataFlowData, DataFlowProblem, Direction};
use crate::{Analysis, Result};

/// Pseudo-block that defines the parameters of a function.
pub const PARAMETER_BLOCK: &str = "arg";

/// `variable` as last assigned in `block`.
///
/// Ordered by variable first, then by block label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Definition {
    pub variable: Variable,
    pub block: Label,
}

impl fmt::Display for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.block, self.variable)
    }
}

/// Which definitions of each variable may reach each point.
pub struct ReachingDefinitions;

impl DataFlowAnalysis for ReachingDefinitions {
    type Domain = BTreeSet<Definition>;

    fn run(function: &Function, analysis: &Analysis) -> Result<DataFlowData<Self::Domain>> {
        let cfg = analysis.cfg()?;
        let parameters: BTreeSet<Definition> = function
            .parameters
            .iter()
            .map(|parameter| Definition {
                variable: parameter.name.clone(),
                block: PARAMETER_BLOCK.to_string(),
            })
            .collect();

        let mut definitions: FxHashMap<Variable, BTreeSet<Definition>> = FxHashMap::default();
        for definition in &parameters {
            definitions
                .entry(definition.variable.clone())
                .or_default()
                .insert(definition.clone());
        }
        for (_, block) in cfg.blocks() {
            for dest in block.instructions.iter().filter_map(|i| i.destination()) {
                definitions.entry(dest.clone()).or_default().insert(Definition {
                    variable: dest.clone(),
                    block: block.label().clone(),
                });
            }
        }

        Ok(solve(
            cfg,
            ReachingDefinitionsProblem {
                parameters,
                definitions,
                gen_kill: FxHashMap::default(),
            },
        ))
    }
}

struct ReachingDefinitionsProblem {
    parameters: BTreeSet<Definition>,
    /// Every definition in the function, by variable.
    definitions: FxHashMap<Variable, BTreeSet<Definition>>,
    gen_kill: FxHashMap<BlockId, (BTreeSet<Definition>, BTreeSet<Definition>)>,
}

impl ReachingDefinitionsProblem {
    /// A block generates one definition per variable it assigns and kills
    /// every other definition of those variables.
    fn gen_kill(&mut self, cfg: &Cfg, block: BlockId) -> &(BTreeSet<Definition>, BTreeSet<Definition>) {
        let definitions = &self.definitions;
        self.gen_kill.entry(block).or_insert_with(|| {
            let label = cfg.label(block);
            let mut gen = BTreeSet::new();
            let mut kill = BTreeSet::new();
            for dest in cfg[block].instructions.iter().filter_map(|i| i.destination()) {
                gen.insert(Definition {
                    variable: dest.clone(),
                    block: label.clone(),
                });
                if let Some(all) = definitions.get(dest) {
                    kill.extend(all.iter().cloned());
                }
            }
            (gen, kill)
        })
    }
}

impl DataFlowProblem for ReachingDefinitionsProblem {
    type Domain = BTreeSet<Definition>;

    fn direction(&self) -> Direction {
        Direction::Forward
    }

    fn boundary_value(&self) -> Self::Domain {
        self.parameters.clone()
    }

    fn initial_value(&self) -> Self::Domain {
        BTreeSet::new()
    }

    fn meet(&self, values: &[&Self::Domain]) -> Self::Domain {
        set_union(values)
    }

    fn transfer(&mut self, cfg: &Cfg, block: BlockId, value: &Self::Domain) -> Self::Domain {
        let (gen, kill) = self.gen_kill(cfg, block);
        value.difference(kill).chain(gen).cloned().collect()
    }

    fn format(_cfg: &Cfg, value: &Self::Domain) -> String {
        let definitions: Vec<String> = value.iter().map(ToString::to_string).collect();
        format!("[{}]", definitions.join(", "))
    }
}
