use std::collections::{BTreeMap, VecDeque};

use data_structure::{FxHashMap, FxHashSet, SetLikeVec};
use ir::{
    Function, Instruction, MutVisitor, Parameter, Type, Variable, VariableVisitContext, UNDEFINED,
};
use ir_analysis::{Analysis, DominanceFrontier, DominanceTree};
use ir_cfg::{BlockId, Cfg, VerifyLevel};

use crate::{Error, Pass, Result};

/// Converts a function into SSA form.
///
/// Phis go to the iterated dominance frontier of the blocks that define each
/// variable. Renaming then walks the dominance tree, giving every definition
/// a fresh `name.N`; parameters keep their bare name. A variable that ends up
/// with a single version gets its original name back.
///
/// Blocks that cannot be reached from the entry are left as they are.
pub struct ToSsa;

impl Pass for ToSsa {
    fn name(&self) -> &'static str {
        "to-ssa"
    }

    fn verify_level(&self) -> VerifyLevel {
        VerifyLevel::Ssa
    }

    fn run_pass(&mut self, function: &mut Function, analysis: &mut Analysis) -> Result<()> {
        let cfg = analysis.cfg_mut()?;
        cfg.add_entry();
        cfg.add_terminators();

        let cfg = analysis.cfg()?;
        if let Some((_, block)) = cfg.blocks().find(|(_, block)| block.phis().next().is_some()) {
            return Err(Error::UnexpectedPhi {
                function: function.name.clone(),
                block: block.label().clone(),
            });
        }

        let mut phis = place_phis(cfg, analysis.dominance_frontier()?, &function.parameters)?;
        let mut renamed = rename(cfg, analysis.dominance_tree()?, &mut phis, &function.parameters);

        // Every predecessor must have an operand, even those renaming never
        // reached.
        for (&block, block_phis) in &mut phis {
            for &predecessor in cfg[block].predecessors() {
                let label = cfg.label(predecessor);
                for phi in block_phis.values_mut() {
                    if !phi.labels.contains(label) {
                        phi.args.push(UNDEFINED.to_string());
                        phi.labels.push(label.clone());
                    }
                }
            }
        }
        let mut phis: FxHashMap<BlockId, Vec<Instruction>> = phis
            .into_iter()
            .map(|(block, block_phis)| {
                let instructions = block_phis
                    .into_values()
                    .map(|phi| Instruction::Phi {
                        dest: phi.dest,
                        ty: phi.ty,
                        args: phi.args,
                        labels: phi.labels,
                    })
                    .collect();
                (block, instructions)
            })
            .collect();
        strip_single_versions(&mut renamed, &mut phis, &function.parameters);

        // Phis only ever land in blocks the renaming walk reached.
        let cfg = analysis.cfg_mut()?;
        for (block, instructions) in renamed {
            let mut body = phis.remove(&block).unwrap_or_default();
            body.extend(instructions);
            cfg[block].instructions = body;
        }

        let rewritten = cfg.to_function(true);
        tracing::debug!(function = %function.name, "converted to SSA");
        analysis.reset_all(rewritten.clone());
        *function = rewritten;
        Ok(())
    }
}

struct PendingPhi {
    dest: Variable,
    ty: Type,
    args: Vec<Variable>,
    labels: Vec<ir::Label>,
}

/// Phis to insert, by block and then by the variable they merge.
type Phis = FxHashMap<BlockId, BTreeMap<Variable, PendingPhi>>;

fn place_phis(cfg: &Cfg, frontier: &DominanceFrontier, parameters: &[Parameter]) -> Result<Phis> {
    let mut defining: BTreeMap<&Variable, Vec<BlockId>> = BTreeMap::new();
    for (id, block) in cfg.blocks() {
        for dest in block.instructions.iter().filter_map(Instruction::destination) {
            let blocks = defining.entry(dest).or_default();
            if blocks.last() != Some(&id) {
                blocks.push(id);
            }
        }
    }

    let mut phis = Phis::default();
    for (variable, blocks) in defining {
        let mut worklist = SetLikeVec::new();
        worklist.extend(blocks.iter().rev().copied());
        let mut visited = FxHashSet::default();
        while let Some(block) = worklist.pop() {
            visited.insert(block);
            for &target in frontier.frontier(block) {
                let target_phis = phis.entry(target).or_default();
                if !target_phis.contains_key(variable) {
                    let ty = phi_type(cfg, target, variable, parameters).ok_or_else(|| {
                        Error::UntypedPhi {
                            function: cfg.function_name().to_string(),
                            variable: variable.clone(),
                            block: cfg.label(target).clone(),
                        }
                    })?;
                    tracing::trace!(variable = %variable, block = %cfg.label(target), "placed phi");
                    target_phis.insert(
                        variable.clone(),
                        PendingPhi {
                            dest: variable.clone(),
                            ty,
                            args: Vec::new(),
                            labels: Vec::new(),
                        },
                    );
                }
                if !visited.contains(&target) {
                    worklist.push(target);
                }
            }
        }
    }
    Ok(phis)
}

/// The IR is not type checked, so the type of a phi is taken from the
/// nearest definition found walking predecessors breadth-first, or from the
/// parameter of that name.
fn phi_type(cfg: &Cfg, block: BlockId, variable: &str, parameters: &[Parameter]) -> Option<Type> {
    let mut queue: VecDeque<BlockId> = cfg[block].predecessors().iter().copied().collect();
    let mut visited: FxHashSet<BlockId> = queue.iter().copied().collect();
    while let Some(current) = queue.pop_front() {
        let ty = cfg[current]
            .instructions
            .iter()
            .filter(|instruction| instruction.destination().is_some_and(|dest| dest == variable))
            .find_map(Instruction::ty);
        if let Some(ty) = ty {
            return Some(ty.clone());
        }
        for &predecessor in cfg[current].predecessors() {
            if visited.insert(predecessor) {
                queue.push_back(predecessor);
            }
        }
    }
    parameters
        .iter()
        .find(|parameter| parameter.name == variable)
        .map(|parameter| parameter.ty.clone())
}

/// Stacks of visible versions, one per original variable.
struct SsaNames {
    /// `None` is the parameter itself.
    stacks: FxHashMap<Variable, Vec<Option<usize>>>,
    counters: FxHashMap<Variable, usize>,
}

impl SsaNames {
    fn new(parameters: &[Parameter]) -> Self {
        Self {
            stacks: parameters
                .iter()
                .map(|parameter| (parameter.name.clone(), vec![None]))
                .collect(),
            counters: FxHashMap::default(),
        }
    }

    fn fresh(&mut self, variable: &str, pushed: &mut Vec<Variable>) -> Variable {
        let counter = self.counters.entry(variable.to_string()).or_default();
        let index = *counter;
        *counter += 1;
        self.stacks
            .entry(variable.to_string())
            .or_default()
            .push(Some(index));
        pushed.push(variable.to_string());
        format!("{variable}.{index}")
    }

    fn current(&self, variable: &str) -> Variable {
        match self.stacks.get(variable).and_then(|stack| stack.last()) {
            Some(Some(index)) => format!("{variable}.{index}"),
            Some(None) => variable.to_string(),
            None => UNDEFINED.to_string(),
        }
    }

    fn pop(&mut self, pushed: Vec<Variable>) {
        for variable in pushed {
            if let Some(stack) = self.stacks.get_mut(&variable) {
                stack.pop();
            }
        }
    }
}

struct Renamer<'a> {
    names: &'a mut SsaNames,
    pushed: &'a mut Vec<Variable>,
}

impl MutVisitor for Renamer<'_> {
    fn visit_variable(&mut self, variable: &mut Variable, context: VariableVisitContext) {
        *variable = match context {
            VariableVisitContext::Use => self.names.current(variable),
            VariableVisitContext::Define => self.names.fresh(variable, self.pushed),
        };
    }
}

enum Frame {
    Enter(BlockId),
    /// Pops the versions pushed while the block was entered.
    Exit(Vec<Variable>),
}

/// Renames the bodies of the blocks in the dominance tree and fills in the
/// phi operands. Returns the renamed bodies.
fn rename(
    cfg: &Cfg,
    tree: &DominanceTree,
    phis: &mut Phis,
    parameters: &[Parameter],
) -> FxHashMap<BlockId, Vec<Instruction>> {
    let mut names = SsaNames::new(parameters);
    let mut renamed = FxHashMap::default();
    let mut stack = vec![Frame::Enter(tree.root())];
    while let Some(frame) = stack.pop() {
        let block = match frame {
            Frame::Enter(block) => block,
            Frame::Exit(pushed) => {
                names.pop(pushed);
                continue;
            }
        };

        let mut pushed = Vec::new();
        if let Some(block_phis) = phis.get_mut(&block) {
            for (variable, phi) in block_phis.iter_mut() {
                phi.dest = names.fresh(variable, &mut pushed);
            }
        }
        let mut instructions = cfg[block].instructions.clone();
        let mut renamer = Renamer {
            names: &mut names,
            pushed: &mut pushed,
        };
        for instruction in &mut instructions {
            renamer.visit_instruction(instruction);
        }
        renamed.insert(block, instructions);

        for successor in cfg[block].successors() {
            let Some(successor_phis) = phis.get_mut(successor) else {
                continue;
            };
            for (variable, phi) in successor_phis.iter_mut() {
                phi.args.push(names.current(variable));
                phi.labels.push(cfg.label(block).clone());
            }
        }

        stack.push(Frame::Exit(pushed));
        stack.extend(tree.children(block).iter().rev().map(|&child| Frame::Enter(child)));
    }
    renamed
}

/// Gives a variable with exactly one version its original name back, unless
/// that name is taken by a parameter or by a version of another variable.
fn strip_single_versions(
    renamed: &mut FxHashMap<BlockId, Vec<Instruction>>,
    phis: &mut FxHashMap<BlockId, Vec<Instruction>>,
    parameters: &[Parameter],
) {
    let mut versions: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut taken: FxHashSet<String> = parameters.iter().map(|p| p.name.clone()).collect();
    for instruction in renamed.values().chain(phis.values()).flatten() {
        if let Some(dest) = instruction.destination() {
            taken.insert(dest.clone());
            if let Some((base, _)) = dest.rsplit_once('.') {
                let entry = versions.entry(base.to_string()).or_default();
                if !entry.contains(dest) {
                    entry.push(dest.clone());
                }
            }
        }
    }

    let mut rename: FxHashMap<String, String> = FxHashMap::default();
    for (base, versions) in versions {
        if let [version] = versions.as_slice() {
            if !taken.contains(&base) {
                rename.insert(version.clone(), base);
            }
        }
    }
    if rename.is_empty() {
        return;
    }

    struct Restore<'a>(&'a FxHashMap<String, String>);
    impl MutVisitor for Restore<'_> {
        fn visit_variable(&mut self, variable: &mut Variable, _context: VariableVisitContext) {
            if let Some(base) = self.0.get(variable) {
                *variable = base.clone();
            }
        }
    }
    let mut restore = Restore(&rename);
    for instruction in renamed.values_mut().chain(phis.values_mut()).flatten() {
        restore.visit_instruction(instruction);
    }
}
