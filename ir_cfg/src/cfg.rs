use std::ops::{Index, IndexMut};

use data_structure::{index::vec::IndexVec, FxHashMap};
use ir::{Function, Instruction, Label, Parameter, Type};

use crate::{block::Block, names::LabelGenerator, BlockId, Error, Result};

/// The control-flow graph of one function.
///
/// Blocks are stored in an arena and addressed by [`BlockId`]. `layout`
/// gives their order in the instruction stream; the first block of the
/// layout is the entry.
#[derive(Debug, Clone)]
pub struct Cfg {
    function_name: String,
    parameters: Vec<Parameter>,
    return_type: Option<Type>,
    blocks: IndexVec<BlockId, Block>,
    layout: Vec<BlockId>,
    label_to_block: FxHashMap<Label, BlockId>,
    names: LabelGenerator,
}

/// Splits an instruction stream into runs that each start at a label or right
/// after a terminator. Empty runs are dropped.
fn partition(instructions: &[Instruction]) -> Vec<Vec<Instruction>> {
    let mut blocks = Vec::new();
    let mut block = Vec::new();
    for instruction in instructions {
        if instruction.is_label() {
            if !block.is_empty() {
                blocks.push(std::mem::take(&mut block));
            }
            block.push(instruction.clone());
        } else {
            block.push(instruction.clone());
            if instruction.is_terminator() {
                blocks.push(std::mem::take(&mut block));
            }
        }
    }
    if !block.is_empty() {
        blocks.push(block);
    }
    blocks
}

impl Cfg {
    pub fn new(function: &Function) -> Result<Self> {
        let raw_blocks = partition(&function.instructions);

        let mut names = LabelGenerator::default();
        for raw in &raw_blocks {
            if let Some(Instruction::Label { label }) = raw.first() {
                if !names.reserve(label) {
                    return Err(Error::DuplicateLabel {
                        function: function.name.clone(),
                        label: label.clone(),
                    });
                }
            }
        }

        let mut cfg = Self {
            function_name: function.name.clone(),
            parameters: function.parameters.clone(),
            return_type: function.return_type.clone(),
            blocks: IndexVec::new(),
            layout: Vec::with_capacity(raw_blocks.len().max(1)),
            label_to_block: FxHashMap::default(),
            names,
        };

        for (index, mut raw) in raw_blocks.into_iter().enumerate() {
            let block = match raw.first() {
                Some(Instruction::Label { label }) => {
                    let label = label.clone();
                    raw.remove(0);
                    Block::new(label, false, raw)
                }
                _ => Block::new(cfg.names.positional(index + 1), true, raw),
            };
            cfg.push_block(block);
        }
        if cfg.layout.is_empty() {
            let label = cfg.names.positional(1);
            cfg.push_block(Block::new(label, true, Vec::new()));
        }

        cfg.add_edges()?;
        tracing::trace!(
            function = %cfg.function_name,
            blocks = cfg.layout.len(),
            "built control-flow graph"
        );
        Ok(cfg)
    }

    fn push_block(&mut self, block: Block) -> BlockId {
        let label = block.label().clone();
        let id = self.blocks.push(block);
        self.label_to_block.insert(label, id);
        self.layout.push(id);
        id
    }

    fn add_edges(&mut self) -> Result<()> {
        let layout = self.layout.clone();
        for (position, &id) in layout.iter().enumerate() {
            let targets = match self.blocks[id].instructions.last() {
                Some(Instruction::Jump { target }) => vec![self.resolve(target)?],
                Some(Instruction::Branch {
                    then_label,
                    else_label,
                    ..
                }) => vec![self.resolve(then_label)?, self.resolve(else_label)?],
                Some(Instruction::Return { .. }) => vec![],
                _ => layout.get(position + 1).copied().into_iter().collect(),
            };
            for target in targets {
                self.add_edge(id, target);
            }
        }
        Ok(())
    }

    /// Inserts `from -> to` in both edge sets.
    pub(crate) fn add_edge(&mut self, from: BlockId, to: BlockId) {
        self.blocks[from].successors.insert(to);
        self.blocks[to].predecessors.insert(from);
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn return_type(&self) -> Option<&Type> {
        self.return_type.as_ref()
    }

    pub fn entry(&self) -> BlockId {
        self.layout[0]
    }

    /// Block handles in instruction-stream order.
    pub fn layout(&self) -> &[BlockId] {
        &self.layout
    }

    pub fn blocks(&self) -> impl DoubleEndedIterator<Item = (BlockId, &Block)> + '_ {
        self.layout.iter().map(|&id| (id, &self.blocks[id]))
    }

    /// Number of blocks ever created, which bounds every [`BlockId`].
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn label(&self, id: BlockId) -> &Label {
        self.blocks[id].label()
    }

    pub fn block_id(&self, label: &str) -> Option<BlockId> {
        self.label_to_block.get(label).copied()
    }

    pub fn resolve(&self, label: &str) -> Result<BlockId> {
        self.block_id(label).ok_or_else(|| Error::UnresolvedLabel {
            function: self.function_name.clone(),
            label: label.to_string(),
        })
    }

    /// Blocks without successors.
    pub fn exits(&self) -> Vec<BlockId> {
        self.layout
            .iter()
            .copied()
            .filter(|&id| self.blocks[id].successors.is_empty())
            .collect()
    }

    /// Makes sure the entry block has no predecessors by putting a fresh empty
    /// block in front of it when something jumps back to the top.
    ///
    /// Returns the new entry, or `None` if nothing had to change.
    pub fn add_entry(&mut self) -> Option<BlockId> {
        let entry = self.entry();
        if self.blocks[entry].predecessors.is_empty() {
            return None;
        }
        let label = self.names.fresh("entry");
        let id = self.blocks.push(Block::new(label.clone(), true, Vec::new()));
        self.label_to_block.insert(label, id);
        self.layout.insert(0, id);
        self.add_edge(id, entry);
        tracing::trace!(function = %self.function_name, entry = %self.blocks[id].label(), "added entry block");
        Some(id)
    }

    /// Ends every block with an explicit terminator that matches its edges:
    /// a jump to the next block if it falls through, otherwise `ret`.
    pub fn add_terminators(&mut self) {
        for (position, &id) in self.layout.iter().enumerate() {
            if self.blocks[id].has_terminator() {
                continue;
            }
            let next = self
                .layout
                .get(position + 1)
                .copied()
                .filter(|next| self.blocks[id].successors.contains(next));
            let terminator = match next {
                Some(next) => Instruction::jump(self.blocks[next].label().clone()),
                None => Instruction::ret(None),
            };
            self.blocks[id].instructions.push(terminator);
        }
    }

    /// Flattens the graph back into an instruction stream.
    ///
    /// Synthesized labels are only emitted when `insert_generated_labels` is
    /// set; source labels always are.
    pub fn make_instructions(&self, insert_generated_labels: bool) -> Vec<Instruction> {
        self.blocks()
            .flat_map(|(_, block)| {
                let marker = (insert_generated_labels || !block.has_generated_label())
                    .then(|| Instruction::label(block.label().clone()));
                marker.into_iter().chain(block.instructions.iter().cloned())
            })
            .collect()
    }

    /// A function with this graph's signature and flattened body.
    pub fn to_function(&self, insert_generated_labels: bool) -> Function {
        Function {
            name: self.function_name.clone(),
            parameters: self.parameters.clone(),
            return_type: self.return_type.clone(),
            instructions: self.make_instructions(insert_generated_labels),
        }
    }
}

impl Index<BlockId> for Cfg {
    type Output = Block;

    fn index(&self, index: BlockId) -> &Self::Output {
        &self.blocks[index]
    }
}

impl IndexMut<BlockId> for Cfg {
    fn index_mut(&mut self, index: BlockId) -> &mut Self::Output {
        &mut self.blocks[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir::{Literal, Operator};
    use pretty_assertions::assert_eq;

    fn constant(dest: &str, value: i64) -> Instruction {
        Instruction::Constant {
            dest: dest.into(),
            ty: Type::Int,
            value: Literal::Int(value),
        }
    }

    fn function(instructions: Vec<Instruction>) -> Function {
        Function {
            name: "main".into(),
            parameters: vec![],
            return_type: None,
            instructions,
        }
    }

    fn labels(cfg: &Cfg, ids: impl IntoIterator<Item = BlockId>) -> Vec<String> {
        ids.into_iter().map(|id| cfg.label(id).clone()).collect()
    }

    fn successors(cfg: &Cfg, label: &str) -> Vec<String> {
        let id = cfg.block_id(label).unwrap();
        labels(cfg, cfg[id].successors().iter().copied())
    }

    fn predecessors(cfg: &Cfg, label: &str) -> Vec<String> {
        let id = cfg.block_id(label).unwrap();
        labels(cfg, cfg[id].predecessors().iter().copied())
    }

    #[test]
    fn test_partition_and_edges() {
        let cfg = Cfg::new(&function(vec![
            constant("v", 4),
            Instruction::jump("somewhere"),
            constant("v", 2),
            Instruction::label("somewhere"),
            Instruction::Print {
                args: vec!["v".into()],
            },
        ]))
        .unwrap();

        assert_eq!(labels(&cfg, cfg.layout().iter().copied()), ["b1", "b2", "somewhere"]);
        assert!(cfg[cfg.entry()].has_generated_label());
        assert!(!cfg[cfg.block_id("somewhere").unwrap()].has_generated_label());
        assert_eq!(cfg[cfg.block_id("somewhere").unwrap()].instructions.len(), 1);
        assert_eq!(successors(&cfg, "b1"), ["somewhere"]);
        assert_eq!(successors(&cfg, "b2"), ["somewhere"]);
        assert_eq!(predecessors(&cfg, "somewhere"), ["b1", "b2"]);
        assert_eq!(labels(&cfg, cfg.exits()), ["somewhere"]);
    }

    #[test]
    fn test_branch_and_return_edges() {
        let cfg = Cfg::new(&function(vec![
            Instruction::Constant {
                dest: "c".into(),
                ty: Type::Bool,
                value: Literal::Bool(true),
            },
            Instruction::Branch {
                cond: "c".into(),
                then_label: "yes".into(),
                else_label: "no".into(),
            },
            Instruction::label("yes"),
            Instruction::ret(None),
            Instruction::label("no"),
            Instruction::label("empty"),
        ]))
        .unwrap();

        assert_eq!(successors(&cfg, "b1"), ["yes", "no"]);
        assert!(successors(&cfg, "yes").is_empty());
        assert_eq!(successors(&cfg, "no"), ["empty"]);
        assert!(cfg[cfg.block_id("empty").unwrap()].instructions.is_empty());
        assert_eq!(labels(&cfg, cfg.exits()), ["yes", "empty"]);
    }

    #[test]
    fn test_empty_function_has_one_block() {
        let cfg = Cfg::new(&function(vec![])).unwrap();
        assert_eq!(cfg.layout().len(), 1);
        assert_eq!(cfg.label(cfg.entry()), "b1");
        assert_eq!(cfg.exits(), vec![cfg.entry()]);
    }

    #[test]
    fn test_unresolved_and_duplicate_labels() {
        let err = Cfg::new(&function(vec![Instruction::jump("nowhere")])).unwrap_err();
        assert_eq!(
            err,
            Error::UnresolvedLabel {
                function: "main".into(),
                label: "nowhere".into()
            }
        );
        let err = Cfg::new(&function(vec![
            Instruction::label("a"),
            Instruction::label("a"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateLabel { .. }));
    }

    #[test]
    fn test_add_entry() {
        let mut cfg = Cfg::new(&function(vec![
            Instruction::label("entry1"),
            Instruction::label("top"),
            constant("x", 1),
            Instruction::jump("top"),
        ]))
        .unwrap();
        // `entry1` has no predecessors, so nothing changes.
        assert_eq!(cfg.add_entry(), None);

        let mut cfg = Cfg::new(&function(vec![
            Instruction::label("top"),
            constant("x", 1),
            Instruction::jump("top"),
        ]))
        .unwrap();
        let entry = cfg.add_entry().unwrap();
        assert_eq!(cfg.entry(), entry);
        assert_eq!(cfg.label(entry), "entry1");
        assert!(cfg[entry].predecessors().is_empty());
        assert_eq!(successors(&cfg, "entry1"), ["top"]);
        assert_eq!(predecessors(&cfg, "top"), ["top", "entry1"]);
        assert_eq!(cfg.add_entry(), None);
        cfg.add_terminators();
        assert_eq!(cfg[entry].instructions, vec![Instruction::jump("top")]);
    }

    #[test]
    fn test_add_terminators_and_flatten() {
        let mut cfg = Cfg::new(&function(vec![
            constant("a", 1),
            Instruction::label("next"),
            Instruction::Operation {
                op: Operator::Add,
                dest: "a".into(),
                ty: Type::Int,
                args: vec!["a".into(), "a".into()],
            },
        ]))
        .unwrap();
        assert_eq!(
            cfg.make_instructions(false),
            vec![
                constant("a", 1),
                Instruction::label("next"),
                Instruction::Operation {
                    op: Operator::Add,
                    dest: "a".into(),
                    ty: Type::Int,
                    args: vec!["a".into(), "a".into()],
                },
            ]
        );

        cfg.add_terminators();
        let flat = cfg.make_instructions(true);
        assert_eq!(flat[0], Instruction::label("b1"));
        assert_eq!(flat[2], Instruction::jump("next"));
        assert_eq!(flat.last(), Some(&Instruction::ret(None)));

        // Terminators are already in place, so a second call adds nothing.
        cfg.add_terminators();
        assert_eq!(cfg.make_instructions(true), flat);
    }
}
