use data_structure::{
    index::{vec::Idx, Indexable},
    FxIndexSet,
};
use ir::{Instruction, Label};

/// Handle of a [`Block`] inside its [`crate::Cfg`].
///
/// Handles are never reused, even when the block order changes.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub struct BlockId(usize);

impl Idx for BlockId {
    fn new(idx: usize) -> Self {
        Self(idx)
    }

    fn index(self) -> usize {
        self.0
    }
}

impl Indexable<BlockId> for Block {}

#[derive(Debug, Clone)]
pub struct Block {
    label: Label,
    generated_label: bool,

    /// The body, without the label marker. At most one terminator, and only
    /// in last position.
    pub instructions: Vec<Instruction>,

    // Only `Cfg` touches these so that both directions stay in sync.
    pub(crate) successors: FxIndexSet<BlockId>,
    pub(crate) predecessors: FxIndexSet<BlockId>,
}

impl Block {
    pub(crate) fn new(label: Label, generated_label: bool, instructions: Vec<Instruction>) -> Self {
        Self {
            label,
            generated_label,
            instructions,
            successors: FxIndexSet::default(),
            predecessors: FxIndexSet::default(),
        }
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    /// Whether the label was synthesized rather than written in the source.
    pub fn has_generated_label(&self) -> bool {
        self.generated_label
    }

    pub fn successors(&self) -> &FxIndexSet<BlockId> {
        &self.successors
    }

    pub fn predecessors(&self) -> &FxIndexSet<BlockId> {
        &self.predecessors
    }

    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions
            .last()
            .filter(|instruction| instruction.is_terminator())
    }

    pub fn has_terminator(&self) -> bool {
        self.terminator().is_some()
    }

    /// The phi nodes at the head of the block.
    pub fn phis(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions
            .iter()
            .take_while(|instruction| instruction.is_phi())
    }
}
