//! Structural checks on a [`Cfg`].
//!
//! Passes are expected to leave the graph consistent; running these checks
//! after each pass catches the ones that do not.

use data_structure::FxHashSet;
use ir::{Instruction, Label};
use thiserror::Error;

use crate::{BlockId, Cfg};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerifyLevel {
    /// Edge symmetry, terminator placement and label resolution.
    #[default]
    Structure,
    /// Additionally: the entry has no predecessors, phis sit at block heads
    /// and name exactly the predecessors of their block.
    Ssa,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("block `{block}`: edge to `{other}` has no matching reverse edge")]
    AsymmetricEdge { block: Label, other: Label },
    #[error("block `{block}`: `{instruction}` follows a terminator")]
    InstructionAfterTerminator { block: Label, instruction: String },
    #[error("block `{block}`: `{instruction}` is not allowed inside a block body")]
    LabelInBody { block: Label, instruction: String },
    #[error("block `{block}`: reference to unknown label `{label}`")]
    UnresolvedLabel { block: Label, label: Label },
    #[error("block `{block}`: successors {found:?} do not match the terminator targets {expected:?}")]
    EdgeMismatch {
        block: Label,
        expected: Vec<Label>,
        found: Vec<Label>,
    },
    #[error("entry block `{block}` has predecessors")]
    EntryHasPredecessors { block: Label },
    #[error("block `{block}`: phi for `{variable}` is not at the head of the block")]
    PhiNotAtHead { block: Label, variable: String },
    #[error("block `{block}`: phi for `{variable}` names {found:?} but the predecessors are {expected:?}")]
    PhiLabelMismatch {
        block: Label,
        variable: String,
        expected: Vec<Label>,
        found: Vec<Label>,
    },
}

pub fn verify(cfg: &Cfg, level: VerifyLevel) -> Result<(), VerificationError> {
    for (id, _) in cfg.blocks() {
        verify_edges(cfg, id)?;
        verify_body(cfg, id)?;
        if level == VerifyLevel::Ssa {
            verify_phis(cfg, id)?;
        }
    }
    if level == VerifyLevel::Ssa {
        let entry = cfg.entry();
        if !cfg[entry].predecessors().is_empty() {
            return Err(VerificationError::EntryHasPredecessors {
                block: cfg.label(entry).clone(),
            });
        }
    }
    Ok(())
}

fn sorted_labels<'a>(cfg: &'a Cfg, ids: impl IntoIterator<Item = &'a BlockId>) -> Vec<Label> {
    let mut labels: Vec<_> = ids.into_iter().map(|&id| cfg.label(id).clone()).collect();
    labels.sort();
    labels.dedup();
    labels
}

fn verify_edges(cfg: &Cfg, id: BlockId) -> Result<(), VerificationError> {
    let block = &cfg[id];
    for &successor in block.successors() {
        if !cfg[successor].predecessors().contains(&id) {
            return Err(VerificationError::AsymmetricEdge {
                block: block.label().clone(),
                other: cfg.label(successor).clone(),
            });
        }
    }
    for &predecessor in block.predecessors() {
        if !cfg[predecessor].successors().contains(&id) {
            return Err(VerificationError::AsymmetricEdge {
                block: cfg.label(predecessor).clone(),
                other: block.label().clone(),
            });
        }
    }

    let targets = match block.terminator() {
        Some(Instruction::Return { .. }) => vec![],
        Some(terminator) => terminator.referenced_labels(),
        // Falls through; the builder decides the edge from the layout.
        None => return Ok(()),
    };
    let mut expected = Vec::with_capacity(targets.len());
    for target in targets {
        let target_id = cfg
            .block_id(target)
            .ok_or_else(|| VerificationError::UnresolvedLabel {
                block: block.label().clone(),
                label: target.clone(),
            })?;
        expected.push(target_id);
    }
    let expected = sorted_labels(cfg, &expected);
    let found = sorted_labels(cfg, block.successors());
    if expected != found {
        return Err(VerificationError::EdgeMismatch {
            block: block.label().clone(),
            expected,
            found,
        });
    }
    Ok(())
}

fn verify_body(cfg: &Cfg, id: BlockId) -> Result<(), VerificationError> {
    let block = &cfg[id];
    let mut terminated = false;
    for instruction in &block.instructions {
        if terminated {
            return Err(VerificationError::InstructionAfterTerminator {
                block: block.label().clone(),
                instruction: instruction.to_string(),
            });
        }
        if instruction.is_label() {
            return Err(VerificationError::LabelInBody {
                block: block.label().clone(),
                instruction: instruction.to_string(),
            });
        }
        terminated = instruction.is_terminator();
    }
    Ok(())
}

fn verify_phis(cfg: &Cfg, id: BlockId) -> Result<(), VerificationError> {
    let block = &cfg[id];
    let expected = sorted_labels(cfg, block.predecessors());
    let mut at_head = true;
    for instruction in &block.instructions {
        let Instruction::Phi { dest, labels, .. } = instruction else {
            at_head = false;
            continue;
        };
        if !at_head {
            return Err(VerificationError::PhiNotAtHead {
                block: block.label().clone(),
                variable: dest.clone(),
            });
        }
        let found: FxHashSet<&Label> = labels.iter().collect();
        let mut found: Vec<Label> = found.into_iter().cloned().collect();
        found.sort();
        if found != expected || labels.len() != expected.len() {
            return Err(VerificationError::PhiLabelMismatch {
                block: block.label().clone(),
                variable: dest.clone(),
                expected,
                found,
            });
        }
    }
    Ok(())
}
