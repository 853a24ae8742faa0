use ir::{Function, Instruction, UNDEFINED};
use ir_analysis::Analysis;

use crate::{Pass, Result};

/// Replaces every phi with copies at the end of its predecessors.
///
/// The copies of one predecessor run one after another rather than in
/// parallel, so two phis of a block that read each other's destination can
/// observe an already updated value.
pub struct NaiveFromSsa;

impl Pass for NaiveFromSsa {
    fn name(&self) -> &'static str {
        "from-ssa"
    }

    fn run_pass(&mut self, function: &mut Function, analysis: &mut Analysis) -> Result<()> {
        let cfg = analysis.cfg_mut()?;
        cfg.add_terminators();

        let mut copies = Vec::new();
        for id in cfg.layout().to_vec() {
            let count = cfg[id].phis().count();
            let phis: Vec<_> = cfg[id].instructions.drain(..count).collect();
            for phi in phis {
                let Instruction::Phi {
                    dest,
                    ty,
                    args,
                    labels,
                } = phi
                else {
                    unreachable!("`phis` yields phi nodes only");
                };
                for (arg, label) in args.into_iter().zip(&labels) {
                    if arg == UNDEFINED {
                        continue;
                    }
                    copies.push((cfg.resolve(label)?, Instruction::id(dest.clone(), ty.clone(), arg)));
                }
            }
        }

        tracing::debug!(function = %function.name, copies = copies.len(), "lowered phis");
        for (predecessor, copy) in copies {
            let block = &mut cfg[predecessor];
            let position = block.instructions.len() - usize::from(block.has_terminator());
            block.instructions.insert(position, copy);
        }

        *function = cfg.to_function(false);
        Ok(())
    }
}
