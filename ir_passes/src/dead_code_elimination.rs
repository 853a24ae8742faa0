use data_structure::FxHashSet;
use ir::{Function, Instruction, Variable, VariableVisitContext, Visitor};
use ir_analysis::Analysis;

use crate::{Pass, Result};

/// Deletes instructions whose destination is never read anywhere in the
/// function, until no more can be deleted.
///
/// Calls are kept whether or not their result is used.
pub struct DeadCodeElimination;

impl Pass for DeadCodeElimination {
    fn name(&self) -> &'static str {
        "dce"
    }

    fn run_pass(&mut self, function: &mut Function, analysis: &mut Analysis) -> Result<()> {
        struct UseCollector<'a> {
            used: &'a mut FxHashSet<Variable>,
        }

        impl Visitor for UseCollector<'_> {
            fn visit_variable(&mut self, variable: &Variable, context: VariableVisitContext) {
                if context == VariableVisitContext::Use {
                    self.used.insert(variable.clone());
                }
            }
        }

        let mut removed = 0;
        loop {
            let mut used = FxHashSet::default();
            UseCollector { used: &mut used }.visit_function(function);

            let before = function.instructions.len();
            function.instructions.retain(|instruction| match instruction.destination() {
                None => true,
                Some(_) if matches!(instruction, Instruction::Call { .. }) => true,
                Some(dest) => used.contains(dest),
            });
            let deleted = before - function.instructions.len();
            if deleted == 0 {
                break;
            }
            removed += deleted;
        }

        tracing::debug!(function = %function.name, removed, "eliminated dead code");
        analysis.reset_all(function.clone());
        Ok(())
    }
}
