use ir::Program;
use ir_analysis::Analysis;
use ir_cfg::verify;

use crate::{Error, Pass, Result};

/// Runs a fixed list of passes over every function of a program, in order,
/// with one [`Analysis`] per function.
#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
    verify: bool,
}

impl PassManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the graph of each function after every pass.
    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn add_pass(mut self, pass: impl Pass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    pub fn run(&mut self, program: &mut Program) -> Result<()> {
        for function in &mut program.functions {
            tracing::debug!(function = %function.name, "running passes");
            let mut analysis = Analysis::new(function.clone());
            for pass in &mut self.passes {
                tracing::info!(pass = pass.name(), function = %function.name, "running pass");
                pass.run_pass(function, &mut analysis)?;
                if self.verify {
                    verify(analysis.cfg()?, pass.verify_level()).map_err(|source| {
                        Error::Verification {
                            pass: pass.name(),
                            function: function.name.clone(),
                            source,
                        }
                    })?;
                }
            }
        }
        Ok(())
    }
}
