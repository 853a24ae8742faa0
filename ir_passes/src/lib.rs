//! Rewrites over functions, driven by a [`PassManager`].

mod dead_code_elimination;
mod from_ssa;
mod local_value_numbering;
mod pass_manager;
mod to_ssa;

use ir::{Function, Label, Variable};
use ir_analysis::Analysis;
use ir_cfg::{VerificationError, VerifyLevel};
use thiserror::Error;

pub use dead_code_elimination::DeadCodeElimination;
pub use from_ssa::NaiveFromSsa;
pub use local_value_numbering::{LocalValueNumbering, LvnConfig};
pub use pass_manager::PassManager;
pub use to_ssa::ToSsa;

/// A rewrite of one function.
///
/// A pass leaves `analysis` describing the rewritten function: it either
/// edits the graph through [`Analysis::cfg_mut`] and flattens it back into
/// `function`, or calls [`Analysis::reset_all`] with the result.
pub trait Pass {
    fn name(&self) -> &'static str;

    fn run_pass(&mut self, function: &mut Function, analysis: &mut Analysis) -> Result<()>;

    /// How strictly the graph is checked after this pass when verification
    /// is enabled.
    fn verify_level(&self) -> VerifyLevel {
        VerifyLevel::Structure
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Analysis(#[from] ir_analysis::Error),
    #[error(transparent)]
    Cfg(#[from] ir_cfg::Error),
    #[error("`{function}` is malformed after {pass}: {source}")]
    Verification {
        pass: &'static str,
        function: String,
        #[source]
        source: VerificationError,
    },
    #[error("`{function}`: block `{block}` already contains phi nodes")]
    UnexpectedPhi { function: String, block: Label },
    #[error("`{function}`: cannot find the type of `{variable}` for a phi in block `{block}`")]
    UntypedPhi {
        function: String,
        variable: Variable,
        block: Label,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
