//! Analyses over the control-flow graph of a function.
//!
//! [`dataflow`] holds the fixed-point engine and the analyses built on it,
//! [`dominance`] the dominator tree and dominance frontier, and [`Analysis`]
//! caches the graph and the dominance results of one function.

mod analysis;
pub mod dataflow;
pub mod dominance;

use thiserror::Error;

pub use analysis::Analysis;
pub use dataflow::{run, DataFlowAnalysis, DataFlowData, DataFlowProblem, Direction};
pub use dominance::{DominanceFrontier, DominanceTree, DominatorSets};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Cfg(#[from] ir_cfg::Error),
    #[error("dominator sets do not contain entry block `{0}`")]
    EntryNotDominated(ir::Label),
    #[error("failed to serialize analysis results: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
