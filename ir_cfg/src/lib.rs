//! Control-flow graphs over [`ir::Function`]s.
//!
//! A [`Cfg`] owns the basic blocks of one function in an append-only arena
//! and keeps successor and predecessor edges symmetric. It can be flattened
//! back into an instruction list with [`Cfg::make_instructions`].

mod block;
mod cfg;
mod dot;
mod graph;
mod names;
pub mod verify;

use thiserror::Error;

pub use block::{Block, BlockId};
pub use cfg::Cfg;
pub use verify::{verify, VerificationError, VerifyLevel};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("`{function}` refers to undefined label `{label}`")]
    UnresolvedLabel { function: String, label: ir::Label },
    #[error("`{function}` defines label `{label}` more than once")]
    DuplicateLabel { function: String, label: ir::Label },
}

pub type Result<T> = std::result::Result<T, Error>;
