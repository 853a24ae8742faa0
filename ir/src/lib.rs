//! A small register-based intermediate representation in the style of Bril.
//!
//! A [`Program`] is a list of [`Function`]s, each holding a flat list of
//! [`Instruction`]s in which label markers delimit basic blocks. Programs
//! travel as JSON (see [`Program::from_json`]) and print as text through
//! their `Display` implementation.

mod json;
mod pretty;
mod syntax;
mod visit;

pub use json::DecodeError;
pub use syntax::*;
pub use visit::*;
