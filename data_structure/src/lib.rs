pub mod bit_set;
pub mod graph;
pub mod index;
mod set_like_vec;

pub use bit_set::DenseBitSet;
pub use bitvec::vec::BitVec;
pub use set_like_vec::SetLikeVec;
pub type FxIndexSet<T> = indexmap::IndexSet<T, rustc_hash::FxBuildHasher>;
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
