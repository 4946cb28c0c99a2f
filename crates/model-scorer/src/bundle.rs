//! Artifacts are bundles of files addressed by relative path.

mod decode;
mod memory;

pub use decode::*;
pub use memory::*;
