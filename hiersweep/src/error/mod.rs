//! Error types produced while flattening, compressing and patching sweep trees.

mod constructors;
mod types;

pub use types::{BoxError, SweepError};
