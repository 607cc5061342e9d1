//! The sweep pipeline: flattening, alias compression, and reconstruction of
//! per-trial override trees.
//!
//! Authoring side: [`standardize`] turns a hierarchical sweep into the flat,
//! aliased specification a sweep service enumerates, recording what it needs
//! in a [`CompressionContext`]. Trial side: [`destandardize`] turns one flat
//! assignment back into an override tree, and [`HierarchicalSweep`] merges it
//! into the base configuration.

mod compress;
mod defaults;
mod flatten;
mod session;
mod spec;
mod standardize;

pub use compress::CompressionContext;
pub use defaults::add_where_needed;
pub use flatten::{Axis, Flattened, flatten, unflatten};
pub use session::{HierarchicalSweep, SweepMetadata};
pub use spec::{Goal, Method, Metric, SweepSpec};
pub use standardize::{PARAMETERS, destandardize, standardize};
