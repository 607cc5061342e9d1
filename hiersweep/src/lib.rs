//! Hierarchical configuration sweeps.
//!
//! This crate turns nested sweep definitions into the flat, aliased form a
//! hyper-parameter sweep service enumerates, and turns each flat assignment
//! back into a concrete configuration by patching a base tree.
//!
//! - [`sweep`] flattens and compresses sweep trees ([`standardize`]) and
//!   rebuilds per-trial override trees ([`destandardize`]).
//! - [`upsert`] merges an override tree into a base configuration with list
//!   edits, index-keyed patches, deferred evaluation and ordered upserts.
//! - [`patch`] classifies raw override trees before they are merged.
//! - [`load_sweep_definition`] reads the authored inputs from TOML, JSON,
//!   JSON5 or YAML files.

use std::sync::Arc;

mod error;
pub mod eval;
mod file;
pub mod keys;
pub mod patch;
pub mod path;
mod result_ext;
pub mod sweep;
pub mod upsert;

pub use error::{BoxError, SweepError};
pub use eval::{EvalCall, EvalFunction, Evaluator, FunctionRegistry, NoEvaluator};
pub use file::{SweepDefinition, load_sweep_definition, parse_sweep_definition};
pub use result_ext::{LocateExt, SweepResultExt};
pub use sweep::{
    CompressionContext, HierarchicalSweep, SweepMetadata, SweepSpec, add_where_needed,
    destandardize, standardize,
};
pub use upsert::{Upserter, check_reserved_keys, upsert};

/// Result type used throughout the crate.
///
/// Errors are shared behind an [`Arc`] so they can be annotated with a merge
/// location without copying the underlying cause.
pub type SweepResult<T> = Result<T, Arc<SweepError>>;
