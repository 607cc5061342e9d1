//! Test helpers shared across crates.
//!
//! This crate provides canonical sweep fixtures and a scratch directory for
//! writing sweep definition files.

pub mod files;
pub mod fixtures;
