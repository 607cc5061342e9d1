//! Extensions for mapping errors to `SweepResult` concisely.
//!
//! These helpers reduce repetitive `.map_err(|e| Arc::new(...))` patterns
//! when converting external error types into the crate's `SweepResult<T>`
//! alias (`Result<T, Arc<SweepError>>`).
//!
//! - Use [`SweepResultExt::into_sweep`] for error types that implement
//!   `Into<SweepError>` (e.g., `serde_json::Error`).
//! - Use [`LocateExt::located`] inside recursive tree walks to attach the
//!   structural path and the offending patch to the first failure.
//!
//! # Examples
//!
//! ```
//! use hiersweep::{SweepResult, SweepResultExt};
//!
//! fn serialize() -> SweepResult<serde_json::Value> {
//!     serde_json::to_value(&42).into_sweep()
//! }
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::{SweepError, SweepResult};

/// Generic extension for mapping any `Result<T, E>` with `E: Into<SweepError>`
/// into a `SweepResult<T>`.
pub trait SweepResultExt<T, E> {
    /// Convert `Result<T, E>` into `SweepResult<T>` using `Into<SweepError>`.
    ///
    /// # Errors
    ///
    /// Propagates the original error after conversion into `Arc<SweepError>`.
    fn into_sweep(self) -> SweepResult<T>;
}

impl<T, E> SweepResultExt<T, E> for Result<T, E>
where
    E: Into<SweepError>,
{
    fn into_sweep(self) -> SweepResult<T> {
        self.map_err(|e| Arc::new(e.into()))
    }
}

/// Attach a merge location to the first error raised in a recursive walk.
pub trait LocateExt<T> {
    /// Annotate the error with `path` and `patch` unless it is already
    /// annotated.
    ///
    /// # Errors
    ///
    /// Returns the (possibly annotated) original error.
    fn located(self, path: &str, patch: impl FnOnce() -> Value) -> SweepResult<T>;
}

impl<T> LocateExt<T> for SweepResult<T> {
    fn located(self, path: &str, patch: impl FnOnce() -> Value) -> SweepResult<T> {
        self.map_err(|err| {
            if err.is_located() {
                err
            } else {
                SweepError::located(err, path, &patch())
            }
        })
    }
}
