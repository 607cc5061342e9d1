//! Primary error enum for sweep authoring and patch application.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Boxed error returned by user-supplied evaluation functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while preparing or resolving a hierarchical sweep.
///
/// Every variant except [`SweepError::Evaluation`] and [`SweepError::File`]
/// is an authoring error: the sweep or patch tree is malformed and must be
/// fixed by its author. None of them are retried.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SweepError {
    /// A reserved directive key survived into plain configuration data.
    #[error("key '{key}' is reserved for sweep configuration and cannot be used in {path}")]
    ReservedKey {
        /// The reserved key that was found.
        key: String,
        /// Dotted path of the mapping holding the key.
        path: String,
    },

    /// A configuration key contains one of the private path tokens.
    #[error("key '{key}' at {path} contains the reserved token '{token}'")]
    ReservedToken {
        /// Offending key.
        key: String,
        /// Dotted path of the mapping holding the key.
        path: String,
        /// The token the key collides with.
        token: &'static str,
    },

    /// Two different keys or values were registered under the same alias.
    #[error("alias '{alias}' already names '{existing}' and cannot also name '{claimant}'")]
    DuplicateAlias {
        /// Alias claimed twice.
        alias: String,
        /// Original key or value that owns the alias.
        existing: String,
        /// Key or value that attempted to reuse it.
        claimant: String,
    },

    /// An axis declares a different number of aliases than values.
    #[error("axis '{axis}' declares {aliases} aliases for {values} values")]
    AliasCountMismatch {
        /// Flat key of the axis.
        axis: String,
        /// Number of aliases supplied.
        aliases: usize,
        /// Number of candidate values supplied.
        values: usize,
    },

    /// An assignment names an axis alias absent from the compression context.
    #[error("unknown axis alias '{alias}'")]
    UnknownAlias {
        /// Alias that could not be resolved.
        alias: String,
    },

    /// An aliased axis received a value that is not one of its aliases.
    #[error("unknown value alias {value} for axis '{axis}'")]
    UnknownValueAlias {
        /// Flat key of the axis.
        axis: String,
        /// Rendered value that could not be resolved.
        value: String,
    },

    /// A list edit instruction has the wrong shape.
    #[error("malformed list operation: {message}")]
    MalformedListEdit {
        /// Description of the problem.
        message: String,
    },

    /// A list edit addressed a position outside the target list.
    #[error("list index {index} is out of range for a list of length {len}")]
    ListIndexOutOfRange {
        /// Requested index as authored.
        index: i64,
        /// Length of the target list.
        len: usize,
    },

    /// A list patch does not match the length of the list it updates.
    #[error("expected a list of length {expected} but got a list of length {actual}")]
    LengthMismatch {
        /// Length of the base list.
        expected: usize,
        /// Length of the patch list.
        actual: usize,
    },

    /// The patch shape cannot be merged into the base shape.
    #[error("cannot merge a {patch} patch into a {base} value")]
    ShapeMismatch {
        /// Kind of the base value.
        base: &'static str,
        /// Kind of the patch.
        patch: &'static str,
    },

    /// A merge target vanished while it was being patched.
    #[error("merge target at {path} no longer exists")]
    DetachedNode {
        /// Dotted path of the missing node.
        path: String,
    },

    /// A sweep axis declaration is malformed or misplaced.
    #[error("malformed sweep axis at {path}: {message}")]
    MalformedAxis {
        /// Dotted path of the axis.
        path: String,
        /// Description of the problem.
        message: String,
    },

    /// A directive (`dy__eval`, `dy__upsert`) has the wrong shape.
    #[error("malformed {directive} directive: {message}")]
    MalformedDirective {
        /// Directive token.
        directive: &'static str,
        /// Description of the problem.
        message: String,
    },

    /// A deferred-evaluation function failed.
    #[error("evaluation of '{function}' failed: {source}")]
    Evaluation {
        /// Function that was evaluated.
        function: String,
        /// Error raised by the function.
        #[source]
        source: BoxError,
    },

    /// No evaluator function is registered under the requested name.
    #[error("no function registered for '{name}'")]
    UnknownFunction {
        /// Requested function name.
        name: String,
    },

    /// The sweep configuration lacks a `parameters` mapping.
    #[error("sweep configuration has no 'parameters' mapping")]
    MissingParameters,

    /// The remainder tree cannot be merged into an assignment tree.
    #[error("cannot restore remainder at {path}: {message}")]
    RemainderMismatch {
        /// Dotted path where the shapes diverge.
        path: String,
        /// Description of the problem.
        message: String,
    },

    /// An axis cannot be enumerated locally.
    #[error("axis '{axis}' cannot be enumerated: {message}")]
    NotEnumerable {
        /// Alias of the axis.
        axis: String,
        /// Description of the problem.
        message: String,
    },

    /// Error reading or parsing a sweep definition file.
    #[error("sweep definition error in '{path}': {source}")]
    File {
        /// Path that triggered the failure.
        path: Utf8PathBuf,
        /// Underlying error reported by the parser or filesystem.
        #[source]
        source: BoxError,
    },

    /// Error converting between JSON trees and typed values.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An error annotated with the merge path and offending patch.
    #[error("{source}\nConfiguration path trying to upsert: {path}\nConfiguration to upsert: {patch}")]
    Located {
        /// Dotted path at which the error was raised.
        path: String,
        /// Pretty-printed JSON of the offending patch subtree.
        patch: String,
        /// The original error.
        #[source]
        source: Arc<SweepError>,
    },
}
