//! Conversion between authored sweep trees and the flat form the sweep
//! service enumerates.

use serde_json::{Map, Value};

use super::compress::CompressionContext;
use super::defaults::add_where_needed;
use super::flatten::{flatten, unflatten};
use crate::{SweepError, SweepResult};

/// Key of the hierarchical parameters tree inside a sweep configuration.
pub const PARAMETERS: &str = "parameters";

/// Flatten and compress the `parameters` of `sweep`.
///
/// `context` is reset, then filled with the alias tables and the remainder
/// needed by [`destandardize`]. Every other top-level key (`method`,
/// `metric`, `name`, ...) is passed through unchanged.
///
/// # Errors
///
/// Returns [`SweepError::MissingParameters`] when `sweep` has no
/// `parameters` mapping, and any flattening or compression error.
///
/// # Examples
///
/// ```
/// use hiersweep::{CompressionContext, standardize};
/// use serde_json::json;
///
/// let mut context = CompressionContext::new();
/// let standard = standardize(
///     &json!({
///         "method": "grid",
///         "parameters": {
///             "model": {"type": {"sweep": true, "values": ["resnet", "vgg"]}},
///             "seed": 7,
///         },
///     }),
///     &mut context,
/// )
/// .expect("sweep is well formed");
/// assert_eq!(
///     standard,
///     json!({"method": "grid", "parameters": {"type": {"values": ["resnet", "vgg"]}}})
/// );
/// assert_eq!(context.remainder, json!({"model": {}, "seed": 7}));
/// ```
pub fn standardize(sweep: &Value, context: &mut CompressionContext) -> SweepResult<Value> {
    context.reset();
    let Some(mut standard) = sweep.as_object().cloned() else {
        return Err(SweepError::MissingParameters.into());
    };
    let Some(parameters) = standard.get(PARAMETERS).filter(|p| p.is_object()) else {
        return Err(SweepError::MissingParameters.into());
    };
    let flat = flatten(parameters)?;
    context.remainder = flat.remainder;
    let compressed = context.compress(flat.axes)?;
    tracing::info!(
        axes = compressed.len(),
        aliased_values = context.values.len(),
        "standardized sweep configuration"
    );
    standard.insert(PARAMETERS.to_owned(), Value::Object(compressed));
    Ok(Value::Object(standard))
}

/// Rebuild the hierarchical override tree for one flat `assignment`.
///
/// The assignment is keyed by axis alias, as handed out by the sweep service.
/// The result is the assignment unflattened and completed with the remainder,
/// ready to be merged into the base configuration.
///
/// # Errors
///
/// Returns [`SweepError::UnknownAlias`] or [`SweepError::UnknownValueAlias`]
/// when the assignment does not match `context`, and
/// [`SweepError::RemainderMismatch`] when the remainder cannot be merged.
pub fn destandardize(assignment: &Map<String, Value>, context: &CompressionContext) -> SweepResult<Value> {
    let flat = context.decompress(assignment)?;
    let axes = flat.len();
    let mut tree = unflatten(flat)?;
    add_where_needed(&mut tree, context.remainder.clone())?;
    tracing::info!(axes, "destandardized sweep assignment");
    Ok(tree)
}
