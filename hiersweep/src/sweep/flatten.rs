//! Splitting a sweep `parameters` tree into flat axes and a remainder.
//!
//! Every node carrying the `sweep` marker becomes an [`Axis`] keyed by its
//! [`FlatKey`]; the marker is dropped and the rest of the node is kept
//! verbatim. Everything else is copied into a remainder tree of the same
//! shape with the axes removed. Lists in the remainder are written as
//! index-keyed mappings so that positions survive the removal of axes.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::keys::{SEPARATOR, SWEEP};
use crate::path::{FlatKey, PathSegment, Trail};
use crate::{SweepError, SweepResult};

/// One sweep axis discovered by [`flatten`].
#[derive(Clone, Debug, PartialEq)]
pub struct Axis {
    /// Location of the axis in the parameters tree.
    pub key: FlatKey,
    /// The axis declaration without its `sweep` marker.
    pub declaration: Map<String, Value>,
}

/// Result of [`flatten`].
#[derive(Clone, Debug, PartialEq)]
pub struct Flattened {
    /// Axes in document order.
    pub axes: Vec<Axis>,
    /// Non-axis content, shaped like the input.
    pub remainder: Value,
    /// Whether any axis was found.
    pub has_axes: bool,
}

/// Flatten a `parameters` tree.
///
/// # Errors
///
/// Returns [`SweepError::MalformedAxis`] when the root itself is an axis and
/// [`SweepError::ReservedToken`] when a mapping key contains the path
/// separator.
///
/// # Examples
///
/// ```
/// use hiersweep::sweep::flatten;
/// use serde_json::json;
///
/// let flat = flatten(&json!({
///     "model": {"type": {"sweep": true, "values": ["resnet", "densenet"]}, "depth": 18},
/// }))
/// .expect("tree flattens");
/// assert_eq!(flat.axes.len(), 1);
/// assert_eq!(flat.axes[0].key.to_string(), "model.type");
/// assert_eq!(flat.remainder, json!({"model": {"depth": 18}}));
/// ```
pub fn flatten(tree: &Value) -> SweepResult<Flattened> {
    if axis_declaration(tree).is_some() {
        return Err(SweepError::axis(
            Trail::root().to_string(),
            "the parameters tree itself cannot be a sweep axis",
        ));
    }
    let (axes, remainder) = walk(tree, &Trail::root())?;
    Ok(Flattened {
        has_axes: !axes.is_empty(),
        axes,
        remainder,
    })
}

fn walk(node: &Value, trail: &Trail) -> SweepResult<(Vec<Axis>, Value)> {
    let mut axes = Vec::new();
    let mut remainder = Map::new();
    match node {
        Value::Object(map) => {
            for (key, child) in map {
                check_key(key, trail)?;
                visit(child, &PathSegment::Key(key.clone()), trail, &mut axes, &mut remainder)?;
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                visit(child, &PathSegment::Index(idx), trail, &mut axes, &mut remainder)?;
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            return Ok((axes, node.clone()));
        }
    }
    Ok((axes, Value::Object(remainder)))
}

fn visit(
    child: &Value,
    segment: &PathSegment,
    trail: &Trail,
    axes: &mut Vec<Axis>,
    remainder: &mut Map<String, Value>,
) -> SweepResult<()> {
    if let Some(declaration) = axis_declaration(child) {
        axes.push(Axis {
            key: FlatKey::from_segments(std::slice::from_ref(segment)),
            declaration,
        });
        return Ok(());
    }
    if child.is_object() || child.is_array() {
        let (nested, sub_remainder) = walk(child, &trail.child(segment))?;
        axes.extend(nested.into_iter().map(|axis| Axis {
            key: axis.key.prefixed(segment),
            declaration: axis.declaration,
        }));
        remainder.insert(segment.to_token(), sub_remainder);
    } else {
        remainder.insert(segment.to_token(), child.clone());
    }
    Ok(())
}

fn axis_declaration(node: &Value) -> Option<Map<String, Value>> {
    let map = node.as_object()?;
    if !map.contains_key(SWEEP) {
        return None;
    }
    let mut declaration = map.clone();
    declaration.remove(SWEEP);
    Some(declaration)
}

fn check_key(key: &str, trail: &Trail) -> SweepResult<()> {
    if !key.contains(SEPARATOR) {
        return Ok(());
    }
    Err(Arc::new(SweepError::ReservedToken {
        key: key.to_owned(),
        path: trail.to_string(),
        token: SEPARATOR,
    }))
}

/// Rebuild a nested tree from flat keys.
///
/// Index tokens are kept as mapping keys; the merge engine reads such
/// mappings as list positions.
///
/// # Errors
///
/// Returns [`SweepError::MalformedAxis`] when one flat key runs through a
/// value already placed by another.
pub fn unflatten<I>(flat: I) -> SweepResult<Value>
where
    I: IntoIterator<Item = (FlatKey, Value)>,
{
    let mut root = Map::new();
    for (key, value) in flat {
        let tokens: Vec<&str> = key.tokens().collect();
        let Some((leaf, parents)) = tokens.split_last() else {
            continue;
        };
        let mut node = &mut root;
        for token in parents {
            let entry = node
                .entry((*token).to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            node = entry.as_object_mut().ok_or_else(|| {
                SweepError::axis(key.to_string(), "flat key runs through a leaf value")
            })?;
        }
        node.insert((*leaf).to_owned(), value);
    }
    Ok(Value::Object(root))
}
