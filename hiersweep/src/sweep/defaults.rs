//! Defaulting merge of the remainder tree into an assignment tree.

use std::sync::Arc;

use serde_json::Value;

use crate::path::Trail;
use crate::{SweepError, SweepResult};

/// Fill the gaps of `base` with the content of `to_add`.
///
/// Mapping keys missing from `base` are copied over; keys present on both
/// sides are merged recursively. Lists are merged position by position and
/// `to_add` may not be longer than `base`. Leaves already in `base` win.
///
/// # Errors
///
/// Returns [`SweepError::RemainderMismatch`] when a mapping meets a
/// non-mapping, a list meets a non-list, or a list to add is longer than its
/// base.
///
/// # Examples
///
/// ```
/// use hiersweep::sweep::add_where_needed;
/// use serde_json::json;
///
/// let mut tree = json!({"model": {"type": "resnet"}});
/// add_where_needed(&mut tree, json!({"model": {"depth": 18, "type": "vgg"}, "seed": 1}))
///     .expect("shapes agree");
/// assert_eq!(tree, json!({"model": {"type": "resnet", "depth": 18}, "seed": 1}));
/// ```
pub fn add_where_needed(base: &mut Value, to_add: Value) -> SweepResult<()> {
    merge_defaults(base, to_add, &Trail::root())
}

fn merge_defaults(base: &mut Value, to_add: Value, trail: &Trail) -> SweepResult<()> {
    match (base, to_add) {
        (Value::Object(base_map), Value::Object(add_map)) => {
            for (key, value) in add_map {
                let child = trail.child(&key);
                match base_map.get_mut(&key) {
                    Some(existing) => merge_defaults(existing, value, &child)?,
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
            Ok(())
        }
        (Value::Array(base_items), Value::Array(add_items)) => {
            if add_items.len() > base_items.len() {
                return Err(mismatch(
                    trail,
                    format!(
                        "cannot add a list of length {} to a list of length {}",
                        add_items.len(),
                        base_items.len()
                    ),
                ));
            }
            for (idx, (existing, value)) in base_items.iter_mut().zip(add_items).enumerate() {
                merge_defaults(existing, value, &trail.child(idx))?;
            }
            Ok(())
        }
        (Value::Object(_), other) => Err(mismatch(
            trail,
            format!("cannot add {other} to a mapping"),
        )),
        (Value::Array(_), other) => Err(mismatch(trail, format!("cannot add {other} to a list"))),
        (Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_), _) => Ok(()),
    }
}

fn mismatch(trail: &Trail, message: String) -> Arc<SweepError> {
    Arc::new(SweepError::RemainderMismatch {
        path: trail.to_string(),
        message,
    })
}
