//! Detection of directive keys that survived a merge.

use std::sync::Arc;

use serde_json::Value;

use crate::keys::is_reserved;
use crate::path::Trail;
use crate::{SweepError, SweepResult};

/// Reject `tree` if any mapping in it still holds a reserved key.
///
/// Directive keys are consumed by the merge engine. Finding one in a merged
/// tree means it was written where no directive is recognised, for example
/// inside a literal list element.
///
/// # Errors
///
/// Returns [`SweepError::ReservedKey`] for the first offending key in
/// depth-first order.
pub fn check_reserved_keys(tree: &Value) -> SweepResult<()> {
    scan(tree, &Trail::root())
}

fn scan(node: &Value, trail: &Trail) -> SweepResult<()> {
    match node {
        Value::Object(map) => {
            for (key, child) in map {
                if is_reserved(key) {
                    return Err(Arc::new(SweepError::ReservedKey {
                        key: key.clone(),
                        path: trail.to_string(),
                    }));
                }
                scan(child, &trail.child(key))?;
            }
            Ok(())
        }
        Value::Array(items) => items
            .iter()
            .enumerate()
            .try_for_each(|(idx, item)| scan(item, &trail.child(idx))),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(()),
    }
}
