//! Execution of list edit scripts against a list node.

use std::sync::Arc;

use serde_json::Value;

use super::{Location, Merge, Shape};
use crate::patch::{EditValue, ListEdit, ListScript};
use crate::{SweepError, SweepResult};

impl Merge<'_> {
    /// Apply `script` to the list at `at`, one instruction at a time.
    pub(super) fn list_edits(&mut self, at: &Location, script: &ListScript) -> SweepResult<()> {
        let shape = self.shape(at)?;
        if !matches!(shape, Shape::List(_)) {
            return Err(SweepError::shape(shape.name(), "list-edit"));
        }
        for edit in &script.edits {
            let len = self.list_mut(at)?.len();
            tracing::debug!(path = %at.trail, ?edit, len, "applying list edit");
            match edit {
                ListEdit::Insert { at: requested, value } => {
                    let pos = insert_position(*requested, len)?;
                    let resolved = self.edit_value(value.as_ref(), at)?;
                    self.list_mut(at)?.insert(pos, resolved.unwrap_or(Value::Null));
                    if value.is_none() {
                        self.mapping(&at.index(pos), &script.payload)?;
                    }
                }
                ListEdit::Overwrite { at: requested, value } => {
                    let pos = element_position(*requested, len)?;
                    match self.edit_value(value.as_ref(), at)? {
                        Some(resolved) => {
                            let slot = self
                                .list_mut(at)?
                                .get_mut(pos)
                                .ok_or_else(|| out_of_range(*requested, len))?;
                            *slot = resolved;
                        }
                        None => self.mapping(&at.index(pos), &script.payload)?,
                    }
                }
                ListEdit::Remove { at: requested } => {
                    let pos = element_position(*requested, len)?;
                    self.list_mut(at)?.remove(pos);
                }
            }
        }
        Ok(())
    }

    fn edit_value(&self, value: Option<&EditValue>, at: &Location) -> SweepResult<Option<Value>> {
        match value {
            None => Ok(None),
            Some(EditValue::Literal(literal)) => Ok(Some(literal.clone())),
            Some(EditValue::Eval(call)) => self.evaluate(call, at, None).map(Some),
        }
    }

    fn list_mut(&mut self, at: &Location) -> SweepResult<&mut Vec<Value>> {
        match self.slot(at)? {
            Value::Array(items) => Ok(items),
            _ => Err(SweepError::shape("scalar", "list-edit")),
        }
    }
}

fn out_of_range(index: i64, len: usize) -> Arc<SweepError> {
    Arc::new(SweepError::ListIndexOutOfRange { index, len })
}

/// Resolve an insertion point: `-1` appends, other negatives count from the
/// end, and `len` itself is a valid position.
fn insert_position(requested: i64, len: usize) -> SweepResult<usize> {
    if requested == -1 {
        return Ok(len);
    }
    resolve(requested, len, len)
}

/// Resolve the position of an existing element with Python-style negative
/// indexing.
fn element_position(requested: i64, len: usize) -> SweepResult<usize> {
    match len.checked_sub(1) {
        Some(last) => resolve(requested, len, last),
        None => Err(out_of_range(requested, len)),
    }
}

fn resolve(requested: i64, len: usize, max: usize) -> SweepResult<usize> {
    let position = if requested < 0 {
        usize::try_from(requested.unsigned_abs())
            .ok()
            .and_then(|back| len.checked_sub(back))
    } else {
        usize::try_from(requested).ok()
    };
    position
        .filter(|pos| *pos <= max)
        .ok_or_else(|| out_of_range(requested, len))
}
