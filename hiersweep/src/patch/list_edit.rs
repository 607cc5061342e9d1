//! The list edit mini-language.
//!
//! A patch mapping holding `dy__list__operations` edits a list in place:
//!
//! ```json
//! {"dy__list__operations": [
//!     {"dy__insert": [-1, "appended"]},
//!     {"dy__overwrite": [0, {"dy__eval": "first"}]},
//!     {"dy__remove": 2}
//! ]}
//! ```
//!
//! Instructions apply in declaration order. They may also be supplied as a
//! mapping keyed by index tokens, which is reordered by numeric index.

use serde_json::{Map, Value};

use super::sparse::{SparseSeq, densify_all};
use crate::eval::EvalCall;
use crate::keys::{EVAL, LIST_INSERT, LIST_OVERWRITE, LIST_REMOVE, index_token, parse_index_token};
use crate::{SweepError, SweepResult};

/// Value carried by an insert or overwrite instruction.
#[derive(Clone, Debug, PartialEq)]
pub enum EditValue {
    /// A literal value written as authored.
    Literal(Value),
    /// A value computed against the merge root.
    Eval(EvalCall),
}

impl EditValue {
    fn parse(raw: Value) -> SweepResult<Self> {
        match raw {
            Value::Object(map) if map.contains_key(EVAL) => {
                if map.len() != 1 {
                    return Err(SweepError::directive(
                        EVAL,
                        "must be the only key in its mapping",
                    ));
                }
                let payload = map.get(EVAL).unwrap_or(&Value::Null);
                Ok(Self::Eval(EvalCall::from_directive(payload)?))
            }
            other => Ok(Self::Literal(other)),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Eval(call) => {
                let mut map = Map::new();
                map.insert(EVAL.to_owned(), call.to_payload());
                Value::Object(map)
            }
        }
    }
}

/// One list edit instruction.
#[derive(Clone, Debug, PartialEq)]
pub enum ListEdit {
    /// Insert at `at` (`-1` appends). Without a value, the rest of the
    /// enclosing patch is inserted.
    Insert {
        /// Target position as authored.
        at: i64,
        /// Explicit value, if any.
        value: Option<EditValue>,
    },
    /// Overwrite position `at`. Without a value, the rest of the enclosing
    /// patch is merged into the existing element.
    Overwrite {
        /// Target position as authored.
        at: i64,
        /// Explicit value, if any.
        value: Option<EditValue>,
    },
    /// Remove position `at`.
    Remove {
        /// Target position as authored.
        at: i64,
    },
}

impl ListEdit {
    /// Parse one instruction mapping.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::MalformedListEdit`] when the instruction does not
    /// have exactly one known key or its index is not an integer.
    pub fn parse(raw: Value) -> SweepResult<Self> {
        let map = match raw {
            Value::Object(map) => map,
            other => {
                return Err(SweepError::list_edit(format!(
                    "expected a mapping with a single key but got {other}"
                )));
            }
        };
        if map.len() != 1 {
            return Err(SweepError::list_edit(
                "any list operation should be a mapping with a single key",
            ));
        }
        let Some((op, mut arg)) = map.into_iter().next() else {
            return Err(SweepError::list_edit("empty list operation"));
        };
        densify_all(&mut arg)?;
        match op.as_str() {
            LIST_INSERT => {
                let (at, value) = indexed_argument(LIST_INSERT, arg)?;
                Ok(Self::Insert { at, value })
            }
            LIST_OVERWRITE => {
                let (at, value) = indexed_argument(LIST_OVERWRITE, arg)?;
                Ok(Self::Overwrite { at, value })
            }
            LIST_REMOVE => {
                let at = arg.as_i64().ok_or_else(|| {
                    SweepError::list_edit(format!(
                        "expected an integer for {LIST_REMOVE} but got: {arg}"
                    ))
                })?;
                Ok(Self::Remove { at })
            }
            unknown => Err(SweepError::list_edit(format!(
                "unknown list operation: {unknown}"
            ))),
        }
    }

    /// Render the instruction in its authoring form.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let (op, at, value) = match self {
            Self::Insert { at, value } => (LIST_INSERT, *at, value.as_ref()),
            Self::Overwrite { at, value } => (LIST_OVERWRITE, *at, value.as_ref()),
            Self::Remove { at } => (LIST_REMOVE, *at, None),
        };
        let arg = value.map_or_else(
            || Value::from(at),
            |v| Value::Array(vec![Value::from(at), v.to_value()]),
        );
        let mut map = Map::new();
        map.insert(op.to_owned(), arg);
        Value::Object(map)
    }
}

/// Parse the `dy__list__operations` payload into ordered instructions.
///
/// # Errors
///
/// Returns [`SweepError::MalformedListEdit`] when the payload is neither a
/// list nor an index-keyed mapping covering `0..n`, or when any instruction
/// is malformed.
pub fn parse_script(raw: Value) -> SweepResult<Vec<ListEdit>> {
    let ordered = match raw {
        Value::Array(items) => items,
        Value::Object(map) => canonicalise(map)?,
        other => {
            return Err(SweepError::list_edit(format!(
                "expected a list or an index-keyed mapping of operations but got {other}"
            )));
        }
    };
    ordered.into_iter().map(ListEdit::parse).collect()
}

/// Render a script back into its list form.
#[must_use]
pub fn script_to_value(edits: &[ListEdit]) -> Value {
    Value::Array(edits.iter().map(ListEdit::to_value).collect())
}

fn canonicalise(map: Map<String, Value>) -> SweepResult<Vec<Value>> {
    let count = map.len();
    let mut seq = SparseSeq::new();
    for (key, value) in map {
        let idx = parse_index_token(&key).ok_or_else(|| {
            SweepError::list_edit(format!(
                "operation key '{key}' is not an index token such as {}",
                index_token(0)
            ))
        })?;
        seq.set(idx, value);
    }
    if seq.len() != count {
        return Err(SweepError::list_edit(format!(
            "operation indices must cover 0..{count} without gaps"
        )));
    }
    Ok(seq.into_filled().map(|(_, value)| value).collect())
}

fn indexed_argument(op: &str, arg: Value) -> SweepResult<(i64, Option<EditValue>)> {
    match arg {
        Value::Number(ref n) => n.as_i64().map(|at| (at, None)).ok_or_else(|| {
            SweepError::list_edit(format!("expected an integer for {op} but got: {arg}"))
        }),
        Value::Array(items) => {
            let [index, value]: [Value; 2] = items.try_into().map_err(|rest: Vec<Value>| {
                SweepError::list_edit(format!(
                    "expected a list of length 2 for {op} but got {} items",
                    rest.len()
                ))
            })?;
            let at = index.as_i64().ok_or_else(|| {
                SweepError::list_edit(format!("expected an integer index for {op} but got: {index}"))
            })?;
            Ok((at, Some(EditValue::parse(value)?)))
        }
        other => Err(SweepError::list_edit(format!(
            "expected an integer for {op} but got: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn parses_every_instruction_form() {
        let edits = parse_script(json!([
            {"dy__insert": -1},
            {"dy__insert": [0, "head"]},
            {"dy__overwrite": [1, {"dy__eval": "first"}]},
            {"dy__remove": 2},
        ]))
        .expect("script parses");

        assert_eq!(
            edits,
            vec![
                ListEdit::Insert { at: -1, value: None },
                ListEdit::Insert {
                    at: 0,
                    value: Some(EditValue::Literal(json!("head"))),
                },
                ListEdit::Overwrite {
                    at: 1,
                    value: Some(EditValue::Eval(EvalCall::named("first"))),
                },
                ListEdit::Remove { at: 2 },
            ]
        );
    }

    #[rstest]
    fn index_keyed_scripts_follow_numeric_order() {
        let edits = parse_script(json!({
            "__IDX__1": {"dy__remove": 0},
            "__IDX__0": {"dy__insert": [0, 9]},
        }))
        .expect("script parses");
        assert!(matches!(edits.first(), Some(ListEdit::Insert { at: 0, .. })));
        assert!(matches!(edits.get(1), Some(ListEdit::Remove { at: 0 })));
    }

    #[rstest]
    #[case::two_keys(json!([{"dy__insert": 0, "dy__remove": 1}]))]
    #[case::unknown_op(json!([{"dy__append": 0}]))]
    #[case::float_index(json!([{"dy__remove": 1.5}]))]
    #[case::triple(json!([{"dy__overwrite": [0, 1, 2]}]))]
    #[case::gap(json!({"__IDX__0": {"dy__remove": 0}, "__IDX__2": {"dy__remove": 0}}))]
    #[case::plain_key(json!({"first": {"dy__remove": 0}}))]
    #[case::scalar(json!(3))]
    fn rejects_malformed_scripts(#[case] raw: Value) {
        let err = parse_script(raw).expect_err("script is malformed");
        assert!(matches!(&*err, SweepError::MalformedListEdit { .. }));
    }

    #[rstest]
    fn accepts_flattened_arguments() {
        let edits = parse_script(json!({
            "__IDX__0": {"dy__insert": {"__IDX__0": 0, "__IDX__1": {"__IDX__0": "x"}}},
        }))
        .expect("script parses");
        assert_eq!(
            edits,
            vec![ListEdit::Insert {
                at: 0,
                value: Some(EditValue::Literal(json!(["x"]))),
            }]
        );
    }

    #[rstest]
    fn renders_authoring_form() {
        let raw = json!([{"dy__overwrite": [0, 10]}, {"dy__remove": 1}]);
        let edits = parse_script(raw.clone()).expect("script parses");
        assert_eq!(script_to_value(&edits), raw);
    }
}
