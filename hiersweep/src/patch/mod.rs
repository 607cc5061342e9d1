//! Classification of raw override trees into patch directives.
//!
//! The merge engine never inspects raw JSON. [`Patch::classify`] walks an
//! override tree once and produces a closed set of variants, rejecting
//! malformed directives before anything is merged. The engine then dispatches
//! over `(base shape, Patch)` with an explicit match.

mod list_edit;
mod sparse;

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::eval::EvalCall;
use crate::keys::{
    EVAL, LIST_OPERATIONS, SWEEP, UPSERT, embedded_eval_call, is_group_key, parse_index_token,
};
use crate::path::Trail;
use crate::result_ext::LocateExt;
use crate::{SweepError, SweepResult};

pub use list_edit::{EditValue, ListEdit, parse_script, script_to_value};
pub use sparse::{SparseSeq, densify, densify_all, is_index_map};

/// A classified override tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Patch {
    /// A literal that replaces the base value outright.
    Scalar(Value),
    /// `"dy__eval(name)"`: recompute the value from its previous value.
    SelfEval(EvalCall),
    /// `{"dy__eval": ...}`: compute the value from the merge root.
    Eval(EvalCall),
    /// A list patch, merged position by position.
    Sequence(Vec<Self>),
    /// An index-keyed patch addressing individual list positions.
    Sparse(SparseSeq<Self>),
    /// A list edit script.
    ListEdits(ListScript),
    /// A keyed patch with optional deferred groups and ordered upserts.
    Mapping(MappingPatch),
}

/// A list edit script and the rest of its enclosing mapping.
#[derive(Clone, Debug, PartialEq)]
pub struct ListScript {
    /// Instructions in application order.
    pub edits: Vec<ListEdit>,
    /// Sibling keys, used by instructions that carry no explicit value.
    pub payload: MappingPatch,
}

/// A keyed patch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MappingPatch {
    /// Plain keys merged first, in declaration order.
    pub entries: Vec<(String, Patch)>,
    /// `sweep_group*` patches, sorted by key, applied after the entries.
    pub groups: Vec<(String, Patch)>,
    /// `dy__upsert` patches, applied last in declaration order.
    pub upserts: Vec<UpsertEntry>,
}

/// One entry of an ordered `dy__upsert` directive.
#[derive(Clone, Debug, PartialEq)]
pub struct UpsertEntry {
    /// Key when the directive was written as a mapping, `None` for a list.
    pub key: Option<String>,
    /// The patch to apply.
    pub patch: Patch,
}

impl UpsertEntry {
    /// Label used in merge trails (`dy__upsert-0`, `dy__upsert-late`).
    #[must_use]
    pub fn label(&self, position: usize) -> String {
        self.key.as_ref().map_or_else(
            || format!("{UPSERT}-{position}"),
            |key| format!("{UPSERT}-{key}"),
        )
    }
}

impl MappingPatch {
    /// Returns `true` when the mapping changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.groups.is_empty() && self.upserts.is_empty()
    }

    fn classify(map: &Map<String, Value>, trail: &Trail) -> SweepResult<Self> {
        let mut out = Self::default();
        for (key, value) in map {
            let child = trail.child(key);
            if is_group_key(key) {
                out.groups.push((key.clone(), Patch::classify_at(value, &child)?));
            } else if key == UPSERT {
                out.upserts = classify_upserts(value, &child)?;
            } else {
                out.entries.push((key.clone(), Patch::classify_at(value, &child)?));
            }
        }
        out.groups.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(out)
    }

    /// Reconstruct the authoring form.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for (key, patch) in self.entries.iter().chain(&self.groups) {
            map.insert(key.clone(), patch.to_value());
        }
        if !self.upserts.is_empty() {
            let keyed = self.upserts.iter().all(|entry| entry.key.is_some());
            let rendered = if keyed {
                Value::Object(
                    self.upserts
                        .iter()
                        .map(|entry| (entry.key.clone().unwrap_or_default(), entry.patch.to_value()))
                        .collect(),
                )
            } else {
                Value::Array(self.upserts.iter().map(|e| e.patch.to_value()).collect())
            };
            map.insert(UPSERT.to_owned(), rendered);
        }
        map
    }
}

impl Patch {
    /// Classify a raw override tree.
    ///
    /// # Errors
    ///
    /// Returns the first malformed directive found, annotated with its path
    /// and the offending subtree.
    ///
    /// # Examples
    ///
    /// ```
    /// use hiersweep::patch::Patch;
    /// use serde_json::json;
    ///
    /// let patch = Patch::classify(&json!({"lr": {"dy__eval": "scaled_lr"}}))
    ///     .expect("patch is well formed");
    /// assert!(matches!(patch, Patch::Mapping(_)));
    /// ```
    pub fn classify(raw: &Value) -> SweepResult<Self> {
        Self::classify_at(raw, &Trail::root())
    }

    pub(crate) fn classify_at(raw: &Value, trail: &Trail) -> SweepResult<Self> {
        Self::classify_node(raw, trail).located(&trail.to_string(), || raw.clone())
    }

    fn classify_node(raw: &Value, trail: &Trail) -> SweepResult<Self> {
        match raw {
            Value::String(text) => Ok(embedded_eval_call(text).map_or_else(
                || Self::Scalar(raw.clone()),
                |name| Self::SelfEval(EvalCall::named(name.trim())),
            )),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(idx, item)| Self::classify_at(item, &trail.child(idx)))
                .collect::<SweepResult<Vec<_>>>()
                .map(Self::Sequence),
            Value::Object(map) => Self::classify_map(map, trail),
            Value::Null | Value::Bool(_) | Value::Number(_) => Ok(Self::Scalar(raw.clone())),
        }
    }

    fn classify_map(map: &Map<String, Value>, trail: &Trail) -> SweepResult<Self> {
        if let Some(payload) = map.get(EVAL) {
            if map.len() != 1 {
                return Err(SweepError::directive(
                    EVAL,
                    "must be the only key in its mapping",
                ));
            }
            return EvalCall::from_directive(payload).map(Self::Eval);
        }
        if map.contains_key(SWEEP) {
            return Err(SweepError::axis(
                trail.to_string(),
                "sweep axes must be resolved to a value before they are merged",
            ));
        }
        if let Some(ops) = map.get(LIST_OPERATIONS) {
            let edits = parse_script(ops.clone())?;
            let mut rest = map.clone();
            rest.remove(LIST_OPERATIONS);
            let payload = MappingPatch::classify(&rest, trail)?;
            return Ok(Self::ListEdits(ListScript { edits, payload }));
        }
        if is_index_map(map) {
            let mut seq = SparseSeq::new();
            for (key, value) in map {
                let idx = parse_index_token(key).ok_or_else(|| {
                    SweepError::shape("list", "index-keyed")
                })?;
                seq.set(idx, Self::classify_at(value, &trail.child(idx))?);
            }
            return Ok(Self::Sparse(seq));
        }
        MappingPatch::classify(map, trail).map(Self::Mapping)
    }

    /// Short name of the variant, used in shape mismatch errors.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::SelfEval(_) | Self::Eval(_) => "evaluation",
            Self::Sequence(_) => "list",
            Self::Sparse(_) => "index-keyed",
            Self::ListEdits(_) => "list-edit",
            Self::Mapping(_) => "mapping",
        }
    }

    /// Reconstruct the authoring form of the patch.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Scalar(value) => value.clone(),
            Self::SelfEval(call) => Value::String(format!("{EVAL}({})", call.expression)),
            Self::Eval(call) => {
                let mut map = Map::new();
                map.insert(EVAL.to_owned(), call.to_payload());
                Value::Object(map)
            }
            Self::Sequence(items) => Value::Array(items.iter().map(Self::to_value).collect()),
            Self::Sparse(seq) => {
                let mut rendered = SparseSeq::new();
                for (idx, patch) in seq.iter() {
                    rendered.set(idx, patch.to_value());
                }
                Value::Object(rendered.into_index_map())
            }
            Self::ListEdits(script) => {
                let mut map = script.payload.to_map();
                map.insert(LIST_OPERATIONS.to_owned(), script_to_value(&script.edits));
                Value::Object(map)
            }
            Self::Mapping(mapping) => Value::Object(mapping.to_map()),
        }
    }
}

fn classify_upserts(raw: &Value, trail: &Trail) -> SweepResult<Vec<UpsertEntry>> {
    match raw {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                Patch::classify_at(item, &trail.child(idx)).map(|patch| UpsertEntry {
                    key: None,
                    patch,
                })
            })
            .collect(),
        Value::Object(map) => {
            let mut entries = map
                .iter()
                .map(|(key, item)| {
                    Patch::classify_at(item, &trail.child(key)).map(|patch| UpsertEntry {
                        key: Some(key.clone()),
                        patch,
                    })
                })
                .collect::<SweepResult<Vec<_>>>()?;
            // Positions rebuilt from flat keys may arrive out of order.
            if is_index_map(map) {
                entries.sort_by_key(|entry| entry.key.as_deref().and_then(parse_index_token));
            }
            Ok(entries)
        }
        other => Err(Arc::new(SweepError::MalformedDirective {
            directive: UPSERT,
            message: format!("expected a list or a mapping of patches but got {other}"),
        })),
    }
}
