//! Recursive update-or-insert of configuration trees.
//!
//! [`upsert`] merges an override tree into a base tree and returns the
//! result. Beyond plain key-wise overlaying, the override language supports:
//!
//! - list edit scripts (`dy__list__operations`),
//! - index-keyed patches addressing individual list positions,
//! - deferred evaluation against the merge root (`{"dy__eval": ...}`) or
//!   against the previous value (`"dy__eval(name)"`),
//! - `sweep_group*` patches applied to the accumulated node after its
//!   siblings, in key order,
//! - ordered `dy__upsert` patches applied last.
//!
//! The merge mutates a single owned tree in place. Nodes are addressed by
//! their path from the root, so every evaluation observes all changes made so
//! far, including those made earlier in the same node.
//!
//! # Examples
//!
//! ```
//! use hiersweep::{FunctionRegistry, upsert};
//! use serde_json::{json, Value};
//!
//! let registry = FunctionRegistry::new().with("lr_for_model", |root: &Value| {
//!     Ok(if root["model"]["type"] == "resnet" { json!(0.01) } else { json!(0.1) })
//! });
//! let merged = upsert(
//!     json!({"model": {"type": "densenet"}, "optimizer": {"lr": 0.1}}),
//!     &json!({
//!         "model": {"type": "resnet"},
//!         "dy__upsert": [{"optimizer": {"lr": {"dy__eval": "lr_for_model"}}}],
//!     }),
//!     &registry,
//! )
//! .expect("patch applies");
//! assert_eq!(merged, json!({"model": {"type": "resnet"}, "optimizer": {"lr": 0.01}}));
//! ```

mod leak;
mod list_ops;

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::eval::{EvalCall, Evaluator};
use crate::patch::{MappingPatch, Patch, densify};
use crate::path::{PathSegment, Trail};
use crate::result_ext::LocateExt;
use crate::{SweepError, SweepResult};

pub use leak::check_reserved_keys;

/// Merge `patch` into `base` and return the merged tree.
///
/// # Errors
///
/// Returns the first authoring or evaluation error, annotated once with the
/// path at which it was raised and the offending patch subtree. A merged tree
/// that still contains a reserved key is rejected.
pub fn upsert(base: Value, patch: &Value, evaluator: &dyn Evaluator) -> SweepResult<Value> {
    Upserter::new(evaluator).upsert(base, patch)
}

/// Merge engine bound to an [`Evaluator`].
#[derive(Clone, Copy)]
pub struct Upserter<'e> {
    evaluator: &'e dyn Evaluator,
}

impl<'e> Upserter<'e> {
    /// Create an engine that resolves deferred values through `evaluator`.
    #[must_use]
    pub const fn new(evaluator: &'e dyn Evaluator) -> Self {
        Self { evaluator }
    }

    /// Classify `patch` and merge it into `base`.
    ///
    /// # Errors
    ///
    /// See [`upsert`].
    pub fn upsert(&self, base: Value, patch: &Value) -> SweepResult<Value> {
        let classified = Patch::classify(patch)?;
        self.apply(base, &classified)
    }

    /// Merge an already classified patch into `base`.
    ///
    /// # Errors
    ///
    /// See [`upsert`].
    pub fn apply(&self, base: Value, patch: &Patch) -> SweepResult<Value> {
        let mut merge = Merge {
            root: base,
            evaluator: self.evaluator,
        };
        let at = Location::root();
        merge.node(&at, patch)?;
        check_reserved_keys(&merge.root).located(&at.trail.to_string(), || patch.to_value())?;
        Ok(merge.root)
    }
}

/// Where a node lives and how it is reported.
///
/// `path` addresses the node inside the merged tree; `trail` is the label
/// sequence shown in errors. Group and upsert passes revisit the same node
/// under a longer trail.
#[derive(Clone, Debug)]
struct Location {
    path: Vec<PathSegment>,
    trail: Trail,
}

impl Location {
    const fn root() -> Self {
        Self {
            path: Vec::new(),
            trail: Trail::root(),
        }
    }

    fn key(&self, key: &str) -> Self {
        let mut path = self.path.clone();
        path.push(PathSegment::Key(key.to_owned()));
        Self {
            path,
            trail: self.trail.child(key),
        }
    }

    fn index(&self, idx: usize) -> Self {
        let mut path = self.path.clone();
        path.push(PathSegment::Index(idx));
        Self {
            path,
            trail: self.trail.child(idx),
        }
    }

    fn labelled(&self, label: &str) -> Self {
        Self {
            path: self.path.clone(),
            trail: self.trail.child(label),
        }
    }
}

/// Coarse shape of the base value at a location.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Shape {
    List(usize),
    Mapping,
    Other,
}

impl Shape {
    const fn name(self) -> &'static str {
        match self {
            Self::List(_) => "list",
            Self::Mapping => "mapping",
            Self::Other => "scalar",
        }
    }
}

struct Merge<'e> {
    root: Value,
    evaluator: &'e dyn Evaluator,
}

impl Merge<'_> {
    /// Merge `patch` into the node at `at`, then fold an index-keyed result
    /// back into a list.
    fn node(&mut self, at: &Location, patch: &Patch) -> SweepResult<()> {
        self.dispatch(at, patch)
            .and_then(|()| densify(self.slot(at)?))
            .located(&at.trail.to_string(), || patch.to_value())
    }

    fn dispatch(&mut self, at: &Location, patch: &Patch) -> SweepResult<()> {
        match patch {
            Patch::Scalar(value) => {
                *self.slot(at)? = value.clone();
                Ok(())
            }
            Patch::Eval(call) => {
                let value = self.evaluate(call, at, None)?;
                *self.slot(at)? = value;
                Ok(())
            }
            Patch::SelfEval(call) => {
                let current = self.slot(at)?.clone();
                let value = self.evaluate(call, at, Some(&current))?;
                *self.slot(at)? = value;
                Ok(())
            }
            Patch::Mapping(mapping) => self.mapping(at, mapping),
            Patch::ListEdits(script) => self.list_edits(at, script),
            Patch::Sequence(items) => self.sequence(at, items),
            Patch::Sparse(seq) => {
                let shape = self.shape(at)?;
                match shape {
                    Shape::List(len) => {
                        for (idx, item) in seq.iter() {
                            if idx >= len {
                                return Err(Arc::new(SweepError::ListIndexOutOfRange {
                                    index: i64::try_from(idx).unwrap_or(i64::MAX),
                                    len,
                                }));
                            }
                            self.node(&at.index(idx), item)?;
                        }
                        Ok(())
                    }
                    Shape::Other => {
                        seq.check_dense()?;
                        *self.slot(at)? = Value::Array(vec![Value::Null; seq.filled()]);
                        for (idx, item) in seq.iter() {
                            self.node(&at.index(idx), item)?;
                        }
                        Ok(())
                    }
                    Shape::Mapping => Err(SweepError::shape(shape.name(), patch.kind())),
                }
            }
        }
    }

    /// Merge a keyed patch, building a fresh mapping over non-container
    /// bases.
    fn mapping(&mut self, at: &Location, mapping: &MappingPatch) -> SweepResult<()> {
        let shape = self.shape(at)?;
        match shape {
            Shape::Mapping => {}
            Shape::Other => *self.slot(at)? = Value::Object(Map::new()),
            Shape::List(_) if mapping.entries.is_empty() => return self.deferred(at, mapping),
            Shape::List(_) => return Err(SweepError::shape(shape.name(), "mapping")),
        }
        for (key, patch) in &mapping.entries {
            let Value::Object(map) = self.slot(at)? else {
                return Err(SweepError::shape("scalar", "mapping"));
            };
            if !map.contains_key(key) {
                map.insert(key.clone(), Value::Null);
            }
            self.node(&at.key(key), patch)?;
        }
        self.deferred(at, mapping)
    }

    /// Apply group patches, then ordered upserts, to the accumulated node.
    fn deferred(&mut self, at: &Location, mapping: &MappingPatch) -> SweepResult<()> {
        for (key, patch) in &mapping.groups {
            tracing::debug!(path = %at.trail, group = %key, "applying group patch");
            self.node(&at.labelled(key), patch)?;
        }
        for (position, entry) in mapping.upserts.iter().enumerate() {
            let label = entry.label(position);
            tracing::debug!(path = %at.trail, entry = %label, "applying ordered upsert");
            self.node(&at.labelled(&label), &entry.patch)?;
        }
        Ok(())
    }

    fn sequence(&mut self, at: &Location, items: &[Patch]) -> SweepResult<()> {
        let shape = self.shape(at)?;
        match shape {
            Shape::List(len) if len == items.len() => {}
            Shape::List(len) => {
                return Err(Arc::new(SweepError::LengthMismatch {
                    expected: len,
                    actual: items.len(),
                }));
            }
            Shape::Other => *self.slot(at)? = Value::Array(vec![Value::Null; items.len()]),
            Shape::Mapping => return Err(SweepError::shape(shape.name(), "list")),
        }
        for (idx, item) in items.iter().enumerate() {
            self.node(&at.index(idx), item)?;
        }
        Ok(())
    }

    /// Inspect the base at `at`, first unmasking an index-keyed mapping left
    /// behind by an earlier merge into a real list.
    fn shape(&mut self, at: &Location) -> SweepResult<Shape> {
        let node = self.slot(at)?;
        densify(node)?;
        Ok(match node {
            Value::Array(items) => Shape::List(items.len()),
            Value::Object(_) => Shape::Mapping,
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Shape::Other,
        })
    }

    fn evaluate(
        &self,
        call: &EvalCall,
        at: &Location,
        previous: Option<&Value>,
    ) -> SweepResult<Value> {
        tracing::debug!(path = %at.trail, function = %call.label(), "resolving deferred value");
        self.evaluator.evaluate(call, previous.unwrap_or(&self.root))
    }

    fn slot(&mut self, at: &Location) -> SweepResult<&mut Value> {
        let mut node = &mut self.root;
        for segment in &at.path {
            let next = match (node, segment) {
                (Value::Object(map), PathSegment::Key(key)) => map.get_mut(key),
                (Value::Array(items), PathSegment::Index(idx)) => items.get_mut(*idx),
                _ => None,
            };
            node = next.ok_or_else(|| {
                Arc::new(SweepError::DetachedNode {
                    path: at.trail.to_string(),
                })
            })?;
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests;
