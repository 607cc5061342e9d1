//! Deferred evaluation of patch values.
//!
//! A `dy__eval` directive asks the merge engine to compute a value instead of
//! copying a literal. The engine never executes code itself; it hands the
//! directive and an argument tree to an injected [`Evaluator`]. The crate
//! ships [`FunctionRegistry`], which resolves directives to named Rust
//! closures, and [`NoEvaluator`], which rejects every directive.

mod registry;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::keys::EVAL;
use crate::{SweepError, SweepResult};

pub use registry::{EvalFunction, FunctionRegistry};

/// Reference to the function a directive wants evaluated.
///
/// The structured form mirrors the authoring syntax:
///
/// ```json
/// {"dy__eval": {"expression": "num_classes", "function_of_interest": "func"}}
/// ```
///
/// while the short form is a bare string (`{"dy__eval": "num_classes"}`).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvalCall {
    /// Source text or registered name of the function.
    pub expression: String,
    /// Entry point inside `expression`, when it defines several.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_of_interest: Option<String>,
}

impl EvalCall {
    /// A call referring to a function by name only.
    #[must_use]
    pub fn named(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            function_of_interest: None,
        }
    }

    /// Parse the payload of a `dy__eval` key.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::MalformedDirective`] when the payload is neither a
    /// string nor an `{expression, function_of_interest}` mapping.
    pub fn from_directive(payload: &Value) -> SweepResult<Self> {
        match payload {
            Value::String(expression) => Ok(Self::named(expression.clone())),
            Value::Object(_) => serde_json::from_value(payload.clone())
                .map_err(|err| SweepError::directive(EVAL, err.to_string())),
            other => Err(SweepError::directive(
                EVAL,
                format!("expected a string or a mapping but got {other}"),
            )),
        }
    }

    /// Render the call back into its `dy__eval` payload.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        match &self.function_of_interest {
            None => Value::String(self.expression.clone()),
            Some(entry) => serde_json::json!({
                "expression": self.expression,
                "function_of_interest": entry,
            }),
        }
    }

    /// Short human-readable label for logs and errors.
    #[must_use]
    pub fn label(&self) -> &str {
        self.function_of_interest
            .as_deref()
            .unwrap_or_else(|| self.expression.trim())
    }
}

/// Capability that turns an [`EvalCall`] into a value.
///
/// `argument` is either the root of the tree being merged (for `dy__eval`
/// directives) or the current value at the patched location (for the
/// string-embedded `dy__eval(name)` form).
pub trait Evaluator {
    /// Evaluate `call` against `argument`.
    ///
    /// # Errors
    ///
    /// Implementations return [`SweepError::UnknownFunction`] for unresolvable
    /// calls and [`SweepError::Evaluation`] when the function itself fails.
    fn evaluate(&self, call: &EvalCall, argument: &Value) -> SweepResult<Value>;
}

impl<E: Evaluator + ?Sized> Evaluator for &E {
    fn evaluate(&self, call: &EvalCall, argument: &Value) -> SweepResult<Value> {
        (**self).evaluate(call, argument)
    }
}

/// Evaluator that refuses every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEvaluator;

impl Evaluator for NoEvaluator {
    fn evaluate(&self, call: &EvalCall, _argument: &Value) -> SweepResult<Value> {
        Err(Arc::new(SweepError::UnknownFunction {
            name: call.label().to_owned(),
        }))
    }
}
