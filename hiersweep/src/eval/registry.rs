//! Named-function evaluator.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::{EvalCall, Evaluator};
use crate::error::BoxError;
use crate::{SweepError, SweepResult};

/// Function stored in a [`FunctionRegistry`].
pub type EvalFunction = Box<dyn Fn(&Value) -> Result<Value, BoxError> + Send + Sync>;

/// Evaluator resolving directives to registered Rust closures.
///
/// A call resolves by its trimmed `expression` first and by its
/// `function_of_interest` second, so both `{"dy__eval": "num_classes"}` and a
/// structured reference whose entry point is registered are supported.
///
/// # Examples
///
/// ```
/// use hiersweep::{EvalCall, Evaluator, FunctionRegistry};
/// use serde_json::{json, Value};
///
/// let registry = FunctionRegistry::new().with("is_resnet", |root: &Value| {
///     Ok(json!(root["model"]["type"] == "resnet"))
/// });
/// let flag = registry
///     .evaluate(&EvalCall::named("is_resnet"), &json!({"model": {"type": "resnet"}}))
///     .expect("registered function evaluates");
/// assert_eq!(flag, json!(true));
/// ```
#[derive(Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, EvalFunction>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `function` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(&Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        let key = name.into();
        if self.functions.insert(key.clone(), Box::new(function)).is_some() {
            tracing::warn!(function = %key, "replaced registered evaluation function");
        }
        self
    }

    /// Builder-style variant of [`FunctionRegistry::register`].
    #[must_use]
    pub fn with<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.register(name, function);
        self
    }

    /// Returns `true` when a function is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Number of registered functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    fn resolve(&self, call: &EvalCall) -> Option<(&str, &EvalFunction)> {
        let by_expression = self
            .functions
            .get_key_value(call.expression.trim())
            .map(|(name, function)| (name.as_str(), function));
        by_expression.or_else(|| {
            let entry = call.function_of_interest.as_deref()?;
            self.functions
                .get_key_value(entry)
                .map(|(name, function)| (name.as_str(), function))
        })
    }
}

impl Evaluator for FunctionRegistry {
    fn evaluate(&self, call: &EvalCall, argument: &Value) -> SweepResult<Value> {
        let Some((name, function)) = self.resolve(call) else {
            return Err(Arc::new(SweepError::UnknownFunction {
                name: call.label().to_owned(),
            }));
        };
        tracing::debug!(function = %name, "evaluating deferred value");
        function(argument).map_err(|source| {
            Arc::new(SweepError::Evaluation {
                function: name.to_owned(),
                source,
            })
        })
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FunctionRegistry")
            .field("functions", &names)
            .finish()
    }
}
