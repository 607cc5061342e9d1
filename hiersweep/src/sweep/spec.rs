//! Typed view of a standardized sweep specification.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::result_ext::SweepResultExt;
use crate::{SweepError, SweepResult};

/// Search strategy requested from the sweep service.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Exhaustive cartesian product of every axis.
    Grid,
    /// Independent random draws.
    Random,
    /// Bayesian optimisation guided by the metric.
    Bayes,
}

/// Optimisation direction of a [`Metric`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    /// Lower is better.
    Minimize,
    /// Higher is better.
    Maximize,
}

/// Metric the sweep service optimises.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Name of the logged metric.
    pub name: String,
    /// Optimisation direction.
    pub goal: Goal,
}

/// A standardized sweep: flat, aliased `parameters` plus service settings.
///
/// Keys this type does not model are kept in [`SweepSpec::extra`] so the
/// specification round-trips unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepSpec {
    /// Display name of the sweep.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Search strategy.
    pub method: Method,
    /// Metric to optimise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<Metric>,
    /// Axis declarations keyed by alias.
    pub parameters: Map<String, Value>,
    /// Every other top-level key.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SweepSpec {
    /// Extract the typed view from a standardized tree.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::Json`] when the tree does not have the expected
    /// shape.
    pub fn from_value(standard: &Value) -> SweepResult<Self> {
        Self::deserialize(standard).into_sweep()
    }

    /// Render the specification back into a tree for the sweep service.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::Json`] if serialization fails.
    pub fn to_value(&self) -> SweepResult<Value> {
        serde_json::to_value(self).into_sweep()
    }

    /// Enumerate every assignment of the grid locally.
    ///
    /// Axes are combined in declaration order with the first axis varying
    /// slowest. An axis declares its candidates with a `values` list or a
    /// single `value`.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::NotEnumerable`] for an axis without candidates,
    /// such as a distribution with `min`/`max` bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use hiersweep::sweep::SweepSpec;
    /// use serde_json::json;
    ///
    /// let spec = SweepSpec::from_value(&json!({
    ///     "method": "grid",
    ///     "parameters": {"a": {"values": [1, 2]}, "b": {"value": "x"}},
    /// }))
    /// .expect("spec parses");
    /// let grid = spec.grid_assignments().expect("grid is finite");
    /// assert_eq!(grid.len(), 2);
    /// assert_eq!(serde_json::Value::Object(grid[1].clone()), json!({"a": 2, "b": "x"}));
    /// ```
    pub fn grid_assignments(&self) -> SweepResult<Vec<Map<String, Value>>> {
        let mut assignments = vec![Map::new()];
        for (alias, declaration) in &self.parameters {
            let values = axis_candidates(alias, declaration)?;
            assignments = assignments
                .into_iter()
                .flat_map(|partial| {
                    values.iter().map(move |value| {
                        let mut next = partial.clone();
                        next.insert(alias.clone(), value.clone());
                        next
                    })
                })
                .collect();
        }
        Ok(assignments)
    }
}

fn axis_candidates(alias: &str, declaration: &Value) -> SweepResult<Vec<Value>> {
    let not_enumerable = |message: &str| {
        Arc::new(SweepError::NotEnumerable {
            axis: alias.to_owned(),
            message: message.to_owned(),
        })
    };
    let Some(map) = declaration.as_object() else {
        return Err(not_enumerable("axis declaration is not a mapping"));
    };
    match (map.get("values"), map.get("value")) {
        (Some(Value::Array(values)), _) if !values.is_empty() => Ok(values.clone()),
        (Some(Value::Array(_)), _) => Err(not_enumerable("values list is empty")),
        (Some(_), _) => Err(not_enumerable("values is not a list")),
        (None, Some(value)) => Ok(vec![value.clone()]),
        (None, None) => Err(not_enumerable("axis declares neither values nor value")),
    }
}
