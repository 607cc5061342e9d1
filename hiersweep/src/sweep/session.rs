//! A base configuration bound to a standardized sweep.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::compress::CompressionContext;
use super::spec::SweepSpec;
use super::standardize::{destandardize, standardize};
use crate::eval::Evaluator;
use crate::result_ext::SweepResultExt;
use crate::upsert::Upserter;
use crate::{SweepError, SweepResult};

/// Everything needed to rebuild concrete configurations in another process.
///
/// Callers persist this record next to the sweep registered with the sweep
/// service and hand it to [`HierarchicalSweep::from_metadata`] in each
/// worker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepMetadata {
    /// The configuration every trial starts from.
    pub base_config: Value,
    /// Alias tables and remainder of the sweep.
    pub compression: CompressionContext,
}

/// Hierarchical sweep over a base configuration.
///
/// # Examples
///
/// ```
/// use hiersweep::{HierarchicalSweep, NoEvaluator};
/// use serde_json::json;
///
/// let sweep = HierarchicalSweep::new(
///     json!({"model": {"type": "resnet", "depth": 18}}),
///     &json!({
///         "method": "grid",
///         "parameters": {"model": {"depth": {"sweep": true, "values": [18, 50]}}},
///     }),
/// )
/// .expect("sweep is well formed");
///
/// let configs = sweep.materialize_grid(&NoEvaluator).expect("grid materializes");
/// assert_eq!(configs[1], json!({"model": {"type": "resnet", "depth": 50}}));
/// ```
#[derive(Clone, Debug)]
pub struct HierarchicalSweep {
    metadata: SweepMetadata,
    spec: Option<SweepSpec>,
}

impl HierarchicalSweep {
    /// Standardize `sweep` against `base_config`.
    ///
    /// # Errors
    ///
    /// Returns any standardization error, or [`SweepError::Json`] when the
    /// standardized tree lacks the service settings (`method`, ...).
    pub fn new(base_config: Value, sweep: &Value) -> SweepResult<Self> {
        let mut compression = CompressionContext::new();
        let standard = standardize(sweep, &mut compression)?;
        let spec = SweepSpec::from_value(&standard)?;
        Ok(Self {
            metadata: SweepMetadata {
                base_config,
                compression,
            },
            spec: Some(spec),
        })
    }

    /// Rebuild a session from persisted metadata.
    ///
    /// The standardized specification is not part of the metadata, so
    /// [`HierarchicalSweep::spec`] is `None` on the result.
    #[must_use]
    pub const fn from_metadata(metadata: SweepMetadata) -> Self {
        Self {
            metadata,
            spec: None,
        }
    }

    /// The standardized specification to register with the sweep service.
    #[must_use]
    pub const fn spec(&self) -> Option<&SweepSpec> {
        self.spec.as_ref()
    }

    /// The record to persist alongside the sweep.
    #[must_use]
    pub const fn metadata(&self) -> &SweepMetadata {
        &self.metadata
    }

    /// The configuration every trial starts from.
    #[must_use]
    pub const fn base_config(&self) -> &Value {
        &self.metadata.base_config
    }

    /// Build the concrete configuration for one flat `assignment`.
    ///
    /// # Errors
    ///
    /// Returns any error raised while reconstructing the override tree or
    /// merging it into the base configuration.
    pub fn materialize(
        &self,
        assignment: &Map<String, Value>,
        evaluator: &dyn Evaluator,
    ) -> SweepResult<Value> {
        let overrides = destandardize(assignment, &self.metadata.compression)?;
        Upserter::new(evaluator).upsert(self.metadata.base_config.clone(), &overrides)
    }

    /// Build the concrete configuration and deserialize it into `T`.
    ///
    /// # Errors
    ///
    /// As [`HierarchicalSweep::materialize`], plus [`SweepError::Json`] when
    /// the configuration does not fit `T`.
    pub fn materialize_as<T: DeserializeOwned>(
        &self,
        assignment: &Map<String, Value>,
        evaluator: &dyn Evaluator,
    ) -> SweepResult<T> {
        let config = self.materialize(assignment, evaluator)?;
        serde_json::from_value(config).into_sweep()
    }

    /// Materialize every assignment of the grid, in grid order.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::NotEnumerable`] when the session has no
    /// specification or an axis has no finite candidates, and any error from
    /// [`HierarchicalSweep::materialize`].
    pub fn materialize_grid(&self, evaluator: &dyn Evaluator) -> SweepResult<Vec<Value>> {
        let Some(spec) = &self.spec else {
            return Err(SweepError::NotEnumerable {
                axis: "parameters".to_owned(),
                message: "session was rebuilt from metadata without its specification".to_owned(),
            }
            .into());
        };
        spec.grid_assignments()?
            .iter()
            .map(|assignment| self.materialize(assignment, evaluator))
            .collect()
    }
}
