//! Reading sweep definitions from disk.
//!
//! A sweep definition document holds the two trees a sweep is authored from:
//!
//! ```toml
//! [base_config.model]
//! type = "resnet"
//!
//! [sweep_configuration]
//! method = "grid"
//!
//! [sweep_configuration.parameters.model.type]
//! sweep = true
//! values = ["resnet", "densenet"]
//! ```

mod error;
mod parser;
#[cfg(feature = "yaml")]
mod yaml;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use self::error::{file_error, invalid_data};
use self::parser::parse_by_format;
use crate::SweepResult;
use crate::sweep::HierarchicalSweep;

/// The authored inputs of a hierarchical sweep.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepDefinition {
    /// The configuration every trial starts from.
    pub base_config: Value,
    /// The hierarchical sweep configuration (`method`, `parameters`, ...).
    pub sweep_configuration: Value,
}

impl SweepDefinition {
    /// Standardize the sweep against the base configuration.
    ///
    /// # Errors
    ///
    /// See [`HierarchicalSweep::new`].
    pub fn into_session(self) -> SweepResult<HierarchicalSweep> {
        HierarchicalSweep::new(self.base_config, &self.sweep_configuration)
    }
}

/// Load a sweep definition, selecting the parser based on extension.
///
/// # Examples
///
/// ```rust,no_run
/// use camino::Utf8Path;
/// use hiersweep::load_sweep_definition;
///
/// # fn run() -> hiersweep::SweepResult<()> {
/// let definition = load_sweep_definition(Utf8Path::new("sweep.toml"))?;
/// let session = definition.into_session()?;
/// println!("{:?}", session.spec());
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns a [`crate::SweepError::File`] if reading or parsing the file fails
/// or if the document is not a sweep definition.
pub fn load_sweep_definition(path: &Utf8Path) -> SweepResult<SweepDefinition> {
    let data = std::fs::read_to_string(path).map_err(|e| file_error(path, e))?;
    parse_sweep_definition(path, &data)
}

/// Parse an in-memory sweep definition; `path_hint` selects the format and
/// is reported in errors.
///
/// # Errors
///
/// As [`load_sweep_definition`], without the read step.
pub fn parse_sweep_definition(path_hint: &Utf8Path, data: &str) -> SweepResult<SweepDefinition> {
    let value = parse_by_format(path_hint, data)?;
    if !value.is_object() {
        return Err(invalid_data(
            path_hint,
            "sweep definition must be a mapping with base_config and sweep_configuration",
        ));
    }
    let definition = SweepDefinition::deserialize(&value).map_err(|e| file_error(path_hint, e))?;
    tracing::debug!(path = %path_hint, "parsed sweep definition");
    Ok(definition)
}
