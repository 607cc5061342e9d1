//! Format-specific parsing of sweep definition files.

use camino::Utf8Path;
use serde_json::Value;

use super::error::file_error;
#[cfg(any(not(feature = "toml"), not(feature = "json5"), not(feature = "yaml")))]
use super::error::unsupported;
#[cfg(feature = "yaml")]
use super::yaml;
use crate::SweepResult;

/// Parse a document according to the extension of `path`.
///
/// Supported formats are TOML (the default for unknown extensions), JSON,
/// JSON5 and YAML. The `toml`, `json5` and `yaml` features must be enabled for
/// those formats to be parsed.
///
/// # Errors
///
/// Returns a [`crate::SweepError::File`] if the contents fail to parse or if
/// the required feature is disabled.
pub(super) fn parse_by_format(path: &Utf8Path, data: &str) -> SweepResult<Value> {
    let ext = path.extension().map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("json") => serde_json::from_str(data).map_err(|e| file_error(path, e)),
        Some("json5") => {
            #[cfg(feature = "json5")]
            {
                json5::from_str(data).map_err(|e| file_error(path, e))
            }
            #[cfg(not(feature = "json5"))]
            {
                Err(unsupported(path, "json5"))
            }
        }
        Some("yaml" | "yml") => {
            #[cfg(feature = "yaml")]
            {
                yaml::parse_value(data).map_err(|e| file_error(path, e.to_string()))
            }
            #[cfg(not(feature = "yaml"))]
            {
                Err(unsupported(path, "yaml"))
            }
        }
        _ => {
            #[cfg(feature = "toml")]
            {
                toml::from_str(data).map_err(|e| file_error(path, e))
            }
            #[cfg(not(feature = "toml"))]
            {
                Err(unsupported(path, "toml"))
            }
        }
    }
}
