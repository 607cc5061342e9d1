//! YAML parsing backed by `serde-saphyr`.

use serde_json::Value;
use serde_saphyr::Options;

/// Parse YAML contents using strict boolean semantics, so only `true` and
/// `false` are booleans and `yes`/`no`/`on`/`off` stay strings.
pub(super) fn parse_value(contents: &str) -> Result<Value, serde_saphyr::Error> {
    serde_saphyr::from_str_with_options(
        contents,
        Options {
            strict_booleans: true,
            ..Options::default()
        },
    )
}
