//! Reserved vocabulary of the sweep patch language.
//!
//! Sweep and patch trees are ordinary JSON-shaped documents in which a small
//! set of keys carry directive meaning. Everything else is plain data. The
//! constants below are the exact literal tokens authors write.

/// Marks a mapping as a sweep axis.
pub const SWEEP: &str = "sweep";
/// Stable identifier used as the axis alias instead of a derived suffix.
pub const SWEEP_IDENTIFIER: &str = "sweep_identifier";
/// Per-value aliases, parallel to an axis' `values` list.
pub const SWEEP_ALIAS: &str = "sweep_alias";
/// Prefix for "apply after siblings" group patches.
pub const SWEEP_GROUP: &str = "sweep_group";

/// Ordered list (or mapping) of patches applied after the main merge.
pub const UPSERT: &str = "dy__upsert";
/// Container for a list edit script.
pub const LIST_OPERATIONS: &str = "dy__list__operations";
/// List edit: insert at an index.
pub const LIST_INSERT: &str = "dy__insert";
/// List edit: remove an index.
pub const LIST_REMOVE: &str = "dy__remove";
/// List edit: overwrite an index.
pub const LIST_OVERWRITE: &str = "dy__overwrite";
/// Deferred evaluation directive.
pub const EVAL: &str = "dy__eval";

/// Prefix marking a path component as a list position.
pub const INDEX_PREFIX: &str = "__IDX__";
/// Separator joining path components of a flat axis key.
pub const SEPARATOR: &str = "__SEP__";

/// Keys that may only appear as directives.
pub const RESERVED_KEYS: [&str; 9] = [
    SWEEP,
    SWEEP_IDENTIFIER,
    SWEEP_ALIAS,
    UPSERT,
    LIST_OPERATIONS,
    LIST_INSERT,
    LIST_REMOVE,
    LIST_OVERWRITE,
    EVAL,
];

/// Returns `true` when `key` is part of the directive vocabulary.
///
/// Group keys are matched by prefix because authors may declare several of
/// them on one node (`sweep_group_a`, `sweep_group_b`, ...).
#[must_use]
pub fn is_reserved(key: &str) -> bool {
    is_group_key(key) || RESERVED_KEYS.contains(&key)
}

/// Returns `true` when `key` names an apply-after-siblings group.
#[must_use]
pub fn is_group_key(key: &str) -> bool {
    key.starts_with(SWEEP_GROUP)
}

/// Render the index token for list position `idx`.
///
/// ```
/// assert_eq!(hiersweep::keys::index_token(3), "__IDX__3");
/// ```
#[must_use]
pub fn index_token(idx: usize) -> String {
    format!("{INDEX_PREFIX}{idx}")
}

/// Parse an index token back into its list position.
///
/// Returns `None` for keys that are not index tokens, including tokens whose
/// suffix is not a non-negative integer.
#[must_use]
pub fn parse_index_token(key: &str) -> Option<usize> {
    let digits = key.strip_prefix(INDEX_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Returns `true` when `key` carries the index prefix.
#[must_use]
pub fn is_index_token(key: &str) -> bool {
    parse_index_token(key).is_some()
}

/// Extract the function name from a string-embedded call such as
/// `dy__eval(double)`.
///
/// The outermost parentheses delimit the name, so nested parentheses inside
/// the call survive intact.
#[must_use]
pub fn embedded_eval_call(text: &str) -> Option<&str> {
    let start = text.find(EVAL)?;
    let after = text.get(start + EVAL.len()..)?;
    let inner = after.strip_prefix('(')?;
    let end = inner.rfind(')')?;
    inner.get(..end)
}
