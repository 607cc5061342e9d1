//! Index-addressed sequences with holes.
//!
//! Partial trees rebuilt from flat axis keys address list positions through
//! `__IDX__<n>` mapping keys, and those positions need not be contiguous.
//! [`SparseSeq`] is the explicit form of such a mapping: filled slots keyed by
//! position. Nothing is allocated for the positions in between, so an
//! authored index never sizes a buffer. A sequence only becomes a list once
//! its positions cover `0..n` without gaps.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::keys::{index_token, parse_index_token};
use crate::{SweepError, SweepResult};

/// Ordered array of optional slots.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseSeq<T> {
    slots: BTreeMap<usize, T>,
}

impl<T> Default for SparseSeq<T> {
    fn default() -> Self {
        Self {
            slots: BTreeMap::new(),
        }
    }
}

impl<T> SparseSeq<T> {
    /// Create an empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill slot `idx`, replacing any previous value.
    pub fn set(&mut self, idx: usize, value: T) {
        self.slots.insert(idx, value);
    }

    /// One past the highest filled position, saturating at `usize::MAX`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.highest().map_or(0, |idx| idx.saturating_add(1))
    }

    /// Returns `true` when no slot is filled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of filled slots.
    #[must_use]
    pub fn filled(&self) -> usize {
        self.slots.len()
    }

    fn highest(&self) -> Option<usize> {
        self.slots.last_key_value().map(|(idx, _)| *idx)
    }

    /// Check that the filled slots cover `0..n` without gaps.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::ListIndexOutOfRange`] naming the highest
    /// position when it lies past the number of filled slots.
    pub fn check_dense(&self) -> SweepResult<()> {
        match self.highest() {
            Some(idx) if idx >= self.filled() => Err(gap(idx, self.filled())),
            _ => Ok(()),
        }
    }

    /// Iterate filled slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots.iter().map(|(idx, value)| (*idx, value))
    }

    /// Consume the sequence, yielding filled slots in index order.
    pub fn into_filled(self) -> impl Iterator<Item = (usize, T)> {
        self.slots.into_iter()
    }

    /// Convert a gap-free sequence into a list.
    ///
    /// # Errors
    ///
    /// As [`SparseSeq::check_dense`].
    pub fn into_dense(self) -> SweepResult<Vec<T>> {
        self.check_dense()?;
        Ok(self.slots.into_values().collect())
    }
}

fn gap(idx: usize, len: usize) -> Arc<SweepError> {
    Arc::new(SweepError::ListIndexOutOfRange {
        index: i64::try_from(idx).unwrap_or(i64::MAX),
        len,
    })
}

impl SparseSeq<Value> {
    /// Interpret `map` as a sparse sequence.
    ///
    /// Returns `None` unless `map` is non-empty and every key is an index
    /// token.
    #[must_use]
    pub fn from_index_map(map: Map<String, Value>) -> Option<Self> {
        if !is_index_map(&map) {
            return None;
        }
        let mut seq = Self::new();
        for (key, value) in map {
            let idx = parse_index_token(&key)?;
            seq.set(idx, value);
        }
        Some(seq)
    }

    /// Render the filled slots back into an index-keyed mapping.
    #[must_use]
    pub fn into_index_map(self) -> Map<String, Value> {
        self.into_filled()
            .map(|(idx, value)| (index_token(idx), value))
            .collect()
    }
}

/// Returns `true` when `map` is non-empty and keyed only by index tokens.
///
/// An empty mapping is an empty mapping, never an empty list.
#[must_use]
pub fn is_index_map(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.keys().all(|key| parse_index_token(key).is_some())
}

/// Convert an index-keyed mapping into an array, leaving other values alone.
///
/// ```
/// use hiersweep::patch::densify;
/// use serde_json::json;
///
/// let mut value = json!({"__IDX__1": "b", "__IDX__0": "a"});
/// densify(&mut value).expect("positions are contiguous");
/// assert_eq!(value, json!(["a", "b"]));
/// ```
///
/// # Errors
///
/// Returns [`SweepError::ListIndexOutOfRange`] when the positions leave a
/// gap; the mapping is left untouched.
pub fn densify(value: &mut Value) -> SweepResult<()> {
    let Value::Object(map) = value else {
        return Ok(());
    };
    if !is_index_map(map) {
        return Ok(());
    }
    // Distinct keys all below the entry count cover `0..len` exactly.
    let len = map.len();
    if let Some(idx) = map.keys().filter_map(|key| parse_index_token(key)).find(|idx| *idx >= len) {
        return Err(gap(idx, len));
    }
    if let Some(seq) = SparseSeq::from_index_map(std::mem::take(map)) {
        *value = Value::Array(seq.into_dense()?);
    }
    Ok(())
}

/// Apply [`densify`] to every node of `value`, innermost first.
///
/// Trees that went through the flattener carry every list as an index-keyed
/// mapping; literals taken verbatim from such trees are restored with this.
///
/// # Errors
///
/// As [`densify`].
pub fn densify_all(value: &mut Value) -> SweepResult<()> {
    match value {
        Value::Object(map) => map.values_mut().try_for_each(densify_all)?,
        Value::Array(items) => items.iter_mut().try_for_each(densify_all)?,
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }
    densify(value)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn orders_positions() {
        let mut value = json!({"__IDX__2": 3, "__IDX__0": 1, "__IDX__1": 2});
        densify(&mut value).expect("positions are contiguous");
        assert_eq!(value, json!([1, 2, 3]));
    }

    #[rstest]
    #[case::hole(json!({"__IDX__2": 3, "__IDX__0": 1}), 2)]
    #[case::huge(json!({"__IDX__0": "a", "__IDX__18446744073709551615": "b"}), i64::MAX)]
    #[case::far(json!({"__IDX__4000000000": "a"}), 4_000_000_000)]
    fn rejects_gaps_without_losing_entries(#[case] input: Value, #[case] index: i64) {
        let mut value = input.clone();
        let err = densify(&mut value).expect_err("positions leave a gap");
        assert!(matches!(&*err, SweepError::ListIndexOutOfRange { index: i, .. } if *i == index));
        assert_eq!(value, input);
    }

    #[rstest]
    #[case(json!({}))]
    #[case(json!({"__IDX__0": 1, "name": "x"}))]
    fn leaves_ordinary_mappings(#[case] input: Value) {
        let mut value = input.clone();
        densify(&mut value).expect("nothing to densify");
        assert_eq!(value, input);
    }

    #[rstest]
    fn restores_nested_lists() {
        let mut value = json!({"__IDX__0": {"__IDX__0": 0, "__IDX__1": {"k": {"__IDX__0": "v"}}}});
        densify_all(&mut value).expect("positions are contiguous");
        assert_eq!(value, json!([[0, {"k": ["v"]}]]));
    }

    #[rstest]
    fn huge_positions_do_not_allocate() {
        let mut seq = SparseSeq::new();
        seq.set(0, "a");
        seq.set(usize::MAX, "b");
        assert_eq!(seq.len(), usize::MAX);
        assert_eq!(seq.filled(), 2);
        assert_eq!(seq.iter().map(|(idx, _)| idx).collect::<Vec<_>>(), vec![0, usize::MAX]);
        assert!(seq.into_dense().is_err());
    }

    #[rstest]
    fn index_map_round_trips_filled_slots() {
        let map = json!({"__IDX__3": "d", "__IDX__1": "b"});
        let Value::Object(map) = map else {
            panic!("fixture is a mapping");
        };
        let seq = SparseSeq::from_index_map(map).expect("index map");
        assert_eq!(seq.len(), 4);
        let keys: Vec<String> = seq.into_index_map().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["__IDX__1", "__IDX__3"]);
    }
}
