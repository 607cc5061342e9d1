//! Alias tables for the flat axis keys and aliased axis values.
//!
//! The external sweep service only ever sees short aliases. Each axis is
//! aliased by its `sweep_identifier` when one is given, and otherwise by the
//! shortest dotted suffix of its path that no other axis shares. Axes with a
//! `sweep_alias` list have their candidate values replaced by those aliases.
//!
//! The tables live in a [`CompressionContext`] owned by the caller, so the
//! context produced while standardizing one sweep can be persisted and later
//! drive the reconstruction of assignments in another process.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::flatten::Axis;
use crate::keys::{SWEEP_ALIAS, SWEEP_IDENTIFIER};
use crate::path::FlatKey;
use crate::{SweepError, SweepResult};

/// Alias tables and remainder produced by standardizing a sweep.
///
/// The serialized field names (`keys`, `values`, `remaining_bunch`) are part
/// of the persisted sweep metadata format.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompressionContext {
    /// Flat axis key to alias.
    pub keys: BTreeMap<FlatKey, String>,
    /// Value alias to the value it stands for.
    pub values: BTreeMap<String, Value>,
    /// Non-axis part of the `parameters` tree.
    #[serde(rename = "remaining_bunch", default)]
    pub remainder: Value,
    /// Axes whose assigned values are value aliases.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub aliased_axes: BTreeSet<FlatKey>,
}

impl CompressionContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every alias and the remainder.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Number of aliased axes.
    #[must_use]
    pub fn axis_count(&self) -> usize {
        self.keys.len()
    }

    /// Alias registered for `key`.
    #[must_use]
    pub fn alias_of(&self, key: &FlatKey) -> Option<&str> {
        self.keys.get(key).map(String::as_str)
    }

    /// Register aliases for `axes` and return the compressed declarations,
    /// keyed by alias, in the order of `axes`.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::AliasCountMismatch`] when an axis declares a
    /// different number of value aliases than values,
    /// [`SweepError::DuplicateAlias`] when an alias would name two different
    /// keys or values, and [`SweepError::MalformedAxis`] when an identifier or
    /// value alias is not a string.
    pub fn compress(&mut self, axes: Vec<Axis>) -> SweepResult<Map<String, Value>> {
        let mut declarations = Vec::with_capacity(axes.len());
        let mut claimed: BTreeMap<String, FlatKey> = self
            .keys
            .iter()
            .map(|(key, alias)| (alias.clone(), key.clone()))
            .collect();

        for Axis {
            key,
            mut declaration,
        } in axes
        {
            if let Some(identifier) = declaration.remove(SWEEP_IDENTIFIER) {
                let alias = match identifier {
                    Value::String(alias) => alias,
                    other => {
                        return Err(SweepError::axis(
                            key.to_string(),
                            format!("{SWEEP_IDENTIFIER} must be a string but got {other}"),
                        ));
                    }
                };
                claim(&mut claimed, &alias, &key)?;
                self.keys.insert(key.clone(), alias);
            }
            self.alias_values(&key, &mut declaration)?;
            declarations.push((key, declaration));
        }

        let derived: Vec<&FlatKey> = declarations
            .iter()
            .map(|(key, _)| key)
            .filter(|key| !self.keys.contains_key(*key))
            .collect();
        let trie = SuffixTrie::build(derived.iter().copied());
        let mut assigned = Vec::with_capacity(derived.len());
        for key in derived {
            let alias = trie.shortest_unique_suffix(key);
            claim(&mut claimed, &alias, key)?;
            assigned.push((key.clone(), alias));
        }
        for (key, alias) in assigned {
            tracing::debug!(key = %key, alias = %alias, "registered axis alias");
            self.keys.insert(key, alias);
        }

        let mut compressed = Map::new();
        for (key, declaration) in declarations {
            let alias = self.keys.get(&key).cloned().unwrap_or_else(|| key.to_string());
            compressed.insert(alias, Value::Object(declaration));
        }
        Ok(compressed)
    }

    /// Replace the `values` of an axis with its `sweep_alias` list.
    fn alias_values(&mut self, key: &FlatKey, declaration: &mut Map<String, Value>) -> SweepResult<()> {
        let aliases = match declaration.remove(SWEEP_ALIAS) {
            None => return Ok(()),
            Some(Value::Array(aliases)) => aliases,
            Some(_) => {
                return Err(SweepError::axis(
                    key.to_string(),
                    format!("{SWEEP_ALIAS} must be a list"),
                ));
            }
        };
        let Some(Value::Array(values)) = declaration.get("values") else {
            return Err(SweepError::axis(
                key.to_string(),
                format!("{SWEEP_ALIAS} requires a values list"),
            ));
        };
        if aliases.len() != values.len() {
            return Err(Arc::new(SweepError::AliasCountMismatch {
                axis: key.to_string(),
                aliases: aliases.len(),
                values: values.len(),
            }));
        }
        let mut renamed = Vec::with_capacity(values.len());
        for (raw, value) in aliases.into_iter().zip(values) {
            let alias = match raw {
                Value::String(alias) => alias,
                other => {
                    return Err(SweepError::axis(
                        key.to_string(),
                        format!("value aliases must be strings but got {other}"),
                    ));
                }
            };
            match self.values.get(&alias) {
                Some(existing) if existing != value => {
                    return Err(Arc::new(SweepError::DuplicateAlias {
                        alias,
                        existing: existing.to_string(),
                        claimant: value.to_string(),
                    }));
                }
                Some(_) => {}
                None => {
                    tracing::debug!(axis = %key, alias = %alias, "registered value alias");
                    self.values.insert(alias.clone(), value.clone());
                }
            }
            renamed.push(Value::String(alias));
        }
        declaration.insert("values".to_owned(), Value::Array(renamed));
        self.aliased_axes.insert(key.clone());
        Ok(())
    }

    /// Map an assignment keyed by alias back to flat keys and raw values.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::UnknownAlias`] for an alias absent from the
    /// context and [`SweepError::UnknownValueAlias`] when an aliased axis
    /// receives a value that is not one of its aliases.
    pub fn decompress(&self, assignment: &Map<String, Value>) -> SweepResult<Vec<(FlatKey, Value)>> {
        let by_alias: BTreeMap<&str, &FlatKey> = self
            .keys
            .iter()
            .map(|(key, alias)| (alias.as_str(), key))
            .collect();
        assignment
            .iter()
            .map(|(alias, value)| {
                let key = by_alias.get(alias.as_str()).copied().ok_or_else(|| {
                    Arc::new(SweepError::UnknownAlias {
                        alias: alias.clone(),
                    })
                })?;
                if !self.aliased_axes.contains(key) {
                    return Ok((key.clone(), value.clone()));
                }
                let raw = value
                    .as_str()
                    .and_then(|name| self.values.get(name))
                    .ok_or_else(|| {
                        Arc::new(SweepError::UnknownValueAlias {
                            axis: key.to_string(),
                            value: value.to_string(),
                        })
                    })?;
                Ok((key.clone(), raw.clone()))
            })
            .collect()
    }
}

fn claim(claimed: &mut BTreeMap<String, FlatKey>, alias: &str, key: &FlatKey) -> SweepResult<()> {
    match claimed.get(alias) {
        Some(owner) if owner != key => Err(Arc::new(SweepError::DuplicateAlias {
            alias: alias.to_owned(),
            existing: owner.to_string(),
            claimant: key.to_string(),
        })),
        Some(_) => Ok(()),
        None => {
            claimed.insert(alias.to_owned(), key.clone());
            Ok(())
        }
    }
}

/// Trie over reversed flat keys, counting the keys passing through each node.
#[derive(Debug, Default)]
struct SuffixTrie {
    count: usize,
    children: BTreeMap<String, SuffixTrie>,
}

impl SuffixTrie {
    fn build<'k>(keys: impl IntoIterator<Item = &'k FlatKey>) -> Self {
        let mut root = Self::default();
        for key in keys {
            let mut node = &mut root;
            for token in key.rtokens() {
                node = node.children.entry(token.to_owned()).or_default();
                node.count += 1;
            }
        }
        root
    }

    /// The shortest dotted suffix of `key` that no other key in the trie
    /// shares, or the whole dotted key when every suffix is shared.
    fn shortest_unique_suffix(&self, key: &FlatKey) -> String {
        let mut suffix: Vec<&str> = Vec::new();
        let mut node = self;
        for token in key.rtokens() {
            suffix.push(token);
            match node.children.get(token) {
                Some(child) if child.count == 1 => break,
                Some(child) => node = child,
                None => break,
            }
        }
        suffix.reverse();
        suffix.join(".")
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;
    use crate::sweep::flatten;

    fn axes(tree: &Value) -> Vec<Axis> {
        flatten(tree).expect("tree flattens").axes
    }

    #[fixture]
    fn context() -> CompressionContext {
        CompressionContext::new()
    }

    #[rstest]
    fn aliases_are_shortest_unique_suffixes(mut context: CompressionContext) {
        let compressed = context
            .compress(axes(&json!({
                "a": {"b": {"lr": {"sweep": true, "values": [1]}}},
                "c": {"lr": {"sweep": true, "values": [2]}},
                "model": {"depth": {"sweep": true, "values": [3]}},
            })))
            .expect("aliases are unique");
        let aliases: Vec<&str> = compressed.keys().map(String::as_str).collect();
        assert_eq!(aliases, vec!["b.lr", "c.lr", "depth"]);
    }

    #[rstest]
    fn nested_suffixes_fall_back_to_the_full_path(mut context: CompressionContext) {
        let compressed = context
            .compress(axes(&json!({
                "lr": {"sweep": true, "values": [1]},
                "opt": {"lr": {"sweep": true, "values": [2]}},
            })))
            .expect("aliases are unique");
        let aliases: Vec<&str> = compressed.keys().map(String::as_str).collect();
        assert_eq!(aliases, vec!["lr", "opt.lr"]);
    }

    #[rstest]
    fn identifiers_take_priority(mut context: CompressionContext) {
        let compressed = context
            .compress(axes(&json!({
                "model": {"type": {"sweep": true, "sweep_identifier": "arch", "values": ["a"]}},
            })))
            .expect("identifier is unique");
        assert_eq!(Value::Object(compressed), json!({"arch": {"values": ["a"]}}));
        assert_eq!(context.alias_of(&FlatKey::new("model__SEP__type")), Some("arch"));
    }

    #[rstest]
    fn value_aliases_replace_values(mut context: CompressionContext) {
        let compressed = context
            .compress(axes(&json!({
                "model": {"type": {
                    "sweep": true,
                    "sweep_alias": ["r", "d"],
                    "values": [{"name": "resnet"}, {"name": "densenet"}],
                }},
            })))
            .expect("aliases are unique");
        assert_eq!(compressed.get("type"), Some(&json!({"values": ["r", "d"]})));
        assert_eq!(context.values.get("d"), Some(&json!({"name": "densenet"})));
    }

    #[rstest]
    #[case::identifier_clash(json!({
        "a": {"sweep": true, "sweep_identifier": "x", "values": [1]},
        "b": {"sweep": true, "sweep_identifier": "x", "values": [2]},
    }))]
    #[case::identifier_shadows_suffix(json!({
        "a": {"sweep": true, "sweep_identifier": "lr", "values": [1]},
        "b": {"lr": {"sweep": true, "values": [2]}},
    }))]
    #[case::value_alias_reused(json!({
        "a": {"sweep": true, "sweep_alias": ["v"], "values": [1]},
        "b": {"sweep": true, "sweep_alias": ["v"], "values": [2]},
    }))]
    fn rejects_duplicate_aliases(mut context: CompressionContext, #[case] tree: Value) {
        let err = context.compress(axes(&tree)).expect_err("alias is claimed twice");
        assert!(matches!(&*err, SweepError::DuplicateAlias { .. }));
    }

    #[rstest]
    fn rejects_alias_count_mismatch(mut context: CompressionContext) {
        let err = context
            .compress(axes(&json!({"a": {"sweep": true, "sweep_alias": ["x"], "values": [1, 2]}})))
            .expect_err("counts differ");
        assert!(matches!(
            &*err,
            SweepError::AliasCountMismatch { aliases: 1, values: 2, .. }
        ));
    }

    #[rstest]
    fn decompress_inverts_compress(mut context: CompressionContext) {
        context
            .compress(axes(&json!({
                "model": {"type": {"sweep": true, "sweep_alias": ["r", "d"], "values": ["resnet", "densenet"]}},
                "optimizer": {"lr": {"sweep": true, "values": [0.1, 0.01]}},
            })))
            .expect("aliases are unique");
        let assignment = json!({"type": "d", "lr": 0.01});
        let flat = context
            .decompress(assignment.as_object().expect("fixture is a mapping"))
            .expect("aliases resolve");
        assert_eq!(
            flat,
            vec![
                (FlatKey::new("model__SEP__type"), json!("densenet")),
                (FlatKey::new("optimizer__SEP__lr"), json!(0.01)),
            ]
        );
    }

    #[rstest]
    #[case::key(json!({"missing": 1}))]
    #[case::value(json!({"type": "x"}))]
    fn decompress_rejects_unknown_aliases(mut context: CompressionContext, #[case] assignment: Value) {
        context
            .compress(axes(&json!({
                "type": {"sweep": true, "sweep_alias": ["r"], "values": ["resnet"]},
            })))
            .expect("aliases are unique");
        let err = context
            .decompress(assignment.as_object().expect("fixture is a mapping"))
            .expect_err("alias is unknown");
        assert!(matches!(
            &*err,
            SweepError::UnknownAlias { .. } | SweepError::UnknownValueAlias { .. }
        ));
    }

    #[rstest]
    fn serialises_with_persisted_field_names(mut context: CompressionContext) {
        context
            .compress(axes(&json!({"lr": {"sweep": true, "values": [1]}})))
            .expect("aliases are unique");
        context.remainder = json!({"seed": 1});
        let value = serde_json::to_value(&context).expect("context serialises");
        assert_eq!(
            value,
            json!({"keys": {"lr": "lr"}, "values": {}, "remaining_bunch": {"seed": 1}})
        );
        let restored: CompressionContext = serde_json::from_value(value).expect("context parses");
        assert_eq!(restored, context);
    }
}
