//! Unit tests for the merge engine.

use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::eval::{FunctionRegistry, NoEvaluator};

#[fixture]
fn registry() -> FunctionRegistry {
    FunctionRegistry::new()
        .with("double", |value: &Value| {
            Ok(json!(value.as_i64().unwrap_or_default() * 2))
        })
        .with("depth_plus_one", |root: &Value| {
            Ok(json!(root.pointer("/model/depth").and_then(Value::as_i64).unwrap_or_default() + 1))
        })
        .with("layer_count", |root: &Value| {
            Ok(json!(root.get("layers").and_then(Value::as_array).map_or(0, Vec::len)))
        })
}

fn merge(base: Value, patch: &Value, registry: &FunctionRegistry) -> Value {
    upsert(base, patch, registry).expect("patch applies")
}

#[rstest]
fn overlays_nested_mappings_and_creates_missing_keys(registry: FunctionRegistry) {
    let merged = merge(
        json!({"model": {"type": "resnet", "depth": 18}, "seed": 0}),
        &json!({"model": {"depth": 50, "width": 2}, "extra": {"deep": [1, 2]}}),
        &registry,
    );
    assert_eq!(
        merged,
        json!({
            "model": {"type": "resnet", "depth": 50, "width": 2},
            "seed": 0,
            "extra": {"deep": [1, 2]},
        })
    );
}

#[rstest]
fn empty_patch_round_trips(registry: FunctionRegistry) {
    let tree = json!({"a": [1, {"b": null}], "c": {}, "d": "text"});
    assert_eq!(merge(tree.clone(), &json!({}), &registry), tree);
}

#[rstest]
fn literal_patches_are_idempotent(registry: FunctionRegistry) {
    let patch = json!({"a": {"b": 2}, "xs": [5, 6]});
    let once = merge(json!({"a": {"b": 1}, "xs": [1, 2]}), &patch, &registry);
    let twice = merge(once.clone(), &patch, &registry);
    assert_eq!(once, twice);
}

#[rstest]
#[case::overwrite(
    json!([1, 2, 3]),
    json!([{"dy__overwrite": [1, 11]}]),
    json!([1, 11, 3])
)]
#[case::append(json!([1, 2]), json!([{"dy__insert": [-1, 9]}]), json!([1, 2, 9]))]
#[case::remove(json!([1, 2, 3]), json!([{"dy__remove": 0}]), json!([2, 3]))]
#[case::negative_remove(json!([1, 2, 3]), json!([{"dy__remove": -1}]), json!([1, 2]))]
#[case::sequence(
    json!(["a"]),
    json!([{"dy__insert": [0, "z"]}, {"dy__overwrite": [-1, "b"]}, {"dy__insert": [1, "m"]}]),
    json!(["z", "m", "b"])
)]
fn applies_list_edit_scripts(
    registry: FunctionRegistry,
    #[case] list: Value,
    #[case] ops: Value,
    #[case] expected: Value,
) {
    let merged = merge(
        json!({"xs": list}),
        &json!({"xs": {"dy__list__operations": ops}}),
        &registry,
    );
    assert_eq!(merged, json!({"xs": expected}));
}

#[rstest]
fn insert_without_value_builds_the_payload(registry: FunctionRegistry) {
    let merged = merge(
        json!({"layers": [{"kind": "conv"}]}),
        &json!({"layers": {
            "dy__list__operations": [{"dy__insert": -1}],
            "kind": "pool",
            "size": 2,
        }}),
        &registry,
    );
    assert_eq!(
        merged,
        json!({"layers": [{"kind": "conv"}, {"kind": "pool", "size": 2}]})
    );
}

#[rstest]
fn overwrite_without_value_merges_the_payload(registry: FunctionRegistry) {
    let merged = merge(
        json!({"layers": [{"kind": "conv", "size": 3}]}),
        &json!({"layers": {
            "dy__list__operations": [{"dy__overwrite": 0}],
            "size": 5,
        }}),
        &registry,
    );
    assert_eq!(merged, json!({"layers": [{"kind": "conv", "size": 5}]}));
}

#[rstest]
fn list_edit_values_see_the_root(registry: FunctionRegistry) {
    let merged = merge(
        json!({"layers": ["a", "b"], "counts": [0]}),
        &json!({"counts": {"dy__list__operations": [
            {"dy__overwrite": [0, {"dy__eval": "layer_count"}]}
        ]}}),
        &registry,
    );
    assert_eq!(merged.get("counts"), Some(&json!([2])));
}

#[rstest]
#[case::insert_past_end(json!([{"dy__insert": [5, 0]}]))]
#[case::remove_past_end(json!([{"dy__remove": 3}]))]
#[case::overwrite_too_negative(json!([{"dy__overwrite": [-4, 0]}]))]
fn rejects_out_of_range_edits(registry: FunctionRegistry, #[case] ops: Value) {
    let err = upsert(
        json!({"xs": [1, 2, 3]}),
        &json!({"xs": {"dy__list__operations": ops}}),
        &registry,
    )
    .expect_err("index is out of range");
    assert_eq!(err.location(), Some("xs"));
    assert!(matches!(err.root_cause(), SweepError::ListIndexOutOfRange { len: 3, .. }));
}

#[rstest]
fn index_keyed_patches_update_positions(registry: FunctionRegistry) {
    let merged = merge(
        json!({"xs": [{"p": 1}, {"p": 2}, {"p": 3}]}),
        &json!({"xs": {"__IDX__2": {"p": 30}, "__IDX__0": {"q": true}}}),
        &registry,
    );
    assert_eq!(merged, json!({"xs": [{"p": 1, "q": true}, {"p": 2}, {"p": 30}]}));
}

#[rstest]
fn index_keyed_patches_build_lists_over_null(registry: FunctionRegistry) {
    let merged = merge(json!({}), &json!({"xs": {"__IDX__1": "b", "__IDX__0": "a"}}), &registry);
    assert_eq!(merged, json!({"xs": ["a", "b"]}));
}

#[rstest]
#[case::hole(json!({"__IDX__1": "b"}), 1)]
#[case::huge(json!({"__IDX__0": "a", "__IDX__18446744073709551615": "b"}), i64::MAX)]
#[case::far(json!({"__IDX__4000000000": "a"}), 4_000_000_000)]
fn index_keyed_patches_over_null_must_be_contiguous(
    registry: FunctionRegistry,
    #[case] positions: Value,
    #[case] index: i64,
) {
    let err = upsert(json!({}), &json!({"xs": positions}), &registry)
        .expect_err("positions leave a gap");
    assert_eq!(err.location(), Some("xs"));
    assert!(matches!(
        err.root_cause(),
        SweepError::ListIndexOutOfRange { index: i, .. } if *i == index
    ));
}

#[rstest]
#[case::past_end(json!({"__IDX__3": 4}), 3)]
#[case::huge(json!({"__IDX__0": 0, "__IDX__18446744073709551615": 9}), i64::MAX)]
fn index_keyed_patches_stay_within_the_base_list(
    registry: FunctionRegistry,
    #[case] positions: Value,
    #[case] index: i64,
) {
    let err = upsert(json!({"cfg": {"xs": [1, 2, 3]}}), &json!({"cfg": {"xs": positions}}), &registry)
        .expect_err("position is past the end");
    assert_eq!(err.location(), Some("cfg.xs"));
    assert!(matches!(
        err.root_cause(),
        SweepError::ListIndexOutOfRange { index: i, len: 3 } if *i == index
    ));
}

#[rstest]
fn gapped_index_maps_in_the_base_are_rejected(registry: FunctionRegistry) {
    let err = upsert(
        json!({"xs": {"__IDX__0": "a", "__IDX__18446744073709551615": "b"}}),
        &json!({"xs": {"__IDX__0": "z"}}),
        &registry,
    )
    .expect_err("base positions leave a gap");
    assert_eq!(err.location(), Some("xs"));
    assert!(matches!(err.root_cause(), SweepError::ListIndexOutOfRange { len: 2, .. }));
}

#[rstest]
fn list_patches_must_match_in_length(registry: FunctionRegistry) {
    let err = upsert(json!({"xs": [1, 2]}), &json!({"xs": [1, 2, 3]}), &registry)
        .expect_err("lengths differ");
    assert!(matches!(
        err.root_cause(),
        SweepError::LengthMismatch { expected: 2, actual: 3 }
    ));
    assert_eq!(err.location(), Some("xs"));
}

#[rstest]
fn list_patches_build_lists_over_null(registry: FunctionRegistry) {
    let merged = merge(json!({"xs": null}), &json!({"xs": [{"a": 1}, 2]}), &registry);
    assert_eq!(merged, json!({"xs": [{"a": 1}, 2]}));
}

#[rstest]
fn mappings_replace_scalars(registry: FunctionRegistry) {
    let merged = merge(json!({"opt": "sgd"}), &json!({"opt": {"name": "adam"}}), &registry);
    assert_eq!(merged, json!({"opt": {"name": "adam"}}));
}

#[rstest]
#[case::keys_into_list(json!({"xs": [1]}), json!({"xs": {"a": 1}}))]
#[case::list_into_mapping(json!({"xs": {"a": 1}}), json!({"xs": [1]}))]
#[case::edits_into_mapping(json!({"xs": {"a": 1}}), json!({"xs": {"dy__list__operations": []}}))]
#[case::edits_into_null(json!({}), json!({"xs": {"dy__list__operations": []}}))]
fn rejects_incompatible_shapes(
    registry: FunctionRegistry,
    #[case] base: Value,
    #[case] patch: Value,
) {
    let err = upsert(base, &patch, &registry).expect_err("shapes are incompatible");
    assert!(matches!(err.root_cause(), SweepError::ShapeMismatch { .. }));
}

#[rstest]
fn groups_apply_after_siblings_in_key_order(registry: FunctionRegistry) {
    let merged = merge(
        json!({"model": {"depth": 1}}),
        &json!({"model": {
            "sweep_group_b": {"depth": {"dy__eval": "depth_plus_one"}},
            "depth": 10,
            "sweep_group_a": {"depth": 20},
        }}),
        &registry,
    );
    assert_eq!(merged, json!({"model": {"depth": 21}}));
}

#[rstest]
fn upserts_apply_last_in_declaration_order(registry: FunctionRegistry) {
    let merged = merge(
        json!({"model": {"depth": 1}}),
        &json!({
            "dy__upsert": [
                {"model": {"depth": {"dy__eval": "depth_plus_one"}}},
                {"model": {"depth": {"dy__eval": "depth_plus_one"}}},
            ],
            "model": {"depth": 5},
        }),
        &registry,
    );
    assert_eq!(merged, json!({"model": {"depth": 7}}));
}

#[rstest]
fn embedded_calls_use_the_previous_value(registry: FunctionRegistry) {
    let merged = merge(
        json!({"batch": 16, "layers": [4, 8]}),
        &json!({"batch": "dy__eval(double)", "layers": ["dy__eval(double)", 1]}),
        &registry,
    );
    assert_eq!(merged, json!({"batch": 32, "layers": [8, 1]}));
}

#[rstest]
fn directives_see_earlier_siblings(registry: FunctionRegistry) {
    let merged = merge(
        json!({"model": {"depth": 1}, "head": null}),
        &json!({"model": {"depth": 4}, "head": {"dy__eval": "depth_plus_one"}}),
        &registry,
    );
    assert_eq!(merged.get("head"), Some(&json!(5)));
}

#[rstest]
fn evaluation_failures_are_located_once() {
    let err = upsert(
        json!({"a": {"b": 1}}),
        &json!({"a": {"b": {"dy__eval": "missing"}}}),
        &NoEvaluator,
    )
    .expect_err("nothing is registered");
    assert_eq!(err.location(), Some("a.b"));
    let SweepError::Located { source, .. } = &*err else {
        panic!("expected a located error");
    };
    assert!(matches!(&**source, SweepError::UnknownFunction { name } if name == "missing"));
}

#[rstest]
fn group_failures_report_the_group_label() {
    let err = upsert(
        json!({"m": {"x": 1}}),
        &json!({"m": {"sweep_group_z": {"x": {"dy__eval": "nope"}}}}),
        &NoEvaluator,
    )
    .expect_err("nothing is registered");
    assert_eq!(err.location(), Some("m.sweep_group_z.x"));
}

#[rstest]
fn rejects_reserved_keys_left_in_data(registry: FunctionRegistry) {
    let err = upsert(json!({}), &json!({"xs": [{"sweep_alias": ["a"]}]}), &registry)
        .expect_err("reserved key leaked into a list element");
    assert!(matches!(
        err.root_cause(),
        SweepError::ReservedKey { key, path } if key == "sweep_alias" && path == "xs.0"
    ));
}
