//! Canonical base configurations and hierarchical sweeps.
//!
//! The trees model an image classifier whose optimizer settings depend on the
//! chosen architecture, so that conditional patches have something to react
//! to.

use serde_json::{Value, json};

/// Base configuration shared by the classifier sweeps.
#[must_use]
pub fn classifier_base() -> Value {
    json!({
        "batch_size": 128,
        "dataset": "cifar10",
        "model": {"type": "resnet", "depth": 20},
        "optimizer": {"type": "sgd", "lr": 0.1},
        "chiz": [1, 2, 3],
    })
}

/// A sweep over the architecture and one element of `chiz`.
///
/// Each architecture and each `chiz` choice is a whole-subtree axis value, so
/// the swept candidates themselves carry list edits and ordered upserts. The
/// `is_resnet` function is expected to be available to the evaluator.
#[must_use]
pub fn architecture_sweep() -> Value {
    json!({
        "method": "grid",
        "metric": {"name": "val_acc", "goal": "maximize"},
        "parameters": {
            "model": {
                "sweep": true,
                "sweep_identifier": "type",
                "sweep_alias": ["type1", "type2"],
                "values": [
                    {"type": "resnet"},
                    {"type": "densenet"},
                ],
            },
            "chiz": {
                "sweep": true,
                "sweep_alias": ["chiz1", "chiz2"],
                "values": [
                    {"dy__list__operations": [{"dy__overwrite": [0, 10]}]},
                    {"dy__list__operations": [{"dy__overwrite": [1, 11]}]},
                ],
            },
            "dy__upsert": [
                {"optimizer": {"type": {"dy__eval": "is_resnet"}}},
            ],
        },
    })
}

/// A sweep over the learning rates of two optimizers sharing a leaf name.
#[must_use]
pub fn shared_leaf_sweep() -> Value {
    json!({
        "method": "grid",
        "parameters": {
            "optimizer": {"lr": {"sweep": true, "values": [0.1, 0.01]}},
            "warmup": {"lr": {"sweep": true, "values": [0.001]}},
            "model": {"depth": {"sweep": true, "values": [20, 56]}},
        },
    })
}
