//! Evaluation functions shared by the integration tests.

use hiersweep::FunctionRegistry;
use serde_json::{Value, json};

fn model_type(root: &Value) -> Option<&str> {
    root.pointer("/model/type").and_then(Value::as_str)
}

/// Registry holding the functions the fixture sweeps refer to.
///
/// - `is_resnet`: whether the merged model is a resnet.
/// - `lr_for_model`: `0.01` for resnets, the current learning rate otherwise.
/// - `double` and `add_one`: integer arithmetic on the patched value.
pub fn registry() -> FunctionRegistry {
    FunctionRegistry::new()
        .with("is_resnet", |root: &Value| {
            Ok(json!(model_type(root) == Some("resnet")))
        })
        .with("lr_for_model", |root: &Value| {
            if model_type(root) == Some("resnet") {
                return Ok(json!(0.01));
            }
            root.pointer("/optimizer/lr")
                .cloned()
                .ok_or_else(|| "optimizer.lr is not set".into())
        })
        .with("double", |value: &Value| {
            value
                .as_i64()
                .and_then(|n| n.checked_mul(2))
                .map(Value::from)
                .ok_or_else(|| format!("cannot double {value}").into())
        })
        .with("add_one", |value: &Value| {
            value
                .as_i64()
                .and_then(|n| n.checked_add(1))
                .map(Value::from)
                .ok_or_else(|| format!("cannot increment {value}").into())
        })
}
