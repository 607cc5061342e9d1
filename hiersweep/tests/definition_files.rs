//! Loading sweep definitions from disk and running them.

mod common;

use anyhow::{Result, ensure};
use hiersweep::{SweepError, load_sweep_definition};
use rstest::rstest;
use serde_json::json;
use test_helpers::files::Scratch;
use test_helpers::fixtures::{architecture_sweep, classifier_base};

#[rstest]
fn json_definitions_drive_a_full_grid() -> Result<()> {
    let scratch = Scratch::new()?;
    let path = scratch.write_definition("sweep.json", &classifier_base(), &architecture_sweep())?;
    let session = load_sweep_definition(&path)?.into_session()?;
    let configs = session.materialize_grid(&common::registry())?;
    ensure!(configs.len() == 4);
    ensure!(configs.iter().all(|config| config.get("batch_size") == Some(&json!(128))));
    Ok(())
}

#[rstest]
fn toml_definitions_support_list_edits() -> Result<()> {
    let scratch = Scratch::new()?;
    let path = scratch.write(
        "sweep.toml",
        r#"
[base_config]
layers = [64, 128, 256]

[sweep_configuration]
method = "grid"

[sweep_configuration.parameters.layers]
sweep = true
sweep_alias = ["shallow", "wide"]
values = [
    { dy__list__operations = [{ dy__remove = -1 }] },
    { dy__list__operations = [{ dy__insert = [-1, 512] }, { dy__overwrite = [0, 96] }] },
]
"#,
    )?;
    let session = load_sweep_definition(&path)?.into_session()?;
    let configs = session.materialize_grid(&common::registry())?;
    ensure!(
        configs == vec![json!({"layers": [64, 128]}), json!({"layers": [96, 128, 256, 512]})],
        "unexpected configs {configs:?}"
    );
    Ok(())
}

#[rstest]
fn malformed_sweeps_surface_authoring_errors() -> Result<()> {
    let scratch = Scratch::new()?;
    let path = scratch.write_definition(
        "sweep.json",
        &json!({}),
        &json!({
            "method": "grid",
            "parameters": {"a": {"sweep": true, "values": [1, 2], "sweep_alias": ["x"]}},
        }),
    )?;
    let Err(err) = load_sweep_definition(&path)?.into_session() else {
        anyhow::bail!("alias count mismatch must be rejected");
    };
    ensure!(
        matches!(&*err, SweepError::AliasCountMismatch { aliases: 1, values: 2, .. }),
        "unexpected error {err}"
    );
    Ok(())
}
