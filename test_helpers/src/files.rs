//! Scratch directories for sweep definition files.
//!
//! # Examples
//!
//! ```
//! use hiersweep_test_helpers::files::Scratch;
//!
//! let scratch = Scratch::new().expect("create scratch dir");
//! let path = scratch.write("sweep.json", "{}").expect("write file");
//! assert!(path.as_str().ends_with("sweep.json"));
//! ```

use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use tempfile::TempDir;

/// Temporary directory removed on drop.
#[must_use = "dropping removes the directory and its files"]
pub struct Scratch {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Scratch {
    /// Create an empty scratch directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or its path is not
    /// valid UTF-8.
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temporary directory")?;
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|path| anyhow!("temporary directory {} is not UTF-8", path.display()))?;
        Ok(Self { _dir: dir, root })
    }

    /// Directory holding the written files.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.root
    }

    /// Write `contents` to `name` inside the directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self, name: &str, contents: &str) -> Result<Utf8PathBuf> {
        let path = self.root.join(name);
        std::fs::write(&path, contents).with_context(|| format!("write {path}"))?;
        Ok(path)
    }

    /// Write a JSON sweep definition holding `base` and `sweep`.
    ///
    /// # Errors
    ///
    /// Returns an error if the definition cannot be serialised or written.
    pub fn write_definition(&self, name: &str, base: &Value, sweep: &Value) -> Result<Utf8PathBuf> {
        let definition = serde_json::json!({
            "base_config": base,
            "sweep_configuration": sweep,
        });
        let text = serde_json::to_string_pretty(&definition).context("serialise definition")?;
        self.write(name, &text)
    }
}
