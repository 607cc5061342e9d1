//! Error constructors shared by sweep definition loading helpers.

use std::error::Error;
use std::sync::Arc;

use camino::Utf8Path;

use crate::SweepError;

/// Construct a [`SweepError::File`] for a definition path.
pub(super) fn file_error(
    path: &Utf8Path,
    err: impl Into<Box<dyn Error + Send + Sync>>,
) -> Arc<SweepError> {
    Arc::new(SweepError::File {
        path: path.to_path_buf(),
        source: err.into(),
    })
}

pub(super) fn invalid_data(path: &Utf8Path, msg: impl Into<String>) -> Arc<SweepError> {
    file_error(
        path,
        std::io::Error::new(std::io::ErrorKind::InvalidData, msg.into()),
    )
}

pub(super) fn unsupported(path: &Utf8Path, feature: &str) -> Arc<SweepError> {
    file_error(
        path,
        std::io::Error::other(format!(
            "{feature} feature disabled: enable the '{feature}' feature to support this file format"
        )),
    )
}
