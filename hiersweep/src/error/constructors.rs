//! Constructors and inspection helpers for `SweepError`.

use std::sync::Arc;

use serde_json::Value;

use super::SweepError;

impl SweepError {
    /// Annotate `err` with the merge `path` and the offending `patch`.
    ///
    /// An error that already carries a location is returned untouched, so the
    /// innermost frame wins and the annotation is attached exactly once no
    /// matter how many recursive frames the error crosses.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use hiersweep::SweepError;
    /// use serde_json::json;
    ///
    /// let inner = Arc::new(SweepError::MissingParameters);
    /// let once = SweepError::located(inner, "model.type", &json!({"a": 1}));
    /// let twice = SweepError::located(Arc::clone(&once), "model", &json!({}));
    /// assert!(Arc::ptr_eq(&once, &twice));
    /// ```
    #[must_use]
    pub fn located(err: Arc<Self>, path: &str, patch: &Value) -> Arc<Self> {
        if err.is_located() {
            return err;
        }
        let rendered = serde_json::to_string_pretty(patch).unwrap_or_else(|_| patch.to_string());
        Arc::new(Self::Located {
            path: path.to_owned(),
            patch: rendered,
            source: err,
        })
    }

    /// Returns `true` when the error already carries a merge location.
    #[must_use]
    pub const fn is_located(&self) -> bool {
        matches!(self, Self::Located { .. })
    }

    /// Return the innermost error, skipping location wrappers.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Located { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Return the merge path recorded for this error, if any.
    #[must_use]
    pub const fn location(&self) -> Option<&str> {
        match self {
            Self::Located { path, .. } => Some(path.as_str()),
            _ => None,
        }
    }

    /// Construct a malformed list edit error.
    #[must_use]
    pub fn list_edit(message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::MalformedListEdit {
            message: message.into(),
        })
    }

    /// Construct a malformed directive error.
    #[must_use]
    pub fn directive(directive: &'static str, message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::MalformedDirective {
            directive,
            message: message.into(),
        })
    }

    /// Construct a malformed axis error.
    #[must_use]
    pub fn axis(path: impl Into<String>, message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::MalformedAxis {
            path: path.into(),
            message: message.into(),
        })
    }

    /// Construct a shape mismatch error.
    #[must_use]
    pub fn shape(base: &'static str, patch: &'static str) -> Arc<Self> {
        Arc::new(Self::ShapeMismatch { base, patch })
    }
}
