//! Structural paths through configuration trees.
//!
//! Two representations are used: [`FlatKey`] identifies a sweep axis by
//! joining every component from the root with [`SEPARATOR`], while [`Trail`]
//! is the human-readable dotted path reported in errors.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::keys::{SEPARATOR, index_token, parse_index_token};

/// One step from a node to its child.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum PathSegment {
    /// A mapping key.
    Key(String),
    /// A list position.
    Index(usize),
}

impl PathSegment {
    /// Parse a flat-key token, recognising index tokens.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        parse_index_token(token).map_or_else(|| Self::Key(token.to_owned()), Self::Index)
    }

    /// Render the segment as a flat-key token.
    #[must_use]
    pub fn to_token(&self) -> String {
        match self {
            Self::Key(key) => key.clone(),
            Self::Index(idx) => index_token(*idx),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(idx) => write!(f, "{idx}"),
        }
    }
}

/// Flat identifier of a sweep axis location.
///
/// # Examples
///
/// ```
/// use hiersweep::path::{FlatKey, PathSegment};
///
/// let key = FlatKey::from_segments(&[
///     PathSegment::Key("transforms".into()),
///     PathSegment::Index(2),
///     PathSegment::Key("p".into()),
/// ]);
/// assert_eq!(key.as_str(), "transforms__SEP____IDX__2__SEP__p");
/// assert_eq!(key.segments().len(), 3);
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatKey(String);

impl FlatKey {
    /// Join `segments` into a flat key.
    #[must_use]
    pub fn from_segments(segments: &[PathSegment]) -> Self {
        let tokens: Vec<String> = segments.iter().map(PathSegment::to_token).collect();
        Self(tokens.join(SEPARATOR))
    }

    /// Wrap an already-joined flat key.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Prefix this key with a parent segment.
    #[must_use]
    pub fn prefixed(&self, parent: &PathSegment) -> Self {
        Self(format!("{}{SEPARATOR}{}", parent.to_token(), self.0))
    }

    /// Raw tokens in root-to-leaf order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR)
    }

    /// Raw tokens in leaf-to-root order.
    pub fn rtokens(&self) -> impl Iterator<Item = &str> {
        self.0.rsplit(SEPARATOR)
    }

    /// Parsed segments in root-to-leaf order.
    #[must_use]
    pub fn segments(&self) -> Vec<PathSegment> {
        self.tokens().map(PathSegment::from_token).collect()
    }

    /// Borrow the joined representation.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for FlatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<&str> = self.tokens().collect();
        f.write_str(&tokens.join("."))
    }
}

/// Dotted path used when reporting merge failures.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Trail(Vec<String>);

impl Trail {
    /// The empty trail at the root of a merge.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Extend the trail by one label.
    #[must_use]
    pub fn child(&self, label: impl fmt::Display) -> Self {
        let mut labels = self.0.clone();
        labels.push(label.to_string());
        Self(labels)
    }

    /// Returns `true` at the root of a merge.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Trail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.0.join("."))
        }
    }
}
