use derive_more::Display;
use itertools::Itertools;
use thiserror::Error;

use super::{NodeName, NodeNameError};

/// An absolute hierarchy node path, e.g. `/a/b`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
#[display("{_0}")]
pub struct NodePath(String);

/// An invalid node path.
#[derive(Debug, Error)]
pub enum NodePathError {
    /// The path is not absolute or contains empty segments.
    #[error("invalid node path {0:?}")]
    InvalidPath(String),
    /// A segment of the path is not a valid node name.
    #[error(transparent)]
    InvalidName(#[from] NodeNameError),
}

impl NodePath {
    /// Create a new node path from an absolute `path`.
    ///
    /// # Errors
    ///
    /// Returns [`NodePathError`] if `path` is not valid according to [`NodePath::validate`()].
    pub fn new(path: &str) -> Result<Self, NodePathError> {
        if Self::validate(path) {
            Ok(Self(path.to_string()))
        } else {
            Err(NodePathError::InvalidPath(path.to_string()))
        }
    }

    /// Create a node path from a path relative to the root.
    ///
    /// A leading or trailing `/` is ignored, so `a/b`, `/a/b` and `/a/b/` are the same path.
    ///
    /// # Errors
    ///
    /// Returns [`NodePathError`] if the path is empty or a segment is not a valid [`NodeName`].
    pub fn from_relative(path: &str) -> Result<Self, NodePathError> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Err(NodePathError::InvalidPath(path.to_string()));
        }
        for name in trimmed.split('/') {
            NodeName::new(name)?;
        }
        Ok(Self(format!("/{trimmed}")))
    }

    /// The root node.
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Returns true if this is the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Extracts a string slice containing the node path `String`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The names of the path segments.
    pub fn names(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.0.split('/').filter(|name| !name.is_empty())
    }

    /// The path of the child `name` of this path.
    #[must_use]
    pub fn child(&self, name: &NodeName) -> Self {
        if self.is_root() {
            Self(format!("/{name}"))
        } else {
            Self(format!("{}/{name}", self.0))
        }
    }

    /// The concatenation of this path and a path relative to it.
    #[must_use]
    pub fn join(&self, relative: &NodePath) -> Self {
        if self.is_root() {
            relative.clone()
        } else if relative.is_root() {
            self.clone()
        } else {
            Self(format!("{}{}", self.0, relative.0))
        }
    }

    /// The path made of the last `depth` segments, e.g. `/b/c` for depth 2 of `/a/b/c`.
    #[must_use]
    pub fn suffix(&self, depth: usize) -> Self {
        let names = self.names().collect_vec();
        let start = names.len().saturating_sub(depth);
        Self(format!("/{}", names[start..].iter().join("/")))
    }

    /// Validates a path according to the following rules:
    /// - A path always starts with `/`, and
    /// - a non-root path cannot end with `/`, because node names must be non-empty and cannot contain `/`.
    ///
    /// Additionally, it checks that there are no empty nodes (i.e. a `//` substring).
    #[must_use]
    pub fn validate(path: &str) -> bool {
        path.eq("/") || (path.starts_with('/') && !path.ends_with('/') && !path.contains("//"))
    }
}

impl TryFrom<&str> for NodePath {
    type Error = NodePathError;

    fn try_from(path: &str) -> Result<Self, Self::Error> {
        Self::new(path)
    }
}
