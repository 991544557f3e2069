use thiserror::Error;

/// A hierarchy node name: one segment of a [`NodePath`](super::NodePath).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeName(String);

/// An invalid node name.
#[derive(Debug, Error)]
#[error("invalid node name {0:?}")]
pub struct NodeNameError(String);

impl NodeName {
    /// Create a new node name from `name`.
    ///
    /// # Errors
    ///
    /// Returns [`NodeNameError`] if `name` is not valid according to [`NodeName::validate`()].
    pub fn new(name: &str) -> Result<Self, NodeNameError> {
        if Self::validate(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(NodeNameError(name.to_string()))
        }
    }

    /// Extracts a string slice containing the node name `String`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates a node name according to the following rules:
    /// - must not be the empty string (""),
    /// - must not include the character "/", and
    /// - must not be a string composed only of period characters, e.g. "." or "..".
    #[must_use]
    pub fn validate(node_name: &str) -> bool {
        !node_name.contains('/') && !node_name.replace('.', "").is_empty()
    }
}

impl std::fmt::Display for NodeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
