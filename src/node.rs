//! Hierarchy nodes.
//!
//! A [`Node`] is either a [`Group`] or a [`Dataset`]. Nodes are owned by the [`Root`](crate::group::Root) of a hierarchy
//! and are addressed by a [`NodeId`] handle or by their [`NodePath`].
//!
//! Every node has an absolute path name, [`Metadata`], and a read-only flag.

mod node_name;
mod node_path;

pub use node_name::{NodeName, NodeNameError};
pub use node_path::{NodePath, NodePathError};

use derive_more::Display;
use thiserror::Error;

use crate::{
    array::ArrayError,
    dataset::{Dataset, DatasetError, DatasetLoggingError},
    group::Group,
    metadata::{Metadata, MetadataError},
};

/// A handle to a node of a [`Root`](crate::group::Root).
///
/// The slot of a removed node is reused with a new generation, so a stale handle never refers to another node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display("#{index}.{generation}")]
pub struct NodeId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

impl NodeId {
    /// The handle of the root group.
    pub const ROOT: Self = Self::new(0, 0);

    pub(crate) const fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// A hierarchy node.
#[derive(Debug)]
pub enum Node {
    /// A group.
    Group(Group),
    /// A dataset.
    Dataset(Dataset),
}

/// A mutation was attempted on a read-only object.
#[derive(Clone, Debug, Error)]
#[error("cannot modify {0}, it is accessed in read-only mode")]
pub struct ReadOnlyError(String);

impl ReadOnlyError {
    /// Create a new read-only error for the object described by `object`.
    #[must_use]
    pub fn new(object: impl Into<String>) -> Self {
        Self(object.into())
    }
}

/// A node error.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The group is read-only.
    #[error(transparent)]
    ReadOnly(#[from] ReadOnlyError),
    /// A node already exists at the path.
    #[error("a node already exists at {0}")]
    DuplicatePath(String),
    /// No node exists at the path.
    #[error("no node exists at {0}")]
    PathNotFound(String),
    /// The node is not a group.
    #[error("{0} is not a group")]
    NotAGroup(String),
    /// The node is not a dataset.
    #[error("{0} is not a dataset")]
    NotADataset(String),
    /// The node handle does not refer to a node of the hierarchy.
    #[error("node handle {0} does not exist")]
    InvalidNodeId(NodeId),
    /// An invalid node path.
    #[error(transparent)]
    InvalidPath(#[from] NodePathError),
    /// A metadata error.
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    /// An array error.
    #[error(transparent)]
    Array(#[from] ArrayError),
    /// A dataset error.
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    /// A dataset logging error.
    #[error(transparent)]
    Logging(#[from] DatasetLoggingError),
}

impl From<NodeNameError> for NodeError {
    fn from(err: NodeNameError) -> Self {
        Self::InvalidPath(err.into())
    }
}

impl Node {
    /// The absolute path name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Group(group) => group.name(),
            Self::Dataset(dataset) => dataset.name(),
        }
    }

    /// The metadata.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        match self {
            Self::Group(group) => group.metadata(),
            Self::Dataset(dataset) => dataset.metadata(),
        }
    }

    /// The mutable metadata.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        match self {
            Self::Group(group) => group.metadata_mut(),
            Self::Dataset(dataset) => dataset.metadata_mut(),
        }
    }

    /// Returns true if the node is read-only.
    #[must_use]
    pub fn read_only(&self) -> bool {
        match self {
            Self::Group(group) => group.read_only(),
            Self::Dataset(dataset) => dataset.read_only(),
        }
    }

    /// Set the read-only flag of this node and its metadata only.
    pub(crate) fn set_read_only_shallow(&mut self, read_only: bool) {
        match self {
            Self::Group(group) => group.set_read_only_shallow(read_only),
            Self::Dataset(dataset) => dataset.set_read_only(read_only),
        }
    }

    /// Returns the group if the node is one.
    #[must_use]
    pub fn as_group(&self) -> Option<&Group> {
        if let Self::Group(group) = self {
            Some(group)
        } else {
            None
        }
    }

    /// Returns the dataset if the node is one.
    #[must_use]
    pub fn as_dataset(&self) -> Option<&Dataset> {
        if let Self::Dataset(dataset) = self {
            Some(dataset)
        } else {
            None
        }
    }

    /// Returns the mutable dataset if the node is one.
    #[must_use]
    pub fn as_dataset_mut(&mut self) -> Option<&mut Dataset> {
        if let Self::Dataset(dataset) = self {
            Some(dataset)
        } else {
            None
        }
    }

    /// Returns true if the node is a group.
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    /// Returns true if the node is a dataset.
    #[must_use]
    pub fn is_dataset(&self) -> bool {
        matches!(self, Self::Dataset(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_errors() {
        assert_eq!(
            NodeError::from(ReadOnlyError::new("<Group '/a'>")).to_string(),
            "cannot modify <Group '/a'>, it is accessed in read-only mode"
        );
        assert_eq!(
            NodeError::from(NodeName::new("").unwrap_err()).to_string(),
            "invalid node name \"\""
        );
        assert_eq!(NodeId::new(3, 1).to_string(), "#3.1");
    }
}
