//! Groups and hierarchies.
//!
//! A hierarchy is owned by a [`Root`], which stores every [`Group`] and [`Dataset`] in an arena addressed by [`NodeId`].
//! The root group is named `/`, and every other node is named by its absolute path, e.g. `/raw/voltage`.
//!
//! Every group keeps a flattened index of all of its descendants (not only its children) keyed by their path relative to the group.
//! A node is registered in the index of every ancestor when it is created and unregistered from every ancestor when it or an ancestor is removed.
//! So any descendant can be looked up from any group in a single step.
//!
//! Access a group with a [`GroupView`] and modify it with a [`GroupViewMut`]. For example:
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use labio::{dataset::DatasetBuilder, group::{GroupBuilder, Root}};
//! let mut root = Root::new();
//! let mut group = root.root_mut();
//! group.create_group("a", GroupBuilder::new().metadata("operator", "J. Doe"))?;
//! group.create_dataset("a/b/c", DatasetBuilder::new().shape(vec![3]))?;
//! let datasets: Vec<_> = root.root().datasets().map(|dataset| dataset.name()).collect();
//! assert_eq!(datasets, ["/a/b/c"]);
//! assert_eq!(root.root().group("a")?.dataset("b/c")?.shape(), [3]);
//! # Ok(())
//! # }
//! ```

mod group_builder;
mod node_filter;

pub use group_builder::GroupBuilder;
pub use node_filter::NodeFilter;

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use itertools::Itertools;

use crate::{
    array::ArrayData,
    dataset::{Dataset, DatasetBuilder, DatasetLoggingBuilder},
    metadata::Metadata,
    node::{Node, NodeError, NodeId, NodeName, NodePath, ReadOnlyError},
};

/// A group of a hierarchy.
///
/// A group is accessed through a [`GroupView`] or a [`GroupViewMut`] of its [`Root`].
#[derive(Debug)]
pub struct Group {
    name: String,
    metadata: Metadata,
    read_only: bool,
    index: IndexMap<String, NodeId>,
}

impl Group {
    pub(crate) fn new(name: String, metadata: Metadata, read_only: bool) -> Self {
        let mut metadata = metadata.with_node_name(&name);
        metadata.set_read_only(read_only);
        Self {
            name,
            metadata,
            read_only,
            index: IndexMap::new(),
        }
    }

    /// The absolute path name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The metadata.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The mutable metadata.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Returns true if the group is read-only.
    #[must_use]
    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// The number of descendants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if the group has no descendants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub(crate) fn set_read_only_shallow(&mut self, read_only: bool) {
        self.read_only = read_only;
        self.metadata.set_read_only(read_only);
    }

    fn read_only_error(&self) -> ReadOnlyError {
        ReadOnlyError::new(format!("<Group '{}'>", self.name))
    }
}

#[derive(Debug)]
struct NodeEntry {
    parent: Option<NodeId>,
    node: Node,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    entry: Option<NodeEntry>,
}

/// The root of a hierarchy.
///
/// A root owns every node of the hierarchy and optionally the path of the file it was read from or is written to.
/// Roots compare equal if their hierarchies are structurally equal, see [`GroupView`].
#[derive(Debug)]
pub struct Root {
    nodes: Vec<Slot>,
    free: Vec<usize>,
    file: Option<PathBuf>,
}

impl Default for Root {
    fn default() -> Self {
        Self::new()
    }
}

impl Root {
    /// Create a hierarchy with an empty, writable root group.
    #[must_use]
    pub fn new() -> Self {
        Self::with_metadata(Metadata::new(false), false)
    }

    /// Create a hierarchy with a root group with `metadata`.
    #[must_use]
    pub fn with_metadata(metadata: Metadata, read_only: bool) -> Self {
        let group = Group::new("/".to_string(), metadata, read_only);
        Self {
            nodes: vec![Slot {
                generation: 0,
                entry: Some(NodeEntry {
                    parent: None,
                    node: Node::Group(group),
                }),
            }],
            free: Vec::new(),
            file: None,
        }
    }

    /// The path of the file associated with the hierarchy.
    #[must_use]
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Set the path of the file associated with the hierarchy.
    pub fn set_file(&mut self, file: Option<PathBuf>) {
        self.file = file;
    }

    /// The root group.
    #[must_use]
    pub fn root(&self) -> GroupView<'_> {
        GroupView {
            root: self,
            id: NodeId::ROOT,
            group: self.root_group(),
        }
    }

    /// The mutable root group.
    pub fn root_mut(&mut self) -> GroupViewMut<'_> {
        GroupViewMut {
            root: self,
            id: NodeId::ROOT,
        }
    }

    fn root_group(&self) -> &Group {
        match self.nodes.first().and_then(|slot| slot.entry.as_ref()) {
            Some(NodeEntry {
                node: Node::Group(group),
                ..
            }) => group,
            _ => unreachable!("the root group is never removed"),
        }
    }

    /// Returns true if the root group is read-only.
    #[must_use]
    pub fn read_only(&self) -> bool {
        self.root_group().read_only
    }

    /// Set the read-only flag of every node of the hierarchy and their metadata.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.root_mut().set_read_only(read_only);
    }

    /// The node with handle `id`.
    ///
    /// # Errors
    /// Returns [`NodeError::InvalidNodeId`] if the node does not exist.
    pub fn node(&self, id: NodeId) -> Result<&Node, NodeError> {
        Ok(&self.entry(id)?.node)
    }

    /// The parent group of the node with handle `id`, [`None`] for the root group.
    ///
    /// # Errors
    /// Returns [`NodeError::InvalidNodeId`] if the node does not exist.
    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, NodeError> {
        Ok(self.entry(id)?.parent)
    }

    /// The group with handle `id`.
    ///
    /// # Errors
    /// Returns [`NodeError::InvalidNodeId`] if the node does not exist or [`NodeError::NotAGroup`] if it is a dataset.
    pub fn group(&self, id: NodeId) -> Result<GroupView<'_>, NodeError> {
        Ok(GroupView {
            root: self,
            id,
            group: self.group_of(id)?,
        })
    }

    /// The mutable group with handle `id`.
    ///
    /// # Errors
    /// Returns [`NodeError::InvalidNodeId`] if the node does not exist or [`NodeError::NotAGroup`] if it is a dataset.
    pub fn group_mut(&mut self, id: NodeId) -> Result<GroupViewMut<'_>, NodeError> {
        self.group_of(id)?;
        Ok(GroupViewMut { root: self, id })
    }

    /// The dataset with handle `id`.
    ///
    /// # Errors
    /// Returns [`NodeError::InvalidNodeId`] if the node does not exist or [`NodeError::NotADataset`] if it is a group.
    pub fn dataset(&self, id: NodeId) -> Result<&Dataset, NodeError> {
        match &self.entry(id)?.node {
            Node::Dataset(dataset) => Ok(dataset),
            Node::Group(group) => Err(NodeError::NotADataset(group.name.clone())),
        }
    }

    /// The mutable dataset with handle `id`.
    ///
    /// # Errors
    /// Returns [`NodeError::InvalidNodeId`] if the node does not exist or [`NodeError::NotADataset`] if it is a group.
    pub fn dataset_mut(&mut self, id: NodeId) -> Result<&mut Dataset, NodeError> {
        match &mut self.entry_mut(id)?.node {
            Node::Dataset(dataset) => Ok(dataset),
            Node::Group(group) => Err(NodeError::NotADataset(group.name.clone())),
        }
    }

    fn entry(&self, id: NodeId) -> Result<&NodeEntry, NodeError> {
        self.nodes
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
            .ok_or(NodeError::InvalidNodeId(id))
    }

    fn entry_mut(&mut self, id: NodeId) -> Result<&mut NodeEntry, NodeError> {
        self.nodes
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
            .ok_or(NodeError::InvalidNodeId(id))
    }

    fn group_of(&self, id: NodeId) -> Result<&Group, NodeError> {
        match &self.entry(id)?.node {
            Node::Group(group) => Ok(group),
            Node::Dataset(dataset) => Err(NodeError::NotAGroup(dataset.name().to_string())),
        }
    }

    fn group_of_mut(&mut self, id: NodeId) -> Result<&mut Group, NodeError> {
        match &mut self.entry_mut(id)?.node {
            Node::Group(group) => Ok(group),
            Node::Dataset(dataset) => Err(NodeError::NotAGroup(dataset.name().to_string())),
        }
    }

    /// The ancestors of `id`, nearest first.
    fn ancestor_ids(&self, id: NodeId) -> Vec<NodeId> {
        std::iter::successors(self.entry(id).ok().and_then(|entry| entry.parent), |ancestor| {
            self.entry(*ancestor).ok().and_then(|entry| entry.parent)
        })
        .collect()
    }

    fn check_writable(&self, id: NodeId) -> Result<(), NodeError> {
        let group = self.group_of(id)?;
        if group.read_only {
            Err(group.read_only_error().into())
        } else {
            Ok(())
        }
    }

    /// Create the node at `path` relative to the group `group_id`, creating missing intermediate groups.
    ///
    /// `make` creates the node from its absolute name. Nothing is modified if it fails.
    fn create_node(
        &mut self,
        group_id: NodeId,
        path: &str,
        read_only: bool,
        make: impl FnOnce(String) -> Result<Node, NodeError>,
    ) -> Result<NodeId, NodeError> {
        self.check_writable(group_id)?;
        let relative = NodePath::from_relative(path)?;
        let group = self.group_of(group_id)?;
        let names = relative.names().collect_vec();
        let mut parent = group_id;
        let mut missing = Vec::new();
        for depth in 1..names.len() {
            let prefix = format!("/{}", names[..depth].join("/"));
            match group.index.get(&prefix) {
                Some(&id) => match &self.entry(id)?.node {
                    Node::Group(_) => parent = id,
                    Node::Dataset(dataset) => {
                        return Err(NodeError::NotAGroup(dataset.name().to_string()))
                    }
                },
                None => missing.push(names[depth - 1]),
            }
        }
        let absolute = NodePath::new(&group.name)?.join(&relative);
        if missing.is_empty() && group.index.contains_key(relative.as_str()) {
            return Err(NodeError::DuplicatePath(absolute.to_string()));
        }
        let node = make(absolute.to_string())?;
        for name in missing {
            let name = NodePath::new(&self.group_of(parent)?.name)?.child(&NodeName::new(name)?);
            let group = Group::new(name.to_string(), Metadata::new(read_only), read_only);
            parent = self.insert_node(parent, Node::Group(group))?;
        }
        self.insert_node(parent, node)
    }

    /// Register `node` as a child of `parent` in the index of `parent` and every ancestor of `parent`.
    fn insert_node(&mut self, parent: NodeId, node: Node) -> Result<NodeId, NodeError> {
        let path = NodePath::new(node.name())?;
        let ancestors = std::iter::once(parent)
            .chain(self.ancestor_ids(parent))
            .collect_vec();
        let keys = (1..=ancestors.len())
            .map(|depth| path.suffix(depth).to_string())
            .collect_vec();
        for (ancestor, key) in ancestors.iter().zip(&keys) {
            if self.group_of(*ancestor)?.index.contains_key(key) {
                return Err(NodeError::DuplicatePath(path.to_string()));
            }
        }
        let entry = NodeEntry {
            parent: Some(parent),
            node,
        };
        let id = if let Some(index) = self.free.pop() {
            let slot = &mut self.nodes[index];
            slot.entry = Some(entry);
            NodeId::new(index, slot.generation)
        } else {
            self.nodes.push(Slot {
                generation: 0,
                entry: Some(entry),
            });
            NodeId::new(self.nodes.len() - 1, 0)
        };
        for (ancestor, key) in ancestors.into_iter().zip(keys) {
            self.group_of_mut(ancestor)?.index.insert(key, id);
        }
        log::debug!("created {path} {id}");
        Ok(id)
    }

    fn remove_node(&mut self, group_id: NodeId, path: &str) -> Result<(), NodeError> {
        self.check_writable(group_id)?;
        let group = self.group_of(group_id)?;
        let id = NodePath::from_relative(path)
            .ok()
            .and_then(|relative| group.index.get(relative.as_str()).copied())
            .ok_or_else(|| NodeError::PathNotFound(absolute_name(&group.name, path)))?;
        let mut removed = HashSet::from([id]);
        if let Node::Group(removed_group) = &self.entry(id)?.node {
            removed.extend(removed_group.index.values().copied());
        }
        for ancestor in self.ancestor_ids(id) {
            self.group_of_mut(ancestor)?
                .index
                .retain(|_, node| !removed.contains(node));
        }
        for removed_id in &removed {
            if let Some(slot) = self.nodes.get_mut(removed_id.index) {
                slot.entry = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(removed_id.index);
            }
        }
        log::debug!(
            "removed {} and {} descendants",
            absolute_name(&self.group_of(group_id)?.name, path),
            removed.len() - 1
        );
        Ok(())
    }

    fn set_group_read_only(&mut self, id: NodeId, read_only: bool) -> Result<(), NodeError> {
        let group = self.group_of_mut(id)?;
        group.set_read_only_shallow(read_only);
        let descendants = group.index.values().copied().collect_vec();
        for descendant in descendants {
            self.entry_mut(descendant)?
                .node
                .set_read_only_shallow(read_only);
        }
        Ok(())
    }
}

fn absolute_name(group: &str, path: &str) -> String {
    format!("{}/{}", group.trim_end_matches('/'), path.trim_matches('/'))
}

impl PartialEq for Root {
    fn eq(&self, other: &Self) -> bool {
        self.root() == other.root()
    }
}

impl std::fmt::Display for Root {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.root().fmt(f)
    }
}

/// A shared reference to a group of a [`Root`].
///
/// Group views compare equal if the groups are structurally equal:
/// they have the same name and metadata (ignoring order and the read-only flag), and the same descendants at the same paths,
/// where descendant groups have the same metadata and descendant datasets are equal.
#[derive(Clone, Copy, Debug)]
pub struct GroupView<'a> {
    root: &'a Root,
    id: NodeId,
    group: &'a Group,
}

impl<'a> GroupView<'a> {
    /// The handle of the group.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The root of the group.
    #[must_use]
    pub fn root(&self) -> &'a Root {
        self.root
    }

    /// The absolute path name.
    #[must_use]
    pub fn name(&self) -> &'a str {
        &self.group.name
    }

    /// The metadata.
    #[must_use]
    pub fn metadata(&self) -> &'a Metadata {
        &self.group.metadata
    }

    /// Returns true if the group is read-only.
    #[must_use]
    pub fn read_only(&self) -> bool {
        self.group.read_only
    }

    /// The number of descendants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.group.len()
    }

    /// Returns true if the group has no descendants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.group.is_empty()
    }

    /// The handle of the descendant at `path` relative to the group, if it exists.
    ///
    /// A leading or trailing `/` is ignored.
    #[must_use]
    pub fn get_id(&self, path: &str) -> Option<NodeId> {
        NodePath::from_relative(path)
            .ok()
            .and_then(|relative| self.group.index.get(relative.as_str()).copied())
    }

    /// Returns true if a descendant exists at `path`.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.get_id(path).is_some()
    }

    /// The descendant at `path` relative to the group.
    ///
    /// # Errors
    /// Returns [`NodeError::PathNotFound`] if no descendant exists at `path`.
    pub fn get(&self, path: &str) -> Result<&'a Node, NodeError> {
        let id = self
            .get_id(path)
            .ok_or_else(|| NodeError::PathNotFound(absolute_name(self.name(), path)))?;
        self.root.node(id)
    }

    /// The descendant group at `path` relative to the group.
    ///
    /// # Errors
    /// Returns [`NodeError::PathNotFound`] if no descendant exists at `path` or [`NodeError::NotAGroup`] if it is a dataset.
    pub fn group(&self, path: &str) -> Result<GroupView<'a>, NodeError> {
        let id = self
            .get_id(path)
            .ok_or_else(|| NodeError::PathNotFound(absolute_name(self.name(), path)))?;
        self.root.group(id)
    }

    /// The descendant dataset at `path` relative to the group.
    ///
    /// # Errors
    /// Returns [`NodeError::PathNotFound`] if no descendant exists at `path` or [`NodeError::NotADataset`] if it is a group.
    pub fn dataset(&self, path: &str) -> Result<&'a Dataset, NodeError> {
        let id = self
            .get_id(path)
            .ok_or_else(|| NodeError::PathNotFound(absolute_name(self.name(), path)))?;
        self.root.dataset(id)
    }

    /// Iterate over every descendant with its path relative to the group, in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Node)> {
        let root = self.root;
        self.group
            .index
            .iter()
            .filter_map(move |(key, id)| Some((key.as_str(), root.node(*id).ok()?)))
    }

    /// Iterate over the direct children of the group.
    pub fn children(&self) -> impl Iterator<Item = &'a Node> {
        self.iter()
            .filter(|(key, _)| key.rfind('/') == Some(0))
            .map(|(_, node)| node)
    }

    fn group_views(&self) -> impl Iterator<Item = GroupView<'a>> {
        let root = self.root;
        self.group
            .index
            .values()
            .filter_map(move |id| root.group(*id).ok())
    }

    /// Iterate over every descendant dataset.
    pub fn datasets(&self) -> impl Iterator<Item = &'a Dataset> {
        self.iter().filter_map(|(_, node)| node.as_dataset())
    }

    /// Iterate over the descendant datasets whose name matches `filter`.
    pub fn datasets_matching<'f>(
        &self,
        filter: &'f NodeFilter,
    ) -> impl Iterator<Item = &'a Dataset> + 'f
    where
        'a: 'f,
    {
        self.datasets()
            .filter(move |dataset| filter.matches(dataset.name()))
    }

    /// Iterate over every descendant group.
    pub fn groups(&self) -> impl Iterator<Item = GroupView<'a>> {
        self.group_views()
    }

    /// Iterate over the descendant groups whose name matches `filter`.
    pub fn groups_matching<'f>(
        &self,
        filter: &'f NodeFilter,
    ) -> impl Iterator<Item = GroupView<'a>> + 'f
    where
        'a: 'f,
    {
        self.group_views()
            .filter(move |group| filter.matches(group.name()))
    }

    /// Iterate over every descendant group. Datasets are not included.
    pub fn descendants(&self) -> impl Iterator<Item = GroupView<'a>> {
        self.group_views()
    }

    /// The parent group, [`None`] for the root group.
    #[must_use]
    pub fn parent(&self) -> Option<GroupView<'a>> {
        let parent = self.root.parent(self.id).ok()??;
        self.root.group(parent).ok()
    }

    /// Iterate over the ancestor groups, from the parent up to the root group.
    pub fn ancestors(&self) -> impl Iterator<Item = GroupView<'a>> {
        std::iter::successors(self.parent(), GroupView::parent)
    }

    /// Return a tree representation of the group as a string.
    ///
    /// Datasets are annotated with their shape and data type.
    /// For example:
    /// ```text
    /// /
    ///   a
    ///     baz [10000, 1000] float64
    ///     foo [10000, 1000] float64
    ///   b
    /// ```
    #[must_use]
    pub fn hierarchy_tree(&self) -> String {
        fn print_node(name: &str, string: &mut String, node: &Node) {
            match node {
                Node::Dataset(dataset) => {
                    let s = format!("{} {:?} {}", name, dataset.shape(), dataset.data_type());
                    string.push_str(&s);
                }
                Node::Group(_) => {
                    string.push_str(name);
                }
            }
            string.push('\n');
        }

        fn update_tree(string: &mut String, group: &GroupView, depth: usize) {
            for child in group.children() {
                let name = child.name().rsplit('/').next().unwrap_or_default();
                string.push_str(&" ".repeat(depth * 2));
                print_node(name, string, child);
                if let Ok(child_group) = group.group(name) {
                    update_tree(string, &child_group, depth + 1);
                }
            }
        }

        let mut string = String::default();
        let name = if self.id == NodeId::ROOT {
            "/"
        } else {
            self.name().rsplit('/').next().unwrap_or_default()
        };
        string.push_str(name);
        string.push('\n');
        update_tree(&mut string, self, 1);
        string
    }
}

fn nodes_equal(a: &Node, b: &Node) -> bool {
    match (a, b) {
        (Node::Group(a), Node::Group(b)) => a.name == b.name && a.metadata == b.metadata,
        (Node::Dataset(a), Node::Dataset(b)) => a == b,
        _ => false,
    }
}

impl PartialEq<GroupView<'_>> for GroupView<'_> {
    fn eq(&self, other: &GroupView<'_>) -> bool {
        self.name() == other.name()
            && self.metadata() == other.metadata()
            && self.len() == other.len()
            && self.iter().all(|(key, node)| {
                other
                    .get_id(key)
                    .and_then(|id| other.root.node(id).ok())
                    .is_some_and(|other_node| nodes_equal(node, other_node))
            })
    }
}

impl std::fmt::Display for GroupView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<Group '{}' ({} groups, {} datasets, {} metadata)>",
            self.name(),
            self.groups().count(),
            self.datasets().count(),
            self.metadata().len()
        )
    }
}

/// A mutable reference to a group of a [`Root`].
///
/// Every method that creates or removes a node fails with [`NodeError::ReadOnly`] if this group is read-only.
#[derive(Debug)]
pub struct GroupViewMut<'a> {
    root: &'a mut Root,
    id: NodeId,
}

impl<'a> GroupViewMut<'a> {
    /// The handle of the group.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// A shared view of the group.
    #[must_use]
    pub fn view(&self) -> GroupView<'_> {
        GroupView {
            root: self.root,
            id: self.id,
            group: self.group(),
        }
    }

    /// Convert into a shared view of the group.
    #[must_use]
    pub fn into_view(self) -> GroupView<'a> {
        let root: &'a Root = self.root;
        GroupView {
            root,
            id: self.id,
            group: Self::group_in(root, self.id),
        }
    }

    fn group_in(root: &Root, id: NodeId) -> &Group {
        match root.group_of(id) {
            Ok(group) => group,
            Err(_) => unreachable!("a group view refers to an existing group"),
        }
    }

    fn group(&self) -> &Group {
        Self::group_in(self.root, self.id)
    }

    fn group_mut(&mut self) -> &mut Group {
        match self.root.group_of_mut(self.id) {
            Ok(group) => group,
            Err(_) => unreachable!("a group view refers to an existing group"),
        }
    }

    /// The mutable metadata.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.group_mut().metadata
    }

    /// Set the read-only flag of the group, every descendant, and their metadata.
    pub fn set_read_only(&mut self, read_only: bool) {
        // the group exists, so this cannot fail
        let _ = self.root.set_group_read_only(self.id, read_only);
    }

    /// The mutable descendant group at `path` relative to the group.
    ///
    /// # Errors
    /// Returns [`NodeError::PathNotFound`] if no descendant exists at `path` or [`NodeError::NotAGroup`] if it is a dataset.
    pub fn group_mut_at(&mut self, path: &str) -> Result<GroupViewMut<'_>, NodeError> {
        let id = self.existing(path)?;
        self.root.group_mut(id)
    }

    /// The mutable descendant dataset at `path` relative to the group.
    ///
    /// # Errors
    /// Returns [`NodeError::PathNotFound`] if no descendant exists at `path` or [`NodeError::NotADataset`] if it is a group.
    pub fn dataset_mut(&mut self, path: &str) -> Result<&mut Dataset, NodeError> {
        let id = self.existing(path)?;
        self.root.dataset_mut(id)
    }

    fn existing(&self, path: &str) -> Result<NodeId, NodeError> {
        let view = self.view();
        view.get_id(path)
            .ok_or_else(|| NodeError::PathNotFound(absolute_name(view.name(), path)))
    }

    /// Create a group at `path` relative to this group.
    ///
    /// Missing intermediate groups are created with the read-only flag of the new group,
    /// which defaults to that of this group.
    ///
    /// # Errors
    /// Returns a [`NodeError`] if this group is read-only, `path` is invalid, a node already exists at `path`, or an intermediate node is a dataset.
    /// Nothing is modified on error.
    pub fn create_group(&mut self, path: &str, builder: GroupBuilder) -> Result<NodeId, NodeError> {
        let read_only = builder
            .read_only_flag()
            .unwrap_or(self.group().read_only);
        self.root.create_node(self.id, path, read_only, |name| {
            Ok(Node::Group(Group::new(
                name,
                builder.into_metadata(read_only),
                read_only,
            )))
        })
    }

    /// Return the group at `path`, creating it if it does not exist.
    ///
    /// If the group exists, the read-only flag of the builder (if set) is applied to it and the builder metadata is merged into its metadata.
    ///
    /// # Errors
    /// See [`GroupViewMut::create_group`]. Returns [`NodeError::NotAGroup`] if a dataset exists at `path`.
    pub fn require_group(&mut self, path: &str, builder: GroupBuilder) -> Result<NodeId, NodeError> {
        let Some(id) = self.view().get_id(path) else {
            return self.create_group(path, builder);
        };
        let read_only = builder.read_only_flag();
        let entries = builder.into_entries();
        let mut group = self.root.group_mut(id)?;
        if read_only == Some(false) {
            group.set_read_only(false);
        }
        if !entries.is_empty() {
            group.metadata_mut().update(entries)?;
        }
        if read_only == Some(true) {
            group.set_read_only(true);
        }
        Ok(id)
    }

    /// Create a dataset at `path` relative to this group.
    ///
    /// Missing intermediate groups are created with the read-only flag of the new dataset,
    /// which defaults to that of this group.
    ///
    /// # Errors
    /// See [`GroupViewMut::create_group`]. Returns [`NodeError::Array`] if the builder data cannot be cast to its data type.
    pub fn create_dataset(&mut self, path: &str, builder: DatasetBuilder) -> Result<NodeId, NodeError> {
        let read_only = builder.read_only_or(self.group().read_only);
        self.root.create_node(self.id, path, read_only, |name| {
            Ok(Node::Dataset(builder.build_with(name, read_only)?))
        })
    }

    /// Return the dataset at `path`, creating it if it does not exist.
    ///
    /// If the dataset exists, the read-only flag of the builder (if set) is applied to it and the builder metadata is merged into its metadata.
    /// The shape, data type and data of the builder are ignored.
    ///
    /// # Errors
    /// See [`GroupViewMut::create_dataset`]. Returns [`NodeError::NotADataset`] if a group exists at `path`.
    pub fn require_dataset(&mut self, path: &str, builder: DatasetBuilder) -> Result<NodeId, NodeError> {
        let Some(id) = self.view().get_id(path) else {
            return self.create_dataset(path, builder);
        };
        let dataset = self.root.dataset_mut(id)?;
        let read_only = builder.read_only_flag();
        let entries = builder.into_entries();
        if read_only == Some(false) {
            dataset.set_read_only(false);
        }
        if !entries.is_empty() {
            dataset.metadata_mut().update(entries)?;
        }
        if read_only == Some(true) {
            dataset.set_read_only(true);
        }
        Ok(id)
    }

    /// Create a logging dataset at `path` relative to this group.
    ///
    /// The logging dataset and any missing intermediate groups are writable.
    /// Bind it to a [`LogSink`](crate::dataset::LogSink) to start appending records.
    ///
    /// # Errors
    /// See [`GroupViewMut::create_group`]. Returns [`NodeError::Logging`] if the builder is invalid.
    pub fn create_dataset_logging(
        &mut self,
        path: &str,
        builder: DatasetLoggingBuilder,
    ) -> Result<NodeId, NodeError> {
        self.root.create_node(self.id, path, false, |name| {
            Ok(Node::Dataset(builder.build(name)?))
        })
    }

    /// Return the logging dataset at `path`, creating it if it does not exist.
    ///
    /// A plain dataset at `path` that was previously used for logging (e.g. one read from a file) is converted in place into a writable logging dataset.
    /// This does not require this group to be writable.
    ///
    /// # Errors
    /// See [`GroupViewMut::create_dataset_logging`].
    /// Returns [`NodeError::Logging`] if the dataset at `path` is not used for logging or its attributes differ from those of the builder.
    pub fn require_dataset_logging(
        &mut self,
        path: &str,
        builder: DatasetLoggingBuilder,
    ) -> Result<NodeId, NodeError> {
        let Some(id) = self.view().get_id(path) else {
            return self.create_dataset_logging(path, builder);
        };
        let dataset = self.root.dataset_mut(id)?;
        if let Some(logging) = dataset.logging() {
            let existing = logging
                .attributes()
                .iter()
                .map(|attribute| attribute.name().to_string())
                .collect_vec();
            builder.check_attributes(&existing)?;
        } else {
            let logging = builder.convert(dataset)?;
            dataset.replace_with_logging(logging);
            dataset.set_read_only(false);
            log::debug!("converted {} into a logging dataset", dataset.name());
        }
        Ok(id)
    }

    /// Copy the group `source`, which may belong to another hierarchy, and all of its descendants to `path` relative to this group.
    ///
    /// # Errors
    /// See [`GroupViewMut::create_group`].
    pub fn add_group(&mut self, path: &str, source: GroupView) -> Result<NodeId, NodeError> {
        let id = self.create_group(
            path,
            GroupBuilder::new()
                .metadata_from(source.metadata())
                .read_only(source.read_only()),
        )?;
        // the new group may be read-only, so descendants are created before applying its flag
        let mut group = self.root.group_mut(id)?;
        let read_only = group.view().read_only();
        group.set_read_only_shallow(false);
        let copied = source.iter().try_for_each(|(key, node)| {
            match node {
                Node::Group(child) => group.create_group(
                    key,
                    GroupBuilder::new()
                        .metadata_from(child.metadata())
                        .read_only(child.read_only()),
                ),
                Node::Dataset(dataset) => group.add_dataset(key, dataset),
            }
            .map(|_| ())
        });
        group.set_read_only_shallow(read_only);
        copied?;
        Ok(id)
    }

    fn set_read_only_shallow(&mut self, read_only: bool) {
        self.group_mut().set_read_only_shallow(read_only);
    }

    /// Copy `dataset`, which may belong to another hierarchy or be detached, to `path` relative to this group.
    ///
    /// A copy of a logging dataset holds the rows logged so far and is not bound to any sink.
    ///
    /// # Errors
    /// See [`GroupViewMut::create_dataset`].
    pub fn add_dataset(&mut self, path: &str, dataset: &Dataset) -> Result<NodeId, NodeError> {
        let read_only = dataset.read_only();
        let data = ArrayData::clone(&dataset.data());
        let metadata = dataset.metadata().copy(Some(read_only));
        self.root.create_node(self.id, path, read_only, |name| {
            Ok(Node::Dataset(Dataset::new(name, data, metadata, read_only)))
        })
    }

    /// Remove the descendant at `path` relative to this group, and all of its descendants.
    ///
    /// The node is removed from the index of every ancestor, and its handle becomes invalid.
    ///
    /// # Errors
    /// Returns [`NodeError::ReadOnly`] if this group is read-only or [`NodeError::PathNotFound`] if no descendant exists at `path`.
    pub fn remove(&mut self, path: &str) -> Result<(), NodeError> {
        self.root.remove_node(self.id, path)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        array::{DataType, StructuredField},
        metadata::{MetadataError, MetadataValue},
    };

    use super::*;

    fn tree() -> Root {
        let mut root = Root::new();
        let mut group = root.root_mut();
        group
            .create_group("a", GroupBuilder::new().metadata("x", 1))
            .unwrap();
        group
            .create_dataset("a/b/c", DatasetBuilder::new().data(vec![1.0, 2.0]))
            .unwrap();
        group.create_group("d", GroupBuilder::new()).unwrap();
        root
    }

    #[test]
    fn group_create_intermediates() {
        let root = tree();
        let view = root.root();
        assert_eq!(
            view.iter().map(|(key, _)| key).collect_vec(),
            vec!["/a", "/a/b", "/a/b/c", "/d"]
        );
        assert_eq!(view.datasets().map(Dataset::name).collect_vec(), vec!["/a/b/c"]);
        assert_eq!(
            view.groups().map(|group| group.name()).collect_vec(),
            vec!["/a", "/a/b", "/d"]
        );
        let a = view.group("a").unwrap();
        assert_eq!(a.iter().map(|(key, _)| key).collect_vec(), vec!["/b", "/b/c"]);
        let b = view.group("/a/b/").unwrap();
        assert_eq!(b.dataset("c").unwrap().name(), "/a/b/c");
        assert_eq!(b.parent().unwrap().name(), "/a");
        assert_eq!(b.ancestors().map(|group| group.name()).collect_vec(), vec!["/a", "/"]);
        assert_eq!(view.children().map(Node::name).collect_vec(), vec!["/a", "/d"]);
        assert_eq!(a.metadata().get("x").and_then(MetadataValue::as_i64), Some(1));
        assert_eq!(a.metadata().node_name(), "/a");
        assert_eq!(
            view.to_string(),
            "<Group '/' (3 groups, 1 datasets, 0 metadata)>"
        );
    }

    #[test]
    fn group_create_errors() {
        let mut root = tree();
        let mut group = root.root_mut();
        assert!(matches!(
            group.create_group("a/b", GroupBuilder::new()),
            Err(NodeError::DuplicatePath(path)) if path == "/a/b"
        ));
        assert!(matches!(
            group.create_group("a/b/c/d", GroupBuilder::new()),
            Err(NodeError::NotAGroup(path)) if path == "/a/b/c"
        ));
        assert!(matches!(
            group.create_group("a//e", GroupBuilder::new()),
            Err(NodeError::InvalidPath(_))
        ));
        assert!(matches!(
            group.create_dataset(
                "x/y",
                DatasetBuilder::new()
                    .data(vec![0.5])
                    .data_type(DataType::Structured(vec![
                        StructuredField::new("a", DataType::Float64).unwrap()
                    ]))
            ),
            Err(NodeError::Array(_))
        ));
        assert!(!group.view().contains("x"));
        let mut a = group.group_mut_at("a").unwrap();
        assert!(matches!(
            a.create_dataset("b/c", DatasetBuilder::new()),
            Err(NodeError::DuplicatePath(_))
        ));
        a.create_dataset("e", DatasetBuilder::new()).unwrap();
        assert!(root.root().contains("/a/e"));
        assert_eq!(root.root().len(), 5);
    }

    #[test]
    fn group_remove_cascade() {
        let mut root = tree();
        let c = root.root().get_id("a/b/c").unwrap();
        let mut group = root.root_mut();
        let mut a = group.group_mut_at("a").unwrap();
        a.remove("b").unwrap();
        assert!(a.view().is_empty());
        assert!(matches!(a.remove("b"), Err(NodeError::PathNotFound(path)) if path == "/a/b"));
        let view = root.root();
        assert!(matches!(view.get("a/b/c"), Err(NodeError::PathNotFound(_))));
        assert!(matches!(view.get("a/b"), Err(NodeError::PathNotFound(_))));
        assert!(view.get("a").is_ok());
        assert!(matches!(root.dataset(c), Err(NodeError::InvalidNodeId(_))));

        root.root_mut().create_group("a/b", GroupBuilder::new()).unwrap();
        assert_eq!(root.root().len(), 3);
    }

    #[test]
    fn group_remove_reuses_slots() {
        let mut root = tree();
        let slots = root.nodes.len();
        let mut stale = Vec::new();
        for _ in 0..100 {
            let mut group = root.root_mut();
            let id = group.create_dataset("e/f", DatasetBuilder::new()).unwrap();
            group.remove("e").unwrap();
            stale.push(id);
        }
        assert_eq!(root.nodes.len(), slots + 2);
        let id = root
            .root_mut()
            .create_dataset("e", DatasetBuilder::new())
            .unwrap();
        assert!(id.index < slots + 2);
        assert_eq!(root.nodes.len(), slots + 2);
        for old in stale {
            assert!(matches!(root.node(old), Err(NodeError::InvalidNodeId(_))));
        }
        assert_eq!(root.dataset(id).unwrap().name(), "/e");
    }

    #[test]
    fn group_read_only_cascade() {
        let mut root = tree();
        root.set_read_only(true);
        let view = root.root();
        assert!(view.group("a/b").unwrap().read_only());
        assert!(view.dataset("a/b/c").unwrap().read_only());
        assert!(view.dataset("a/b/c").unwrap().metadata().read_only());
        assert!(view.group("a").unwrap().metadata().read_only());

        let mut group = root.root_mut();
        assert!(matches!(
            group.create_group("e", GroupBuilder::new()),
            Err(NodeError::ReadOnly(_))
        ));
        assert!(matches!(group.remove("a"), Err(NodeError::ReadOnly(_))));
        assert!(group.metadata_mut().insert("k", 1).is_err());
        assert!(group.dataset_mut("a/b/c").unwrap().data_mut().is_err());
        let mut a = group.group_mut_at("a").unwrap();
        assert!(a.metadata_mut().insert("k", 1).is_err());

        root.set_read_only(false);
        assert!(root.root_mut().dataset_mut("a/b/c").unwrap().data_mut().is_ok());
        assert!(root.root_mut().remove("d").is_ok());
    }

    #[test]
    fn group_read_only_inherited() {
        let mut root = Root::new();
        let mut group = root.root_mut();
        group
            .create_dataset("a/b", DatasetBuilder::new().read_only(true))
            .unwrap();
        group.create_group("c", GroupBuilder::new()).unwrap();
        let view = root.root();
        assert!(view.group("a").unwrap().read_only());
        assert!(view.dataset("a/b").unwrap().read_only());
        assert!(!view.group("c").unwrap().read_only());
    }

    #[test]
    fn group_require() {
        let mut root = tree();
        let mut group = root.root_mut();
        let a = group.view().get_id("a").unwrap();
        let c = group.view().get_id("a/b/c").unwrap();
        assert_eq!(
            group
                .require_dataset("a/b/c", DatasetBuilder::new().metadata("unit", "V"))
                .unwrap(),
            c
        );
        assert_eq!(
            group
                .require_group("a", GroupBuilder::new().metadata("y", 2).read_only(true))
                .unwrap(),
            a
        );
        let e = group.require_group("e/f", GroupBuilder::new()).unwrap();
        assert_ne!(e, a);
        assert!(matches!(
            group.require_group("a/b/c", GroupBuilder::new()),
            Err(NodeError::NotAGroup(_))
        ));
        assert!(matches!(
            group.require_dataset("a/b", DatasetBuilder::new()),
            Err(NodeError::NotADataset(_))
        ));

        // read-only cascades from /a down to /a/b/c
        assert!(matches!(
            group.require_dataset("a/b/c", DatasetBuilder::new().metadata("gain", 2)),
            Err(NodeError::Metadata(MetadataError::ReadOnly(_)))
        ));
        {
            let view = group.view();
            let a = view.group("a").unwrap();
            assert!(a.read_only());
            assert!(a.group("b").unwrap().read_only());
            assert!(a.dataset("b/c").unwrap().read_only());
            assert_eq!(a.metadata().len(), 2);
            assert_eq!(view.dataset("a/b/c").unwrap().metadata().len(), 1);
        }

        assert_eq!(
            group
                .require_dataset(
                    "a/b/c",
                    DatasetBuilder::new().metadata("gain", 2).read_only(false)
                )
                .unwrap(),
            c
        );
        let view = root.root();
        assert!(!view.dataset("a/b/c").unwrap().read_only());
        assert!(view.group("a/b").unwrap().read_only());
        assert_eq!(view.dataset("a/b/c").unwrap().metadata().len(), 2);
    }

    #[test]
    fn group_filters() {
        let mut root = Root::new();
        let mut group = root.root_mut();
        for path in ["raw/voltage", "raw/current", "processed/voltage"] {
            group.create_dataset(path, DatasetBuilder::new()).unwrap();
        }
        let view = root.root();
        let filter = NodeFilter::new().include("voltage").unwrap();
        assert_eq!(
            view.datasets_matching(&filter).map(Dataset::name).collect_vec(),
            vec!["/raw/voltage", "/processed/voltage"]
        );
        let filter = filter.exclude("^/raw").unwrap();
        assert_eq!(
            view.datasets_matching(&filter).map(Dataset::name).collect_vec(),
            vec!["/processed/voltage"]
        );
        let filter = NodeFilter::new().exclude("raw").unwrap();
        assert_eq!(
            view.groups_matching(&filter).map(|group| group.name()).collect_vec(),
            vec!["/processed"]
        );
        assert_eq!(view.descendants().count(), 2);
    }

    #[test]
    fn group_equality_and_copy() {
        let a = tree();
        let mut b = tree();
        assert!(a == b);
        b.root_mut()
            .dataset_mut("a/b/c")
            .unwrap()
            .data_mut()
            .unwrap()
            .as_array_mut::<f64>()
            .unwrap()
            .fill(0.0);
        assert!(a != b);

        let mut c = Root::new();
        c.root_mut().add_group("a", a.root().group("a").unwrap()).unwrap();
        c.root_mut().add_group("d", a.root().group("d").unwrap()).unwrap();
        assert!(a == c);

        let mut d = Root::new();
        d.root_mut()
            .add_dataset("x", &Dataset::new("/y", ArrayData::from(vec![1_u8]), Metadata::default(), true))
            .unwrap();
        assert_eq!(d.root().dataset("x").unwrap().name(), "/x");
        assert!(d.root().dataset("x").unwrap().read_only());
    }

    #[test]
    fn group_add_read_only() {
        let mut a = tree();
        a.root_mut().group_mut_at("a").unwrap().set_read_only(true);
        let mut b = Root::new();
        b.root_mut().add_group("a", a.root().group("a").unwrap()).unwrap();
        let view = b.root().group("a").unwrap();
        assert!(view.read_only());
        assert!(view.dataset("b/c").unwrap().read_only());
        assert!(view.group("b").unwrap().read_only());
    }

    #[test]
    fn group_hierarchy_tree() {
        let root = tree();
        assert_eq!(
            root.root().hierarchy_tree(),
            "/
  a
    b
      c [2] float64
  d
"
        );
    }
}
