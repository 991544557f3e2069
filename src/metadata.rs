//! Metadata.
//!
//! [`Metadata`] is an ordered mapping from string keys to [`MetadataValue`]s that is owned by a node of a hierarchy.
//! Every mutating method fails with a [`ReadOnlyError`] while the metadata is read-only.
//! The read-only flag itself can always be toggled, and toggling it cascades into nested metadata.

mod metadata_value;

pub use metadata_value::MetadataValue;

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use thiserror::Error;

use crate::node::ReadOnlyError;

/// A metadata error.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The metadata is read-only.
    #[error(transparent)]
    ReadOnly(#[from] ReadOnlyError),
    /// The key does not exist.
    #[error("metadata key {0} does not exist")]
    KeyNotFound(String),
    /// The metadata is empty.
    #[error("metadata is empty")]
    Empty,
}

/// Ordered key/value metadata.
///
/// Equality compares entries irrespective of order and ignores the read-only flag.
#[derive(Clone, Debug, Default)]
pub struct Metadata {
    node_name: String,
    read_only: bool,
    entries: IndexMap<String, MetadataValue>,
}

impl Metadata {
    /// Create empty metadata.
    #[must_use]
    pub fn new(read_only: bool) -> Self {
        Self {
            node_name: String::new(),
            read_only,
            entries: IndexMap::new(),
        }
    }

    /// Create metadata from key/value pairs.
    #[must_use]
    pub fn from_entries<K: Into<String>, V: Into<MetadataValue>>(
        entries: impl IntoIterator<Item = (K, V)>,
        read_only: bool,
    ) -> Self {
        let mut metadata: Self = entries.into_iter().collect();
        metadata.set_read_only(read_only);
        metadata
    }

    pub(crate) fn with_node_name(mut self, node_name: &str) -> Self {
        self.node_name = node_name.to_string();
        self
    }

    /// The name of the node that owns the metadata.
    #[must_use]
    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// Returns true if the metadata is read-only.
    #[must_use]
    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// Set the read-only flag, and that of all nested metadata.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
        for value in self.entries.values_mut() {
            if let MetadataValue::Metadata(nested) = value {
                nested.set_read_only(read_only);
            }
        }
    }

    fn check_writable(&self) -> Result<(), ReadOnlyError> {
        if self.read_only {
            Err(ReadOnlyError::new(format!("<Metadata '{}'>", self.node_name)))
        } else {
            Ok(())
        }
    }

    /// The number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if `key` exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the value of `key`, if it exists.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.get(key)
    }

    /// Returns the value of `key`.
    ///
    /// # Errors
    /// Returns [`MetadataError::KeyNotFound`] if `key` does not exist.
    pub fn field(&self, key: &str) -> Result<&MetadataValue, MetadataError> {
        self.entries
            .get(key)
            .ok_or_else(|| MetadataError::KeyNotFound(key.to_string()))
    }

    /// Returns the mutable value of `key`, if it exists.
    ///
    /// # Errors
    /// Returns [`MetadataError::ReadOnly`] if the metadata is read-only.
    pub fn get_mut(&mut self, key: &str) -> Result<Option<&mut MetadataValue>, MetadataError> {
        self.check_writable()?;
        Ok(self.entries.get_mut(key))
    }

    /// Set `key` to `value`, returning the previous value.
    ///
    /// Nested metadata takes the read-only flag of this metadata.
    ///
    /// # Errors
    /// Returns [`MetadataError::ReadOnly`] if the metadata is read-only.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<MetadataValue>,
    ) -> Result<Option<MetadataValue>, MetadataError> {
        self.check_writable()?;
        Ok(self.insert_unchecked(key.into(), value.into()))
    }

    fn insert_unchecked(&mut self, key: String, mut value: MetadataValue) -> Option<MetadataValue> {
        if let MetadataValue::Metadata(nested) = &mut value {
            nested.node_name.clone_from(&self.node_name);
            nested.set_read_only(self.read_only);
        }
        self.entries.insert(key, value)
    }

    /// Remove `key`, returning its value.
    ///
    /// # Errors
    /// Returns [`MetadataError::ReadOnly`] if the metadata is read-only, or [`MetadataError::KeyNotFound`] if `key` does not exist.
    pub fn remove(&mut self, key: &str) -> Result<MetadataValue, MetadataError> {
        self.check_writable()?;
        self.entries
            .shift_remove(key)
            .ok_or_else(|| MetadataError::KeyNotFound(key.to_string()))
    }

    /// Remove `key` if it exists, returning its value.
    ///
    /// # Errors
    /// Returns [`MetadataError::ReadOnly`] if the metadata is read-only.
    pub fn pop(&mut self, key: &str) -> Result<Option<MetadataValue>, MetadataError> {
        self.check_writable()?;
        Ok(self.entries.shift_remove(key))
    }

    /// Remove and return the last inserted entry.
    ///
    /// # Errors
    /// Returns [`MetadataError::ReadOnly`] if the metadata is read-only, or [`MetadataError::Empty`] if there are no entries.
    pub fn popitem(&mut self) -> Result<(String, MetadataValue), MetadataError> {
        self.check_writable()?;
        self.entries.pop().ok_or(MetadataError::Empty)
    }

    /// Returns the value of `key`, inserting `default` if it does not exist.
    ///
    /// # Errors
    /// Returns [`MetadataError::ReadOnly`] if `key` does not exist and the metadata is read-only.
    pub fn setdefault(
        &mut self,
        key: &str,
        default: impl Into<MetadataValue>,
    ) -> Result<&MetadataValue, MetadataError> {
        if !self.entries.contains_key(key) {
            self.check_writable()?;
            self.insert_unchecked(key.to_string(), default.into());
        }
        self.field(key)
    }

    /// Insert every key/value pair of `entries`.
    ///
    /// # Errors
    /// Returns [`MetadataError::ReadOnly`] if the metadata is read-only. No entry is inserted in that case.
    pub fn update<K: Into<String>, V: Into<MetadataValue>>(
        &mut self,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Result<(), MetadataError> {
        self.check_writable()?;
        for (key, value) in entries {
            self.insert_unchecked(key.into(), value.into());
        }
        Ok(())
    }

    /// Remove every entry.
    ///
    /// # Errors
    /// Returns [`MetadataError::ReadOnly`] if the metadata is read-only.
    pub fn clear(&mut self) -> Result<(), MetadataError> {
        self.check_writable()?;
        self.entries.clear();
        Ok(())
    }

    /// Returns a detached copy of the metadata.
    ///
    /// The copy keeps the read-only flag unless `read_only` is given.
    #[must_use]
    pub fn copy(&self, read_only: Option<bool>) -> Self {
        let mut copy = self.clone();
        copy.set_read_only(read_only.unwrap_or(self.read_only));
        copy
    }

    /// Returns new detached metadata with each of `keys` set to `value`.
    ///
    /// The new metadata keeps the read-only flag of this metadata unless `read_only` is given.
    #[must_use]
    pub fn fromkeys<K: Into<String>>(
        &self,
        keys: impl IntoIterator<Item = K>,
        value: impl Into<MetadataValue>,
        read_only: Option<bool>,
    ) -> Self {
        let value = value.into();
        let mut metadata = Self::new(false).with_node_name(&self.node_name);
        for key in keys {
            metadata.insert_unchecked(key.into(), value.clone());
        }
        metadata.set_read_only(read_only.unwrap_or(self.read_only));
        metadata
    }

    /// The keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// The values in order.
    pub fn values(&self) -> impl Iterator<Item = &MetadataValue> {
        self.entries.values()
    }

    /// The entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl PartialEq for Metadata {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Into<String>, V: Into<MetadataValue>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metadata = Self::new(false);
        for (key, value) in iter {
            metadata.insert_unchecked(key.into(), value.into());
        }
        metadata
    }
}

impl<'a> IntoIterator for &'a Metadata {
    type Item = (&'a String, &'a MetadataValue);
    type IntoIter = indexmap::map::Iter<'a, String, MetadataValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl std::fmt::Display for Metadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = MetadataValue::Metadata(self.clone()).to_value();
        write!(f, "<Metadata '{}' {value}>", self.node_name)
    }
}

impl serde::Serialize for Metadata {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
