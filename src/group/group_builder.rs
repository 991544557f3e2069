use crate::metadata::{Metadata, MetadataValue};

/// A [`Group`](super::Group) builder.
///
/// The group builder is initialised with no metadata.
/// The read-only flag defaults to that of the group the new group is created in.
#[derive(Clone, Debug, Default)]
pub struct GroupBuilder {
    metadata: Vec<(String, MetadataValue)>,
    read_only: Option<bool>,
}

impl GroupBuilder {
    /// Create a new group builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a metadata entry.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    /// Add every entry of `metadata`.
    #[must_use]
    pub fn metadata_from(mut self, metadata: &Metadata) -> Self {
        self.metadata.extend(
            metadata
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone())),
        );
        self
    }

    /// Set the read-only flag.
    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = Some(read_only);
        self
    }

    pub(crate) fn read_only_flag(&self) -> Option<bool> {
        self.read_only
    }

    pub(crate) fn into_metadata(self, read_only: bool) -> Metadata {
        Metadata::from_entries(self.metadata, read_only)
    }

    pub(crate) fn into_entries(self) -> Vec<(String, MetadataValue)> {
        self.metadata
    }
}
