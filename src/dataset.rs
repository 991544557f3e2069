//! Datasets.
//!
//! A [`Dataset`] is a named [`ArrayData`] with [`Metadata`] and a read-only flag.
//! Datasets in a hierarchy are created with [`GroupViewMut::create_dataset`](crate::group::GroupViewMut::create_dataset)
//! and named by their absolute path. A [`Dataset`] can also be detached, such as the result of [`DatasetOps`].
//!
//! A [`DatasetLogging`] is a dataset whose rows are appended from [`log`] records delivered by a [`LogSink`].

mod dataset_builder;
mod dataset_logging;
mod dataset_ops;
mod log_sink;

pub use dataset_builder::DatasetBuilder;
pub use dataset_logging::{
    DatasetLogging, DatasetLoggingBuilder, DatasetLoggingError, LogAttribute, DEFAULT_ATTRIBUTES,
};
pub use dataset_ops::{DatasetOps, Operand};
pub use log_sink::LogSink;

use std::ops::{Deref, DerefMut};

use itertools::Itertools;
use parking_lot::MappedMutexGuard;
use thiserror::Error;

use crate::{
    array::{ArrayData, ArrayError, DataType},
    metadata::Metadata,
    node::ReadOnlyError,
};

/// A dataset error.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The dataset is read-only.
    #[error(transparent)]
    ReadOnly(#[from] ReadOnlyError),
    /// An array error.
    #[error(transparent)]
    Array(#[from] ArrayError),
}

#[derive(Debug)]
enum DatasetData {
    Array(ArrayData),
    Logging(DatasetLogging),
}

/// A dataset.
#[derive(Debug)]
pub struct Dataset {
    name: String,
    metadata: Metadata,
    read_only: bool,
    data: DatasetData,
}

enum ArrayRefInner<'a> {
    Borrowed(&'a ArrayData),
    Locked(MappedMutexGuard<'a, ArrayData>),
}

/// A shared reference to the data of a [`Dataset`].
///
/// The data of a [`DatasetLogging`] stays locked while the reference is held,
/// so records logged on the same thread in the meantime would block.
pub struct ArrayRef<'a>(ArrayRefInner<'a>);

enum ArrayRefMutInner<'a> {
    Borrowed(&'a mut ArrayData),
    Locked(MappedMutexGuard<'a, ArrayData>),
}

/// A mutable reference to the data of a [`Dataset`].
///
/// See [`ArrayRef`] for the locking behaviour of a [`DatasetLogging`].
pub struct ArrayRefMut<'a>(ArrayRefMutInner<'a>);

impl Deref for ArrayRef<'_> {
    type Target = ArrayData;

    fn deref(&self) -> &ArrayData {
        match &self.0 {
            ArrayRefInner::Borrowed(data) => data,
            ArrayRefInner::Locked(guard) => guard,
        }
    }
}

impl Deref for ArrayRefMut<'_> {
    type Target = ArrayData;

    fn deref(&self) -> &ArrayData {
        match &self.0 {
            ArrayRefMutInner::Borrowed(data) => data,
            ArrayRefMutInner::Locked(guard) => guard,
        }
    }
}

impl DerefMut for ArrayRefMut<'_> {
    fn deref_mut(&mut self) -> &mut ArrayData {
        match &mut self.0 {
            ArrayRefMutInner::Borrowed(data) => data,
            ArrayRefMutInner::Locked(guard) => guard,
        }
    }
}

impl std::fmt::Debug for ArrayRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.deref().fmt(f)
    }
}

impl std::fmt::Debug for ArrayRefMut<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.deref().fmt(f)
    }
}

impl Dataset {
    /// Create a detached dataset.
    #[must_use]
    pub fn new(name: impl Into<String>, data: ArrayData, metadata: Metadata, read_only: bool) -> Self {
        let name = name.into();
        let mut metadata = metadata.with_node_name(&name);
        metadata.set_read_only(read_only);
        Self {
            name,
            metadata,
            read_only,
            data: DatasetData::Array(data),
        }
    }

    pub(crate) fn new_logging(name: String, logging: DatasetLogging, metadata: Metadata) -> Self {
        let mut metadata = metadata.with_node_name(&name);
        metadata.set_read_only(false);
        Self {
            name,
            metadata,
            read_only: false,
            data: DatasetData::Logging(logging),
        }
    }

    /// The name, which is the absolute path of a dataset in a hierarchy.
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
    ///
    /// Mutating read-only metadata fails.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Returns true if the dataset is read-only.
    #[must_use]
    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// Set the read-only flag of the dataset and its metadata.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
        self.metadata.set_read_only(read_only);
    }

    /// The data.
    #[must_use]
    pub fn data(&self) -> ArrayRef<'_> {
        ArrayRef(match &self.data {
            DatasetData::Array(data) => ArrayRefInner::Borrowed(data),
            DatasetData::Logging(logging) => ArrayRefInner::Locked(logging.lock_data()),
        })
    }

    /// The mutable data.
    ///
    /// # Errors
    /// Returns [`DatasetError::ReadOnly`] if the dataset is read-only.
    pub fn data_mut(&mut self) -> Result<ArrayRefMut<'_>, DatasetError> {
        if self.read_only {
            return Err(ReadOnlyError::new(format!("<Dataset '{}'>", self.name)).into());
        }
        Ok(ArrayRefMut(match &mut self.data {
            DatasetData::Array(data) => ArrayRefMutInner::Borrowed(data),
            DatasetData::Logging(logging) => ArrayRefMutInner::Locked(logging.lock_data()),
        }))
    }

    /// The column of field `name` of a structured dataset.
    ///
    /// # Errors
    /// Returns [`DatasetError::Array`] if the dataset is not structured or the field does not exist.
    pub fn field(&self, name: &str) -> Result<ArrayRef<'_>, DatasetError> {
        match self.data().0 {
            ArrayRefInner::Borrowed(data) => Ok(ArrayRef(ArrayRefInner::Borrowed(data.field(name)?))),
            ArrayRefInner::Locked(guard) => {
                guard.field(name)?;
                let guard = MappedMutexGuard::try_map(guard, |data| data.field_column_mut(name))
                    .map_err(|_| ArrayError::FieldNotFound(name.to_string()))?;
                Ok(ArrayRef(ArrayRefInner::Locked(guard)))
            }
        }
    }

    /// The data type.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.data().data_type()
    }

    /// The shape.
    #[must_use]
    pub fn shape(&self) -> Vec<usize> {
        self.data().shape()
    }

    /// The number of dimensions.
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.data().ndim()
    }

    /// The total number of elements.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data().size()
    }

    /// The length of the first dimension, or 1 for a zero-dimensional dataset.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data().len()
    }

    /// Returns true if the dataset has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    /// Returns the logging handle if this is a [`DatasetLogging`].
    #[must_use]
    pub fn logging(&self) -> Option<&DatasetLogging> {
        if let DatasetData::Logging(logging) = &self.data {
            Some(logging)
        } else {
            None
        }
    }

    pub(crate) fn replace_with_logging(&mut self, logging: DatasetLogging) {
        self.data = DatasetData::Logging(logging);
    }

    /// Returns a detached copy of the dataset.
    ///
    /// The copy keeps the read-only flag unless `read_only` is given.
    /// A copy of a [`DatasetLogging`] is a plain dataset holding the rows logged so far.
    #[must_use]
    pub fn copy(&self, read_only: Option<bool>) -> Self {
        let read_only = read_only.unwrap_or(self.read_only);
        Self::new(
            self.name.clone(),
            self.data().clone(),
            self.metadata.copy(Some(read_only)),
            read_only,
        )
    }
}

impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        if self.name != other.name || self.metadata != other.metadata {
            return false;
        }
        match (self.logging(), other.logging()) {
            (Some(a), Some(b)) if a.ptr_eq(b) => true,
            _ => *self.data() == *other.data(),
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.data();
        let data_type = data.data_type();
        let shape = data.shape();
        let shape = if shape.len() == 1 {
            format!("({},)", shape[0])
        } else {
            format!("({})", shape.iter().format(", "))
        };
        write!(
            f,
            "<Dataset '{}' shape={shape} dtype='{}' ({} metadata)>",
            self.name,
            data_type.type_str().map_or_else(|| data_type.name(), str::to_string),
            self.metadata.len()
        )
    }
}
