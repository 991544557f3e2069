use crate::{
    array::{ArrayData, ArrayError, DataType},
    metadata::{Metadata, MetadataValue},
};

use super::Dataset;

/// A [`Dataset`] builder.
///
/// The dataset builder is initialised with a shape of `[0]` and the `float64` data type.
///  - If [`data`](DatasetBuilder::data) is set, the shape is that of the data and the data is cast to the data type if one was set.
///  - Otherwise the dataset is filled with zeros of the shape and data type.
///  - The metadata is empty and the read-only flag defaults to that of the group the dataset is created in.
///
/// For example:
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use labio::{array::DataType, dataset::DatasetBuilder, group::Root};
/// let mut root = Root::new();
/// let id = root.root_mut().create_dataset(
///     "raw/voltage",
///     DatasetBuilder::new()
///         .shape(vec![100])
///         .data_type(DataType::Float32)
///         .metadata("unit", "V"),
/// )?;
/// assert_eq!(root.dataset(id)?.name(), "/raw/voltage");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct DatasetBuilder {
    shape: Option<Vec<usize>>,
    data_type: Option<DataType>,
    data: Option<ArrayData>,
    metadata: Vec<(String, MetadataValue)>,
    read_only: Option<bool>,
}

impl DatasetBuilder {
    /// Create a new dataset builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shape of a zero-filled dataset.
    ///
    /// Ignored if [`data`](DatasetBuilder::data) is set.
    #[must_use]
    pub fn shape(mut self, shape: Vec<usize>) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Set the data type.
    #[must_use]
    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    /// Set the data.
    #[must_use]
    pub fn data(mut self, data: impl Into<ArrayData>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Add a metadata entry.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    /// Set the read-only flag.
    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = Some(read_only);
        self
    }

    pub(crate) fn read_only_or(&self, default: bool) -> bool {
        self.read_only.unwrap_or(default)
    }

    pub(crate) fn read_only_flag(&self) -> Option<bool> {
        self.read_only
    }

    pub(crate) fn into_entries(self) -> Vec<(String, MetadataValue)> {
        self.metadata
    }

    /// Build a detached dataset named `name`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the data cannot be cast to the data type.
    pub fn build(self, name: impl Into<String>) -> Result<Dataset, ArrayError> {
        let read_only = self.read_only_or(false);
        self.build_with(name.into(), read_only)
    }

    pub(crate) fn build_with(self, name: String, read_only: bool) -> Result<Dataset, ArrayError> {
        let data = match (self.data, self.data_type) {
            (Some(data), Some(data_type)) if data.data_type() != data_type => data.cast(&data_type)?,
            (Some(data), _) => data,
            (None, data_type) => ArrayData::zeros(
                &data_type.unwrap_or(DataType::Float64),
                self.shape.as_deref().unwrap_or(&[0]),
            ),
        };
        let metadata = Metadata::from_entries(self.metadata, read_only);
        Ok(Dataset::new(name, data, metadata, read_only))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_builder_zeros() {
        let dataset = DatasetBuilder::new().build("/a").unwrap();
        assert_eq!(dataset.shape(), vec![0]);
        assert_eq!(dataset.data_type(), DataType::Float64);
        assert!(!dataset.read_only());

        let dataset = DatasetBuilder::new()
            .shape(vec![2, 3])
            .data_type(DataType::Int16)
            .metadata("unit", "mA")
            .read_only(true)
            .build("/b")
            .unwrap();
        assert_eq!(*dataset.data(), ArrayData::zeros(&DataType::Int16, &[2, 3]));
        assert_eq!(dataset.metadata().get("unit").and_then(MetadataValue::as_str), Some("mA"));
        assert!(dataset.read_only());
        assert!(dataset.metadata().read_only());
    }

    #[test]
    fn dataset_builder_data() {
        let dataset = DatasetBuilder::new()
            .shape(vec![10])
            .data(vec![1_i32, 2, 3])
            .data_type(DataType::Float32)
            .build("/a")
            .unwrap();
        assert_eq!(dataset.shape(), vec![3]);
        assert_eq!(*dataset.data(), ArrayData::from(vec![1.0_f32, 2.0, 3.0]));

        assert!(DatasetBuilder::new()
            .data(vec![1.5_f64])
            .data_type(DataType::Int8)
            .build("/b")
            .is_err());
    }
}
