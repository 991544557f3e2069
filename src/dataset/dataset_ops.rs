use indexmap::IndexMap;
use itertools::Itertools;

use crate::{
    array::{ArrayData, ArrayError, BinaryOperator, UnaryOperator},
    metadata::{Metadata, MetadataValue},
    value::Value,
};

use super::Dataset;

/// The right-hand operand of a binary [`DatasetOps`] operation.
#[derive(Clone, Copy, Debug)]
pub enum Operand<'a> {
    /// A dataset.
    Dataset(&'a Dataset),
    /// Array data.
    Array(&'a ArrayData),
    /// An integer scalar.
    Int(i64),
    /// A float scalar.
    Float(f64),
}

impl<'a> From<&'a Dataset> for Operand<'a> {
    fn from(dataset: &'a Dataset) -> Self {
        Self::Dataset(dataset)
    }
}

impl<'a> From<&'a ArrayData> for Operand<'a> {
    fn from(array: &'a ArrayData) -> Self {
        Self::Array(array)
    }
}

impl From<i64> for Operand<'_> {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Operand<'_> {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for Operand<'_> {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// Elementwise operations and reductions of a [`Dataset`].
///
/// Elementwise operations return a new detached dataset:
///  - named after the operator and the dataset operands, e.g. `add(/a,/b)`,
///  - with the read-only flag of `self`, and
///  - with the metadata of every dataset operand merged, where the keys of `self` take precedence.
pub trait DatasetOps {
    /// Apply a binary elementwise operator.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the operands are not numeric or cannot be broadcast together.
    fn binary<'a>(&self, operator: BinaryOperator, other: impl Into<Operand<'a>>) -> Result<Dataset, ArrayError>;

    /// Apply a unary elementwise operator.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the dataset is not numeric.
    fn unary(&self, operator: UnaryOperator) -> Result<Dataset, ArrayError>;

    /// Elementwise addition.
    ///
    /// # Errors
    /// See [`DatasetOps::binary`].
    fn add<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Dataset, ArrayError> {
        self.binary(BinaryOperator::Add, other)
    }

    /// Elementwise subtraction.
    ///
    /// # Errors
    /// See [`DatasetOps::binary`].
    fn subtract<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Dataset, ArrayError> {
        self.binary(BinaryOperator::Subtract, other)
    }

    /// Elementwise multiplication.
    ///
    /// # Errors
    /// See [`DatasetOps::binary`].
    fn multiply<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Dataset, ArrayError> {
        self.binary(BinaryOperator::Multiply, other)
    }

    /// Elementwise true division.
    ///
    /// # Errors
    /// See [`DatasetOps::binary`].
    fn divide<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Dataset, ArrayError> {
        self.binary(BinaryOperator::Divide, other)
    }

    /// Elementwise negation.
    ///
    /// # Errors
    /// See [`DatasetOps::unary`].
    fn negative(&self) -> Result<Dataset, ArrayError> {
        self.unary(UnaryOperator::Negative)
    }

    /// Elementwise absolute value.
    ///
    /// # Errors
    /// See [`DatasetOps::unary`].
    fn absolute(&self) -> Result<Dataset, ArrayError> {
        self.unary(UnaryOperator::Absolute)
    }

    /// The sum of all elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the dataset is not numeric.
    fn sum(&self) -> Result<f64, ArrayError>;

    /// The mean of all elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the dataset is not numeric.
    fn mean(&self) -> Result<f64, ArrayError>;

    /// The minimum element.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the dataset is not numeric.
    fn min(&self) -> Result<Option<f64>, ArrayError>;

    /// The maximum element.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the dataset is not numeric.
    fn max(&self) -> Result<Option<f64>, ArrayError>;
}

fn merge_metadata<'a>(operands: impl IntoIterator<Item = &'a Metadata>) -> Metadata {
    let mut entries: IndexMap<&str, &MetadataValue> = IndexMap::new();
    for metadata in operands {
        for (key, value) in metadata {
            entries.entry(key.as_str()).or_insert(value);
        }
    }
    entries
        .into_iter()
        .map(|(key, value)| (key, value.clone()))
        .collect()
}

fn operation_name<'a>(operator: &str, operands: impl IntoIterator<Item = &'a Dataset>) -> String {
    format!(
        "{operator}({})",
        operands.into_iter().map(Dataset::name).join(",")
    )
}

impl DatasetOps for Dataset {
    fn binary<'a>(&self, operator: BinaryOperator, other: impl Into<Operand<'a>>) -> Result<Dataset, ArrayError> {
        let other = other.into();
        let data = self.data();
        let (result, operands) = match other {
            Operand::Dataset(dataset) => {
                let result = if std::ptr::eq(self, dataset) {
                    data.binary(operator, &data)?
                } else {
                    data.binary(operator, &dataset.data())?
                };
                (result, vec![self, dataset])
            }
            Operand::Array(array) => (data.binary(operator, array)?, vec![self]),
            Operand::Int(value) => (data.binary_scalar(operator, Value::Int(value))?, vec![self]),
            Operand::Float(value) => (data.binary_scalar(operator, Value::Float(value))?, vec![self]),
        };
        drop(data);
        Ok(Dataset::new(
            operation_name(operator.name(), operands.iter().copied()),
            result,
            merge_metadata(operands.iter().map(|dataset| dataset.metadata())),
            self.read_only(),
        ))
    }

    fn unary(&self, operator: UnaryOperator) -> Result<Dataset, ArrayError> {
        let result = self.data().unary(operator)?;
        Ok(Dataset::new(
            operation_name(operator.name(), [self]),
            result,
            merge_metadata([self.metadata()]),
            self.read_only(),
        ))
    }

    fn sum(&self) -> Result<f64, ArrayError> {
        self.data().sum()
    }

    fn mean(&self) -> Result<f64, ArrayError> {
        self.data().mean()
    }

    fn min(&self) -> Result<Option<f64>, ArrayError> {
        self.data().min()
    }

    fn max(&self) -> Result<Option<f64>, ArrayError> {
        self.data().max()
    }
}

#[cfg(test)]
mod tests {
    use crate::array::DataType;

    use super::*;

    fn dataset(name: &str, data: Vec<i64>, metadata: &[(&str, i32)]) -> Dataset {
        Dataset::new(
            name,
            ArrayData::from(data),
            metadata.iter().copied().collect(),
            false,
        )
    }

    #[test]
    fn dataset_ops_binary() {
        let a = dataset("/a", vec![1, 2, 3], &[("x", 1), ("y", 2)]);
        let b = dataset("/b", vec![4, 5, 6], &[("y", 20), ("z", 30)]);
        let c = a.add(&b).unwrap();
        assert_eq!(c.name(), "add(/a,/b)");
        assert_eq!(*c.data(), ArrayData::from(vec![5_i64, 7, 9]));
        assert_eq!(c.metadata().keys().collect::<Vec<_>>(), vec!["x", "y", "z"]);
        assert_eq!(c.metadata().get("y").and_then(MetadataValue::as_i64), Some(2));
        assert!(!c.read_only());

        let d = a.divide(2).unwrap();
        assert_eq!(d.name(), "divide(/a)");
        assert_eq!(*d.data(), ArrayData::from(vec![0.5, 1.0, 1.5]));

        let e = a.multiply(&a).unwrap();
        assert_eq!(*e.data(), ArrayData::from(vec![1_i64, 4, 9]));

        let f = a.subtract(&ArrayData::from(vec![1_i64])).unwrap();
        assert_eq!(*f.data(), ArrayData::from(vec![0_i64, 1, 2]));

        assert!(a.add(&dataset("/c", vec![1, 2], &[])).is_err());
    }

    #[test]
    fn dataset_ops_unary_and_reductions() {
        let mut a = dataset("/a", vec![-1, 2, -3], &[]);
        a.set_read_only(true);
        let b = a.absolute().unwrap();
        assert_eq!(b.name(), "absolute(/a)");
        assert!(b.read_only());
        assert_eq!(*b.data(), ArrayData::from(vec![1_i64, 2, 3]));
        assert_eq!(*a.negative().unwrap().data(), ArrayData::from(vec![1_i64, -2, 3]));
        assert_eq!(a.sum().unwrap(), -2.0);
        assert_eq!(a.min().unwrap(), Some(-3.0));
        assert_eq!(a.max().unwrap(), Some(2.0));

        let strings = Dataset::new(
            "/s",
            ArrayData::zeros(&DataType::Object, &[2]),
            Metadata::default(),
            false,
        );
        assert!(strings.mean().is_err());
        assert!(strings.add(1.0).is_err());
    }
}
