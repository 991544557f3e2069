use thiserror::Error;

use super::{DataType, UnsupportedDataTypeError};

/// An array error.
#[derive(Debug, Error)]
pub enum ArrayError {
    /// Unsupported data type.
    #[error(transparent)]
    UnsupportedDataType(#[from] UnsupportedDataTypeError),
    /// A value cannot be represented by the data type.
    #[error("value {value} is incompatible with data type {data_type}")]
    IncompatibleValue {
        /// The offending value.
        value: String,
        /// The data type.
        data_type: DataType,
    },
    /// Nested list data is not rectangular.
    #[error("nested list data is not rectangular")]
    RaggedData,
    /// The number of elements does not match the shape.
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
    /// The shapes of two operands cannot be broadcast together.
    #[error("shapes {0:?} and {1:?} cannot be broadcast together")]
    IncompatibleShapes(Vec<usize>, Vec<usize>),
    /// The operation is not supported for the data type.
    #[error("{operation} is not supported for data type {data_type}")]
    UnsupportedOperation {
        /// The operation name.
        operation: &'static str,
        /// The data type.
        data_type: DataType,
    },
    /// A structured field does not exist.
    #[error("field {0} does not exist")]
    FieldNotFound(String),
    /// The array is not structured.
    #[error("array with data type {0} is not structured")]
    NotStructured(DataType),
    /// Invalid structured data.
    #[error("invalid structured data: {0}")]
    InvalidStructuredData(String),
}

impl ArrayError {
    pub(crate) fn incompatible_value(value: &crate::value::Value, data_type: &DataType) -> Self {
        Self::IncompatibleValue {
            value: value.to_string(),
            data_type: data_type.clone(),
        }
    }
}
