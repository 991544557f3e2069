//! Typed multi-dimensional arrays.
//!
//! An [`ArrayData`] holds either a homogeneous [`ndarray::ArrayD`] of one of the supported [`Element`] types,
//! or a one-dimensional [`StructuredArray`] of records with named fields.
//!
//! Arrays convert to and from nested [`Value`] lists, which is how they are written to and read from files
//! and how list-valued metadata is inferred as a typed array.

mod array_errors;
mod data_type;
mod element;
mod elementwise;
mod structured;

pub use array_errors::ArrayError;
pub use data_type::{DataType, StructuredField, UnsupportedDataTypeError};
pub use element::Element;
pub use elementwise::{broadcast_shape, BinaryOperator, UnaryOperator};
pub use structured::StructuredArray;

use ndarray::{Array, ArrayD, ArrayViewMutD, Dimension, IxDyn};

use crate::value::Value;

/// Typed array data.
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayData {
    /// A `bool` array.
    Bool(ArrayD<bool>),
    /// An `int8` array.
    Int8(ArrayD<i8>),
    /// An `int16` array.
    Int16(ArrayD<i16>),
    /// An `int32` array.
    Int32(ArrayD<i32>),
    /// An `int64` array.
    Int64(ArrayD<i64>),
    /// A `uint8` array.
    UInt8(ArrayD<u8>),
    /// A `uint16` array.
    UInt16(ArrayD<u16>),
    /// A `uint32` array.
    UInt32(ArrayD<u32>),
    /// A `uint64` array.
    UInt64(ArrayD<u64>),
    /// A `float32` array.
    Float32(ArrayD<f32>),
    /// A `float64` array.
    Float64(ArrayD<f64>),
    /// An `object` array.
    Object(ArrayD<Value>),
    /// A structured array.
    Structured(StructuredArray),
}

/// Apply `$homogeneous` to the inner [`ArrayD`] of a homogeneous [`ArrayData`], or `$structured` otherwise.
macro_rules! apply {
    ($data:expr, $array:ident => $homogeneous:expr, $structured:pat => $other:expr) => {
        match $data {
            ArrayData::Bool($array) => $homogeneous,
            ArrayData::Int8($array) => $homogeneous,
            ArrayData::Int16($array) => $homogeneous,
            ArrayData::Int32($array) => $homogeneous,
            ArrayData::Int64($array) => $homogeneous,
            ArrayData::UInt8($array) => $homogeneous,
            ArrayData::UInt16($array) => $homogeneous,
            ArrayData::UInt32($array) => $homogeneous,
            ArrayData::UInt64($array) => $homogeneous,
            ArrayData::Float32($array) => $homogeneous,
            ArrayData::Float64($array) => $homogeneous,
            ArrayData::Object($array) => $homogeneous,
            $structured => $other,
        }
    };
}
pub(crate) use apply;

/// Call a generic function `$function::<T>($args)` where `T` is the element type of a scalar `$data_type`,
/// or evaluate `$structured` for a structured data type.
macro_rules! with_element_type {
    ($data_type:expr, $function:ident($($args:expr),*), $structured:pat => $other:expr) => {
        match $data_type {
            DataType::Bool => $function::<bool>($($args),*),
            DataType::Int8 => $function::<i8>($($args),*),
            DataType::Int16 => $function::<i16>($($args),*),
            DataType::Int32 => $function::<i32>($($args),*),
            DataType::Int64 => $function::<i64>($($args),*),
            DataType::UInt8 => $function::<u8>($($args),*),
            DataType::UInt16 => $function::<u16>($($args),*),
            DataType::UInt32 => $function::<u32>($($args),*),
            DataType::UInt64 => $function::<u64>($($args),*),
            DataType::Float32 => $function::<f32>($($args),*),
            DataType::Float64 => $function::<f64>($($args),*),
            DataType::Object => $function::<Value>($($args),*),
            $structured => $other,
        }
    };
}

fn zeros_of<T: Element>(shape: &[usize]) -> ArrayData {
    T::into_data(ArrayD::from_elem(IxDyn(shape), T::zero()))
}

fn from_values_of<T: Element>(
    shape: &[usize],
    values: Vec<Value>,
) -> Result<ArrayData, ArrayError> {
    let elements = values
        .iter()
        .map(|value| {
            T::from_value(value).ok_or_else(|| ArrayError::incompatible_value(value, &T::DATA_TYPE))
        })
        .collect::<Result<Vec<T>, _>>()?;
    Ok(T::into_data(ArrayD::from_shape_vec(IxDyn(shape), elements)?))
}

impl ArrayData {
    /// Create a zero-filled array.
    ///
    /// Object elements are [`Value::Null`].
    #[must_use]
    pub fn zeros(data_type: &DataType, shape: &[usize]) -> Self {
        with_element_type!(data_type, zeros_of(shape), DataType::Structured(fields) => {
            Self::Structured(StructuredArray::zeros(fields, shape.iter().product()))
        })
    }

    /// Create an array from `values` in C order, coercing each to `data_type`.
    ///
    /// For a structured data type, `shape` must be one-dimensional and each value is a record.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the number of values does not match `shape` or a value is incompatible with `data_type`.
    pub fn from_values(
        data_type: &DataType,
        shape: &[usize],
        values: Vec<Value>,
    ) -> Result<Self, ArrayError> {
        with_element_type!(data_type, from_values_of(shape, values), DataType::Structured(fields) => {
            if shape != [values.len()] {
                return Err(ArrayError::InvalidStructuredData(format!(
                    "{} records for shape {shape:?}",
                    values.len()
                )));
            }
            Ok(Self::Structured(StructuredArray::from_records(fields, &values)?))
        })
    }

    /// Create an array of `data_type` from nested lists.
    ///
    /// A structured array is a list of records, each a list with one value per field.
    /// An object array that is not rectangular becomes a one-dimensional array of its items.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `value` is not rectangular or cannot be coerced to `data_type`.
    pub fn from_nested(data_type: &DataType, value: &Value) -> Result<Self, ArrayError> {
        match (data_type, value) {
            (DataType::Structured(fields), Value::List(records)) => Ok(Self::Structured(
                StructuredArray::from_records(fields, records)?,
            )),
            (DataType::Structured(_), _) => Err(ArrayError::InvalidStructuredData(format!(
                "expected a list of records, found {}",
                value.kind()
            ))),
            _ => match flatten(value) {
                Some((shape, leaves)) => {
                    Self::from_values(data_type, &shape, leaves.into_iter().cloned().collect())
                }
                None => match (data_type, value) {
                    (DataType::Object, Value::List(items)) => {
                        Ok(Self::Object(ArrayD::from_shape_vec(
                            IxDyn(&[items.len()]),
                            items.clone(),
                        )?))
                    }
                    _ => Err(ArrayError::RaggedData),
                },
            },
        }
    }

    /// Infer a typed array from nested lists.
    ///
    /// Rectangular lists of booleans become `bool`, of integers `int64` (or `uint64` if one exceeds [`i64::MAX`]),
    /// of numbers `float64`,
    /// and of anything else `object`. Ragged lists become a one-dimensional `object` array.
    /// An empty list becomes an empty `float64` array.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the array cannot be constructed.
    pub fn infer(value: &Value) -> Result<Self, ArrayError> {
        let Some((shape, leaves)) = flatten(value) else {
            return Self::from_nested(&DataType::Object, value);
        };
        let data_type = if leaves.is_empty() {
            DataType::Float64
        } else if leaves.iter().all(|leaf| matches!(leaf, Value::Bool(_))) {
            DataType::Bool
        } else if leaves.iter().all(|leaf| matches!(leaf, Value::Int(_))) {
            DataType::Int64
        } else if leaves.iter().all(|leaf| leaf.as_u64().is_some()) {
            DataType::UInt64
        } else if leaves
            .iter()
            .all(|leaf| matches!(leaf, Value::Int(_) | Value::UInt(_) | Value::Float(_)))
        {
            DataType::Float64
        } else {
            DataType::Object
        };
        Self::from_values(&data_type, &shape, leaves.into_iter().cloned().collect())
    }

    /// The data type.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Bool(_) => DataType::Bool,
            Self::Int8(_) => DataType::Int8,
            Self::Int16(_) => DataType::Int16,
            Self::Int32(_) => DataType::Int32,
            Self::Int64(_) => DataType::Int64,
            Self::UInt8(_) => DataType::UInt8,
            Self::UInt16(_) => DataType::UInt16,
            Self::UInt32(_) => DataType::UInt32,
            Self::UInt64(_) => DataType::UInt64,
            Self::Float32(_) => DataType::Float32,
            Self::Float64(_) => DataType::Float64,
            Self::Object(_) => DataType::Object,
            Self::Structured(array) => array.data_type(),
        }
    }

    /// The shape.
    #[must_use]
    pub fn shape(&self) -> Vec<usize> {
        apply!(self, array => array.shape().to_vec(), Self::Structured(array) => vec![array.len()])
    }

    /// The number of dimensions.
    #[must_use]
    pub fn ndim(&self) -> usize {
        apply!(self, array => array.ndim(), Self::Structured(_) => 1)
    }

    /// The total number of elements (records for a structured array).
    #[must_use]
    pub fn size(&self) -> usize {
        apply!(self, array => array.len(), Self::Structured(array) => array.len())
    }

    /// The length of the first dimension, or 1 for a zero-dimensional array.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shape().first().copied().unwrap_or(1)
    }

    /// Returns true if the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns the element at `index` as a [`Value`]. A structured element is a [`Value::List`] record.
    #[must_use]
    pub fn value(&self, index: &[usize]) -> Option<Value> {
        apply!(self, array => array.get(index).map(Element::to_value), Self::Structured(array) => {
            match index {
                [index] => array.record(*index).map(Value::List),
                _ => None,
            }
        })
    }

    /// The elements in C order as [`Value`]s. Structured elements are [`Value::List`] records.
    #[must_use]
    pub fn to_values(&self) -> Vec<Value> {
        apply!(self, array => array.iter().map(Element::to_value).collect(), Self::Structured(array) => array.records())
    }

    /// The array as nested lists. A zero-dimensional array is a single value.
    #[must_use]
    pub fn to_nested(&self) -> Value {
        fn nest(shape: &[usize], values: &mut impl Iterator<Item = Value>) -> Value {
            match shape.split_first() {
                None => values.next().unwrap_or_default(),
                Some((len, shape)) => Value::List((0..*len).map(|_| nest(shape, values)).collect()),
            }
        }
        nest(&self.shape(), &mut self.to_values().into_iter())
    }

    /// Convert the array to `data_type`.
    ///
    /// Structured arrays can only be cast to a structured data type with the same field names.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if an element cannot be represented by `data_type`.
    pub fn cast(&self, data_type: &DataType) -> Result<Self, ArrayError> {
        if &self.data_type() == data_type {
            return Ok(self.clone());
        }
        match (self, data_type) {
            (Self::Structured(array), DataType::Structured(fields)) => {
                if !array.field_names().eq(fields.iter().map(StructuredField::name)) {
                    return Err(ArrayError::InvalidStructuredData(format!(
                        "cannot cast {} to {data_type}",
                        array.data_type()
                    )));
                }
                let columns = array
                    .fields()
                    .iter()
                    .zip(fields)
                    .map(|((name, column), field)| Ok((name.clone(), column.cast(field.data_type())?)))
                    .collect::<Result<Vec<_>, ArrayError>>()?;
                Ok(Self::Structured(StructuredArray::new(columns)?))
            }
            (Self::Structured(_), _) | (_, DataType::Structured(_)) => {
                Err(ArrayError::UnsupportedOperation {
                    operation: "cast",
                    data_type: self.data_type(),
                })
            }
            _ => Self::from_values(data_type, &self.shape(), self.to_values()),
        }
    }

    /// Returns the array if it has element type `T`.
    #[must_use]
    pub fn as_array<T: Element>(&self) -> Option<&ArrayD<T>> {
        T::array(self)
    }

    /// Returns the mutable array if it has element type `T`.
    #[must_use]
    pub fn as_array_mut<T: Element>(&mut self) -> Option<&mut ArrayD<T>> {
        T::array_mut(self)
    }

    /// Returns the structured array if the array is structured.
    #[must_use]
    pub fn as_structured(&self) -> Option<&StructuredArray> {
        if let Self::Structured(array) = self {
            Some(array)
        } else {
            None
        }
    }

    /// Returns the column of field `name` of a structured array.
    ///
    /// # Errors
    /// Returns [`ArrayError::NotStructured`] or [`ArrayError::FieldNotFound`].
    pub fn field(&self, name: &str) -> Result<&ArrayData, ArrayError> {
        let array = self
            .as_structured()
            .ok_or_else(|| ArrayError::NotStructured(self.data_type()))?;
        array
            .field(name)
            .ok_or_else(|| ArrayError::FieldNotFound(name.to_string()))
    }

    pub(crate) fn as_structured_mut(&mut self) -> Option<&mut StructuredArray> {
        if let Self::Structured(array) = self {
            Some(array)
        } else {
            None
        }
    }

    pub(crate) fn field_column_mut(&mut self, name: &str) -> Option<&mut ArrayData> {
        if let Self::Structured(array) = self {
            array.field_data_mut(name)
        } else {
            None
        }
    }

    /// Returns a mutable view of the column of field `name` of a structured array.
    ///
    /// The view writes through to the structured array.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the array is not structured, the field does not exist, or the field element type is not `T`.
    pub fn field_mut<T: Element>(&mut self, name: &str) -> Result<ArrayViewMutD<'_, T>, ArrayError> {
        let data_type = self.data_type();
        let Self::Structured(array) = self else {
            return Err(ArrayError::NotStructured(data_type));
        };
        let column = array
            .field_data_mut(name)
            .ok_or_else(|| ArrayError::FieldNotFound(name.to_string()))?;
        let column_type = column.data_type();
        T::array_mut(column)
            .map(ArrayD::view_mut)
            .ok_or(ArrayError::UnsupportedOperation {
                operation: "typed field access",
                data_type: column_type,
            })
    }

    /// Convert the array to `float64`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the array is structured or contains non-numeric values.
    pub fn to_float64(&self) -> Result<ArrayD<f64>, ArrayError> {
        match self.cast(&DataType::Float64)? {
            Self::Float64(array) => Ok(array),
            other => Err(ArrayError::UnsupportedOperation {
                operation: "conversion to float64",
                data_type: other.data_type(),
            }),
        }
    }
}

/// Determine the shape of rectangular nested lists and collect their leaves in C order.
///
/// Returns [`None`] if the lists are ragged.
fn flatten(value: &Value) -> Option<(Vec<usize>, Vec<&Value>)> {
    fn collect<'a>(value: &'a Value, shape: &[usize], leaves: &mut Vec<&'a Value>) -> bool {
        match (shape.split_first(), value) {
            (None, Value::List(_)) => false,
            (None, leaf) => {
                leaves.push(leaf);
                true
            }
            (Some((len, shape)), Value::List(items)) if items.len() == *len => {
                items.iter().all(|item| collect(item, shape, leaves))
            }
            (Some(_), _) => false,
        }
    }

    let mut shape = Vec::new();
    let mut current = value;
    while let Value::List(items) = current {
        shape.push(items.len());
        match items.first() {
            Some(first) => current = first,
            None => break,
        }
    }
    let mut leaves = Vec::with_capacity(shape.iter().product());
    collect(value, &shape, &mut leaves).then_some((shape, leaves))
}

macro_rules! impl_from_array {
    ($type:ty) => {
        impl<D: Dimension> From<Array<$type, D>> for ArrayData {
            fn from(array: Array<$type, D>) -> Self {
                <$type as Element>::into_data(array.into_dyn())
            }
        }

        impl From<Vec<$type>> for ArrayData {
            fn from(values: Vec<$type>) -> Self {
                <$type as Element>::into_data(Array::from_vec(values).into_dyn())
            }
        }
    };
}

impl_from_array!(bool);
impl_from_array!(i8);
impl_from_array!(i16);
impl_from_array!(i32);
impl_from_array!(i64);
impl_from_array!(u8);
impl_from_array!(u16);
impl_from_array!(u32);
impl_from_array!(u64);
impl_from_array!(f32);
impl_from_array!(f64);
impl_from_array!(Value);

impl From<StructuredArray> for ArrayData {
    fn from(array: StructuredArray) -> Self {
        Self::Structured(array)
    }
}
