use derive_more::From;
use ndarray::{Array, Dimension};

use crate::{array::ArrayData, value::Value};

use super::Metadata;

/// A metadata value.
///
/// A list becomes a typed [`ArrayData`] and a mapping a nested [`Metadata`].
#[derive(Clone, Debug, PartialEq, From)]
pub enum MetadataValue {
    /// The null value.
    #[from(ignore)]
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// An unsigned integer greater than [`i64::MAX`].
    #[from(ignore)]
    UInt(u64),
    /// A floating point number, possibly non-finite.
    Float(f64),
    /// A string.
    String(String),
    /// A typed array.
    Array(ArrayData),
    /// Nested metadata.
    Metadata(Metadata),
}

impl MetadataValue {
    /// Returns true if the value is [`MetadataValue::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the value as a boolean if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        if let Self::Bool(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    /// Returns the value as an integer if it is one.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        if let Self::Int(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    /// Returns the value as a float if it is numeric.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::UInt(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the value as a string slice if it is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        if let Self::String(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Returns the value as an array if it is one.
    #[must_use]
    pub fn as_array(&self) -> Option<&ArrayData> {
        if let Self::Array(array) = self {
            Some(array)
        } else {
            None
        }
    }

    /// Returns the value as nested metadata if it is.
    #[must_use]
    pub fn as_metadata(&self) -> Option<&Metadata> {
        if let Self::Metadata(metadata) = self {
            Some(metadata)
        } else {
            None
        }
    }

    /// Returns the value as mutable nested metadata if it is.
    #[must_use]
    pub fn as_metadata_mut(&mut self) -> Option<&mut Metadata> {
        if let Self::Metadata(metadata) = self {
            Some(metadata)
        } else {
            None
        }
    }

    /// Convert to a [`Value`]. Arrays become nested lists and metadata a map.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(value) => Value::Bool(*value),
            Self::Int(value) => Value::Int(*value),
            Self::UInt(value) => Value::UInt(*value),
            Self::Float(value) => Value::Float(*value),
            Self::String(value) => Value::String(value.clone()),
            Self::Array(array) => array.to_nested(),
            Self::Metadata(metadata) => Value::Map(
                metadata
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.to_value()))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

macro_rules! impl_from_int {
    ($($type:ty),*) => {
        $(
            impl From<$type> for MetadataValue {
                fn from(value: $type) -> Self {
                    Self::Int(value.into())
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, u8, u16, u32);

impl From<u64> for MetadataValue {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Self::UInt(value), Self::Int)
    }
}

impl From<f32> for MetadataValue {
    fn from(value: f32) -> Self {
        Self::Float(value.into())
    }
}

impl<T> From<Vec<T>> for MetadataValue
where
    ArrayData: From<Vec<T>>,
{
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into())
    }
}

impl<T, D: Dimension> From<Array<T, D>> for MetadataValue
where
    ArrayData: From<Array<T, D>>,
{
    fn from(array: Array<T, D>) -> Self {
        Self::Array(array.into())
    }
}

impl From<Value> for MetadataValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Bool(value),
            Value::Int(value) => Self::Int(value),
            Value::UInt(value) => Self::UInt(value),
            Value::Float(value) => Self::Float(value),
            Value::String(value) => Self::String(value),
            Value::List(items) => {
                let list = Value::List(items);
                match ArrayData::infer(&list) {
                    Ok(array) => Self::Array(array),
                    Err(_) => match list {
                        Value::List(items) => Self::Array(items.into()),
                        other => Self::from(other),
                    },
                }
            }
            Value::Map(map) => Self::Metadata(map.into_iter().collect()),
        }
    }
}

impl From<serde_json::Value> for MetadataValue {
    fn from(value: serde_json::Value) -> Self {
        Value::from(value).into()
    }
}

impl serde::Serialize for MetadataValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::DataType;

    #[test]
    fn metadata_value_from_json() {
        let value = MetadataValue::from(serde_json::json!([[1, 2], [3, 4]]));
        let array = value.as_array().unwrap();
        assert_eq!(array.data_type(), DataType::Int64);
        assert_eq!(array.shape(), vec![2, 2]);

        let value = MetadataValue::from(serde_json::json!({"a": {"b": 1}}));
        let nested = value.as_metadata().unwrap();
        assert_eq!(
            nested.get("a").unwrap().as_metadata().unwrap().get("b"),
            Some(&MetadataValue::Int(1))
        );

        assert_eq!(MetadataValue::from(7_u8), MetadataValue::Int(7));
        assert_eq!(MetadataValue::from(7_u64), MetadataValue::Int(7));
        assert_eq!(
            MetadataValue::from(serde_json::json!(u64::MAX)),
            MetadataValue::UInt(u64::MAX)
        );
        assert_eq!(MetadataValue::from("x").as_str(), Some("x"));
        assert_eq!(MetadataValue::from(2).as_f64(), Some(2.0));
        assert!(MetadataValue::from(serde_json::Value::Null).is_null());
    }

    #[test]
    fn metadata_value_to_value() {
        let value = MetadataValue::from(vec![1.0_f64, f64::INFINITY]);
        assert_eq!(
            value.to_value(),
            Value::List(vec![Value::Float(1.0), Value::Float(f64::INFINITY)])
        );
    }
}
