//! Array data types.
//!
//! Homogeneous data types are written to files as numpy-style type strings (e.g. `<f8`),
//! and the fields of structured data types by name (e.g. `float64`).

use derive_more::From;
use itertools::Itertools;
use thiserror::Error;

/// A data type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[rustfmt::skip]
pub enum DataType {
    /// `bool` Boolean.
    Bool,
    /// `int8` Integer in `[-2^7, 2^7-1]`.
    Int8,
    /// `int16` Integer in `[-2^15, 2^15-1]`.
    Int16,
    /// `int32` Integer in `[-2^31, 2^31-1]`.
    Int32,
    /// `int64` Integer in `[-2^63, 2^63-1]`.
    Int64,
    /// `uint8` Integer in `[0, 2^8-1]`.
    UInt8,
    /// `uint16` Integer in `[0, 2^16-1]`.
    UInt16,
    /// `uint32` Integer in `[0, 2^32-1]`.
    UInt32,
    /// `uint64` Integer in `[0, 2^64-1]`.
    UInt64,
    /// `float32` IEEE 754 single-precision floating point.
    Float32,
    /// `float64` IEEE 754 double-precision floating point.
    Float64,
    /// `object` A dynamically typed [`Value`](crate::value::Value), also used for strings.
    Object,
    /// A record of named fields, each with a scalar data type.
    Structured(Vec<StructuredField>),
}

/// A named field of a [structured](DataType::Structured) data type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StructuredField {
    name: String,
    data_type: DataType,
}

/// An unsupported data type error.
#[derive(Debug, Error, From)]
#[error("unsupported data type {0}")]
pub struct UnsupportedDataTypeError(String);

impl StructuredField {
    /// Create a new structured field.
    ///
    /// # Errors
    /// Returns [`UnsupportedDataTypeError`] if `data_type` is itself structured.
    pub fn new(
        name: impl Into<String>,
        data_type: DataType,
    ) -> Result<Self, UnsupportedDataTypeError> {
        if data_type.is_structured() {
            Err(UnsupportedDataTypeError(format!(
                "nested structured field {data_type}"
            )))
        } else {
            Ok(Self {
                name: name.into(),
                data_type,
            })
        }
    }

    /// The field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field data type.
    #[must_use]
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }
}

impl DataType {
    /// Create a structured data type from `(name, data_type)` pairs.
    ///
    /// # Errors
    /// Returns [`UnsupportedDataTypeError`] if there are no fields, a field name is repeated, or a field is structured.
    pub fn structured<S: Into<String>>(
        fields: impl IntoIterator<Item = (S, DataType)>,
    ) -> Result<Self, UnsupportedDataTypeError> {
        let fields = fields
            .into_iter()
            .map(|(name, data_type)| StructuredField::new(name, data_type))
            .collect::<Result<Vec<_>, _>>()?;
        if fields.is_empty() {
            return Err(UnsupportedDataTypeError(
                "structured data type with no fields".to_string(),
            ));
        }
        if !fields.iter().map(StructuredField::name).all_unique() {
            return Err(UnsupportedDataTypeError(format!(
                "structured data type with duplicate field names {}",
                fields.iter().map(StructuredField::name).format(", ")
            )));
        }
        Ok(Self::Structured(fields))
    }

    /// Returns the name of a scalar data type (e.g. `float64`).
    ///
    /// Structured data types are named by their fields.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Bool => "bool".to_string(),
            Self::Int8 => "int8".to_string(),
            Self::Int16 => "int16".to_string(),
            Self::Int32 => "int32".to_string(),
            Self::Int64 => "int64".to_string(),
            Self::UInt8 => "uint8".to_string(),
            Self::UInt16 => "uint16".to_string(),
            Self::UInt32 => "uint32".to_string(),
            Self::UInt64 => "uint64".to_string(),
            Self::Float32 => "float32".to_string(),
            Self::Float64 => "float64".to_string(),
            Self::Object => "object".to_string(),
            Self::Structured(fields) => format!(
                "[{}]",
                fields
                    .iter()
                    .map(|field| format!("({}, {})", field.name, field.data_type))
                    .format(", ")
            ),
        }
    }

    /// Returns the numpy-style type string of a scalar data type (e.g. `<f8`), or [`None`] if structured.
    #[must_use]
    pub fn type_str(&self) -> Option<&'static str> {
        Some(match self {
            Self::Bool => "|b1",
            Self::Int8 => "|i1",
            Self::Int16 => "<i2",
            Self::Int32 => "<i4",
            Self::Int64 => "<i8",
            Self::UInt8 => "|u1",
            Self::UInt16 => "<u2",
            Self::UInt32 => "<u4",
            Self::UInt64 => "<u8",
            Self::Float32 => "<f4",
            Self::Float64 => "<f8",
            Self::Object => "|O",
            Self::Structured(_) => return None,
        })
    }

    /// Parse a scalar data type from a name (`float64`) or numpy-style type string (`<f8`).
    ///
    /// The byte order of a type string is ignored.
    /// Fixed-width string types (`<U8`, `|S3`) map to [`DataType::Object`].
    ///
    /// # Errors
    /// Returns [`UnsupportedDataTypeError`] if `name` is not a recognised data type.
    pub fn from_name(name: &str) -> Result<Self, UnsupportedDataTypeError> {
        let name = name.trim();
        let data_type = match name {
            "bool" | "bool_" | "bool8" => Self::Bool,
            "int8" => Self::Int8,
            "int16" => Self::Int16,
            "int32" => Self::Int32,
            "int64" | "int" => Self::Int64,
            "uint8" => Self::UInt8,
            "uint16" => Self::UInt16,
            "uint32" => Self::UInt32,
            "uint64" | "uint" => Self::UInt64,
            "float32" | "single" => Self::Float32,
            "float64" | "float" | "double" => Self::Float64,
            "object" | "str" | "string" | "unicode" | "bytes" => Self::Object,
            _ => {
                let code = name.strip_prefix(&['<', '>', '=', '|'][..]).unwrap_or(name);
                match code {
                    "b1" | "?" => Self::Bool,
                    "i1" => Self::Int8,
                    "i2" => Self::Int16,
                    "i4" => Self::Int32,
                    "i8" => Self::Int64,
                    "u1" => Self::UInt8,
                    "u2" => Self::UInt16,
                    "u4" => Self::UInt32,
                    "u8" => Self::UInt64,
                    "f4" => Self::Float32,
                    "f8" => Self::Float64,
                    "O" => Self::Object,
                    _ if is_string_code(code) => Self::Object,
                    _ => return Err(UnsupportedDataTypeError(name.to_string())),
                }
            }
        };
        Ok(data_type)
    }

    /// Returns the fields of a structured data type.
    #[must_use]
    pub fn fields(&self) -> Option<&[StructuredField]> {
        if let Self::Structured(fields) = self {
            Some(fields)
        } else {
            None
        }
    }

    /// Returns true if the data type is structured.
    #[must_use]
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    /// Returns true if the data type is a signed or unsigned integer.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::UInt8
                | Self::UInt16
                | Self::UInt32
                | Self::UInt64
        )
    }

    /// Returns true if the data type is a floating point type.
    #[must_use]
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Returns true if the data type supports arithmetic.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Bool) || self.is_integer() || self.is_float()
    }
}

fn is_string_code(code: &str) -> bool {
    code.strip_prefix(&['U', 'S'][..])
        .is_some_and(|size| size.chars().all(|c| c.is_ascii_digit()))
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

impl std::str::FromStr for DataType {
    type Err = UnsupportedDataTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}
