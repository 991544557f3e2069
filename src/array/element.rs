use ndarray::ArrayD;
use num::{NumCast, ToPrimitive};

use crate::value::Value;

use super::{ArrayData, DataType};

/// An array element type.
///
/// Implemented for `bool`, the primitive integer and float types, and [`Value`] (the [object](DataType::Object) type).
pub trait Element: Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// The data type of the element.
    const DATA_TYPE: DataType;

    /// The zero element, used to fill new arrays.
    fn zero() -> Self;

    /// Returns the array if `data` has this element type.
    fn array(data: &ArrayData) -> Option<&ArrayD<Self>>;

    /// Returns the mutable array if `data` has this element type.
    fn array_mut(data: &mut ArrayData) -> Option<&mut ArrayD<Self>>;

    /// Wrap an array of this element type.
    fn into_data(array: ArrayD<Self>) -> ArrayData;

    /// Convert the element to a [`Value`].
    fn to_value(&self) -> Value;

    /// Coerce a [`Value`] to the element type.
    ///
    /// Integers are range checked, floats convert to integers only if integral, and booleans convert to 0 or 1.
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_element_accessors {
    ($variant:ident) => {
        fn array(data: &ArrayData) -> Option<&ArrayD<Self>> {
            if let ArrayData::$variant(array) = data {
                Some(array)
            } else {
                None
            }
        }

        fn array_mut(data: &mut ArrayData) -> Option<&mut ArrayD<Self>> {
            if let ArrayData::$variant(array) = data {
                Some(array)
            } else {
                None
            }
        }

        fn into_data(array: ArrayD<Self>) -> ArrayData {
            ArrayData::$variant(array)
        }
    };
}

macro_rules! impl_element_int {
    ($type:ty, $variant:ident) => {
        impl Element for $type {
            const DATA_TYPE: DataType = DataType::$variant;

            fn zero() -> Self {
                0
            }

            impl_element_accessors!($variant);

            // only a u64 can exceed i64::MAX
            #[allow(clippy::cast_sign_loss, clippy::cast_lossless, clippy::unnecessary_cast)]
            fn to_value(&self) -> Value {
                match self.to_i64() {
                    Some(value) => Value::Int(value),
                    None => Value::UInt(*self as u64),
                }
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::Int(value) => <$type>::try_from(*value).ok(),
                    Value::UInt(value) => <$type>::try_from(*value).ok(),
                    Value::Bool(value) => Some(<$type as From<bool>>::from(*value)),
                    Value::Float(value) if value.fract() == 0.0 => NumCast::from(*value),
                    _ => None,
                }
            }
        }
    };
}

macro_rules! impl_element_float {
    ($type:ty, $variant:ident) => {
        impl Element for $type {
            const DATA_TYPE: DataType = DataType::$variant;

            fn zero() -> Self {
                0.0
            }

            impl_element_accessors!($variant);

            fn to_value(&self) -> Value {
                Value::Float(<f64 as From<$type>>::from(*self))
            }

            #[allow(clippy::cast_possible_truncation)]
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::Int(value) => NumCast::from(*value),
                    Value::UInt(value) => NumCast::from(*value),
                    Value::Float(value) => Some(*value as $type),
                    Value::Bool(value) => Some(if *value { 1.0 } else { 0.0 }),
                    _ => None,
                }
            }
        }
    };
}

impl_element_int!(i8, Int8);
impl_element_int!(i16, Int16);
impl_element_int!(i32, Int32);
impl_element_int!(i64, Int64);
impl_element_int!(u8, UInt8);
impl_element_int!(u16, UInt16);
impl_element_int!(u32, UInt32);
impl_element_int!(u64, UInt64);
impl_element_float!(f32, Float32);
impl_element_float!(f64, Float64);

impl Element for bool {
    const DATA_TYPE: DataType = DataType::Bool;

    fn zero() -> Self {
        false
    }

    impl_element_accessors!(Bool);

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(value) => Some(*value),
            Value::Int(0) => Some(false),
            Value::Int(1) => Some(true),
            _ => None,
        }
    }
}

impl Element for Value {
    const DATA_TYPE: DataType = DataType::Object;

    fn zero() -> Self {
        Value::Null
    }

    impl_element_accessors!(Object);

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_coercion() {
        assert_eq!(u8::from_value(&Value::Int(255)), Some(255));
        assert_eq!(u8::from_value(&Value::Int(256)), None);
        assert_eq!(i32::from_value(&Value::Float(4.0)), Some(4));
        assert_eq!(i32::from_value(&Value::Float(4.5)), None);
        assert_eq!(i32::from_value(&Value::Float(f64::NAN)), None);
        assert_eq!(i16::from_value(&Value::Bool(true)), Some(1));
        assert_eq!(f32::from_value(&Value::Int(3)), Some(3.0));
        assert_eq!(bool::from_value(&Value::Int(2)), None);
        assert_eq!(f64::from_value(&Value::String("1".into())), None);
        assert_eq!(u64::MAX.to_value(), Value::UInt(u64::MAX));
        assert_eq!(u64::from_value(&Value::UInt(u64::MAX)), Some(u64::MAX));
        assert_eq!(i64::from_value(&Value::UInt(u64::MAX)), None);
        assert_eq!(7_u64.to_value(), Value::Int(7));
    }
}
