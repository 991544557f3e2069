//! Elementwise arithmetic and reductions.
//!
//! Binary operations broadcast their operands and promote them to a common data type:
//! - integers of the same type keep their type and wrap on overflow,
//! - mixed integers (and booleans) promote to `int64`,
//! - any float promotes to `float64`, unless both operands are `float32`,
//! - division always produces a float.
//!
//! Object and structured arrays do not support arithmetic.

use ndarray::{ArrayD, Zip};

use crate::value::Value;

use super::{ArrayData, ArrayError, DataType, Element};

/// A binary elementwise operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
    /// Addition.
    Add,
    /// Subtraction.
    Subtract,
    /// Multiplication.
    Multiply,
    /// True division.
    Divide,
}

/// A unary elementwise operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOperator {
    /// Negation.
    Negative,
    /// Absolute value.
    Absolute,
}

impl BinaryOperator {
    /// The operator name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
        }
    }
}

impl UnaryOperator {
    /// The operator name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Negative => "negative",
            Self::Absolute => "absolute",
        }
    }
}

trait Arithmetic: Element + Copy {
    fn add(self, other: Self) -> Self;
    fn subtract(self, other: Self) -> Self;
    fn multiply(self, other: Self) -> Self;
    fn divide(self, other: Self) -> Self;
    fn negative(self) -> Self;
    fn absolute(self) -> Self;

    fn binary(self, operator: BinaryOperator, other: Self) -> Self {
        match operator {
            BinaryOperator::Add => self.add(other),
            BinaryOperator::Subtract => self.subtract(other),
            BinaryOperator::Multiply => self.multiply(other),
            BinaryOperator::Divide => self.divide(other),
        }
    }

    fn unary(self, operator: UnaryOperator) -> Self {
        match operator {
            UnaryOperator::Negative => self.negative(),
            UnaryOperator::Absolute => self.absolute(),
        }
    }
}

macro_rules! impl_arithmetic_int {
    ($type:ty, $absolute:expr) => {
        impl Arithmetic for $type {
            fn add(self, other: Self) -> Self {
                self.wrapping_add(other)
            }
            fn subtract(self, other: Self) -> Self {
                self.wrapping_sub(other)
            }
            fn multiply(self, other: Self) -> Self {
                self.wrapping_mul(other)
            }
            // Integer operands are promoted to float before division.
            fn divide(self, other: Self) -> Self {
                self.checked_div(other).unwrap_or_default()
            }
            fn negative(self) -> Self {
                self.wrapping_neg()
            }
            fn absolute(self) -> Self {
                $absolute(self)
            }
        }
    };
}

macro_rules! impl_arithmetic_float {
    ($type:ty) => {
        impl Arithmetic for $type {
            fn add(self, other: Self) -> Self {
                self + other
            }
            fn subtract(self, other: Self) -> Self {
                self - other
            }
            fn multiply(self, other: Self) -> Self {
                self * other
            }
            fn divide(self, other: Self) -> Self {
                self / other
            }
            fn negative(self) -> Self {
                -self
            }
            fn absolute(self) -> Self {
                self.abs()
            }
        }
    };
}

impl_arithmetic_int!(i8, i8::wrapping_abs);
impl_arithmetic_int!(i16, i16::wrapping_abs);
impl_arithmetic_int!(i32, i32::wrapping_abs);
impl_arithmetic_int!(i64, i64::wrapping_abs);
impl_arithmetic_int!(u8, std::convert::identity);
impl_arithmetic_int!(u16, std::convert::identity);
impl_arithmetic_int!(u32, std::convert::identity);
impl_arithmetic_int!(u64, std::convert::identity);
impl_arithmetic_float!(f32);
impl_arithmetic_float!(f64);

/// Returns the shape of two broadcast shapes.
///
/// Shapes are aligned from their last dimension; each pair of dimensions must be equal or one of them must be 1.
///
/// # Errors
/// Returns [`ArrayError::IncompatibleShapes`] if the shapes cannot be broadcast together.
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Result<Vec<usize>, ArrayError> {
    let ndim = a.len().max(b.len());
    let dim = |shape: &[usize], i: usize| {
        (i + shape.len())
            .checked_sub(ndim)
            .map_or(1, |i| shape[i])
    };
    (0..ndim)
        .map(|i| match (dim(a, i), dim(b, i)) {
            (x, y) if x == y => Ok(x),
            (1, y) => Ok(y),
            (x, 1) => Ok(x),
            _ => Err(ArrayError::IncompatibleShapes(a.to_vec(), b.to_vec())),
        })
        .collect()
}

fn promote(operator: BinaryOperator, a: &DataType, b: &DataType) -> Option<DataType> {
    if !a.is_numeric() || !b.is_numeric() {
        return None;
    }
    let data_type = if a.is_float() || b.is_float() || operator == BinaryOperator::Divide {
        if a == &DataType::Float32 && b == &DataType::Float32 {
            DataType::Float32
        } else {
            DataType::Float64
        }
    } else if a == b && a != &DataType::Bool {
        a.clone()
    } else {
        DataType::Int64
    };
    Some(data_type)
}

fn binary_of<T: Arithmetic>(
    a: &ArrayD<T>,
    b: &ArrayD<T>,
    operator: BinaryOperator,
) -> Result<ArrayD<T>, ArrayError> {
    let shape = broadcast_shape(a.shape(), b.shape())?;
    let incompatible = || ArrayError::IncompatibleShapes(a.shape().to_vec(), b.shape().to_vec());
    let a = a.broadcast(shape.clone()).ok_or_else(incompatible)?;
    let b = b.broadcast(shape).ok_or_else(incompatible)?;
    Ok(Zip::from(&a)
        .and(&b)
        .map_collect(|&x, &y| x.binary(operator, y)))
}

impl ArrayData {
    /// Apply a binary elementwise operator, broadcasting the operands.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if either operand is not numeric or the shapes cannot be broadcast together.
    pub fn binary(&self, operator: BinaryOperator, other: &ArrayData) -> Result<ArrayData, ArrayError> {
        let data_type = promote(operator, &self.data_type(), &other.data_type()).ok_or_else(|| {
            ArrayError::UnsupportedOperation {
                operation: operator.name(),
                data_type: if self.data_type().is_numeric() {
                    other.data_type()
                } else {
                    self.data_type()
                },
            }
        })?;
        let result = match (self.cast(&data_type)?, other.cast(&data_type)?) {
            (Self::Int8(a), Self::Int8(b)) => binary_of(&a, &b, operator)?.into(),
            (Self::Int16(a), Self::Int16(b)) => binary_of(&a, &b, operator)?.into(),
            (Self::Int32(a), Self::Int32(b)) => binary_of(&a, &b, operator)?.into(),
            (Self::Int64(a), Self::Int64(b)) => binary_of(&a, &b, operator)?.into(),
            (Self::UInt8(a), Self::UInt8(b)) => binary_of(&a, &b, operator)?.into(),
            (Self::UInt16(a), Self::UInt16(b)) => binary_of(&a, &b, operator)?.into(),
            (Self::UInt32(a), Self::UInt32(b)) => binary_of(&a, &b, operator)?.into(),
            (Self::UInt64(a), Self::UInt64(b)) => binary_of(&a, &b, operator)?.into(),
            (Self::Float32(a), Self::Float32(b)) => binary_of(&a, &b, operator)?.into(),
            (Self::Float64(a), Self::Float64(b)) => binary_of(&a, &b, operator)?.into(),
            _ => {
                return Err(ArrayError::UnsupportedOperation {
                    operation: operator.name(),
                    data_type,
                })
            }
        };
        Ok(result)
    }

    /// Apply a binary elementwise operator with a scalar operand.
    ///
    /// An integer scalar takes the data type of a numeric array, and a float scalar that of a float array.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the array is not numeric or the scalar cannot be represented by the array data type.
    pub fn binary_scalar(
        &self,
        operator: BinaryOperator,
        scalar: impl Into<Value>,
    ) -> Result<ArrayData, ArrayError> {
        let scalar = scalar.into();
        let data_type = self.data_type();
        let scalar_type = match &scalar {
            Value::Int(_) | Value::UInt(_) if data_type.is_integer() || data_type.is_float() => {
                data_type
            }
            Value::Float(_) if data_type.is_float() => data_type,
            Value::Int(_) => DataType::Int64,
            Value::UInt(_) => DataType::UInt64,
            Value::Float(_) => DataType::Float64,
            Value::Bool(_) => DataType::Bool,
            _ => DataType::Object,
        };
        let scalar = ArrayData::from_values(&scalar_type, &[], vec![scalar])?;
        self.binary(operator, &scalar)
    }

    /// Apply a unary elementwise operator.
    ///
    /// # Errors
    /// Returns [`ArrayError::UnsupportedOperation`] if the array is not numeric.
    pub fn unary(&self, operator: UnaryOperator) -> Result<ArrayData, ArrayError> {
        Ok(match self {
            Self::Bool(_) => self
                .cast(&DataType::Int64)?
                .unary(operator)?,
            Self::Int8(a) => a.mapv(|x| x.unary(operator)).into(),
            Self::Int16(a) => a.mapv(|x| x.unary(operator)).into(),
            Self::Int32(a) => a.mapv(|x| x.unary(operator)).into(),
            Self::Int64(a) => a.mapv(|x| x.unary(operator)).into(),
            Self::UInt8(a) => a.mapv(|x| x.unary(operator)).into(),
            Self::UInt16(a) => a.mapv(|x| x.unary(operator)).into(),
            Self::UInt32(a) => a.mapv(|x| x.unary(operator)).into(),
            Self::UInt64(a) => a.mapv(|x| x.unary(operator)).into(),
            Self::Float32(a) => a.mapv(|x| x.unary(operator)).into(),
            Self::Float64(a) => a.mapv(|x| x.unary(operator)).into(),
            Self::Object(_) | Self::Structured(_) => {
                return Err(ArrayError::UnsupportedOperation {
                    operation: operator.name(),
                    data_type: self.data_type(),
                })
            }
        })
    }

    /// The sum of all elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the array is not numeric.
    pub fn sum(&self) -> Result<f64, ArrayError> {
        Ok(self.to_float64()?.sum())
    }

    /// The mean of all elements, `NaN` if the array is empty.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the array is not numeric.
    pub fn mean(&self) -> Result<f64, ArrayError> {
        Ok(self.to_float64()?.mean().unwrap_or(f64::NAN))
    }

    /// The minimum element, [`None`] if the array is empty. `NaN` propagates.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the array is not numeric.
    pub fn min(&self) -> Result<Option<f64>, ArrayError> {
        Ok(reduce(&self.to_float64()?, f64::min))
    }

    /// The maximum element, [`None`] if the array is empty. `NaN` propagates.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the array is not numeric.
    pub fn max(&self) -> Result<Option<f64>, ArrayError> {
        Ok(reduce(&self.to_float64()?, f64::max))
    }
}

fn reduce(array: &ArrayD<f64>, f: fn(f64, f64) -> f64) -> Option<f64> {
    array.iter().copied().reduce(|acc, x| {
        if acc.is_nan() || x.is_nan() {
            f64::NAN
        } else {
            f(acc, x)
        }
    })
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn elementwise_broadcast_shape() {
        assert_eq!(broadcast_shape(&[2, 3], &[3]).unwrap(), vec![2, 3]);
        assert_eq!(broadcast_shape(&[4, 1], &[1, 5]).unwrap(), vec![4, 5]);
        assert_eq!(broadcast_shape(&[], &[2]).unwrap(), vec![2]);
        assert!(broadcast_shape(&[2, 3], &[2]).is_err());
    }

    #[test]
    fn elementwise_binary() {
        let a = ArrayData::from(vec![1_i32, 2, 3]);
        let b = ArrayData::from(vec![4_i32, 5, 6]);
        assert_eq!(
            a.binary(BinaryOperator::Add, &b).unwrap(),
            ArrayData::from(vec![5_i32, 7, 9])
        );
        assert_eq!(
            a.binary(BinaryOperator::Divide, &b).unwrap(),
            ArrayData::from(vec![0.25, 0.4, 0.5])
        );
        let c = ArrayData::from(array![[1.0_f64], [2.0]]);
        assert_eq!(
            a.binary(BinaryOperator::Multiply, &c).unwrap(),
            ArrayData::from(array![[1.0, 2.0, 3.0], [2.0, 4.0, 6.0]])
        );
        let overflow = ArrayData::from(vec![i8::MAX]);
        assert_eq!(
            overflow.binary_scalar(BinaryOperator::Add, 1).unwrap(),
            ArrayData::from(vec![i8::MIN])
        );
        assert!(a
            .binary(BinaryOperator::Add, &ArrayData::from(vec![1_i32, 2]))
            .is_err());
        assert!(ArrayData::from(vec![Value::Null])
            .binary(BinaryOperator::Add, &a)
            .is_err());
    }

    #[test]
    fn elementwise_scalar_promotion() {
        let a = ArrayData::from(vec![1_u8, 2]);
        assert_eq!(
            a.binary_scalar(BinaryOperator::Multiply, 3).unwrap(),
            ArrayData::from(vec![3_u8, 6])
        );
        assert_eq!(
            a.binary_scalar(BinaryOperator::Subtract, 0.5).unwrap(),
            ArrayData::from(vec![0.5_f64, 1.5])
        );
        let f = ArrayData::from(vec![1.0_f32]);
        assert_eq!(
            f.binary_scalar(BinaryOperator::Add, 1).unwrap().data_type(),
            DataType::Float32
        );
    }

    #[test]
    fn elementwise_unary_and_reductions() {
        let a = ArrayData::from(vec![-1_i64, 2, -3]);
        assert_eq!(
            a.unary(UnaryOperator::Absolute).unwrap(),
            ArrayData::from(vec![1_i64, 2, 3])
        );
        assert_eq!(
            a.unary(UnaryOperator::Negative).unwrap(),
            ArrayData::from(vec![1_i64, -2, 3])
        );
        assert_eq!(a.sum().unwrap(), -2.0);
        assert_eq!(a.min().unwrap(), Some(-3.0));
        assert_eq!(a.max().unwrap(), Some(2.0));
        assert!((a.mean().unwrap() + 2.0 / 3.0).abs() < 1e-12);

        let nan = ArrayData::from(vec![1.0, f64::NAN]);
        assert!(nan.max().unwrap().unwrap().is_nan());
        assert_eq!(ArrayData::from(Vec::<f64>::new()).min().unwrap(), None);
        assert!(ArrayData::from(vec![Value::from("a")]).sum().is_err());
    }
}
