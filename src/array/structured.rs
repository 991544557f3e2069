use itertools::Itertools;
use ndarray::{ArrayD, IxDyn};

use crate::value::Value;

use super::{ArrayData, ArrayError, DataType, StructuredField};

/// A one-dimensional array of records with named fields.
///
/// Each field is stored as a separate column [`ArrayData`] of the same length.
#[derive(Clone, Debug, PartialEq)]
pub struct StructuredArray {
    len: usize,
    fields: Vec<(String, ArrayData)>,
}

impl StructuredArray {
    /// Create a structured array from named columns.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidStructuredData`] if there are no columns, a column is not one-dimensional or structured,
    /// column lengths differ, or a field name is repeated.
    pub fn new<S: Into<String>>(
        fields: impl IntoIterator<Item = (S, ArrayData)>,
    ) -> Result<Self, ArrayError> {
        let fields: Vec<(String, ArrayData)> = fields
            .into_iter()
            .map(|(name, column)| (name.into(), column))
            .collect();
        let Some((_, first)) = fields.first() else {
            return Err(ArrayError::InvalidStructuredData(
                "no fields".to_string(),
            ));
        };
        let len = first.shape().first().copied().unwrap_or_default();
        for (name, column) in &fields {
            if column.data_type().is_structured() || column.shape() != [len] {
                return Err(ArrayError::InvalidStructuredData(format!(
                    "field {name} with data type {} and shape {:?} is not a column of length {len}",
                    column.data_type(),
                    column.shape()
                )));
            }
        }
        if !fields.iter().map(|(name, _)| name).all_unique() {
            return Err(ArrayError::InvalidStructuredData(
                "duplicate field names".to_string(),
            ));
        }
        Ok(Self { len, fields })
    }

    /// Create a structured array of `len` zero records.
    #[must_use]
    pub fn zeros(fields: &[StructuredField], len: usize) -> Self {
        let fields = fields
            .iter()
            .map(|field| {
                (
                    field.name().to_string(),
                    ArrayData::zeros(field.data_type(), &[len]),
                )
            })
            .collect();
        Self { len, fields }
    }

    /// Create a structured array from records, each a [`Value::List`] with one value per field.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if a record has the wrong number of values or a value is incompatible with its field.
    pub fn from_records(fields: &[StructuredField], records: &[Value]) -> Result<Self, ArrayError> {
        let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(records.len()); fields.len()];
        for record in records {
            let values = match record {
                Value::List(values) if values.len() == fields.len() => values,
                _ => {
                    return Err(ArrayError::InvalidStructuredData(format!(
                        "record {record} does not have {} fields",
                        fields.len()
                    )))
                }
            };
            for (column, value) in columns.iter_mut().zip(values) {
                column.push(value.clone());
            }
        }
        let fields = fields
            .iter()
            .zip(columns)
            .map(|(field, column)| {
                let column = ArrayData::from_values(field.data_type(), &[records.len()], column)?;
                Ok((field.name().to_string(), column))
            })
            .collect::<Result<Vec<_>, ArrayError>>()?;
        Ok(Self {
            len: records.len(),
            fields,
        })
    }

    /// The number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The structured data type.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        DataType::Structured(
            self.fields
                .iter()
                .filter_map(|(name, column)| StructuredField::new(name, column.data_type()).ok())
                .collect(),
        )
    }

    /// The field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// The named columns.
    #[must_use]
    pub fn fields(&self) -> &[(String, ArrayData)] {
        &self.fields
    }

    /// Returns the column of field `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&ArrayData> {
        self.fields
            .iter()
            .find_map(|(field, column)| (field == name).then_some(column))
    }

    pub(super) fn field_data_mut(&mut self, name: &str) -> Option<&mut ArrayData> {
        self.fields
            .iter_mut()
            .find_map(|(field, column)| (field == name).then_some(column))
    }

    /// Returns the record at `index`.
    #[must_use]
    pub fn record(&self, index: usize) -> Option<Vec<Value>> {
        (index < self.len).then(|| {
            self.fields
                .iter()
                .map(|(_, column)| column.value(&[index]).unwrap_or_default())
                .collect()
        })
    }

    /// Returns every record as a [`Value::List`].
    #[must_use]
    pub fn records(&self) -> Vec<Value> {
        let columns: Vec<Vec<Value>> = self
            .fields
            .iter()
            .map(|(_, column)| column.to_values())
            .collect();
        (0..self.len)
            .map(|index| {
                Value::List(
                    columns
                        .iter()
                        .map(|column| column[index].clone())
                        .collect(),
                )
            })
            .collect()
    }

    /// Keep only the records for which `keep` is true.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidStructuredData`] if `keep` does not have one entry per record.
    pub fn select(&self, keep: &[bool]) -> Result<Self, ArrayError> {
        if keep.len() != self.len {
            return Err(ArrayError::InvalidStructuredData(format!(
                "selection of length {} for {} records",
                keep.len(),
                self.len
            )));
        }
        let fields = self
            .fields
            .iter()
            .map(|(name, column)| {
                let values = column
                    .to_values()
                    .into_iter()
                    .zip(keep)
                    .filter_map(|(value, keep)| keep.then_some(value))
                    .collect::<Vec<_>>();
                let len = values.len();
                Ok((
                    name.clone(),
                    ArrayData::from_values(&column.data_type(), &[len], values)?,
                ))
            })
            .collect::<Result<Vec<_>, ArrayError>>()?;
        Ok(Self {
            len: keep.iter().filter(|keep| **keep).count(),
            fields,
        })
    }

    /// Cast every column to [`DataType::Object`].
    pub(crate) fn into_object_columns(self) -> Result<Self, ArrayError> {
        let fields = self
            .fields
            .into_iter()
            .map(|(name, column)| Ok((name, column.cast(&DataType::Object)?)))
            .collect::<Result<Vec<_>, ArrayError>>()?;
        Ok(Self {
            len: self.len,
            fields,
        })
    }

    fn object_columns(&mut self) -> Result<Vec<&mut ArrayD<Value>>, ArrayError> {
        self.fields
            .iter_mut()
            .map(|(_, column)| match column {
                ArrayData::Object(array) => Ok(array),
                other => Err(ArrayError::UnsupportedOperation {
                    operation: "record append",
                    data_type: other.data_type(),
                }),
            })
            .collect()
    }

    /// Append a record to an array of object columns.
    ///
    /// Returns true if the backing storage was reallocated.
    /// Storage grows geometrically, so appends are amortised O(1).
    pub(crate) fn push_record(&mut self, record: Vec<Value>) -> Result<bool, ArrayError> {
        let mut columns = self.object_columns()?;
        if record.len() != columns.len() {
            return Err(ArrayError::InvalidStructuredData(format!(
                "record with {} values for {} fields",
                record.len(),
                columns.len()
            )));
        }
        let mut reallocated = false;
        for (column, value) in columns.iter_mut().zip(record) {
            let mut values = take_values(column);
            let capacity = values.capacity();
            values.push(value);
            reallocated |= values.capacity() != capacity;
            **column = ArrayD::from_shape_vec(IxDyn(&[values.len()]), values)?;
        }
        self.len += 1;
        Ok(reallocated)
    }

    /// Overwrite the record at `index` of an array of object columns.
    pub(crate) fn set_record(&mut self, index: usize, record: Vec<Value>) -> Result<(), ArrayError> {
        let len = self.len;
        let mut columns = self.object_columns()?;
        if record.len() != columns.len() || index >= len {
            return Err(ArrayError::InvalidStructuredData(format!(
                "record {index} with {} values for {} fields and {len} records",
                record.len(),
                columns.len()
            )));
        }
        for (column, value) in columns.iter_mut().zip(record) {
            if let Some(element) = column.as_slice_mut().and_then(|slice| slice.get_mut(index)) {
                *element = value;
            }
        }
        Ok(())
    }

    /// Resize an array of object columns to `len` records, padding with [`Value::Null`].
    pub(crate) fn resize(&mut self, len: usize) -> Result<(), ArrayError> {
        for column in self.object_columns()? {
            let mut values = take_values(column);
            values.resize(len, Value::Null);
            *column = ArrayD::from_shape_vec(IxDyn(&[len]), values)?;
        }
        self.len = len;
        Ok(())
    }
}

/// Take the elements of a one-dimensional column, keeping its allocation.
fn take_values(column: &mut ArrayD<Value>) -> Vec<Value> {
    let array = std::mem::replace(column, ArrayD::from_elem(IxDyn(&[0]), Value::Null));
    let array = if array.is_standard_layout() {
        array
    } else {
        array.as_standard_layout().into_owned()
    };
    let len = array.len();
    let (mut values, offset) = array.into_raw_vec_and_offset();
    if let Some(offset) = offset.filter(|offset| *offset > 0) {
        values.drain(..offset);
    }
    values.truncate(len);
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Vec<StructuredField> {
        vec![
            StructuredField::new("a", DataType::Float64).unwrap(),
            StructuredField::new("b", DataType::Int32).unwrap(),
        ]
    }

    #[test]
    fn structured_from_records() {
        let records = [
            Value::List(vec![1.5.into(), Value::Int(1)]),
            Value::List(vec![2.5.into(), Value::Int(2)]),
        ];
        let array = StructuredArray::from_records(&fields(), &records).unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array.records(), records);
        assert_eq!(
            array.field("b").unwrap().as_array::<i32>().unwrap().as_slice(),
            Some(&[1, 2][..])
        );
        assert!(array.field("c").is_none());
        assert_eq!(array.data_type(), DataType::Structured(fields()));

        let bad = [Value::List(vec![1.5.into()])];
        assert!(StructuredArray::from_records(&fields(), &bad).is_err());
    }

    #[test]
    fn structured_new_validates_columns() {
        let a = ArrayData::from(vec![1.0_f64, 2.0]);
        let b = ArrayData::from(vec![1_i32, 2, 3]);
        assert!(StructuredArray::new([("a", a.clone()), ("b", b)]).is_err());
        assert!(StructuredArray::new([("a", a.clone()), ("a", a.clone())]).is_err());
        assert_eq!(StructuredArray::new([("a", a)]).unwrap().len(), 2);
    }

    #[test]
    fn structured_push_and_resize() {
        let object = vec![StructuredField::new("m", DataType::Object).unwrap()];
        let mut array = StructuredArray::zeros(&object, 0);
        let mut reallocations = 0;
        for i in 0..100 {
            if array.push_record(vec![Value::Int(i)]).unwrap() {
                reallocations += 1;
            }
        }
        assert_eq!(array.len(), 100);
        assert!(reallocations <= 10);
        assert_eq!(array.record(99), Some(vec![Value::Int(99)]));

        array.resize(120).unwrap();
        assert_eq!(array.record(110), Some(vec![Value::Null]));
        array.set_record(110, vec!["x".into()]).unwrap();
        assert_eq!(array.record(110), Some(vec!["x".into()]));

        let keep: Vec<bool> = (0..120).map(|i| i % 2 == 0).collect();
        assert_eq!(array.select(&keep).unwrap().len(), 60);
    }
}
