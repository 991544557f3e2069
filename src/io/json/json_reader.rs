use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

use indexmap::IndexMap;

use crate::{
    array::{ArrayData, DataType},
    dataset::DatasetBuilder,
    group::{GroupBuilder, GroupViewMut, Root},
    io::{ReadError, Reader},
    metadata::MetadataValue,
    node::NodeName,
    value::Value,
};

use super::{parse, DATA_KEY, DTYPE_KEY};

/// The maximum number of bytes inspected for the provenance line.
const HEADER_LIMIT: u64 = 1024;

/// Reads a file written by a [`JsonWriter`](super::JsonWriter).
///
/// Lists in metadata are read as typed arrays, see [`ArrayData::infer`].
///
/// The shape of a dataset is that of its nested `data` lists. An empty dataset therefore reads back
/// one-dimensional: one written with shape `[0, 3]` reads as shape `[0]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonReader;

impl JsonReader {
    /// Create a new JSON reader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Returns true if `line` is a version 1.0 provenance line.
    #[must_use]
    pub fn is_header(line: &str) -> bool {
        let line = line.trim_end();
        line.starts_with('#') && line.contains("JSONWriter") && line.ends_with("version 1.0")
    }

    /// Reconstruct a hierarchy from the contents of a file.
    ///
    /// # Errors
    /// Returns [`ReadError::Malformed`] if `text` does not start with a provenance line or
    /// the payload is not a JSON object that maps to a hierarchy.
    pub fn read_str(&self, text: &str) -> Result<Root, ReadError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let (header, payload) = text.split_once('\n').unwrap_or((text, ""));
        if !header.starts_with('#') {
            return Err(ReadError::Malformed(
                "missing the provenance line".to_string(),
            ));
        }
        if payload.trim().is_empty() {
            return Err(ReadError::Malformed("missing the JSON payload".to_string()));
        }
        let value = parse(payload).map_err(|err| ReadError::Malformed(err.to_string()))?;
        let Value::Map(entries) = value else {
            return Err(ReadError::Malformed(format!(
                "expected an object, found a {}",
                value.kind()
            )));
        };
        let mut root = Root::new();
        populate_group(&mut root.root_mut(), entries)?;
        Ok(root)
    }
}

impl Reader for JsonReader {
    fn name(&self) -> &'static str {
        "JsonReader"
    }

    fn can_read(&self, file: &Path) -> Result<bool, ReadError> {
        let mut line = String::new();
        BufReader::new(File::open(file)?.take(HEADER_LIMIT)).read_line(&mut line)?;
        Ok(Self::is_header(&line))
    }

    fn read(&self, file: &Path) -> Result<Root, ReadError> {
        let text = std::fs::read_to_string(file)?;
        let mut root = self.read_str(&text)?;
        root.set_file(Some(file.to_path_buf()));
        Ok(root)
    }
}

fn is_dataset(entries: &IndexMap<String, Value>) -> bool {
    entries.contains_key(DTYPE_KEY) && entries.contains_key(DATA_KEY)
}

fn node_name(group: &GroupViewMut, key: &str) -> Result<NodeName, ReadError> {
    NodeName::new(key).map_err(|_| {
        ReadError::Malformed(format!(
            "invalid node name {key:?} in {}",
            group.view().name()
        ))
    })
}

fn populate_group(
    group: &mut GroupViewMut,
    entries: IndexMap<String, Value>,
) -> Result<(), ReadError> {
    for (key, value) in entries {
        match value {
            Value::Map(entries) if is_dataset(&entries) => {
                let name = node_name(group, &key)?;
                let builder = dataset_builder(entries).map_err(|message| {
                    ReadError::Malformed(format!(
                        "dataset {key:?} in {}: {message}",
                        group.view().name()
                    ))
                })?;
                group.create_dataset(name.as_str(), builder)?;
            }
            Value::Map(entries) => {
                let name = node_name(group, &key)?;
                group.create_group(name.as_str(), GroupBuilder::new())?;
                let mut child = group.group_mut_at(name.as_str())?;
                populate_group(&mut child, entries)?;
            }
            value => {
                group
                    .metadata_mut()
                    .insert(key, MetadataValue::from(value))
                    .map_err(crate::node::NodeError::from)?;
            }
        }
    }
    Ok(())
}

fn data_type(dtype: &Value) -> Result<DataType, String> {
    match dtype {
        Value::String(name) => DataType::from_name(name).map_err(|err| err.to_string()),
        Value::List(fields) => {
            let fields = fields
                .iter()
                .map(|field| match field.as_list() {
                    Some([Value::String(name), Value::String(data_type)]) => {
                        let data_type =
                            DataType::from_name(data_type).map_err(|err| err.to_string())?;
                        Ok((name.clone(), data_type))
                    }
                    _ => Err(format!("invalid structured field {field}")),
                })
                .collect::<Result<Vec<_>, String>>()?;
            DataType::structured(fields).map_err(|err| err.to_string())
        }
        _ => Err(format!("invalid dtype {dtype}")),
    }
}

fn dataset_builder(mut entries: IndexMap<String, Value>) -> Result<DatasetBuilder, String> {
    let dtype = entries.shift_remove(DTYPE_KEY).unwrap_or_default();
    let data = entries.shift_remove(DATA_KEY).unwrap_or_default();
    let data_type = data_type(&dtype)?;
    let data = ArrayData::from_nested(&data_type, &data).map_err(|err| err.to_string())?;
    Ok(entries.into_iter().fold(
        DatasetBuilder::new().data(data),
        |builder, (key, value)| builder.metadata(key, value),
    ))
}

#[cfg(test)]
mod tests {
    use crate::{io::ReadError, node::Node};

    use super::*;

    #[test]
    fn json_reader_header() {
        assert!(JsonReader::is_header(
            "#File created with: labio JSONWriter version 1.0\n"
        ));
        assert!(JsonReader::is_header(
            "#File created with: Acme JSONWriter version 1.0\r\n"
        ));
        assert!(!JsonReader::is_header("File created with: labio JSONWriter version 1.0"));
        assert!(!JsonReader::is_header("#File created with: labio JSONWriter version 2.0"));
        assert!(!JsonReader::is_header("{}"));
    }

    #[test]
    fn json_reader_empty_dataset_shape() {
        let text = r#"#File created with: labio JSONWriter version 1.0
{"e": {"dtype": "<f8", "data": []}, "f": {"dtype": "<i4", "data": [[], []]}}"#;
        let root = JsonReader::new().read_str(text).unwrap();
        let view = root.root();
        assert_eq!(view.dataset("e").unwrap().shape(), vec![0]);
        assert_eq!(view.dataset("f").unwrap().shape(), vec![2, 0]);
    }

    #[test]
    fn json_reader_read_str() {
        let text = r#"#File created with: labio JSONWriter version 1.0
{
  "x": [1,2,3],
  "y": NaN,
  "a": {
    "b": {
      "dtype": [["t", "float64"], ["v", "int32"]],
      "data": [[0.5, 1], [1.5, 2]],
      "unit": "V",
      "calibration": {"slope": 2.0}
    },
    "c": {
      "dtype": "<f8",
      "data": [[1.0, 2.0], [3.0, 4.0]]
    },
    "empty": {}
  }
}"#;
        let root = JsonReader::new().read_str(text).unwrap();
        let view = root.root();
        let x = view.metadata().get("x").and_then(MetadataValue::as_array).unwrap();
        assert_eq!(*x, ArrayData::from(vec![1_i64, 2, 3]));
        let y = view.metadata().get("y").and_then(MetadataValue::as_f64).unwrap();
        assert!(y.is_nan());

        let b = view.dataset("a/b").unwrap();
        assert_eq!(b.shape(), vec![2]);
        assert_eq!(
            b.data_type(),
            DataType::structured([("t", DataType::Float64), ("v", DataType::Int32)]).unwrap()
        );
        assert_eq!(b.metadata().get("unit").and_then(MetadataValue::as_str), Some("V"));
        let calibration = b
            .metadata()
            .get("calibration")
            .and_then(MetadataValue::as_metadata)
            .unwrap();
        assert_eq!(calibration.get("slope").and_then(MetadataValue::as_f64), Some(2.0));

        let c = view.dataset("a/c").unwrap();
        assert_eq!(c.shape(), vec![2, 2]);
        assert_eq!(c.data_type(), DataType::Float64);
        assert!(matches!(view.get("a/empty").unwrap(), Node::Group(_)));
        assert!(!root.read_only());
    }

    #[test]
    fn json_reader_malformed() {
        let reader = JsonReader::new();
        assert!(matches!(reader.read_str("{}"), Err(ReadError::Malformed(_))));
        assert!(matches!(
            reader.read_str("#File created with: labio JSONWriter version 1.0\n"),
            Err(ReadError::Malformed(_))
        ));
        assert!(matches!(
            reader.read_str("#File created with: labio JSONWriter version 1.0\n[1, 2]"),
            Err(ReadError::Malformed(_))
        ));
        assert!(matches!(
            reader.read_str("#\n{\"a\": {\"dtype\": \"<f7\", \"data\": []}}"),
            Err(ReadError::Malformed(_))
        ));
        assert!(matches!(
            reader.read_str("#\n{\"a/b\": {}}"),
            Err(ReadError::Malformed(_))
        ));
        assert!(matches!(
            reader.read_str("#\n{\"a\": {\"dtype\": \"<i4\", \"data\": [[1], [2, 3]]}}"),
            Err(ReadError::Malformed(_))
        ));
    }
}
