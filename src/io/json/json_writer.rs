use std::{
    fs::OpenOptions,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use derive_more::{Deref, DerefMut};
use indexmap::IndexMap;

use crate::{
    config::global_config,
    dataset::Dataset,
    group::{GroupView, Root},
    io::{WriteError, Writer},
    metadata::Metadata,
    node::Node,
    value::Value,
};

use super::{JsonEncoder, DATA_KEY, DTYPE_KEY, HEADER, MAX_NESTING_DEPTH};

/// [`JsonWriter`] options.
///
/// The defaults are taken from the [global configuration](crate::config::global_config).
#[derive(Clone, Debug)]
pub struct JsonWriterOptions {
    indent: Option<usize>,
    sort_keys: bool,
    overwrite: bool,
}

impl Default for JsonWriterOptions {
    fn default() -> Self {
        let config = global_config();
        Self {
            indent: config.json_indent(),
            sort_keys: config.json_sort_keys(),
            overwrite: false,
        }
    }
}

impl JsonWriterOptions {
    /// Get the indentation. [`None`] writes the payload on a single line.
    #[must_use]
    pub fn indent(&self) -> Option<usize> {
        self.indent
    }

    /// Set the indentation.
    #[must_use]
    pub fn with_indent(mut self, indent: Option<usize>) -> Self {
        self.indent = indent;
        self
    }

    /// Get the sort keys option.
    #[must_use]
    pub fn sort_keys(&self) -> bool {
        self.sort_keys
    }

    /// Set the sort keys option.
    #[must_use]
    pub fn with_sort_keys(mut self, sort_keys: bool) -> Self {
        self.sort_keys = sort_keys;
        self
    }

    /// Get the overwrite option.
    #[must_use]
    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Set the overwrite option. An existing file is not replaced unless it is enabled.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// Writes a hierarchy in the [JSON format](super).
///
/// A writer owns a [`Root`] (accessible through [`Deref`](std::ops::Deref)) that is written to its file with [`JsonWriter::save`].
/// Any other hierarchy can be written with [`JsonWriter::write`], for example to convert a file read by another [`Reader`](crate::io::Reader).
///
/// A group whose metadata has a key equal to the name of a child, or a dataset with `dtype` or `data` metadata, cannot be written.
/// The shape of a dataset is not written, so an empty dataset with a leading zero dimension (e.g. `[0, 3]`) is written as `[]`
/// and reads back with shape `[0]`.
#[derive(Debug, Default, Deref, DerefMut)]
pub struct JsonWriter {
    #[deref]
    #[deref_mut]
    root: Root,
    options: JsonWriterOptions,
}

impl JsonWriter {
    /// Create a writer of an empty hierarchy to `file`.
    #[must_use]
    pub fn new(file: impl Into<PathBuf>) -> Self {
        let mut root = Root::new();
        root.set_file(Some(file.into()));
        Self::from_root(root)
    }

    /// Create a writer of `root`.
    #[must_use]
    pub fn from_root(root: Root) -> Self {
        Self {
            root,
            options: JsonWriterOptions::default(),
        }
    }

    /// Set the options.
    #[must_use]
    pub fn with_options(mut self, options: JsonWriterOptions) -> Self {
        self.options = options;
        self
    }

    /// Get the options.
    #[must_use]
    pub fn options(&self) -> &JsonWriterOptions {
        &self.options
    }

    /// Get a mutable reference to the options.
    pub fn options_mut(&mut self) -> &mut JsonWriterOptions {
        &mut self.options
    }

    /// Convert into the owned hierarchy.
    #[must_use]
    pub fn into_root(self) -> Root {
        self.root
    }

    /// Write the owned hierarchy to its file.
    ///
    /// # Errors
    /// Returns [`WriteError::NoFile`] if the hierarchy has no file, otherwise see [`JsonWriter::write`].
    pub fn save(&self) -> Result<(), WriteError> {
        let file = self.root.file().ok_or(WriteError::NoFile)?;
        self.write(file, &self.root)
    }

    /// Write `root` to `file`.
    ///
    /// # Errors
    /// Returns [`WriteError::FileExists`] if `file` exists and [`overwrite`](JsonWriterOptions::with_overwrite) is disabled,
    /// [`WriteError::KeyConflict`] or [`WriteError::TooDeep`] if `root` cannot be represented, or [`WriteError::Io`] on failure to write `file`.
    /// Nothing is written if `root` cannot be represented.
    pub fn write(&self, file: impl AsRef<Path>, root: &Root) -> Result<(), WriteError> {
        let file = file.as_ref();
        let text = self.to_string(root)?;
        let mut options = OpenOptions::new();
        options.write(true);
        if self.options.overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        let handle = options.open(file).map_err(|err| match err.kind() {
            std::io::ErrorKind::AlreadyExists => WriteError::FileExists(file.to_path_buf()),
            _ => err.into(),
        })?;
        let mut writer = BufWriter::new(handle);
        writer.write_all(text.as_bytes())?;
        writer.flush()?;
        log::debug!("wrote {} ({} bytes)", file.display(), text.len());
        Ok(())
    }

    /// Write `root` to `writer`.
    ///
    /// # Errors
    /// Returns [`WriteError::KeyConflict`] or [`WriteError::TooDeep`] if `root` cannot be represented, or [`WriteError::Io`] on failure to write.
    pub fn write_to<W: Write>(&self, mut writer: W, root: &Root) -> Result<(), WriteError> {
        writer.write_all(self.to_string(root)?.as_bytes())?;
        Ok(())
    }

    /// Encode `root`, including the provenance line.
    ///
    /// # Errors
    /// Returns [`WriteError::KeyConflict`] if `root` cannot be represented,
    /// or [`WriteError::TooDeep`] if it nests lists and maps deeper than [`MAX_NESTING_DEPTH`].
    pub fn to_string(&self, root: &Root) -> Result<String, WriteError> {
        let value = Value::Map(group_entries(root.root())?);
        let depth = value.depth();
        if depth > MAX_NESTING_DEPTH {
            return Err(WriteError::TooDeep {
                depth,
                max: MAX_NESTING_DEPTH,
            });
        }
        let encoder = JsonEncoder::new(self.options.indent, self.options.sort_keys);
        Ok(format!("{HEADER}\n{}", encoder.encode(&value)))
    }
}

impl Writer for JsonWriter {
    fn write(&self, file: &Path, root: &Root) -> Result<(), WriteError> {
        JsonWriter::write(self, file, root)
    }
}

fn metadata_entries(metadata: &Metadata) -> IndexMap<String, Value> {
    metadata
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_value()))
        .collect()
}

fn group_entries(group: GroupView) -> Result<IndexMap<String, Value>, WriteError> {
    let mut entries = metadata_entries(group.metadata());
    for (key, node) in group.iter() {
        let Some(name) = key.strip_prefix('/').filter(|name| !name.contains('/')) else {
            continue;
        };
        if entries.contains_key(name) {
            return Err(WriteError::KeyConflict(format!(
                "{} has metadata and a child named {name:?}",
                group.name()
            )));
        }
        let value = match node {
            Node::Group(_) => Value::Map(group_entries(group.group(name)?)?),
            Node::Dataset(dataset) => Value::Map(dataset_entries(dataset)?),
        };
        entries.insert(name.to_string(), value);
    }
    Ok(entries)
}

fn dataset_entries(dataset: &Dataset) -> Result<IndexMap<String, Value>, WriteError> {
    let mut entries = metadata_entries(dataset.metadata());
    for key in [DTYPE_KEY, DATA_KEY] {
        if entries.contains_key(key) {
            return Err(WriteError::KeyConflict(format!(
                "{} has reserved metadata key {key:?}",
                dataset.name()
            )));
        }
    }
    let data_type = dataset.data_type();
    let dtype = match data_type.fields() {
        Some(fields) => Value::List(
            fields
                .iter()
                .map(|field| {
                    Value::List(vec![
                        Value::from(field.name()),
                        Value::String(field.data_type().name()),
                    ])
                })
                .collect(),
        ),
        None => Value::from(data_type.type_str().unwrap_or_default()),
    };
    entries.insert(DTYPE_KEY.to_string(), dtype);
    entries.insert(DATA_KEY.to_string(), dataset.data().to_nested());
    Ok(entries)
}
