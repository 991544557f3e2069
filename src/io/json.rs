//! The JSON hierarchy format, version 1.0.
//!
//! A file starts with the provenance line
//! ```text
//! #File created with: labio JSONWriter version 1.0
//! ```
//! followed by one JSON object representing the root group.
//!
//! - An object with both a `dtype` and a `data` key is a dataset.
//!   `dtype` is a type string (e.g. `<f8`) or a list of `[name, type]` pairs for a structured dataset,
//!   `data` holds the nested array, and every other key is dataset metadata.
//! - Any other object is a group. Its object values are child groups or datasets and its other values are group metadata.
//!
//! Non-finite floats are written as the tokens `NaN`, `Infinity` and `-Infinity`.
//! One-dimensional lists are written on a single line.
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use labio::{dataset::DatasetBuilder, io::json::{JsonReader, JsonWriter}};
//! let mut writer = JsonWriter::default();
//! writer.root_mut().metadata_mut().insert("operator", "J. Doe")?;
//! writer.root_mut().create_dataset("a/b", DatasetBuilder::new().data(vec![1, 2, 3]))?;
//! let text = writer.to_string(&writer)?;
//! assert_eq!(
//!     text,
//!     r#"#File created with: labio JSONWriter version 1.0
//! {
//!   "operator": "J. Doe",
//!   "a": {
//!     "b": {
//!       "dtype": "<i4",
//!       "data": [1,2,3]
//!     }
//!   }
//! }"#
//! );
//! let root = JsonReader::new().read_str(&text)?;
//! assert!(root == *writer);
//! # Ok(())
//! # }
//! ```

mod json_encoder;
mod json_parser;
mod json_reader;
mod json_writer;

pub use json_encoder::JsonEncoder;
pub use json_parser::{parse, JsonParseError};
pub use json_reader::JsonReader;
pub use json_writer::{JsonWriter, JsonWriterOptions};

use crate::value::Value;

/// The provenance line of a version 1.0 file.
pub const HEADER: &str = "#File created with: labio JSONWriter version 1.0";

/// The key holding the data type of a dataset.
pub const DTYPE_KEY: &str = "dtype";

/// The key holding the data of a dataset.
pub const DATA_KEY: &str = "data";

/// The maximum nesting depth of lists and maps that is read or written.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Encode `value` on a single line, e.g. `{"a": [1, 2.5, NaN]}`.
#[must_use]
pub fn encode_compact(value: &Value) -> String {
    JsonEncoder::new(None, false).encode(value)
}
