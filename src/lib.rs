//! A rust library for hierarchies of laboratory datasets and metadata.
//!
//! A hierarchy is organised like a UNIX filesystem:
//! - a [`Root`](group::Root) owns every [`Group`](group::Group) and [`Dataset`](dataset::Dataset) of the hierarchy,
//! - a group contains other groups and datasets, addressed by absolute path names such as `/raw/voltage`,
//! - a dataset holds a multidimensional array of a scalar or structured [`DataType`](array::DataType), and
//! - every group and dataset carries [`Metadata`](metadata::Metadata).
//!
//! Groups, datasets and metadata can be made read-only. Making a group read-only makes every descendant read-only.
//!
//! Hierarchies are written losslessly with a [`JsonWriter`](io::json::JsonWriter) and read back with [`read`], which dispatches to a registered [`Reader`](io::Reader).
//!
//! A [`DatasetLogging`](dataset::DatasetLogging) dataset records [`log`] records emitted through a [`LogSink`](dataset::LogSink).
//!
//! ## Example
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use labio::{
//!     dataset::{DatasetBuilder, DatasetOps},
//!     group::GroupBuilder,
//!     io::json::JsonWriter,
//! };
//!
//! let dir = tempfile::tempdir()?;
//! let path = dir.path().join("measurement.json");
//!
//! let mut writer = JsonWriter::new(&path);
//! let mut root = writer.root_mut();
//! root.metadata_mut().insert("operator", "J. Doe")?;
//! root.create_group("raw", GroupBuilder::new().metadata("instrument", "DMM"))?;
//! root.create_dataset(
//!     "raw/voltage",
//!     DatasetBuilder::new().data(vec![0.1, 0.2, 0.3]).metadata("unit", "V"),
//! )?;
//! writer.save()?;
//!
//! let root = labio::read(&path)?;
//! assert!(root == *writer);
//! assert!(root.read_only());
//! let voltage = root.root().dataset("raw/voltage")?;
//! assert_eq!(voltage.metadata().get("unit").and_then(|unit| unit.as_str()), Some("V"));
//! assert!((voltage.mean()? - 0.2).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```
//!
//! ## Licence
//! `labio` is licensed under either of
//!  - the Apache License, Version 2.0 [LICENSE-APACHE](./LICENCE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license [LICENSE-MIT](./LICENCE-MIT) or <http://opensource.org/licenses/MIT>, at your option.

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::missing_panics_doc)]

pub mod array;
pub mod config;
pub mod dataset;
pub mod group;
pub mod io;
pub mod metadata;
pub mod node;
pub mod value;

pub use io::read;
