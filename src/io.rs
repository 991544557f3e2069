//! Reading and writing hierarchies.
//!
//! A [`Reader`] reconstructs a [`Root`] from a file and a [`Writer`] serializes a [`Root`] to a file.
//! The [`json`] format is the native format of this crate.
//!
//! [`read`] dispatches to the first reader of the default [`ReaderRegistry`] that claims it can read a file.
//! Additional readers are added to the default registry with [`default_registry_mut`]:
//! ```rust
//! # use std::path::Path;
//! # use labio::{group::Root, io::{default_registry_mut, ReadError, Reader}};
//! struct CsvReader;
//!
//! impl Reader for CsvReader {
//!     fn name(&self) -> &'static str {
//!         "CsvReader"
//!     }
//!
//!     fn can_read(&self, file: &Path) -> Result<bool, ReadError> {
//!         Ok(file.extension().is_some_and(|extension| extension == "csv"))
//!     }
//!
//!     fn read(&self, file: &Path) -> Result<Root, ReadError> {
//!         Ok(Root::new())
//!     }
//! }
//!
//! default_registry_mut().register(CsvReader);
//! ```

pub mod json;

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

use crate::{config::global_config, group::Root, node::NodeError};

/// A read error.
#[derive(Debug, Error)]
pub enum ReadError {
    /// An IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The file does not match the format of the reader.
    #[error("malformed file: {0}")]
    Malformed(String),
    /// No registered reader accepts the file.
    #[error("no reader is available to read {}", .0.display())]
    NoReader(PathBuf),
    /// The hierarchy could not be reconstructed.
    #[error(transparent)]
    Node(#[from] NodeError),
}

/// A write error.
#[derive(Debug, Error)]
pub enum WriteError {
    /// An IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The file exists and overwriting is disabled.
    #[error("file exists {}, enable overwrite to replace it", .0.display())]
    FileExists(PathBuf),
    /// A key is used by both metadata and a node, or a dataset uses a reserved key.
    #[error("key conflict: {0}")]
    KeyConflict(String),
    /// No file was specified.
    #[error("a file must be specified to write the root to")]
    NoFile,
    /// The hierarchy is nested deeper than the format can represent.
    #[error("nesting depth {depth} exceeds the maximum of {max}")]
    TooDeep {
        /// The nesting depth of the encoded hierarchy.
        depth: usize,
        /// The maximum nesting depth.
        max: usize,
    },
    /// The hierarchy could not be traversed.
    #[error(transparent)]
    Node(#[from] NodeError),
}

/// Traits for a hierarchy reader.
pub trait Reader: Send + Sync {
    /// The name of the reader.
    fn name(&self) -> &'static str;

    /// Returns true if the reader can read `file`.
    ///
    /// # Errors
    /// Returns a [`ReadError`] if `file` could not be inspected.
    fn can_read(&self, file: &Path) -> Result<bool, ReadError>;

    /// Read the hierarchy in `file`.
    ///
    /// # Errors
    /// Returns a [`ReadError`] if `file` could not be read or is malformed.
    fn read(&self, file: &Path) -> Result<Root, ReadError>;
}

/// Traits for a hierarchy writer.
pub trait Writer {
    /// Write `root` to `file`.
    ///
    /// # Errors
    /// Returns a [`WriteError`] if `root` cannot be represented by the format or `file` could not be written.
    fn write(&self, file: &Path, root: &Root) -> Result<(), WriteError>;
}

/// An ordered collection of [`Reader`]s.
#[derive(Default)]
pub struct ReaderRegistry {
    readers: Vec<Box<dyn Reader>>,
}

impl std::fmt::Debug for ReaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl ReaderRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the readers of this crate.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(json::JsonReader::new());
        registry
    }

    /// Append `reader` to the registry.
    pub fn register(&mut self, reader: impl Reader + 'static) {
        log::debug!("registered reader {}", reader.name());
        self.readers.push(Box::new(reader));
    }

    /// The names of the registered readers, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.readers.iter().map(|reader| reader.name())
    }

    /// Read `file` with the first reader, in registration order, that can read it.
    ///
    /// A reader that fails to inspect `file` is skipped.
    /// The hierarchy is put in read-only mode if [`Config::read_only_after_read`](crate::config::Config::read_only_after_read) is enabled.
    ///
    /// # Errors
    /// Returns [`ReadError::NoReader`] if no reader can read `file`, or the error of the reader that accepted it.
    pub fn read(&self, file: impl AsRef<Path>) -> Result<Root, ReadError> {
        let file = file.as_ref();
        for reader in &self.readers {
            match reader.can_read(file) {
                Ok(true) => {
                    log::debug!("reading {} with {}", file.display(), reader.name());
                    let mut root = reader.read(file)?;
                    root.set_file(Some(file.to_path_buf()));
                    if global_config().read_only_after_read() {
                        root.set_read_only(true);
                    }
                    return Ok(root);
                }
                Ok(false) => {}
                Err(err) => {
                    log::debug!("{} cannot inspect {}: {err}", reader.name(), file.display());
                }
            }
        }
        Err(ReadError::NoReader(file.to_path_buf()))
    }
}

static DEFAULT_REGISTRY: OnceLock<RwLock<ReaderRegistry>> = OnceLock::new();

/// Returns a reference to the default reader registry.
///
/// The default registry initially holds the readers of [`ReaderRegistry::with_defaults`].
pub fn default_registry() -> RwLockReadGuard<'static, ReaderRegistry> {
    DEFAULT_REGISTRY
        .get_or_init(|| RwLock::new(ReaderRegistry::with_defaults()))
        .read()
}

/// Returns a mutable reference to the default reader registry.
pub fn default_registry_mut() -> RwLockWriteGuard<'static, ReaderRegistry> {
    DEFAULT_REGISTRY
        .get_or_init(|| RwLock::new(ReaderRegistry::with_defaults()))
        .write()
}

/// Read `file` with the default reader registry.
///
/// # Errors
/// See [`ReaderRegistry::read`].
pub fn read(file: impl AsRef<Path>) -> Result<Root, ReadError> {
    default_registry().read(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingReader;

    impl Reader for FailingReader {
        fn name(&self) -> &'static str {
            "FailingReader"
        }

        fn can_read(&self, _file: &Path) -> Result<bool, ReadError> {
            Err(ReadError::Malformed("cannot inspect".to_string()))
        }

        fn read(&self, _file: &Path) -> Result<Root, ReadError> {
            unreachable!()
        }
    }

    struct AnyReader;

    impl Reader for AnyReader {
        fn name(&self) -> &'static str {
            "AnyReader"
        }

        fn can_read(&self, _file: &Path) -> Result<bool, ReadError> {
            Ok(true)
        }

        fn read(&self, _file: &Path) -> Result<Root, ReadError> {
            Ok(Root::new())
        }
    }

    #[test]
    fn reader_registry_dispatch() {
        let mut registry = ReaderRegistry::new();
        registry.register(FailingReader);
        assert!(matches!(
            registry.read("missing.txt"),
            Err(ReadError::NoReader(path)) if path == Path::new("missing.txt")
        ));

        registry.register(AnyReader);
        assert_eq!(registry.names().collect::<Vec<_>>(), ["FailingReader", "AnyReader"]);
        let root = registry.read("any.txt").unwrap();
        assert_eq!(root.file(), Some(Path::new("any.txt")));
        assert_eq!(root.read_only(), global_config().read_only_after_read());
    }

    #[test]
    fn reader_registry_defaults() {
        assert_eq!(
            ReaderRegistry::with_defaults().names().collect::<Vec<_>>(),
            ["JsonReader"]
        );
        assert!(matches!(
            read("does/not/exist.json"),
            Err(ReadError::NoReader(_))
        ));
    }
}
