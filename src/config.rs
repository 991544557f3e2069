//! Labio global configuration options.

use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Global configuration options for the labio crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
///
/// # JSON Configuration Options
///
/// ## JSON Indent
/// > default: `Some(2)`
///
/// The default indentation of a [`JsonWriter`](crate::io::json::JsonWriter).
/// Arrays of two or more dimensions and mappings are written with one line per element at this indentation.
/// If [`None`], the file content after the header line is written on a single line.
///
/// ## JSON Sort Keys
/// > default: [`false`]
///
/// If enabled, a [`JsonWriter`](crate::io::json::JsonWriter) writes the keys of every mapping in sorted order by default.
///
/// # Logging Configuration Options
///
/// ## Logging Date Format
/// > default: `%Y-%m-%dT%H:%M:%S%.6f`
///
/// The default [`chrono`] format string of the `asctime` attribute of a [`DatasetLogging`](crate::dataset::DatasetLogging).
///
/// # Reader Configuration Options
///
/// ## Read Only After Read
/// > default: [`true`]
///
/// If enabled, a hierarchy read with a [`ReaderRegistry`](crate::io::ReaderRegistry) is put in read-only mode.
#[derive(Debug)]
pub struct Config {
    json_indent: Option<usize>,
    json_sort_keys: bool,
    logging_date_format: String,
    read_only_after_read: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            json_indent: Some(2),
            json_sort_keys: false,
            logging_date_format: "%Y-%m-%dT%H:%M:%S%.6f".to_string(),
            read_only_after_read: true,
        }
    }
}

impl Config {
    /// Get the [JSON indent](#json-indent) configuration.
    #[must_use]
    pub fn json_indent(&self) -> Option<usize> {
        self.json_indent
    }

    /// Set the [JSON indent](#json-indent) configuration.
    pub fn set_json_indent(&mut self, indent: Option<usize>) {
        self.json_indent = indent;
    }

    /// Get the [JSON sort keys](#json-sort-keys) configuration.
    #[must_use]
    pub fn json_sort_keys(&self) -> bool {
        self.json_sort_keys
    }

    /// Set the [JSON sort keys](#json-sort-keys) configuration.
    pub fn set_json_sort_keys(&mut self, sort_keys: bool) {
        self.json_sort_keys = sort_keys;
    }

    /// Get the [logging date format](#logging-date-format) configuration.
    #[must_use]
    pub fn logging_date_format(&self) -> &str {
        &self.logging_date_format
    }

    /// Set the [logging date format](#logging-date-format) configuration.
    ///
    /// The format is validated when a logging dataset is created.
    pub fn set_logging_date_format(&mut self, date_format: impl Into<String>) {
        self.logging_date_format = date_format.into();
    }

    /// Get the [read only after read](#read-only-after-read) configuration.
    #[must_use]
    pub fn read_only_after_read(&self) -> bool {
        self.read_only_after_read
    }

    /// Set the [read only after read](#read-only-after-read) configuration.
    pub fn set_read_only_after_read(&mut self, read_only: bool) {
        self.read_only_after_read = read_only;
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global labio configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .read()
        .unwrap()
}

/// Returns a mutable reference to the global labio configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .write()
        .unwrap()
}
