use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use chrono::{
    format::{Item, StrftimeItems},
    DateTime, Local,
};
use itertools::Itertools;
use log::{Level, LevelFilter, Metadata as LogMetadata, Record};
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard, RwLock};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    array::{ArrayData, ArrayError, DataType, StructuredArray, StructuredField},
    config::global_config,
    metadata::{Metadata, MetadataValue},
    value::Value,
};

use super::{Dataset, LogSink};

/// The metadata key of the numeric level of a logging dataset.
pub(crate) const LOGGING_LEVEL: &str = "logging_level";
/// The metadata key of the level name of a logging dataset.
pub(crate) const LOGGING_LEVEL_NAME: &str = "logging_level_name";
/// The metadata key of the date format of a logging dataset.
pub(crate) const LOGGING_DATE_FORMAT: &str = "logging_date_format";

/// A dataset logging error.
#[derive(Debug, Error)]
pub enum DatasetLoggingError {
    /// No attributes.
    #[error("a logging dataset requires at least one attribute")]
    NoAttributes,
    /// An unsupported record attribute.
    #[error("unsupported logging attribute {0}")]
    UnsupportedAttribute(String),
    /// A repeated record attribute.
    #[error("duplicate logging attribute {0}")]
    DuplicateAttribute(String),
    /// An invalid date format.
    #[error("invalid logging date format {0:?}")]
    InvalidDateFormat(String),
    /// An existing dataset is not used for logging.
    #[error("dataset {0} exists but it is not used for logging")]
    NotLogging(String),
    /// The attributes of an existing logging dataset differ.
    #[error("the attributes of the existing logging dataset are {existing:?} which does not equal {requested:?}")]
    AttributeMismatch {
        /// The attributes of the existing dataset.
        existing: Vec<String>,
        /// The requested attributes.
        requested: Vec<String>,
    },
    /// An array error.
    #[error(transparent)]
    Array(#[from] ArrayError),
}

/// A [`log::Record`] attribute stored in a field of a logging dataset.
///
/// Serializes as its [name](LogAttribute::name).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogAttribute {
    /// The local time the record was logged, formatted with the date format.
    Asctime,
    /// The time the record was logged in seconds since the Unix epoch.
    Created,
    /// The file name of the source file.
    Filename,
    /// The level name, e.g. `INFO`.
    Levelname,
    /// The numeric level: 40 for error, 30 for warn, 20 for info, 10 for debug and 5 for trace.
    Levelno,
    /// The line number in the source file.
    Lineno,
    /// The formatted message.
    Message,
    /// The module path.
    Module,
    /// The record target.
    Name,
    /// The process id.
    Process,
    /// The name of the logging thread.
    #[serde(rename = "threadName")]
    ThreadName,
}

/// The attributes of a logging dataset unless others are specified.
pub const DEFAULT_ATTRIBUTES: [LogAttribute; 4] = [
    LogAttribute::Asctime,
    LogAttribute::Levelname,
    LogAttribute::Name,
    LogAttribute::Message,
];

impl LogAttribute {
    /// The attribute (field) name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Asctime => "asctime",
            Self::Created => "created",
            Self::Filename => "filename",
            Self::Levelname => "levelname",
            Self::Levelno => "levelno",
            Self::Lineno => "lineno",
            Self::Message => "message",
            Self::Module => "module",
            Self::Name => "name",
            Self::Process => "process",
            Self::ThreadName => "threadName",
        }
    }

    /// Parse an attribute from its name.
    ///
    /// # Errors
    /// Returns [`DatasetLoggingError::UnsupportedAttribute`] if `name` is not a supported attribute.
    pub fn from_name(name: &str) -> Result<Self, DatasetLoggingError> {
        Ok(match name {
            "asctime" => Self::Asctime,
            "created" => Self::Created,
            "filename" => Self::Filename,
            "levelname" => Self::Levelname,
            "levelno" => Self::Levelno,
            "lineno" => Self::Lineno,
            "message" => Self::Message,
            "module" => Self::Module,
            "name" => Self::Name,
            "process" => Self::Process,
            "threadName" => Self::ThreadName,
            _ => return Err(DatasetLoggingError::UnsupportedAttribute(name.to_string())),
        })
    }

    #[allow(clippy::cast_precision_loss)]
    fn value(self, record: &Record, now: &DateTime<Local>, date_format: &str) -> Value {
        match self {
            Self::Asctime => Value::String(now.format(date_format).to_string()),
            Self::Created => Value::Float(now.timestamp_micros() as f64 / 1e6),
            Self::Filename => record
                .file()
                .map(|file| {
                    std::path::Path::new(file)
                        .file_name()
                        .map_or_else(|| file.to_string(), |name| name.to_string_lossy().into_owned())
                })
                .into(),
            Self::Levelname => record.level().as_str().into(),
            Self::Levelno => Value::Int(level_number(record.level())),
            Self::Lineno => record.line().map(i64::from).into(),
            Self::Message => Value::String(record.args().to_string()),
            Self::Module => record.module_path().map(str::to_string).into(),
            Self::Name => record.target().into(),
            Self::Process => Value::Int(std::process::id().into()),
            Self::ThreadName => {
                let thread = std::thread::current();
                Value::String(
                    thread
                        .name()
                        .map_or_else(|| format!("{:?}", thread.id()), str::to_string),
                )
            }
        }
    }
}

impl std::fmt::Display for LogAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for LogAttribute {
    type Err = DatasetLoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

fn level_number(level: Level) -> i64 {
    match level {
        Level::Error => 40,
        Level::Warn => 30,
        Level::Info => 20,
        Level::Debug => 10,
        Level::Trace => 5,
    }
}

fn level_filter_number(level: LevelFilter) -> i64 {
    level.to_level().map_or(100, level_number)
}

fn level_filter_from_number(number: i64) -> LevelFilter {
    match number {
        i64::MIN..=5 => LevelFilter::Trace,
        6..=10 => LevelFilter::Debug,
        11..=20 => LevelFilter::Info,
        21..=30 => LevelFilter::Warn,
        31..=99 => LevelFilter::Error,
        _ => LevelFilter::Off,
    }
}

/// The level recorded in the metadata of a logging dataset.
fn level_filter_from_metadata(metadata: &Metadata) -> Option<LevelFilter> {
    metadata
        .get(LOGGING_LEVEL_NAME)
        .and_then(MetadataValue::as_str)
        .and_then(|name| name.parse().ok())
        .or_else(|| {
            metadata
                .get(LOGGING_LEVEL)
                .and_then(MetadataValue::as_i64)
                .map(level_filter_from_number)
        })
}

fn validate_date_format(date_format: &str) -> Result<(), DatasetLoggingError> {
    if StrftimeItems::new(date_format).any(|item| matches!(item, Item::Error)) {
        Err(DatasetLoggingError::InvalidDateFormat(date_format.to_string()))
    } else {
        Ok(())
    }
}

#[derive(Debug)]
struct LoggingState {
    data: ArrayData,
    cursor: usize,
    preallocated: bool,
    resize_count: usize,
}

impl LoggingState {
    fn append(&mut self, record: Vec<Value>) -> Result<(), ArrayError> {
        let data_type = self.data.data_type();
        let array = self
            .data
            .as_structured_mut()
            .ok_or(ArrayError::NotStructured(data_type))?;
        if self.preallocated {
            let len = array.len();
            self.cursor = self.cursor.min(len);
            if self.cursor == len {
                array.resize((len * 2).max(1))?;
                self.resize_count += 1;
            }
            array.set_record(self.cursor, record)?;
            self.cursor += 1;
        } else {
            if array.push_record(record)? {
                self.resize_count += 1;
            }
            self.cursor = array.len();
        }
        Ok(())
    }
}

#[derive(Debug)]
struct LoggingShared {
    attributes: Vec<LogAttribute>,
    date_format: String,
    target: Option<String>,
    level: RwLock<LevelFilter>,
    sinks: AtomicUsize,
    state: Mutex<LoggingState>,
}

/// A handle to the records of a logging dataset.
///
/// A logging dataset is a one-dimensional structured [`Dataset`] with an [`object`](DataType::Object) field per [`LogAttribute`].
/// Once bound to a [`LogSink`], every [`log::Record`] that passes the level and target filter is appended as a row.
/// The handle is shared by the dataset and every sink it is bound to, and appends are serialised by an internal mutex.
///
/// A logging dataset created with a capacity is preallocated with empty rows (every field [`Value::Null`]).
/// Records fill the rows in order, and the rows are doubled whenever they are exhausted.
/// Call [`remove_empty_rows`](DatasetLogging::remove_empty_rows) to drop the unused rows.
/// Otherwise every record grows the dataset by exactly one row, with amortised O(1) storage growth.
#[derive(Clone)]
pub struct DatasetLogging(Arc<LoggingShared>);

impl std::fmt::Debug for DatasetLogging {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetLogging")
            .field("attributes", &self.0.attributes)
            .field("date_format", &self.0.date_format)
            .field("target", &self.0.target)
            .field("level", &self.level())
            .field("sinks", &self.0.sinks.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl DatasetLogging {
    /// The record attributes, one per field.
    #[must_use]
    pub fn attributes(&self) -> &[LogAttribute] {
        &self.0.attributes
    }

    /// The [`chrono`] format string of the [`LogAttribute::Asctime`] attribute.
    #[must_use]
    pub fn date_format(&self) -> &str {
        &self.0.date_format
    }

    /// The target prefix of accepted records, if any.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.0.target.as_deref()
    }

    /// The level filter.
    #[must_use]
    pub fn level(&self) -> LevelFilter {
        *self.0.level.read()
    }

    /// Set the level filter.
    ///
    /// The level recorded in the dataset metadata is unchanged.
    pub fn set_level(&self, level: LevelFilter) {
        *self.0.level.write() = level;
    }

    /// Returns true if a record with `metadata` would be appended.
    #[must_use]
    pub fn enabled(&self, metadata: &LogMetadata) -> bool {
        metadata.level() <= self.level()
            && self.0.target.as_deref().map_or(true, |target| {
                metadata
                    .target()
                    .strip_prefix(target)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
            })
    }

    /// Append `record` if it passes the level and target filter.
    ///
    /// Returns true if the record was appended.
    /// This blocks while the data of the dataset is borrowed.
    pub fn log_record(&self, record: &Record) -> bool {
        if !self.enabled(record.metadata()) {
            return false;
        }
        let now = Local::now();
        let row = self
            .0
            .attributes
            .iter()
            .map(|attribute| attribute.value(record, &now, &self.0.date_format))
            .collect_vec();
        self.0.state.lock().append(row).is_ok()
    }

    /// The number of records appended, excluding empty rows.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.0.state.lock().cursor
    }

    /// The number of times the rows were reallocated.
    #[must_use]
    pub fn resize_count(&self) -> usize {
        self.0.state.lock().resize_count
    }

    /// Remove the empty rows, those where the first field is [`Value::Null`].
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the data is no longer structured.
    pub fn remove_empty_rows(&self) -> Result<(), ArrayError> {
        let mut guard = self.0.state.lock();
        let state = &mut *guard;
        let data_type = state.data.data_type();
        let array = state
            .data
            .as_structured()
            .ok_or(ArrayError::NotStructured(data_type))?;
        let keep = array
            .fields()
            .first()
            .map(|(_, column)| {
                column
                    .to_values()
                    .iter()
                    .map(|value| !value.is_null())
                    .collect_vec()
            })
            .unwrap_or_default();
        let array = array.select(&keep)?;
        state.cursor = array.len();
        state.data = array.into();
        Ok(())
    }

    /// Returns true if the dataset is bound to at least one [`LogSink`].
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.0.sinks.load(Ordering::Acquire) > 0
    }

    /// Bind to `sink`. Returns false if already bound to it.
    pub fn bind(&self, sink: &LogSink) -> bool {
        sink.subscribe(self)
    }

    /// Unbind from `sink`. Returns false if not bound to it.
    pub fn unbind(&self, sink: &LogSink) -> bool {
        sink.unsubscribe(self)
    }

    /// Returns true if both handles refer to the same logging dataset.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn sink_added(&self) {
        self.0.sinks.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn sink_removed(&self) {
        self.0.sinks.fetch_sub(1, Ordering::AcqRel);
    }

    pub(super) fn lock_data(&self) -> MappedMutexGuard<'_, ArrayData> {
        MutexGuard::map(self.0.state.lock(), |state| &mut state.data)
    }
}

/// A [`DatasetLogging`] builder.
///
/// The defaults are:
///  - the attributes `asctime`, `levelname`, `name` and `message`,
///  - the [`LevelFilter::Info`] level,
///  - no target filter,
///  - the date format of the [global configuration](crate::config::Config#logging-date-format), and
///  - no capacity, so each record grows the dataset by one row.
#[derive(Clone, Debug, Default)]
pub struct DatasetLoggingBuilder {
    attributes: Option<Vec<LogAttribute>>,
    level: Option<LevelFilter>,
    target: Option<String>,
    date_format: Option<String>,
    capacity: Option<usize>,
    metadata: Vec<(String, MetadataValue)>,
}

impl DatasetLoggingBuilder {
    /// Create a new logging dataset builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the record attributes.
    #[must_use]
    pub fn attributes(mut self, attributes: impl IntoIterator<Item = LogAttribute>) -> Self {
        self.attributes = Some(attributes.into_iter().collect());
        self
    }

    /// Set the level filter.
    #[must_use]
    pub fn level(mut self, level: LevelFilter) -> Self {
        self.level = Some(level);
        self
    }

    /// Only accept records whose target is `target` or a `target::` submodule.
    #[must_use]
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set the [`chrono`] format string of the `asctime` attribute.
    #[must_use]
    pub fn date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = Some(date_format.into());
        self
    }

    /// Preallocate `capacity` empty rows.
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Add a metadata entry.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    /// Build a detached logging dataset named `name`.
    ///
    /// # Errors
    /// Returns a [`DatasetLoggingError`] if there are no attributes, an attribute is repeated, or the date format is invalid.
    pub fn build(self, name: impl Into<String>) -> Result<Dataset, DatasetLoggingError> {
        let level = self.level.unwrap_or(LevelFilter::Info);
        let date_format = self
            .date_format
            .clone()
            .unwrap_or_else(|| global_config().logging_date_format().to_string());
        validate_date_format(&date_format)?;
        let attributes = self
            .attributes
            .clone()
            .unwrap_or_else(|| DEFAULT_ATTRIBUTES.to_vec());
        let fields = Self::fields(&attributes)?;
        let data = StructuredArray::zeros(&fields, self.capacity.unwrap_or_default());
        let logging = self.shared(attributes, level, date_format.clone(), data, 0);

        let mut metadata = self.metadata;
        metadata.extend([
            (LOGGING_LEVEL.to_string(), level_filter_number(level).into()),
            (LOGGING_LEVEL_NAME.to_string(), level.as_str().into()),
            (LOGGING_DATE_FORMAT.to_string(), date_format.into()),
        ]);
        Ok(Dataset::new_logging(
            name.into(),
            logging,
            Metadata::from_entries(metadata, false),
        ))
    }

    /// Convert `dataset`, a plain dataset previously used for logging, into a logging dataset.
    ///
    /// The attributes are the fields of the dataset, and the level and date format default to those in its metadata.
    pub(crate) fn convert(self, dataset: &Dataset) -> Result<DatasetLogging, DatasetLoggingError> {
        let metadata = dataset.metadata();
        if ![LOGGING_LEVEL, LOGGING_LEVEL_NAME, LOGGING_DATE_FORMAT]
            .iter()
            .all(|key| metadata.contains_key(key))
        {
            return Err(DatasetLoggingError::NotLogging(dataset.name().to_string()));
        }
        let data = dataset.data().clone();
        let ArrayData::Structured(array) = data else {
            return Err(DatasetLoggingError::NotLogging(dataset.name().to_string()));
        };
        let existing = array.field_names().map(str::to_string).collect_vec();
        self.check_attributes(&existing)?;
        let attributes = existing
            .iter()
            .map(|name| LogAttribute::from_name(name))
            .collect::<Result<Vec<_>, _>>()?;
        let level = self
            .level
            .or_else(|| level_filter_from_metadata(metadata))
            .unwrap_or(LevelFilter::Info);
        let date_format = self
            .date_format
            .clone()
            .or_else(|| {
                metadata
                    .get(LOGGING_DATE_FORMAT)
                    .and_then(MetadataValue::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| global_config().logging_date_format().to_string());
        validate_date_format(&date_format)?;
        let cursor = array.len();
        let mut array = array.into_object_columns()?;
        if let Some(capacity) = self.capacity.filter(|capacity| *capacity > cursor) {
            array.resize(capacity)?;
        }
        Ok(self.shared(attributes, level, date_format, array, cursor))
    }

    /// Check that the requested attributes, if any, equal the `existing` field names.
    pub(crate) fn check_attributes(&self, existing: &[String]) -> Result<(), DatasetLoggingError> {
        if let Some(attributes) = &self.attributes {
            let requested = attributes
                .iter()
                .map(|attribute| attribute.name().to_string())
                .collect_vec();
            if requested != existing {
                return Err(DatasetLoggingError::AttributeMismatch {
                    existing: existing.to_vec(),
                    requested,
                });
            }
        }
        Ok(())
    }

    fn fields(attributes: &[LogAttribute]) -> Result<Vec<StructuredField>, DatasetLoggingError> {
        if attributes.is_empty() {
            return Err(DatasetLoggingError::NoAttributes);
        }
        if let Some(duplicate) = attributes.iter().duplicates().next() {
            return Err(DatasetLoggingError::DuplicateAttribute(
                duplicate.name().to_string(),
            ));
        }
        attributes
            .iter()
            .map(|attribute| {
                StructuredField::new(attribute.name(), DataType::Object)
                    .map_err(|err| DatasetLoggingError::from(ArrayError::UnsupportedDataType(err)))
            })
            .collect()
    }

    fn shared(
        &self,
        attributes: Vec<LogAttribute>,
        level: LevelFilter,
        date_format: String,
        data: StructuredArray,
        cursor: usize,
    ) -> DatasetLogging {
        DatasetLogging(Arc::new(LoggingShared {
            attributes,
            date_format,
            target: self.target.clone(),
            level: RwLock::new(level),
            sinks: AtomicUsize::new(0),
            state: Mutex::new(LoggingState {
                data: data.into(),
                cursor,
                preallocated: self.capacity.is_some(),
                resize_count: 0,
            }),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(level: Level, target: &str, message: &str, logging: &DatasetLogging) -> bool {
        logging.log_record(
            &Record::builder()
                .level(level)
                .target(target)
                .args(format_args!("{message}"))
                .file(Some("src/acquire.rs"))
                .line(Some(12))
                .module_path(Some("acquire"))
                .build(),
        )
    }

    #[test]
    fn dataset_logging_defaults() {
        let dataset = DatasetLoggingBuilder::new().build("/log").unwrap();
        let logging = dataset.logging().unwrap().clone();
        assert_eq!(logging.attributes(), DEFAULT_ATTRIBUTES.as_slice());
        assert_eq!(logging.level(), LevelFilter::Info);
        assert!(!logging.is_bound());
        assert_eq!(dataset.shape(), vec![0]);
        assert_eq!(
            dataset.metadata().get(LOGGING_LEVEL).and_then(MetadataValue::as_i64),
            Some(20)
        );
        assert_eq!(
            dataset.metadata().get(LOGGING_LEVEL_NAME).and_then(MetadataValue::as_str),
            Some("INFO")
        );

        assert!(record(Level::Info, "labio", "hello", &logging));
        assert!(record(Level::Error, "labio", "oops", &logging));
        assert!(!record(Level::Debug, "labio", "hidden", &logging));
        assert_eq!(logging.record_count(), 2);
        assert_eq!(dataset.len(), 2);
        assert_eq!(
            *dataset.field("message").unwrap(),
            ArrayData::from(vec![Value::from("hello"), Value::from("oops")])
        );
        assert_eq!(
            *dataset.field("levelname").unwrap(),
            ArrayData::from(vec![Value::from("INFO"), Value::from("ERROR")])
        );
    }

    #[test]
    fn dataset_logging_attributes() {
        let dataset = DatasetLoggingBuilder::new()
            .attributes([
                LogAttribute::Filename,
                LogAttribute::Lineno,
                LogAttribute::Levelno,
                LogAttribute::Module,
            ])
            .level(LevelFilter::Trace)
            .target("acq")
            .build("/log")
            .unwrap();
        let logging = dataset.logging().unwrap();
        assert!(record(Level::Trace, "acq::daq", "a", logging));
        assert!(!record(Level::Trace, "acquire", "b", logging));
        let data = dataset.data();
        let records = data.as_structured().unwrap().records();
        assert_eq!(
            records,
            vec![Value::List(vec![
                "acquire.rs".into(),
                Value::Int(12),
                Value::Int(5),
                "acquire".into()
            ])]
        );
    }

    #[test]
    fn dataset_logging_errors() {
        assert!(matches!(
            DatasetLoggingBuilder::new()
                .attributes(Vec::<LogAttribute>::new())
                .build("/a"),
            Err(DatasetLoggingError::NoAttributes)
        ));
        assert!(matches!(
            DatasetLoggingBuilder::new()
                .attributes([LogAttribute::Message, LogAttribute::Message])
                .build("/a"),
            Err(DatasetLoggingError::DuplicateAttribute(_))
        ));
        assert!(matches!(
            DatasetLoggingBuilder::new().date_format("%Y-%Q").build("/a"),
            Err(DatasetLoggingError::InvalidDateFormat(_))
        ));
        assert!(matches!(
            "lineNo".parse::<LogAttribute>(),
            Err(DatasetLoggingError::UnsupportedAttribute(_))
        ));
        assert_eq!("threadName".parse::<LogAttribute>().unwrap(), LogAttribute::ThreadName);
    }

    #[test]
    fn dataset_logging_attribute_serde() {
        let attributes = [LogAttribute::Asctime, LogAttribute::ThreadName];
        let json = serde_json::to_string(&attributes).unwrap();
        assert_eq!(json, r#"["asctime","threadName"]"#);
        let parsed: Vec<LogAttribute> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, attributes);
        for attribute in parsed {
            assert_eq!(serde_json::to_value(attribute).unwrap(), attribute.name());
        }
    }

    #[test]
    fn dataset_logging_preallocated() {
        let dataset = DatasetLoggingBuilder::new().capacity(2).build("/log").unwrap();
        let logging = dataset.logging().unwrap();
        assert_eq!(dataset.len(), 2);
        for i in 0..5 {
            assert!(record(Level::Warn, "labio", &i.to_string(), logging));
        }
        // 2 -> 4 -> 8
        assert_eq!(logging.resize_count(), 2);
        assert_eq!(dataset.len(), 8);
        assert_eq!(logging.record_count(), 5);
        assert!(dataset.field("asctime").unwrap().to_values()[5].is_null());

        logging.remove_empty_rows().unwrap();
        assert_eq!(dataset.len(), 5);
        assert!(record(Level::Warn, "labio", "5", logging));
        assert_eq!(dataset.len(), 10);
        assert_eq!(logging.record_count(), 6);
    }

    #[test]
    fn dataset_logging_amortised_growth() {
        let dataset = DatasetLoggingBuilder::new().build("/log").unwrap();
        let logging = dataset.logging().unwrap();
        for i in 0..1000 {
            record(Level::Info, "labio", &i.to_string(), logging);
        }
        assert_eq!(dataset.len(), 1000);
        assert!(logging.resize_count() <= 20);
    }

    #[test]
    fn dataset_logging_convert() {
        let logged = DatasetLoggingBuilder::new()
            .level(LevelFilter::Warn)
            .build("/log")
            .unwrap();
        record(Level::Warn, "labio", "a", logged.logging().unwrap());
        let plain = logged.copy(None);
        assert!(plain.logging().is_none());

        let logging = DatasetLoggingBuilder::new().convert(&plain).unwrap();
        assert_eq!(logging.level(), LevelFilter::Warn);
        assert_eq!(logging.record_count(), 1);

        assert!(matches!(
            DatasetLoggingBuilder::new()
                .attributes([LogAttribute::Message])
                .convert(&plain),
            Err(DatasetLoggingError::AttributeMismatch { .. })
        ));
        let other = Dataset::new("/x", ArrayData::from(vec![1.0]), Metadata::default(), false);
        assert!(matches!(
            DatasetLoggingBuilder::new().convert(&other),
            Err(DatasetLoggingError::NotLogging(_))
        ));
    }
}
