use std::sync::Arc;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use parking_lot::RwLock;

use super::DatasetLogging;

/// A [`log::Log`] implementation that appends records to bound [`DatasetLogging`] datasets.
///
/// A sink can be used directly, composed into another logger, or installed as the global logger with [`LogSink::install`].
///
/// Records are appended under the lock of each logging dataset.
/// Logging from a thread that holds a reference to the data of a bound dataset (e.g. a [`Dataset::data`](super::Dataset::data) guard) blocks forever.
#[derive(Debug, Default)]
pub struct LogSink {
    subscribers: RwLock<Vec<DatasetLogging>>,
}

impl LogSink {
    /// Create a new log sink with no bound datasets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `logging` to the sink. Returns false if it is already bound.
    pub fn subscribe(&self, logging: &DatasetLogging) -> bool {
        let mut subscribers = self.subscribers.write();
        if subscribers.iter().any(|subscriber| subscriber.ptr_eq(logging)) {
            false
        } else {
            logging.sink_added();
            subscribers.push(logging.clone());
            true
        }
    }

    /// Unbind `logging` from the sink. Returns false if it was not bound.
    pub fn unsubscribe(&self, logging: &DatasetLogging) -> bool {
        let mut subscribers = self.subscribers.write();
        let len = subscribers.len();
        subscribers.retain(|subscriber| !subscriber.ptr_eq(logging));
        let removed = subscribers.len() != len;
        if removed {
            logging.sink_removed();
        }
        removed
    }

    /// The number of bound datasets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Returns true if no datasets are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.read().is_empty()
    }

    /// Install the sink as the global [`log`] logger with a maximum level of `max_level`.
    ///
    /// # Errors
    /// Returns [`SetLoggerError`] if a global logger has already been set.
    pub fn install(self: Arc<Self>, max_level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(InstalledSink(self)))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

impl Log for LogSink {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.subscribers
            .read()
            .iter()
            .any(|subscriber| subscriber.enabled(metadata))
    }

    fn log(&self, record: &Record) {
        for subscriber in self.subscribers.read().iter() {
            subscriber.log_record(record);
        }
    }

    fn flush(&self) {}
}

struct InstalledSink(Arc<LogSink>);

impl Log for InstalledSink {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.0.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        self.0.log(record);
    }

    fn flush(&self) {
        self.0.flush();
    }
}

#[cfg(test)]
mod tests {
    use log::Level;

    use crate::dataset::DatasetLoggingBuilder;

    use super::*;

    #[test]
    fn log_sink_subscribe() {
        let sink = LogSink::new();
        let a = DatasetLoggingBuilder::new().build("/a").unwrap();
        let b = DatasetLoggingBuilder::new()
            .level(LevelFilter::Error)
            .build("/b")
            .unwrap();
        let (la, lb) = (a.logging().unwrap(), b.logging().unwrap());
        assert!(la.bind(&sink));
        assert!(!la.bind(&sink));
        assert!(sink.subscribe(lb));
        assert_eq!(sink.len(), 2);
        assert!(la.is_bound());

        sink.log(
            &Record::builder()
                .level(Level::Info)
                .target("labio")
                .args(format_args!("info"))
                .build(),
        );
        assert_eq!(la.record_count(), 1);
        assert_eq!(lb.record_count(), 0);

        assert!(la.unbind(&sink));
        assert!(!la.unbind(&sink));
        assert!(!la.is_bound());
        sink.log(
            &Record::builder()
                .level(Level::Error)
                .target("labio")
                .args(format_args!("error"))
                .build(),
        );
        assert_eq!(la.record_count(), 1);
        assert_eq!(lb.record_count(), 1);
    }
}
