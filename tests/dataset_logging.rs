use std::{collections::HashSet, error::Error, sync::Arc};

use labio::{
    array::ArrayData,
    dataset::{DatasetBuilder, DatasetLoggingBuilder, DatasetLoggingError, LogAttribute, LogSink},
    io::json::{JsonReader, JsonWriter},
    io::Reader,
    node::NodeError,
    value::Value,
};
use log::{Level, LevelFilter, Log, Record};

fn emit(sink: &LogSink, level: Level, message: &str) {
    sink.log(
        &Record::builder()
            .level(level)
            .target("daq::acquire")
            .args(format_args!("{message}"))
            .build(),
    );
}

#[test]
fn dataset_logging_sink() -> Result<(), Box<dyn Error>> {
    let sink = LogSink::new();
    let mut writer = JsonWriter::default();
    let mut root = writer.root_mut();
    let id = root.create_dataset_logging(
        "logs/acquisition",
        DatasetLoggingBuilder::new()
            .attributes([LogAttribute::Levelname, LogAttribute::Name, LogAttribute::Message])
            .level(LevelFilter::Warn)
            .metadata("instrument", "DMM"),
    )?;
    let debug = root.create_dataset_logging(
        "logs/debug",
        DatasetLoggingBuilder::new()
            .attributes([LogAttribute::Message])
            .level(LevelFilter::Debug)
            .target("daq"),
    )?;
    let acquisition = writer.dataset(id)?.logging().ok_or("not logging")?.clone();
    let debug = writer.dataset(debug)?.logging().ok_or("not logging")?.clone();
    assert!(acquisition.bind(&sink));
    assert!(debug.bind(&sink));

    emit(&sink, Level::Info, "started");
    emit(&sink, Level::Warn, "overrange");
    emit(&sink, Level::Error, "timeout");
    emit(&sink, Level::Debug, "sample 1");

    assert_eq!(acquisition.record_count(), 2);
    assert_eq!(debug.record_count(), 4);
    let dataset = writer.root().dataset("logs/acquisition")?;
    assert_eq!(dataset.shape(), vec![2]);
    assert_eq!(
        *dataset.field("message")?,
        ArrayData::from(vec![Value::from("overrange"), Value::from("timeout")])
    );
    assert_eq!(
        *dataset.field("name")?,
        ArrayData::from(vec![Value::from("daq::acquire"), Value::from("daq::acquire")])
    );

    acquisition.set_level(LevelFilter::Info);
    emit(&sink, Level::Info, "stopped");
    assert_eq!(acquisition.record_count(), 3);
    assert!(debug.unbind(&sink));
    assert_eq!(sink.len(), 1);
    Ok(())
}

#[test]
fn dataset_logging_preallocated() -> Result<(), Box<dyn Error>> {
    let sink = LogSink::new();
    let dataset = DatasetLoggingBuilder::new().capacity(4).build("/log")?;
    let logging = dataset.logging().ok_or("not logging")?;
    logging.bind(&sink);
    for i in 0..10 {
        emit(&sink, Level::Info, &i.to_string());
    }
    // 4 -> 8 -> 16
    assert_eq!(dataset.len(), 16);
    assert_eq!(logging.resize_count(), 2);
    assert_eq!(logging.record_count(), 10);
    logging.remove_empty_rows()?;
    assert_eq!(dataset.len(), 10);
    Ok(())
}

#[test]
fn dataset_logging_concurrent() -> Result<(), Box<dyn Error>> {
    const THREADS: usize = 8;
    const RECORDS: usize = 500;
    let sink = LogSink::new();
    let dataset = DatasetLoggingBuilder::new()
        .attributes([LogAttribute::Levelname, LogAttribute::Message])
        .capacity(1)
        .build("/log")?;
    let logging = dataset.logging().ok_or("not logging")?;
    logging.bind(&sink);

    std::thread::scope(|scope| {
        for thread in 0..THREADS {
            let sink = &sink;
            scope.spawn(move || {
                for i in 0..RECORDS {
                    emit(sink, Level::Info, &format!("{thread}:{i}"));
                }
            });
        }
    });

    assert_eq!(logging.record_count(), THREADS * RECORDS);
    // 1 -> 2 -> ... -> 4096
    assert_eq!(logging.resize_count(), 12);
    logging.remove_empty_rows()?;
    assert_eq!(dataset.len(), THREADS * RECORDS);

    let messages = dataset.field("message")?;
    let messages = messages.as_array::<Value>().ok_or("not an object array")?;
    let unique: HashSet<_> = messages.iter().filter_map(Value::as_str).collect();
    assert_eq!(unique.len(), THREADS * RECORDS);
    for thread in 0..THREADS {
        let mut indices: Vec<usize> = unique
            .iter()
            .filter_map(|message| message.strip_prefix(&format!("{thread}:")))
            .map(str::parse)
            .collect::<Result<_, _>>()?;
        indices.sort_unstable();
        assert_eq!(indices, (0..RECORDS).collect::<Vec<_>>());
    }
    Ok(())
}

#[test]
fn dataset_logging_round_trip() -> Result<(), Box<dyn Error>> {
    let sink = LogSink::new();
    let mut writer = JsonWriter::default();
    let id = writer.root_mut().create_dataset_logging(
        "log",
        DatasetLoggingBuilder::new()
            .attributes([LogAttribute::Levelno, LogAttribute::Message])
            .level(LevelFilter::Warn),
    )?;
    let logging = writer.dataset(id)?.logging().ok_or("not logging")?.clone();
    logging.bind(&sink);
    emit(&sink, Level::Error, "first");
    logging.unbind(&sink);

    let text = writer.to_string(&writer)?;
    let mut root = JsonReader::new().read_str(&text)?;
    root.set_read_only(true);
    {
        let view = root.root();
        let dataset = view.dataset("log")?;
        assert!(dataset.logging().is_none());
        assert_eq!(
            *dataset.field("levelno")?,
            ArrayData::from(vec![Value::Int(40)])
        );
    }

    let id = root
        .root_mut()
        .require_dataset_logging("log", DatasetLoggingBuilder::new())?;
    let dataset = root.dataset(id)?;
    assert!(!dataset.read_only());
    let logging = dataset.logging().ok_or("not logging")?.clone();
    assert_eq!(logging.level(), LevelFilter::Warn);
    assert_eq!(logging.record_count(), 1);
    logging.bind(&sink);
    emit(&sink, Level::Info, "ignored");
    emit(&sink, Level::Warn, "second");
    assert_eq!(
        *root.dataset(id)?.field("message")?,
        ArrayData::from(vec![Value::from("first"), Value::from("second")])
    );

    // an existing logging dataset is returned as is
    assert_eq!(
        root.root_mut()
            .require_dataset_logging("log", DatasetLoggingBuilder::new())?,
        id
    );
    assert!(matches!(
        root.root_mut().require_dataset_logging(
            "log",
            DatasetLoggingBuilder::new().attributes([LogAttribute::Message])
        ),
        Err(NodeError::Logging(DatasetLoggingError::AttributeMismatch { .. }))
    ));
    Ok(())
}

#[test]
fn dataset_logging_require_plain_dataset() -> Result<(), Box<dyn Error>> {
    let mut writer = JsonWriter::default();
    let mut root = writer.root_mut();
    root.create_dataset("data", DatasetBuilder::new().data(vec![1.0, 2.0]))?;
    assert!(matches!(
        root.require_dataset_logging("data", DatasetLoggingBuilder::new()),
        Err(NodeError::Logging(DatasetLoggingError::NotLogging(_)))
    ));
    assert!(matches!(
        root.create_dataset_logging("data", DatasetLoggingBuilder::new()),
        Err(NodeError::DuplicatePath(_))
    ));
    Ok(())
}

#[test]
fn dataset_logging_global_logger() -> Result<(), Box<dyn Error>> {
    let sink = Arc::new(LogSink::new());
    let dataset = DatasetLoggingBuilder::new()
        .attributes([LogAttribute::Levelname, LogAttribute::Message])
        .level(LevelFilter::Debug)
        .target(module_path!())
        .build("/log")?;
    let logging = dataset.logging().ok_or("not logging")?;
    logging.bind(&sink);
    Arc::clone(&sink).install(LevelFilter::Debug)?;

    log::info!("voltage {:.3} V", 1.25);
    log::debug!("sample {}", 7);
    log::trace!("hidden");
    log::info!(target: "elsewhere", "not recorded");

    assert_eq!(logging.record_count(), 2);
    assert_eq!(
        *dataset.field("message")?,
        ArrayData::from(vec![Value::from("voltage 1.250 V"), Value::from("sample 7")])
    );
    assert_eq!(
        *dataset.field("levelname")?,
        ArrayData::from(vec![Value::from("INFO"), Value::from("DEBUG")])
    );
    Ok(())
}
