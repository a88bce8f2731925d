use std::{fs, sync::Arc, time::Duration};

use fanlog::{
    Backpressure, Builder, FileSinkOptions, Level, LogSink, Logger, MemorySink, SinkState,
};

#[test]
fn lines_reach_the_file_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("abc.log");

    let logger = Arc::new(Logger::default());
    let sink = logger.file_sink(&path, FileSinkOptions::default());
    logger.add_sink(sink.clone());

    for line in ["a", "b", "c"] {
        logger.log(Level::Info, line);
    }
    sink.shutdown().unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\nc\n");
}

#[test]
fn file_and_stdout_get_identical_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("both.log");

    let logger = Arc::new(Logger::default());
    let memory = Arc::new(MemorySink::new());
    logger.add_sink(logger.file_sink(&path, FileSinkOptions::new(4, Backpressure::Block)));
    logger.add_sink(memory.clone());

    fanlog::warn!(logger, "low disk: {}%", 3);
    fanlog::info!(logger, "retrying");
    logger.shutdown();

    let expected: String = memory.lines().iter().map(|line| format!("{line}\n")).collect();
    assert_eq!(fs::read_to_string(&path).unwrap(), expected);
}

#[test]
fn file_receives_only_lines_after_attachment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo.log");
    let logger = Arc::new(Logger::default());

    fanlog::info!(logger, "Unseen");
    logger.add_sink(logger.file_sink(&path, FileSinkOptions::default()));
    fanlog::info!(logger, "ToFile");
    logger.shutdown();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(content.starts_with("[info] file_receives_only_lines_after_attachment[file_sink.rs:"));
    assert!(content.ends_with(" ToFile\n"));
}

#[test]
fn existing_file_is_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("old.log");
    fs::write(&path, "stale line\n").unwrap();

    let logger = Arc::new(Logger::default());
    let sink = logger.file_sink(&path, FileSinkOptions::default());
    sink.accept("fresh");
    sink.shutdown().unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "fresh\n");
}

#[test]
fn misconfigured_sink_loses_lines_and_reports_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("app.log");

    let logger = Arc::new(Logger::default());
    let memory = Arc::new(MemorySink::new());
    let sink = logger.file_sink(&path, FileSinkOptions::default());
    logger.add_sink(sink.clone());
    logger.add_sink(memory.clone());

    fanlog::info!(logger, "maybe lost");
    sink.shutdown().unwrap();
    fanlog::info!(logger, "definitely lost");

    assert_eq!(sink.state(), SinkState::Failed);
    assert!(!path.exists());
    assert_eq!(
        memory
            .lines()
            .iter()
            .filter(|line| line.contains("error creating log file"))
            .count(),
        1
    );
    assert!(memory.contains("definitely lost"));
    assert!(sink.stats().dropped >= 1);
    assert_eq!(sink.stats().written, 0);
}

#[test]
fn builder_wires_a_file_sink_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("built.log");

    let logger = Builder::new()
        .with_level(Level::Error)
        .with_file_sink(&path)
        .with_file_options(FileSinkOptions::new(16, Backpressure::DropOldest))
        .build()
        .unwrap();

    fanlog::warn!(logger, "filtered");
    fanlog::error!(logger, "kept");
    logger.shutdown();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(content.trim_end().ends_with(" kept"));
}

#[test]
fn concurrent_producers_share_one_writer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("many.log");

    let logger = Arc::new(Logger::default());
    let sink = logger.file_sink(&path, FileSinkOptions::default());
    logger.add_sink(sink.clone());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let logger = logger.clone();
            std::thread::spawn(move || {
                for m in 0..100 {
                    logger.log(Level::Info, &format!("t{t}-m{m}"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    sink.shutdown().unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 400);
    assert_eq!(sink.stats().written, 400);
    assert_eq!(sink.stats().dropped, 0);
}

#[cfg(target_os = "linux")]
#[test]
fn failing_writers_do_not_wait_on_each_other() {
    let logger = Arc::new(Logger::default());
    let memory = Arc::new(MemorySink::new());
    let sinks: Vec<_> = (0..3)
        .map(|_| logger.file_sink("/dev/full", FileSinkOptions::default()))
        .collect();
    for sink in &sinks {
        logger.add_sink(sink.clone());
    }
    logger.add_sink(memory.clone());

    let (done_tx, done_rx) = crossbeam_channel::bounded(1);
    let producer = {
        let logger = logger.clone();
        std::thread::spawn(move || {
            for _ in 0..3 {
                logger.log(Level::Info, "disk is full");
            }
            let _ = done_tx.send(());
        })
    };

    assert!(
        done_rx.recv_timeout(Duration::from_secs(5)).is_ok(),
        "logging hung while writers reported failures"
    );
    producer.join().unwrap();
    logger.shutdown();

    let reports = memory
        .lines()
        .iter()
        .filter(|line| line.contains("error writing log file /dev/full"))
        .count();
    assert_eq!(reports, 3);
    for sink in &sinks {
        assert_eq!(sink.stats().written, 0);
        assert!(sink.stats().write_errors >= 3);
    }
}
