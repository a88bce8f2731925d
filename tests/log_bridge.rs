use std::sync::Arc;

use fanlog::{Level, Logger, MemorySink};

// The `log` facade accepts a single logger per process, so everything that
// touches it lives in this one test.
#[test]
fn log_macros_flow_through_the_installed_logger() {
    let logger = Arc::new(Logger::default());
    logger.set_level(Level::Info);
    let memory = Arc::new(MemorySink::new());
    logger.add_sink(memory.clone());

    logger.init().unwrap();

    log::trace!("too chatty");
    log::debug!("still too chatty");
    let line = line!() + 1;
    log::warn!("cache miss for {}", "user:42");

    assert_eq!(
        memory.lines(),
        vec![format!("[warn] log_bridge[log_bridge.rs:{line}] cache miss for user:42")]
    );

    logger.set_level(Level::All);
    log::trace!("now visible");
    assert!(memory.lines()[1].starts_with("[debug] log_bridge[log_bridge.rs:"));

    let second = Arc::new(Logger::default());
    assert!(second.init().is_err());
}
