use std::{
    io::Write,
    sync::{Mutex, PoisonError},
};

use super::LogSink;

/// Writes every line to stdout on the calling thread before returning.
#[derive(Debug)]
pub struct StdoutSink {
    handle: std::io::Stdout,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self {
            handle: std::io::stdout(),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for StdoutSink {
    fn accept(&self, line: &str) {
        let mut writer = self.handle.lock();

        let _ = writeln!(writer, "{}", line);
        let _ = writer.flush();
    }

    fn flush(&self) {
        let _ = self.handle.lock().flush();
    }
}

/// Same as [`StdoutSink`] but for stderr.
#[derive(Debug)]
pub struct StderrSink {
    handle: std::io::Stderr,
}

impl StderrSink {
    pub fn new() -> Self {
        Self {
            handle: std::io::stderr(),
        }
    }
}

impl Default for StderrSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for StderrSink {
    fn accept(&self, line: &str) {
        let mut writer = self.handle.lock();

        let _ = writeln!(writer, "{}", line);
        let _ = writer.flush();
    }

    fn flush(&self) {
        let _ = self.handle.lock().flush();
    }
}

/// Keeps every accepted line in memory, mostly useful in tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn contains(&self, text: &str) -> bool {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|line| line.contains(text))
    }
}

impl LogSink for MemorySink {
    fn accept(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}
