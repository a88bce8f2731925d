//! File sink backed by a dedicated writer thread.
//!
//! ```text
//! producers                      writer thread
//! ─────────                      ─────────────
//! accept(line) ──── lines ────▶  create/truncate file
//! accept(line) ──── lines ────▶  write line + '\n'
//! shutdown()   ──── done  ────▶  drain queued lines, flush, close
//! ```
//!
//! The writer is the only code that ever touches the file handle. `accept`
//! returns before the file is necessarily open; if opening fails the sink
//! turns inert and the failure is reported once through the owning logger.

use std::{
    cell::Cell,
    fs::File,
    io::{LineWriter, Write},
    path::{Path, PathBuf},
    str::FromStr,
    sync::{
        atomic::{AtomicU64, AtomicU8, Ordering},
        Arc, Mutex, OnceLock, PoisonError, Weak,
    },
    thread::{self, JoinHandle, ThreadId},
    time::Duration,
};

use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};

use super::{formatters::render_message, CallSite, Level, LogSink, Logger};

/// Attempts made by [`Backpressure::DropOldest`] to make room before giving up
/// on the new line.
const EVICT_ATTEMPTS: usize = 8;

thread_local! {
    /// Set on every writer thread, whichever sink it serves.
    static ON_WRITER_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// What [`FileSink::accept`] does when the writer is not ready for a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backpressure {
    /// Wait until the writer takes the line.
    #[default]
    Block,
    /// Wait at most this long, then drop the line.
    Timeout(Duration),
    /// Drop the line being logged.
    DropNewest,
    /// Evict the oldest queued line to make room.
    DropOldest,
}

impl FromStr for Backpressure {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "block" => Ok(Backpressure::Block),
            "drop-newest" => Ok(Backpressure::DropNewest),
            "drop-oldest" => Ok(Backpressure::DropOldest),
            other => match other.strip_prefix("timeout:") {
                Some(ms) => {
                    let ms: u64 = ms
                        .trim()
                        .parse()
                        .map_err(|_| eyre::eyre!("invalid timeout '{}' in backpressure policy", ms))?;
                    Ok(Backpressure::Timeout(Duration::from_millis(ms)))
                }
                None => Err(eyre::eyre!(
                    "unknown backpressure policy '{}', expected block, drop-newest, drop-oldest or timeout:<ms>",
                    s
                )),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSinkOptions {
    /// Handoff channel capacity, `0` makes every `accept` a rendezvous with the writer.
    pub capacity: usize,
    pub backpressure: Backpressure,
}

impl FileSinkOptions {
    pub fn new(capacity: usize, backpressure: Backpressure) -> Self {
        Self {
            capacity,
            backpressure,
        }
    }

    /// Evicting needs at least one slot to evict from.
    pub fn normalized(self) -> Self {
        match self.backpressure {
            Backpressure::DropOldest if self.capacity == 0 => Self {
                capacity: 1,
                ..self
            },
            _ => self,
        }
    }
}

impl Default for FileSinkOptions {
    fn default() -> Self {
        Self::new(0, Backpressure::Block)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SinkState {
    /// Writer spawned, file not open yet.
    Opening = 0,
    Active = 1,
    /// Shutdown requested, writer draining.
    Closing = 2,
    Closed = 3,
    /// The file could not be created. Terminal.
    Failed = 4,
}

impl SinkState {
    fn from_u8(raw: u8) -> SinkState {
        match raw {
            0 => SinkState::Opening,
            1 => SinkState::Active,
            2 => SinkState::Closing,
            3 => SinkState::Closed,
            _ => SinkState::Failed,
        }
    }

    pub fn accepts_lines(self) -> bool {
        matches!(self, SinkState::Opening | SinkState::Active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileSinkStats {
    pub written: u64,
    pub dropped: u64,
    pub write_errors: u64,
}

#[derive(Debug)]
struct Shared {
    state: AtomicU8,
    written: AtomicU64,
    dropped: AtomicU64,
    write_errors: AtomicU64,
    /// Lines handed to the channel, and lines taken back out of it.
    queued: AtomicU64,
    taken: AtomicU64,
    writer: OnceLock<ThreadId>,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(SinkState::Opening as u8),
            written: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            queued: AtomicU64::new(0),
            taken: AtomicU64::new(0),
            writer: OnceLock::new(),
        }
    }

    fn state(&self) -> SinkState {
        SinkState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: SinkState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn transition(&self, from: SinkState, to: SinkState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn drop_lines(&self, count: u64) {
        self.dropped.fetch_add(count, Ordering::Relaxed);
    }

    fn take_lines(&self, count: u64) {
        self.taken.fetch_add(count, Ordering::Relaxed);
    }

    /// Lines a producer managed to queue after the writer was gone. They sit
    /// in the channel until it is dropped and are never written.
    fn stranded(&self) -> u64 {
        match self.state() {
            SinkState::Closed | SinkState::Failed => {
                let queued = self.queued.load(Ordering::Acquire);
                queued.saturating_sub(self.taken.load(Ordering::Acquire))
            }
            _ => 0,
        }
    }
}

pub struct FileSink {
    path: PathBuf,
    options: FileSinkOptions,
    lines: Sender<String>,
    evict: Option<Receiver<String>>,
    done: Sender<()>,
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl FileSink {
    /// Starts the writer for `path` and returns right away, before the file
    /// is necessarily open.
    ///
    /// Problems opening or writing the file are reported through `reporter`
    /// at [`Level::Error`]; when the logger is gone they go to stderr.
    pub fn spawn(
        path: impl Into<PathBuf>,
        options: FileSinkOptions,
        reporter: Weak<Logger>,
    ) -> Arc<Self> {
        let path = path.into();
        let options = options.normalized();

        let (lines_tx, lines_rx) = bounded::<String>(options.capacity);
        let (done_tx, done_rx) = bounded::<()>(1);
        let evict = match options.backpressure {
            Backpressure::DropOldest => Some(lines_rx.clone()),
            _ => None,
        };
        let shared = Arc::new(Shared::new());

        let writer = Writer {
            path: path.clone(),
            shared: shared.clone(),
            reporter: reporter.clone(),
            write_error_reported: false,
        };

        let worker = thread::Builder::new()
            .name("fanlog-writer".into())
            .spawn(move || writer.run(lines_rx, done_rx));

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(err) => {
                shared.set_state(SinkState::Failed);
                report(
                    &reporter,
                    crate::call_site!(),
                    format_args!("error spawning log writer for {}: {}", path.display(), err),
                );
                None
            }
        };

        Arc::new(Self {
            path,
            options,
            lines: lines_tx,
            evict,
            done: done_tx,
            shared,
            worker: Mutex::new(worker),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> FileSinkOptions {
        self.options
    }

    pub fn state(&self) -> SinkState {
        self.shared.state()
    }

    pub fn stats(&self) -> FileSinkStats {
        FileSinkStats {
            written: self.shared.written.load(Ordering::Relaxed),
            dropped: self.shared.dropped.load(Ordering::Relaxed) + self.shared.stranded(),
            write_errors: self.shared.write_errors.load(Ordering::Relaxed),
        }
    }

    /// Asks the writer to stop and waits for it.
    ///
    /// Lines queued before the call are still written. Once this returns the
    /// file is flushed and closed, and further lines are dropped.
    pub fn shutdown(&self) -> eyre::Result<()> {
        if !self.shared.transition(SinkState::Active, SinkState::Closing) {
            self.shared.transition(SinkState::Opening, SinkState::Closing);
        }
        let _ = self.done.try_send(());

        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match handle {
            // The writer may end up here by reporting through a logger it
            // holds the last reference to; it cannot join itself.
            Some(handle) if handle.thread().id() != thread::current().id() => handle
                .join()
                .map_err(|_| eyre::eyre!("log writer for {} panicked", self.path.display())),
            _ => Ok(()),
        }
    }

    fn on_writer_thread(&self) -> bool {
        self.shared.writer.get() == Some(&thread::current().id())
    }

    fn push_evicting(&self, mut line: String) -> bool {
        for _ in 0..EVICT_ATTEMPTS {
            match self.lines.try_send(line) {
                Ok(()) => return true,
                Err(TrySendError::Disconnected(_)) => return false,
                Err(TrySendError::Full(back)) => {
                    line = back;
                    if let Some(evict) = &self.evict {
                        if evict.try_recv().is_ok() {
                            self.shared.take_lines(1);
                            self.shared.drop_lines(1);
                        }
                    }
                }
            }
        }
        false
    }
}

impl LogSink for FileSink {
    fn accept(&self, line: &str) {
        // The writer reporting its own failure must never wait on itself.
        if !self.state().accepts_lines() || self.on_writer_thread() {
            self.shared.drop_lines(1);
            return;
        }

        // Another writer reporting a failure through the logger must not wait
        // on this one, which may be reporting back the same way.
        let backpressure = if ON_WRITER_THREAD.with(Cell::get) {
            Backpressure::DropNewest
        } else {
            self.options.backpressure
        };

        let line = line.to_string();
        let delivered = match backpressure {
            Backpressure::Block => self.lines.send(line).is_ok(),
            Backpressure::Timeout(timeout) => self.lines.send_timeout(line, timeout).is_ok(),
            Backpressure::DropNewest => self.lines.try_send(line).is_ok(),
            Backpressure::DropOldest => self.push_evicting(line),
        };

        if delivered {
            self.shared.queued.fetch_add(1, Ordering::AcqRel);
        } else {
            self.shared.drop_lines(1);
        }
    }

    fn close(&self) {
        if let Err(err) = self.shutdown() {
            let site = crate::call_site!();
            super::logger::bootstrap(&format!("[{}] {} {}", Level::Error, site.short_tag(), err));
        }
    }
}

impl std::fmt::Debug for FileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSink")
            .field("path", &self.path)
            .field("options", &self.options)
            .field("state", &self.state())
            .field("stats", &self.stats())
            .finish()
    }
}

struct Writer {
    path: PathBuf,
    shared: Arc<Shared>,
    reporter: Weak<Logger>,
    write_error_reported: bool,
}

impl Writer {
    fn run(mut self, lines: Receiver<String>, done: Receiver<()>) {
        let _ = self.shared.writer.set(thread::current().id());
        ON_WRITER_THREAD.with(|flag| flag.set(true));

        let file = match File::create(&self.path) {
            Ok(file) => file,
            Err(err) => {
                self.shared.set_state(SinkState::Failed);
                let lost = lines.try_iter().count() as u64;
                self.shared.take_lines(lost);
                self.shared.drop_lines(lost);
                drop(lines);

                report(
                    &self.reporter,
                    crate::call_site!(),
                    format_args!("error creating log file {}: {}", self.path.display(), err),
                );
                return;
            }
        };

        // Loses only against a shutdown that arrived while opening; the
        // pending done signal is then picked up by the loop below.
        self.shared.transition(SinkState::Opening, SinkState::Active);

        let mut out = LineWriter::new(file);

        loop {
            select! {
                recv(lines) -> msg => match msg {
                    Ok(line) => {
                        self.shared.take_lines(1);
                        self.write(&mut out, &line);
                    }
                    Err(_) => break,
                },
                recv(done) -> _ => {
                    self.shared.set_state(SinkState::Closing);
                    for line in lines.try_iter() {
                        self.shared.take_lines(1);
                        self.write(&mut out, &line);
                    }
                    break;
                },
            }
        }

        let _ = out.flush();
        drop(out);
        self.shared.set_state(SinkState::Closed);
    }

    fn write(&mut self, out: &mut LineWriter<File>, line: &str) {
        match writeln!(out, "{}", line) {
            Ok(()) => {
                self.shared.written.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                self.shared.write_errors.fetch_add(1, Ordering::Relaxed);
                if !self.write_error_reported {
                    self.write_error_reported = true;
                    report(
                        &self.reporter,
                        crate::call_site!(),
                        format_args!("error writing log file {}: {}", self.path.display(), err),
                    );
                }
            }
        }
    }
}

fn report(reporter: &Weak<Logger>, site: CallSite, args: std::fmt::Arguments<'_>) {
    match reporter.upgrade() {
        Some(logger) => logger.log_at(Level::Error, site, args),
        None => super::logger::bootstrap(&format!(
            "[{}] {} {}",
            Level::Error,
            site.short_tag(),
            render_message(&args)
        )),
    }
}
