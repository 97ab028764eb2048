//! Logger setup and in-memory log capture.
//!
//! [`init_logger`] installs a logger that writes to stderr through
//! `env_logger` (honouring `RUST_LOG`, default level `info`) and also keeps the
//! most recent records in a bounded ring. Debug overlays and in-game consoles
//! read the ring with [`drain_captured_logs`].
//!
//! ```text
//! log::warn!(..) ──▶ CaptureLogger ──┬──▶ env_logger (stderr)
//!                                    └──▶ LogRing (last 500) ──▶ drain_captured_logs
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

use log::Log;

/// Maximum records kept in memory. The oldest record is dropped first.
pub const LOG_CAPACITY: usize = 500;

/// One captured log record.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedLog {
    pub level: log::Level,
    pub target: String,
    pub message: String,
    /// Seconds since the logger was installed.
    pub timestamp_secs: f32,
}

struct LogRing {
    entries: VecDeque<CapturedLog>,
    capacity: usize,
}

impl LogRing {
    const fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    fn push(&mut self, entry: CapturedLog) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    fn drain(&mut self, max: usize) -> Vec<CapturedLog> {
        let n = self.entries.len().min(max);
        self.entries.drain(..n).collect()
    }
}

static LOG_RING: Mutex<LogRing> = Mutex::new(LogRing::new(LOG_CAPACITY));
static LOG_START: OnceLock<Instant> = OnceLock::new();
static LOGGER: OnceLock<CaptureLogger> = OnceLock::new();

struct CaptureLogger {
    inner: env_logger::Logger,
}

impl Log for CaptureLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata) || metadata.level() <= log::Level::Info
    }

    fn log(&self, record: &log::Record) {
        if self.inner.enabled(record.metadata()) {
            self.inner.log(record);
        }

        let entry = CapturedLog {
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
            timestamp_secs: LOG_START.get().map_or(0.0, |s| s.elapsed().as_secs_f32()),
        };
        if let Ok(mut ring) = LOG_RING.lock() {
            ring.push(entry);
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Install the engine logger. Call early, before anything logs.
///
/// Calling it again, or after another logger was installed, leaves the
/// existing logger in place and prints a warning to stderr.
pub fn init_logger() {
    LOG_START.get_or_init(Instant::now);

    let inner = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .build();
    let max_level = inner.filter();
    let logger = LOGGER.get_or_init(|| CaptureLogger { inner });

    if log::set_logger(logger).is_err() {
        eprintln!("[sable] Warning: a logger is already set. Log capture disabled.");
        return;
    }
    log::set_max_level(max_level.max(log::LevelFilter::Info));
}

/// Take up to `max` of the oldest captured records.
pub fn drain_captured_logs(max: usize) -> Vec<CapturedLog> {
    match LOG_RING.lock() {
        Ok(mut ring) => ring.drain(max),
        Err(_) => Vec::new(),
    }
}

/// Per-thread log capture for unit tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::sync::Once;

    use super::CapturedLog;

    thread_local! {
        static RECORDS: RefCell<Option<Vec<CapturedLog>>> = const { RefCell::new(None) };
    }

    struct ThreadLogger;

    impl log::Log for ThreadLogger {
        fn enabled(&self, _metadata: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            RECORDS.with(|records| {
                if let Some(records) = records.borrow_mut().as_mut() {
                    records.push(CapturedLog {
                        level: record.level(),
                        target: record.target().to_string(),
                        message: record.args().to_string(),
                        timestamp_secs: 0.0,
                    });
                }
            });
        }

        fn flush(&self) {}
    }

    static LOGGER: ThreadLogger = ThreadLogger;
    static INSTALL: Once = Once::new();

    /// Run `f` and return every record it logged on the current thread.
    pub(crate) fn capture_logs(f: impl FnOnce()) -> Vec<CapturedLog> {
        INSTALL.call_once(|| {
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(log::LevelFilter::Trace);
            }
        });
        RECORDS.with(|records| *records.borrow_mut() = Some(Vec::new()));
        f();
        RECORDS
            .with(|records| records.borrow_mut().take())
            .unwrap_or_default()
    }

    /// Records at `level` whose message contains every one of `needles`.
    pub(crate) fn matching<'a>(
        logs: &'a [CapturedLog],
        level: log::Level,
        needles: &[&str],
    ) -> Vec<&'a CapturedLog> {
        logs.iter()
            .filter(|l| l.level == level && needles.iter().all(|n| l.message.contains(n)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(message: &str) -> CapturedLog {
        CapturedLog {
            level: log::Level::Warn,
            target: "sable".to_string(),
            message: message.to_string(),
            timestamp_secs: 0.0,
        }
    }

    #[test]
    fn ring_drops_oldest_when_full() {
        let mut ring = LogRing::new(3);
        for m in ["a", "b", "c", "d"] {
            ring.push(entry(m));
        }

        let drained: Vec<String> = ring.drain(10).into_iter().map(|e| e.message).collect();
        assert_eq!(drained, vec!["b", "c", "d"]);
    }

    #[test]
    fn drain_respects_max() {
        let mut ring = LogRing::new(10);
        for m in ["a", "b", "c"] {
            ring.push(entry(m));
        }

        assert_eq!(ring.drain(2).len(), 2);
        assert_eq!(ring.drain(2)[0].message, "c");
        assert!(ring.drain(2).is_empty());
    }

    #[test]
    fn capture_sees_only_this_threads_records() {
        let logs = testing::capture_logs(|| {
            log::warn!("mine");
            std::thread::spawn(|| log::warn!("theirs")).join().unwrap();
        });

        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].message, "mine");
        assert_eq!(testing::matching(&logs, log::Level::Warn, &["mi", "ne"]).len(), 1);
    }
}
