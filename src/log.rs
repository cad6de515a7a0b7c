//! Diagnostic sink.
//!
//! Every record that passes `env_logger` filtering (`RUST_LOG`, default is `hook=info`) is kept in
//! a bounded in-memory buffer, so interface can show diagnostics without a terminal for stderr.

use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use once_cell::sync::OnceCell;
use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

const BUFFER_LIMIT: usize = 1024;

type Buffer = Arc<Mutex<VecDeque<LogLine>>>;

static BUFFER: OnceCell<Buffer> = OnceCell::new();

#[derive(PartialEq, Clone, Debug, Eq)]
pub struct LogLine {
    pub level: Level,
    pub time: String,
    pub target: String,
    pub body: String,
}

impl Display for LogLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "[{} {} {}] {}",
            self.time, self.level, self.target, self.body
        ))
    }
}

pub struct DiagnosticLogger {
    inner: env_logger::Logger,
    buffer: Buffer,
    echo: bool,
}

impl Log for DiagnosticLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = LogLine {
            level: record.level(),
            time: Local::now().format("%H:%M:%S%.3f").to_string(),
            target: record.target().to_string(),
            body: format!("{}", record.args()),
        };
        if let Ok(mut buffer) = self.buffer.lock() {
            if buffer.len() == BUFFER_LIMIT {
                buffer.pop_front();
            }
            buffer.push_back(line);
        }

        if self.echo {
            self.inner.log(record);
        }
    }

    fn flush(&self) {
        self.inner.flush()
    }
}

impl DiagnosticLogger {
    /// Create logger.
    ///
    /// # Arguments
    ///
    /// * `buffer`: diagnostic buffer
    /// * `echo`: duplicate records into stderr
    pub fn new(buffer: Buffer, echo: bool) -> Self {
        let env = env_logger::Env::default().default_filter_or("hook=info");
        Self {
            inner: env_logger::Builder::from_env(env).build(),
            buffer,
            echo,
        }
    }

    pub fn filter(&self) -> LevelFilter {
        self.inner.filter()
    }
}

/// Install diagnostic logger. Calls after the first one do nothing.
pub fn init(echo: bool) {
    let buffer = Buffer::default();
    if BUFFER.set(buffer.clone()).is_err() {
        return;
    }

    let logger = DiagnosticLogger::new(buffer, echo);
    let filter = logger.filter();
    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(filter);
    }
}

/// Buffered diagnostics, oldest first. Empty if logger is not installed.
pub fn diagnostics() -> Vec<LogLine> {
    BUFFER
        .get()
        .and_then(|buffer| buffer.lock().ok().map(|b| b.iter().cloned().collect()))
        .unwrap_or_default()
}
