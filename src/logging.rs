//! Rank-aware console logging
//!
//! Library code logs through `tracing` macros. [`setup_logger`] installs the
//! console subscriber on the main process (rank 0) only, so worker processes
//! in a distributed run stay quiet. Lines look like
//!
//! ```text
//! [10/16 14:03:27 vendaval]: Built loss function: FocalLoss
//! [10/16 14:03:27 vendaval]: WARNING Optimizer is None, therefore no optimizer will be created.
//! ```

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;

/// Default logger name
pub const DEFAULT_NAME: &str = "vendaval";

const TIME_FORMAT: &str = "%m/%d %H:%M:%S";

/// Event formatter producing `[MM/DD HH:MM:SS name]: message`
#[derive(Debug, Clone)]
pub struct LineFormat {
    name: String,
}

impl LineFormat {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Everything before the message body
    pub fn prefix(&self, timestamp: &str, level: Level) -> String {
        let severity = match level {
            Level::WARN => "WARNING ",
            Level::ERROR => "ERROR ",
            _ => "",
        };
        format!("[{timestamp} {}]: {severity}", self.name)
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let timestamp = Local::now().format(TIME_FORMAT).to_string();
        write!(writer, "{}", self.prefix(&timestamp, *event.metadata().level()))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Handle returned by [`setup_logger`]
#[derive(Debug)]
pub struct Logger {
    name: String,
    rank: usize,
    level: Level,
    installed: bool,
}

impl Logger {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn is_main_process(&self) -> bool {
        self.rank == 0
    }

    /// Whether this call installed the console subscriber
    pub fn installed(&self) -> bool {
        self.installed
    }

    /// Whether a message at `level` passes this logger's threshold
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }

    /// Log `msg` on the main process when `level` passes the threshold
    pub fn log(&self, level: Level, msg: impl Display) {
        if self.enabled(level) {
            log_main_process(self.rank, level, msg);
        }
    }
}

type LoggerKey = (usize, String, Level);

static LOGGERS: LazyLock<Mutex<HashMap<LoggerKey, Arc<Logger>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Initialize the logger for `name` on process `rank`
///
/// Calls with the same arguments return the same [`Logger`]. Only rank 0
/// attaches a console subscriber, and only when no global subscriber is set
/// yet. Lines go to stdout.
pub fn setup_logger(rank: usize, name: &str, level: Level) -> Arc<Logger> {
    setup_logger_with_writer(rank, name, level, std::io::stdout)
}

/// [`setup_logger`] writing to `writer` instead of stdout
pub fn setup_logger_with_writer<W>(rank: usize, name: &str, level: Level, writer: W) -> Arc<Logger>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let mut loggers = LOGGERS.lock().unwrap_or_else(PoisonError::into_inner);
    let key = (rank, name.to_string(), level);
    if let Some(logger) = loggers.get(&key) {
        return Arc::clone(logger);
    }

    let installed = rank == 0
        && tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(writer)
            .event_format(LineFormat::new(name))
            .try_init()
            .is_ok();

    let logger = Arc::new(Logger { name: name.to_string(), rank, level, installed });
    loggers.insert(key, Arc::clone(&logger));
    logger
}

/// Log `msg` at `level`, but only on the main process
pub fn log_main_process(rank: usize, level: Level, msg: impl Display) {
    if rank != 0 {
        return;
    }
    match level {
        Level::ERROR => tracing::error!("{msg}"),
        Level::WARN => tracing::warn!("{msg}"),
        Level::INFO => tracing::info!("{msg}"),
        Level::DEBUG => tracing::debug!("{msg}"),
        _ => tracing::trace!("{msg}"),
    }
}
