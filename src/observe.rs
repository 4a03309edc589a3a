//! Structured logging hook for the dispatcher.
//!
//! The dispatcher reports what it does to an optional [`DispatchLogger`]. The hook is
//! a pure side channel: a dispatcher without one behaves identically.
//!
//! Messages emitted:
//!
//! | Message                 | Level   | Context keys                         |
//! |-------------------------|---------|--------------------------------------|
//! | `router initialised`    | info    | `base_path`, `routes`                |
//! | `dispatch started`      | info    | `request_id`, `raw_target`, `path`, `method` |
//! | `checking route`        | info    | `method`, `pattern`, `path`          |
//! | `route matched`         | info    | `pattern`, `path`, `params`          |
//! | `no route matched`      | warning | `path`, `method`, `routes`           |
//! | `controller not found`  | error   | `controller`, `action`, `pattern`    |
//! | `action not found`      | error   | `controller`, `action`, `pattern`    |

use serde_json::Value;
use std::sync::Mutex;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

/// Leveled logger taking a message and a key/value context object.
pub trait DispatchLogger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str, context: &Value);

    fn info(&self, message: &str, context: &Value) {
        self.log(LogLevel::Info, message, context);
    }

    fn warning(&self, message: &str, context: &Value) {
        self.log(LogLevel::Warning, message, context);
    }

    fn error(&self, message: &str, context: &Value) {
        self.log(LogLevel::Error, message, context);
    }
}

/// Forwards dispatch events to `tracing` under the `blogrouter::dispatch` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl DispatchLogger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str, context: &Value) {
        match level {
            LogLevel::Info => info!(target: "blogrouter::dispatch", context = %context, "{message}"),
            LogLevel::Warning => warn!(target: "blogrouter::dispatch", context = %context, "{message}"),
            LogLevel::Error => error!(target: "blogrouter::dispatch", context = %context, "{message}"),
        }
    }
}

/// One entry captured by [`MemoryLogger`].
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub context: Value,
}

/// Keeps every record in memory; used by `blogrouter match --explain` and tests.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records so far.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Messages only, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.message).collect()
    }

    pub fn clear(&self) {
        match self.records.lock() {
            Ok(mut r) => r.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl DispatchLogger for MemoryLogger {
    fn log(&self, level: LogLevel, message: &str, context: &Value) {
        let record = LogRecord {
            level,
            message: message.to_owned(),
            context: context.clone(),
        };
        match self.records.lock() {
            Ok(mut r) => r.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}
