//! Generic logging facility with a default implementation.

use crate::context::Context;

pub const INFO: &str = "info";
pub const WARN: &str = "warning";
pub const ERROR: &str = "error";

/// Generic trait any logger must implement.
pub trait Logger {
    /// Write the message somewhere.
    fn write(&self, msg: String);

    /// Log an `INFO` message.
    fn info(&self, msg: impl AsRef<str>, context: Option<&Context>) {
        self.write(self.format_log(INFO, msg, context));
    }

    /// Log a `WARN` message.
    fn warn(&self, msg: impl AsRef<str>, context: Option<&Context>) {
        self.write(self.format_log(WARN, msg, context));
    }

    /// Log an `ERROR` message.
    fn error(&self, msg: impl AsRef<str>, context: Option<&Context>) {
        self.write(self.format_log(ERROR, msg, context));
    }

    /// Formatter for all log messages. Info messages stay unlabeled so routine notices read like
    /// the classical tool's output.
    fn format_log(&self, level: &str, msg: impl AsRef<str>, context: Option<&Context>) -> String {
        let label = context
            .and_then(|c| c.label())
            .map(|l| format!("{}: ", l))
            .unwrap_or_default();

        if level == INFO {
            format!("make: {label}{}", msg.as_ref())
        } else {
            format!("make: {label}{level}: {}", msg.as_ref())
        }
    }
}

/// Uses the default implementation and outputs to `stderr`.
pub struct DefaultLogger {}

impl Logger for DefaultLogger {
    fn write(&self, msg: String) {
        eprintln!("{}", msg);
    }
}
