//! Append-only session log.
//!
//! Every outbound command, every raw line received and every terminal error
//! message ends up here. The transcript is purely diagnostic: nothing in the
//! crate reads it back for control flow.

use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Local};

/// A single timestamped log line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub line: String,
}

impl Display for LogEntry {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{}\t{}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.line
        )
    }
}

/// Ordered record of one SMTP session, never pruned while the session lives
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    entries: Vec<LogEntry>,
}

impl Transcript {
    pub fn new() -> Transcript {
        Transcript::default()
    }

    /// Appends one line with the current local time.
    pub fn record<S: Into<String>>(&mut self, line: S) {
        self.entries.push(LogEntry {
            timestamp: Local::now(),
            line: line.into(),
        });
    }

    /// Records an outbound command, prefixed like a client transcript.
    pub fn record_command(&mut self, command: &str) {
        self.record(format!("# {}", command));
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
