//! JSON-lines output
//!
//! [`JsonLinesSink`] writes level-filtered `log_entry` lines and, unfiltered,
//! any other serializable record (telemetry `data` lines). The caller
//! decides the order, so one consumer sees everything as it was written.

use crate::{LogEntry, LogLevel};
use serde::Serialize;
use std::io::{self, Write};
use thiserror::Error;

/// Output failures
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Writes one JSON object per line to `W`, flushing after each
pub struct JsonLinesSink<W: Write> {
    writer: W,
    min_level: LogLevel,
    lines_written: u64,
}

impl<W: Write> JsonLinesSink<W> {
    /// Creates a sink that logs everything from [`LogLevel::Info`] up
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            min_level: LogLevel::Info,
            lines_written: 0,
        }
    }

    /// Sets the lowest level that reaches the output
    pub fn with_min_level(mut self, min_level: LogLevel) -> Self {
        self.min_level = min_level;
        self
    }

    /// Lowest level that reaches the output
    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// Writes a log entry if its level passes the filter
    pub fn write_entry(&mut self, entry: &LogEntry) -> Result<(), SinkError> {
        if entry.level < self.min_level {
            return Ok(());
        }
        self.write_line(&entry.to_json())
    }

    /// Writes any serializable value as one line, unfiltered
    pub fn write_line<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(value)?;
        line.push(b'\n');
        self.writer.write_all(&line)?;
        self.writer.flush()?;
        self.lines_written += 1;
        Ok(())
    }

    /// Lines written so far
    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    /// Borrows the underlying writer
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Consumes the sink and returns the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}
