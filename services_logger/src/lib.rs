//! # Logger Service
//!
//! This crate implements structured logging for the kernel and its host.
//!
//! ## Philosophy
//!
//! Logging is explicit and structured, not text-based or printf-style.
//! Kernel events arrive as values and leave as one JSON object per line,
//! so a dashboard or a test can parse the stream without scraping text.

pub mod sink;

pub use sink::{JsonLinesSink, SinkError};

use core_types::TaskId;
use kernel_api::{EventRecord, KernelEvent};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// Informational messages
    Info,
    /// Warnings
    Warn,
    /// Errors
    Error,
}

/// A structured log entry
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Tick the entry refers to (if known)
    pub tick: Option<u64>,
    /// Source task (if known)
    pub source: Option<TaskId>,
    /// Log message
    pub message: String,
    /// Structured fields
    pub fields: Vec<(String, Value)>,
}

impl LogEntry {
    /// Creates a new log entry
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            tick: None,
            source: None,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Stamps the entry with a tick
    pub fn with_tick(mut self, tick: u64) -> Self {
        self.tick = Some(tick);
        self
    }

    /// Sets the source task
    pub fn with_source(mut self, source: TaskId) -> Self {
        self.source = Some(source);
        self
    }

    /// Adds a field to the log entry
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    /// Looks up a structured field
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    /// Renders the entry as a `log_entry` JSON object
    ///
    /// Fixed keys win over structured fields of the same name.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        for (key, value) in &self.fields {
            object.insert(key.clone(), value.clone());
        }
        object.insert("type".into(), "log_entry".into());
        object.insert("level".into(), serde_json::to_value(self.level).unwrap_or_default());
        if let Some(tick) = self.tick {
            object.insert("tick".into(), tick.into());
        }
        if let Some(source) = self.source {
            object.insert("task".into(), source.as_u32().into());
        }
        object.insert("message".into(), self.message.clone().into());
        Value::Object(object)
    }
}

impl From<&EventRecord> for LogEntry {
    fn from(record: &EventRecord) -> Self {
        let (level, message) = describe(&record.event);
        let mut entry = LogEntry::new(level, message).with_tick(record.tick);
        if let Some(task_id) = record.event.task_id() {
            entry = entry.with_source(task_id);
        }
        if let Ok(Value::Object(fields)) = serde_json::to_value(&record.event) {
            for (key, value) in fields {
                if key != "task_id" {
                    entry = entry.with_field(key, value);
                }
            }
        }
        entry
    }
}

fn describe(event: &KernelEvent) -> (LogLevel, String) {
    match event {
        KernelEvent::TickAdvanced => (LogLevel::Debug, "Tick advanced".to_string()),
        KernelEvent::TaskCreated { task_id, priority } => (
            LogLevel::Info,
            format!("Kernel: Created {task_id} (Priority: {priority})"),
        ),
        KernelEvent::TaskDispatched { task_id, priority } => (
            LogLevel::Info,
            format!("Scheduler: Running {task_id} (Priority: {priority})"),
        ),
        KernelEvent::TaskBlocked { task_id, wake_at } => (
            LogLevel::Debug,
            format!("Scheduler: {task_id} sleeping until tick {wake_at}"),
        ),
        KernelEvent::TaskWoken { task_id } => {
            (LogLevel::Debug, format!("Scheduler: {task_id} is ready"))
        }
        KernelEvent::CycleIdle => (
            LogLevel::Info,
            "Scheduler: No ready tasks. Idling.".to_string(),
        ),
        KernelEvent::MutexAcquired { mutex, task_id } => {
            (LogLevel::Debug, format!("{task_id}: {mutex} acquired"))
        }
        KernelEvent::MutexReleased { mutex, task_id } => {
            (LogLevel::Debug, format!("{task_id}: {mutex} released"))
        }
        KernelEvent::MutexContended {
            mutex,
            task_id,
            owner,
        } => (
            LogLevel::Warn,
            format!("{task_id}: {mutex} locked by {owner}, yielding"),
        ),
        KernelEvent::MutexStalled {
            mutex,
            task_id,
            owner,
        } => (
            LogLevel::Error,
            format!("{task_id}: gave up waiting for {mutex} held by {owner}"),
        ),
        KernelEvent::UnlockRejected {
            mutex, task_id, ..
        } => (
            LogLevel::Error,
            format!("{task_id}: unlock of {mutex} rejected, not the owner"),
        ),
    }
}
