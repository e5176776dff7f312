//! Kernel Event Audit Trail
//!
//! Every event the kernel emits is also kept here so tests can assert on
//! the exact sequence of transitions.
//!
//! ## Philosophy
//!
//! - Deterministic: Events are recorded in emission order
//! - Queryable: Tests assert on the trail instead of parsing log text
//! - Bounded: The kernel runs indefinitely, so the oldest records are
//!   dropped once capacity is reached
//!
//! ## Example
//!
//! ```
//! use sim_kernel::audit::EventAuditLog;
//! use kernel_api::{EventRecord, KernelEvent};
//!
//! let mut audit_log = EventAuditLog::with_capacity(8);
//! audit_log.record(EventRecord { tick: 1, event: KernelEvent::CycleIdle });
//!
//! assert_eq!(audit_log.len(), 1);
//! assert!(audit_log.has_event(|e| matches!(e, KernelEvent::CycleIdle)));
//! ```

use core_types::TaskId;
use kernel_api::{EventRecord, KernelEvent};
use std::collections::VecDeque;

/// Bounded chronological record of kernel events
#[derive(Debug)]
pub struct EventAuditLog {
    records: VecDeque<EventRecord>,
    capacity: usize,
    dropped: u64,
}

impl EventAuditLog {
    /// Creates an empty log keeping at most `capacity` records
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
            dropped: 0,
        }
    }

    /// Appends a record, evicting the oldest one when full
    pub fn record(&mut self, record: EventRecord) {
        if self.capacity == 0 {
            self.dropped += 1;
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
            self.dropped += 1;
        }
        self.records.push_back(record);
    }

    /// Iterates the retained records, oldest first
    pub fn records(&self) -> impl Iterator<Item = &EventRecord> {
        self.records.iter()
    }

    /// Iterates the retained events, oldest first
    pub fn events(&self) -> impl Iterator<Item = &KernelEvent> {
        self.records.iter().map(|record| &record.event)
    }

    /// Records concerning one task
    pub fn records_for_task(&self, task_id: TaskId) -> Vec<&EventRecord> {
        self.records
            .iter()
            .filter(|record| record.event.task_id() == Some(task_id))
            .collect()
    }

    /// Counts events matching the predicate
    pub fn count_events<F>(&self, predicate: F) -> usize
    where
        F: Fn(&KernelEvent) -> bool,
    {
        self.events().filter(|event| predicate(event)).count()
    }

    /// Checks if any event matches the predicate
    pub fn has_event<F>(&self, predicate: F) -> bool
    where
        F: Fn(&KernelEvent) -> bool,
    {
        self.events().any(|event| predicate(event))
    }

    /// Number of records evicted so far
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Clears all retained records
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Returns the number of retained records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Checks if the log is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
