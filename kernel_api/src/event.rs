//! Structured kernel events
//!
//! Every state transition in the kernel is reported as a [`KernelEvent`].
//! The kernel only produces values; formatting and transport belong to
//! whoever implements [`EventSink`].

use core_types::{MutexId, Priority, TaskId};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// A kernel state transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum KernelEvent {
    /// The tick counter advanced; a new dispatch cycle begins
    TickAdvanced,
    /// A task was registered
    TaskCreated { task_id: TaskId, priority: Priority },
    /// A task was selected and started its slice
    TaskDispatched { task_id: TaskId, priority: Priority },
    /// A task went to sleep
    TaskBlocked { task_id: TaskId, wake_at: u64 },
    /// A sleeping task reached its deadline and is ready again
    TaskWoken { task_id: TaskId },
    /// Selection found nothing to run
    CycleIdle,
    /// A task took a mutex
    MutexAcquired { mutex: MutexId, task_id: TaskId },
    /// A task released a mutex
    MutexReleased { mutex: MutexId, task_id: TaskId },
    /// A task found a mutex held and is yielding
    MutexContended {
        mutex: MutexId,
        task_id: TaskId,
        owner: TaskId,
    },
    /// A task gave up spinning on a mutex
    MutexStalled {
        mutex: MutexId,
        task_id: TaskId,
        owner: TaskId,
    },
    /// A non-owner tried to release a mutex
    UnlockRejected {
        mutex: MutexId,
        task_id: TaskId,
        owner: Option<TaskId>,
    },
}

impl KernelEvent {
    /// Returns the task the event is about, if any
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            KernelEvent::TickAdvanced | KernelEvent::CycleIdle => None,
            KernelEvent::TaskCreated { task_id, .. }
            | KernelEvent::TaskDispatched { task_id, .. }
            | KernelEvent::TaskBlocked { task_id, .. }
            | KernelEvent::TaskWoken { task_id }
            | KernelEvent::MutexAcquired { task_id, .. }
            | KernelEvent::MutexReleased { task_id, .. }
            | KernelEvent::MutexContended { task_id, .. }
            | KernelEvent::MutexStalled { task_id, .. }
            | KernelEvent::UnlockRejected { task_id, .. } => Some(*task_id),
        }
    }
}

/// An event stamped with the tick it occurred at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub tick: u64,
    #[serde(flatten)]
    pub event: KernelEvent,
}

/// Receiver for kernel events
///
/// Sinks are attached to a kernel and see every event in order. They must
/// not call back into the kernel.
pub trait EventSink {
    fn record(&mut self, record: &EventRecord);
}

/// Lets the host keep a handle on a sink it also hands to a kernel
impl<S: EventSink> EventSink for Rc<RefCell<S>> {
    fn record(&mut self, record: &EventRecord) {
        self.borrow_mut().record(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_of_event() {
        let event = KernelEvent::TaskWoken {
            task_id: TaskId::new(3),
        };
        assert_eq!(event.task_id(), Some(TaskId::new(3)));
        assert_eq!(KernelEvent::CycleIdle.task_id(), None);
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = EventRecord {
            tick: 4,
            event: KernelEvent::TaskBlocked {
                task_id: TaskId::new(1),
                wake_at: 6,
            },
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["tick"], 4);
        assert_eq!(value["event"], "task_blocked");
        assert_eq!(value["task_id"], 1);
        assert_eq!(value["wake_at"], 6);
    }

    #[test]
    fn test_shared_sink_forwards() {
        struct Count(usize);
        impl EventSink for Count {
            fn record(&mut self, _record: &EventRecord) {
                self.0 += 1;
            }
        }

        let shared = Rc::new(RefCell::new(Count(0)));
        let mut handle = Rc::clone(&shared);
        handle.record(&EventRecord {
            tick: 1,
            event: KernelEvent::CycleIdle,
        });
        assert_eq!(shared.borrow().0, 1);
    }

    #[test]
    fn test_unit_event_serializes_with_tag_only() {
        let json = serde_json::to_string(&KernelEvent::CycleIdle).unwrap();
        assert_eq!(json, r#"{"event":"cycle_idle"}"#);
    }
}
