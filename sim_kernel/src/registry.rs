//! Task Registry
//!
//! A fixed-capacity arena of task records indexed by [`TaskId`]. Records are
//! appended in creation order and never removed, so a task's identity is
//! simply its slot number. Memory use is bounded by the capacity chosen at
//! kernel construction.

use core_types::{Priority, TaskId};
use kernel_api::{KernelError, TaskBody, TaskState};
use std::fmt;

/// One schedulable unit of work
pub struct TaskRecord {
    id: TaskId,
    name: Option<String>,
    priority: Priority,
    pub(crate) state: TaskState,
    pub(crate) wake_at: u64,
    pub(crate) dispatch_count: u64,
    /// `None` while the body is executing somewhere on the call stack
    body: Option<Box<dyn TaskBody>>,
}

impl TaskRecord {
    /// Task identity
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Optional human-readable label
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Scheduling priority
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Current state
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Wake deadline, only while the task is blocked
    pub fn wake_at(&self) -> Option<u64> {
        match self.state {
            TaskState::Blocked => Some(self.wake_at),
            _ => None,
        }
    }

    /// Number of times the task has been dispatched
    pub fn dispatch_count(&self) -> u64 {
        self.dispatch_count
    }

    /// Returns true while the task's body is running (possibly suspended
    /// in a yield or sleep further up the call stack)
    pub fn is_executing(&self) -> bool {
        self.body.is_none()
    }

    /// Ready and not already on the call stack
    pub(crate) fn is_dispatchable(&self) -> bool {
        self.state == TaskState::Ready && !self.is_executing()
    }
}

impl fmt::Debug for TaskRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("state", &self.state)
            .field("wake_at", &self.wake_at)
            .field("dispatch_count", &self.dispatch_count)
            .field("executing", &self.is_executing())
            .finish()
    }
}

/// Fixed-capacity task table
#[derive(Debug)]
pub struct TaskRegistry {
    records: Vec<TaskRecord>,
    capacity: usize,
}

impl TaskRegistry {
    /// Creates an empty registry holding at most `capacity` tasks
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Allocates the next slot for `body`
    ///
    /// The new record starts `Ready`. Fails without side effects when the
    /// registry is full.
    pub fn create(
        &mut self,
        body: Box<dyn TaskBody>,
        priority: Priority,
        name: Option<String>,
    ) -> Result<TaskId, KernelError> {
        if self.is_full() {
            return Err(KernelError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        let raw = u32::try_from(self.records.len()).map_err(|_| KernelError::CapacityExceeded {
            capacity: self.capacity,
        })?;
        let id = TaskId::new(raw);
        self.records.push(TaskRecord {
            id,
            name,
            priority,
            state: TaskState::Ready,
            wake_at: 0,
            dispatch_count: 0,
            body: Some(body),
        });
        Ok(id)
    }

    /// Returns the record for `id`, or `None` if it was never issued
    pub fn lookup(&self, id: TaskId) -> Option<&TaskRecord> {
        self.records.get(id.index())
    }

    pub(crate) fn lookup_mut(&mut self, id: TaskId) -> Option<&mut TaskRecord> {
        self.records.get_mut(id.index())
    }

    /// Returns the state of `id`, or `None` if it was never issued
    pub fn state(&self, id: TaskId) -> Option<TaskState> {
        self.lookup(id).map(|record| record.state)
    }

    pub(crate) fn set_state(&mut self, id: TaskId, state: TaskState) {
        if let Some(record) = self.lookup_mut(id) {
            record.state = state;
        }
    }

    /// Takes the body out of its slot for execution
    pub(crate) fn take_body(&mut self, id: TaskId) -> Option<Box<dyn TaskBody>> {
        self.lookup_mut(id).and_then(|record| record.body.take())
    }

    /// Puts a body back after its slice ends
    pub(crate) fn restore_body(&mut self, id: TaskId, body: Box<dyn TaskBody>) {
        if let Some(record) = self.lookup_mut(id) {
            record.body = Some(body);
        }
    }

    /// Iterates records in creation order
    pub fn iter(&self) -> impl Iterator<Item = &TaskRecord> {
        self.records.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TaskRecord> {
        self.records.iter_mut()
    }

    /// Number of registered tasks
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no task has been registered
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maximum number of tasks
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true when no further task can be created
    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_api::TaskContext;

    fn noop() -> Box<dyn TaskBody> {
        Box::new(|_: &mut dyn TaskContext| {})
    }

    #[test]
    fn test_create_assigns_increasing_ids() {
        let mut registry = TaskRegistry::new(4);
        let a = registry.create(noop(), Priority(1), None).unwrap();
        let b = registry.create(noop(), Priority(1), None).unwrap();
        assert_eq!(a, TaskId::new(0));
        assert_eq!(b, TaskId::new(1));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_new_record_is_ready() {
        let mut registry = TaskRegistry::new(2);
        let id = registry
            .create(noop(), Priority(3), Some("vitals".to_string()))
            .unwrap();
        let record = registry.lookup(id).unwrap();
        assert_eq!(record.id(), id);
        assert_eq!(record.priority(), Priority(3));
        assert_eq!(record.state(), TaskState::Ready);
        assert_eq!(record.name(), Some("vitals"));
        assert_eq!(record.wake_at(), None);
        assert_eq!(record.dispatch_count(), 0);
        assert!(!record.is_executing());
    }

    #[test]
    fn test_capacity_exceeded_leaves_registry_unchanged() {
        let mut registry = TaskRegistry::new(2);
        registry.create(noop(), Priority(1), None).unwrap();
        registry.create(noop(), Priority(1), None).unwrap();
        assert!(registry.is_full());

        let result = registry.create(noop(), Priority(1), None);
        assert_eq!(result, Err(KernelError::CapacityExceeded { capacity: 2 }));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_zero_capacity_registry_rejects_everything() {
        let mut registry = TaskRegistry::new(0);
        assert!(registry.create(noop(), Priority(1), None).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_lookup_unissued_id_is_none() {
        let mut registry = TaskRegistry::new(4);
        registry.create(noop(), Priority(1), None).unwrap();
        assert!(registry.lookup(TaskId::new(1)).is_none());
        assert!(registry.lookup(TaskId::new(u32::MAX)).is_none());
        assert_eq!(registry.state(TaskId::new(3)), None);
    }

    #[test]
    fn test_take_and_restore_body_tracks_execution() {
        let mut registry = TaskRegistry::new(1);
        let id = registry.create(noop(), Priority(1), None).unwrap();

        let body = registry.take_body(id).unwrap();
        assert!(registry.lookup(id).unwrap().is_executing());
        assert!(!registry.lookup(id).unwrap().is_dispatchable());
        assert!(registry.take_body(id).is_none());

        registry.restore_body(id, body);
        assert!(registry.lookup(id).unwrap().is_dispatchable());
    }

    #[test]
    fn test_wake_at_only_visible_while_blocked() {
        let mut registry = TaskRegistry::new(1);
        let id = registry.create(noop(), Priority(1), None).unwrap();
        {
            let record = registry.lookup_mut(id).unwrap();
            record.wake_at = 9;
        }
        assert_eq!(registry.lookup(id).unwrap().wake_at(), None);
        registry.set_state(id, TaskState::Blocked);
        assert_eq!(registry.lookup(id).unwrap().wake_at(), Some(9));
    }
}
