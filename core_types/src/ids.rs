//! Identifiers for kernel entities
//!
//! Identifiers are small dense integers handed out by the kernel that owns
//! the entity. They double as arena indices, so lookups are bounds-checked
//! slice accesses rather than hash lookups.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a task
///
/// Assigned in creation order starting at zero, stable for the task's
/// lifetime and never reused within a kernel instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(u32);

impl TaskId {
    /// Creates a task ID from its raw value
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Returns the arena slot this ID refers to
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task({})", self.0)
    }
}

/// Unique identifier for a kernel mutex
///
/// Only meaningful to the kernel instance that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MutexId(u32);

impl MutexId {
    /// Creates a mutex ID from its raw value
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Returns the arena slot this ID refers to
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for MutexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mutex({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_roundtrip() {
        let id = TaskId::new(7);
        assert_eq!(id.as_u32(), 7);
        assert_eq!(id.index(), 7);
    }

    #[test]
    fn test_task_id_ordering_follows_creation() {
        assert!(TaskId::new(0) < TaskId::new(1));
        assert!(TaskId::new(1) < TaskId::new(9));
    }

    #[test]
    fn test_task_id_display() {
        assert_eq!(format!("{}", TaskId::new(3)), "Task(3)");
    }

    #[test]
    fn test_mutex_id_display() {
        assert_eq!(format!("{}", MutexId::new(0)), "Mutex(0)");
    }

    #[test]
    fn test_ids_serialize_as_plain_integers() {
        let json = serde_json::to_string(&TaskId::new(4)).unwrap();
        assert_eq!(json, "4");
        let back: MutexId = serde_json::from_str("2").unwrap();
        assert_eq!(back, MutexId::new(2));
    }
}
