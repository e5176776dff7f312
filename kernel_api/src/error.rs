//! Kernel error types

use core_types::{MutexId, TaskId};
use thiserror::Error;

/// Errors that can occur when interacting with the kernel
///
/// The set is closed. An empty ready set, mutex contention and
/// a stalled lock are control states, not errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// The task registry is full
    #[error("Task registry full: capacity is {capacity} tasks")]
    CapacityExceeded { capacity: usize },

    /// The mutex table is full
    #[error("Mutex table full: capacity is {capacity} mutexes")]
    MutexCapacityExceeded { capacity: usize },

    /// Unlock attempted by a task that does not hold the mutex
    #[error("{caller} cannot unlock {mutex}: owner is {}", owner_name(.owner))]
    NotOwner {
        mutex: MutexId,
        caller: TaskId,
        owner: Option<TaskId>,
    },

    /// Mutex handle was not issued by this kernel
    #[error("Mutex not found: {0}")]
    MutexNotFound(MutexId),
}

fn owner_name(owner: &Option<TaskId>) -> String {
    match owner {
        Some(task_id) => task_id.to_string(),
        None => "none".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_message() {
        let err = KernelError::CapacityExceeded { capacity: 10 };
        assert_eq!(err.to_string(), "Task registry full: capacity is 10 tasks");
    }

    #[test]
    fn test_not_owner_message_names_both_tasks() {
        let err = KernelError::NotOwner {
            mutex: MutexId::new(0),
            caller: TaskId::new(2),
            owner: Some(TaskId::new(1)),
        };
        assert_eq!(
            err.to_string(),
            "Task(2) cannot unlock Mutex(0): owner is Task(1)"
        );
    }

    #[test]
    fn test_not_owner_message_for_unlocked_mutex() {
        let err = KernelError::NotOwner {
            mutex: MutexId::new(1),
            caller: TaskId::new(0),
            owner: None,
        };
        assert_eq!(
            err.to_string(),
            "Task(0) cannot unlock Mutex(1): owner is none"
        );
    }
}
