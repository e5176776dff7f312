//! Kernel mutexes
//!
//! A mutex is a binary flag plus the identity of the task that set it.
//! The table here is pure bookkeeping: it never yields. The spin-with-yield
//! loop lives in the kernel, which can run other tasks between attempts.

use core_types::{MutexId, TaskId};
use kernel_api::{KernelError, LockOutcome};

/// State of one mutex
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutexState {
    locked: bool,
    owner: Option<TaskId>,
}

impl MutexState {
    /// An unlocked mutex
    pub const fn new() -> Self {
        Self {
            locked: false,
            owner: None,
        }
    }

    /// Returns true while some task holds the mutex
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// The holder, only while locked
    pub fn owner(&self) -> Option<TaskId> {
        if self.locked {
            self.owner
        } else {
            None
        }
    }

    /// Single acquisition attempt on behalf of `caller`
    ///
    /// Locking a mutex the caller already holds succeeds immediately.
    pub fn try_acquire(&mut self, caller: TaskId) -> LockOutcome {
        match self.owner() {
            None => {
                self.locked = true;
                self.owner = Some(caller);
                LockOutcome::Acquired
            }
            Some(owner) if owner == caller => LockOutcome::AlreadyHeld,
            Some(owner) => LockOutcome::Contended { owner },
        }
    }

    /// Releases the mutex if `caller` holds it
    pub fn release(&mut self, id: MutexId, caller: TaskId) -> Result<(), KernelError> {
        match self.owner() {
            Some(owner) if owner == caller => {
                self.locked = false;
                self.owner = None;
                Ok(())
            }
            owner => Err(KernelError::NotOwner {
                mutex: id,
                caller,
                owner,
            }),
        }
    }
}

/// All mutexes created on one kernel, up to a fixed capacity
#[derive(Debug)]
pub struct MutexTable {
    mutexes: Vec<MutexState>,
    capacity: usize,
}

impl MutexTable {
    /// Creates an empty table holding at most `capacity` mutexes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            mutexes: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Creates an unlocked mutex
    pub fn create(&mut self) -> Result<MutexId, KernelError> {
        let full = KernelError::MutexCapacityExceeded {
            capacity: self.capacity,
        };
        if self.mutexes.len() >= self.capacity {
            return Err(full);
        }
        let raw = u32::try_from(self.mutexes.len()).map_err(|_| full)?;
        self.mutexes.push(MutexState::new());
        Ok(MutexId::new(raw))
    }

    /// Returns the state of `id`
    pub fn get(&self, id: MutexId) -> Result<&MutexState, KernelError> {
        self.mutexes
            .get(id.index())
            .ok_or(KernelError::MutexNotFound(id))
    }

    /// Returns the mutable state of `id`
    pub fn get_mut(&mut self, id: MutexId) -> Result<&mut MutexState, KernelError> {
        self.mutexes
            .get_mut(id.index())
            .ok_or(KernelError::MutexNotFound(id))
    }

    /// Re-initializes `id` to unlocked
    pub fn reset(&mut self, id: MutexId) -> Result<(), KernelError> {
        *self.get_mut(id)? = MutexState::new();
        Ok(())
    }

    /// Number of mutexes created
    pub fn len(&self) -> usize {
        self.mutexes.len()
    }

    /// Returns true if no mutex has been created
    pub fn is_empty(&self) -> bool {
        self.mutexes.is_empty()
    }

    /// Maximum number of mutexes
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: TaskId = TaskId::new(0);
    const B: TaskId = TaskId::new(1);

    #[test]
    fn test_new_mutex_is_unlocked() {
        let state = MutexState::new();
        assert!(!state.is_locked());
        assert_eq!(state.owner(), None);
    }

    #[test]
    fn test_acquire_free_mutex() {
        let mut state = MutexState::new();
        assert_eq!(state.try_acquire(A), LockOutcome::Acquired);
        assert!(state.is_locked());
        assert_eq!(state.owner(), Some(A));
    }

    #[test]
    fn test_reentrant_acquire() {
        let mut state = MutexState::new();
        let _ = state.try_acquire(A);
        assert_eq!(state.try_acquire(A), LockOutcome::AlreadyHeld);
        assert_eq!(state.owner(), Some(A));
    }

    #[test]
    fn test_contended_acquire_reports_owner() {
        let mut state = MutexState::new();
        let _ = state.try_acquire(A);
        assert_eq!(state.try_acquire(B), LockOutcome::Contended { owner: A });
        assert_eq!(state.owner(), Some(A));
    }

    #[test]
    fn test_release_by_owner() {
        let mut state = MutexState::new();
        let _ = state.try_acquire(A);
        assert!(state.release(MutexId::new(0), A).is_ok());
        assert!(!state.is_locked());
        assert_eq!(state.owner(), None);
    }

    #[test]
    fn test_release_by_non_owner_leaves_state_unchanged() {
        let mut state = MutexState::new();
        let _ = state.try_acquire(A);
        let before = state;

        let err = state.release(MutexId::new(3), B).unwrap_err();
        assert_eq!(
            err,
            KernelError::NotOwner {
                mutex: MutexId::new(3),
                caller: B,
                owner: Some(A),
            }
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_release_unlocked_mutex_is_rejected() {
        let mut state = MutexState::new();
        let err = state.release(MutexId::new(0), A).unwrap_err();
        assert!(matches!(err, KernelError::NotOwner { owner: None, .. }));
        assert!(!state.is_locked());
    }

    #[test]
    fn test_table_create_and_reset() {
        let mut table = MutexTable::with_capacity(4);
        let first = table.create().unwrap();
        let second = table.create().unwrap();
        assert_eq!(first, MutexId::new(0));
        assert_eq!(second, MutexId::new(1));
        assert_eq!(table.len(), 2);

        let _ = table.get_mut(second).unwrap().try_acquire(A);
        table.reset(second).unwrap();
        assert!(!table.get(second).unwrap().is_locked());
    }

    #[test]
    fn test_table_rejects_mutex_beyond_capacity() {
        let mut table = MutexTable::with_capacity(1);
        table.create().unwrap();
        assert_eq!(
            table.create(),
            Err(KernelError::MutexCapacityExceeded { capacity: 1 })
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.capacity(), 1);
    }

    #[test]
    fn test_table_unknown_mutex() {
        let table = MutexTable::with_capacity(4);
        assert_eq!(
            table.get(MutexId::new(5)).unwrap_err(),
            KernelError::MutexNotFound(MutexId::new(5))
        );
    }
}
