//! Task behavior and the context a running task sees

use crate::KernelError;
use core_types::{MutexId, TaskId};
use serde::{Deserialize, Serialize};

/// Task execution state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    /// Eligible for dispatch
    Ready,
    /// Currently executing its slice (at most one task at a time)
    Running,
    /// Waiting for the tick counter to reach its wake deadline
    Blocked,
}

/// Result of a lock attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub enum LockOutcome {
    /// The mutex was free and is now held by the caller
    Acquired,
    /// The caller already held the mutex (re-entrant success)
    AlreadyHeld,
    /// Another task holds the mutex (`try_lock` only)
    Contended { owner: TaskId },
    /// `lock` gave up after spinning without the owner releasing.
    ///
    /// The caller should end its slice and retry on a later tick.
    Stalled { owner: TaskId },
}

impl LockOutcome {
    /// Returns true if the caller holds the mutex after the attempt
    pub fn is_held(&self) -> bool {
        matches!(self, LockOutcome::Acquired | LockOutcome::AlreadyHeld)
    }
}

/// The kernel as seen from inside a running task
///
/// A context is only ever handed to a task while it is being dispatched,
/// so every operation here acts on behalf of the running task. Yield and
/// sleep cannot be called from outside a task body.
///
/// # Suspension points
///
/// [`yield_now`](TaskContext::yield_now), [`sleep`](TaskContext::sleep) and
/// a contended [`lock`](TaskContext::lock) may run other tasks before
/// returning. Code between two suspension points is atomic with respect to
/// other tasks.
pub trait TaskContext {
    /// Identity of the running task
    fn task_id(&self) -> TaskId;

    /// Current value of the tick counter
    fn now(&self) -> u64;

    /// Lets another ready task of equal or higher priority run
    ///
    /// Runs the selection phase only: no wake evaluation, no tick advance.
    /// The caller's state is unchanged when this returns.
    fn yield_now(&mut self);

    /// Blocks the caller until the tick counter reaches `now() + ticks`
    ///
    /// Another ready task is dispatched before this returns. `sleep(0)`
    /// blocks until at least the next tick boundary.
    fn sleep(&mut self, ticks: u64);

    /// Acquires `mutex`, yielding while another task holds it
    fn lock(&mut self, mutex: MutexId) -> Result<LockOutcome, KernelError>;

    /// Acquires `mutex` if it is free, without yielding
    fn try_lock(&mut self, mutex: MutexId) -> Result<LockOutcome, KernelError>;

    /// Releases `mutex`
    ///
    /// Fails with [`KernelError::NotOwner`] if the caller does not hold it;
    /// the mutex is left unchanged in that case.
    fn unlock(&mut self, mutex: MutexId) -> Result<(), KernelError>;
}

/// Behavior invoked each time a task is dispatched
///
/// The body captures its own state. One invocation is one execution slice:
/// it runs until it returns, possibly suspending via the context.
pub trait TaskBody {
    fn run(&mut self, ctx: &mut dyn TaskContext);
}

impl<F> TaskBody for F
where
    F: FnMut(&mut dyn TaskContext),
{
    fn run(&mut self, ctx: &mut dyn TaskContext) {
        self(ctx)
    }
}

/// Plain entry function taking the task's bound argument
pub type EntryFn<A> = fn(&mut dyn TaskContext, &mut A);

/// An entry function bound to the argument it was created with
pub struct BoundEntry<A> {
    entry: EntryFn<A>,
    arg: A,
}

impl<A> BoundEntry<A> {
    /// Binds `arg` to `entry`
    pub fn new(entry: EntryFn<A>, arg: A) -> Self {
        Self { entry, arg }
    }

    /// Returns the bound argument
    pub fn arg(&self) -> &A {
        &self.arg
    }
}

impl<A> TaskBody for BoundEntry<A> {
    fn run(&mut self, ctx: &mut dyn TaskContext) {
        (self.entry)(ctx, &mut self.arg)
    }
}
