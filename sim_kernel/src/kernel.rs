//! The kernel context object
//!
//! [`Kernel`] owns the tick counter, task registry, scheduler, mutex table
//! and event plumbing for one kernel instance. There are no globals:
//! several kernels can coexist, which is how the tests isolate scenarios.
//!
//! ## Dispatch model
//!
//! A dispatch runs the selected task's body synchronously; the body *is*
//! the slice. When the body yields or sleeps it calls back into the kernel
//! through its [`TaskContext`], which runs a nested selection on the same
//! call stack. A task whose body is somewhere on that stack is never
//! selected again until it returns, so nesting depth is bounded by the
//! registry capacity.

use crate::audit::EventAuditLog;
use crate::mutex::MutexTable;
use crate::registry::{TaskRecord, TaskRegistry};
use crate::scheduler::{CycleOutcome, Scheduler};
use crate::timer::TickCounter;
use core_types::{MutexId, Priority, TaskId};
use kernel_api::{
    BoundEntry, EntryFn, EventRecord, EventSink, KernelError, KernelEvent, LockOutcome, TaskBody,
    TaskContext, TaskState,
};

/// Kernel configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelConfig {
    /// Fixed capacity of the task registry
    pub max_tasks: usize,
    /// Contended-lock yields allowed per cycle, shared by every task
    pub max_lock_spins: u32,
    /// Fixed capacity of the mutex table
    pub max_mutexes: usize,
    /// Events retained by the audit log
    pub audit_capacity: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_tasks: 10,
            max_lock_spins: 16,
            max_mutexes: 16,
            audit_capacity: 1024,
        }
    }
}

impl KernelConfig {
    /// Sets the registry capacity
    pub fn with_max_tasks(mut self, max_tasks: usize) -> Self {
        self.max_tasks = max_tasks;
        self
    }

    /// Sets the lock spin limit
    pub fn with_max_lock_spins(mut self, max_lock_spins: u32) -> Self {
        self.max_lock_spins = max_lock_spins;
        self
    }

    /// Sets the mutex table capacity
    pub fn with_max_mutexes(mut self, max_mutexes: usize) -> Self {
        self.max_mutexes = max_mutexes;
        self
    }

    /// Sets the audit log capacity
    pub fn with_audit_capacity(mut self, audit_capacity: usize) -> Self {
        self.audit_capacity = audit_capacity;
        self
    }
}

/// One cooperative kernel instance
pub struct Kernel {
    config: KernelConfig,
    ticks: TickCounter,
    registry: TaskRegistry,
    scheduler: Scheduler,
    mutexes: MutexTable,
    audit_log: EventAuditLog,
    sinks: Vec<Box<dyn EventSink>>,
    /// Contended-lock yields left in the current cycle
    spin_budget: u32,
}

impl Kernel {
    /// Creates a kernel with default configuration
    pub fn new() -> Self {
        Self::with_config(KernelConfig::default())
    }

    /// Creates a kernel with custom configuration
    pub fn with_config(config: KernelConfig) -> Self {
        Self {
            ticks: TickCounter::new(),
            registry: TaskRegistry::new(config.max_tasks),
            scheduler: Scheduler::new(),
            mutexes: MutexTable::with_capacity(config.max_mutexes),
            audit_log: EventAuditLog::with_capacity(config.audit_capacity),
            sinks: Vec::new(),
            spin_budget: config.max_lock_spins,
            config,
        }
    }

    /// Attaches an event sink
    pub fn with_sink(mut self, sink: Box<dyn EventSink>) -> Self {
        self.add_sink(sink);
        self
    }

    /// Attaches an event sink to a running kernel
    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Registers a task; it starts `Ready`
    pub fn create_task<B>(&mut self, body: B, priority: Priority) -> Result<TaskId, KernelError>
    where
        B: TaskBody + 'static,
    {
        self.register(Box::new(body), priority, None)
    }

    /// Registers a task with a human-readable name
    pub fn create_named_task<B>(
        &mut self,
        name: impl Into<String>,
        body: B,
        priority: Priority,
    ) -> Result<TaskId, KernelError>
    where
        B: TaskBody + 'static,
    {
        self.register(Box::new(body), priority, Some(name.into()))
    }

    /// Registers a task running `entry` with `arg` bound to it
    pub fn create_task_with_arg<A: 'static>(
        &mut self,
        entry: EntryFn<A>,
        arg: A,
        priority: Priority,
    ) -> Result<TaskId, KernelError> {
        self.register(Box::new(BoundEntry::new(entry, arg)), priority, None)
    }

    fn register(
        &mut self,
        body: Box<dyn TaskBody>,
        priority: Priority,
        name: Option<String>,
    ) -> Result<TaskId, KernelError> {
        let task_id = self.registry.create(body, priority, name)?;
        self.scheduler.register(task_id);
        self.emit(KernelEvent::TaskCreated { task_id, priority });
        Ok(task_id)
    }

    /// Creates an unlocked mutex
    pub fn create_mutex(&mut self) -> Result<MutexId, KernelError> {
        self.mutexes.create()
    }

    /// Re-initializes a mutex to unlocked
    pub fn reset_mutex(&mut self, mutex: MutexId) -> Result<(), KernelError> {
        self.mutexes.reset(mutex)
    }

    /// Returns true while some task holds `mutex`
    pub fn is_locked(&self, mutex: MutexId) -> Result<bool, KernelError> {
        Ok(self.mutexes.get(mutex)?.is_locked())
    }

    /// Returns the holder of `mutex`
    pub fn mutex_owner(&self, mutex: MutexId) -> Result<Option<TaskId>, KernelError> {
        Ok(self.mutexes.get(mutex)?.owner())
    }

    /// Runs one dispatch cycle
    ///
    /// Advances the tick counter, wakes every blocked task whose deadline
    /// has been reached, then dispatches at most one task. The lock spin
    /// budget is refilled for the new cycle.
    pub fn tick(&mut self) -> CycleOutcome {
        self.ticks.advance();
        self.spin_budget = self.config.max_lock_spins;
        self.emit(KernelEvent::TickAdvanced);

        let woken = self.scheduler.wake_expired(&mut self.registry, &self.ticks);
        for task_id in woken {
            self.emit(KernelEvent::TaskWoken { task_id });
        }

        self.dispatch()
    }

    /// Runs `cycles` dispatch cycles and returns their outcomes
    pub fn run_cycles(&mut self, cycles: usize) -> Vec<CycleOutcome> {
        (0..cycles).map(|_| self.tick()).collect()
    }

    /// The task currently marked `Running`
    pub fn current(&self) -> Option<TaskId> {
        self.scheduler.current()
    }

    /// Returns the record for `task_id`, or `None` if it was never issued
    pub fn lookup(&self, task_id: TaskId) -> Option<&TaskRecord> {
        self.registry.lookup(task_id)
    }

    /// Returns the state of `task_id`
    pub fn task_state(&self, task_id: TaskId) -> Option<TaskState> {
        self.registry.state(task_id)
    }

    /// Iterates task records in creation order
    pub fn tasks(&self) -> impl Iterator<Item = &TaskRecord> {
        self.registry.iter()
    }

    /// Number of registered tasks
    pub fn task_count(&self) -> usize {
        self.registry.len()
    }

    /// Registry capacity
    pub fn capacity(&self) -> usize {
        self.registry.capacity()
    }

    /// Current tick
    pub fn now(&self) -> u64 {
        self.ticks.current_ticks()
    }

    /// The tick source
    pub fn timer(&self) -> &TickCounter {
        &self.ticks
    }

    /// Contended-lock yields left in the current cycle
    pub fn spin_budget(&self) -> u32 {
        self.spin_budget
    }

    /// Scheduler bookkeeping
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The configuration this kernel was built with
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Returns the audit log
    ///
    /// Used in tests to verify scheduling behavior.
    pub fn audit_log(&self) -> &EventAuditLog {
        &self.audit_log
    }

    /// Clears the audit log
    pub fn clear_audit_log(&mut self) {
        self.audit_log.clear();
    }

    fn emit(&mut self, event: KernelEvent) {
        let record = EventRecord {
            tick: self.ticks.current_ticks(),
            event,
        };
        for sink in self.sinks.iter_mut() {
            sink.record(&record);
        }
        self.audit_log.record(record);
    }

    /// Phase 2: select one task and run its slice
    fn dispatch(&mut self) -> CycleOutcome {
        let Some(selection) = self.scheduler.select(&self.registry) else {
            self.emit(KernelEvent::CycleIdle);
            return CycleOutcome::Idle;
        };
        let task_id = selection.task_id;

        if let Some(previous) = self.scheduler.current() {
            if self.registry.state(previous) == Some(TaskState::Running) {
                self.registry.set_state(previous, TaskState::Ready);
            }
        }
        if let Some(record) = self.registry.lookup_mut(task_id) {
            record.state = TaskState::Running;
            record.dispatch_count += 1;
        }
        self.scheduler.mark_dispatched(&selection);
        self.emit(KernelEvent::TaskDispatched {
            task_id,
            priority: selection.priority,
        });

        if let Some(mut body) = self.registry.take_body(task_id) {
            body.run(&mut TaskFrame {
                kernel: self,
                task_id,
            });
            self.registry.restore_body(task_id, body);
        }

        if self.registry.state(task_id) == Some(TaskState::Running) {
            self.registry.set_state(task_id, TaskState::Ready);
        }
        self.scheduler.set_current(None);
        CycleOutcome::Dispatched(task_id)
    }

    fn yield_task(&mut self, caller: TaskId) -> CycleOutcome {
        let outcome = self.dispatch();

        // The caller resumes its slice unless it had already put itself to sleep.
        match self.registry.state(caller) {
            Some(TaskState::Blocked) | None => self.scheduler.set_current(None),
            Some(_) => {
                self.registry.set_state(caller, TaskState::Running);
                self.scheduler.set_current(Some(caller));
            }
        }
        outcome
    }

    fn sleep_task(&mut self, caller: TaskId, ticks: u64) {
        let wake_at = self.ticks.deadline_after(ticks);
        if let Some(record) = self.registry.lookup_mut(caller) {
            record.state = TaskState::Blocked;
            record.wake_at = wake_at;
        }
        self.scheduler.set_current(None);
        self.emit(KernelEvent::TaskBlocked {
            task_id: caller,
            wake_at,
        });
        self.dispatch();
    }

    /// Spin-with-yield acquisition
    ///
    /// Every contended yield, at any nesting depth, draws on one per-cycle
    /// budget. Nested contenders therefore cost at most `max_lock_spins`
    /// extra dispatches per cycle in total.
    fn lock_mutex(&mut self, caller: TaskId, mutex: MutexId) -> Result<LockOutcome, KernelError> {
        loop {
            let attempt = self.mutexes.get_mut(mutex)?.try_acquire(caller);
            match attempt {
                LockOutcome::Acquired => {
                    self.emit(KernelEvent::MutexAcquired {
                        mutex,
                        task_id: caller,
                    });
                    return Ok(LockOutcome::Acquired);
                }
                LockOutcome::AlreadyHeld => return Ok(LockOutcome::AlreadyHeld),
                LockOutcome::Contended { owner } | LockOutcome::Stalled { owner } => {
                    if self.spin_budget == 0 {
                        return Ok(self.stall(caller, mutex, owner));
                    }
                    self.spin_budget -= 1;
                    self.emit(KernelEvent::MutexContended {
                        mutex,
                        task_id: caller,
                        owner,
                    });
                    // Nothing else could run, so the owner cannot release this tick.
                    if self.yield_task(caller).is_idle() {
                        return Ok(self.stall(caller, mutex, owner));
                    }
                }
            }
        }
    }

    fn stall(&mut self, caller: TaskId, mutex: MutexId, owner: TaskId) -> LockOutcome {
        self.emit(KernelEvent::MutexStalled {
            mutex,
            task_id: caller,
            owner,
        });
        LockOutcome::Stalled { owner }
    }

    fn try_lock_mutex(
        &mut self,
        caller: TaskId,
        mutex: MutexId,
    ) -> Result<LockOutcome, KernelError> {
        let outcome = self.mutexes.get_mut(mutex)?.try_acquire(caller);
        match outcome {
            LockOutcome::Acquired => self.emit(KernelEvent::MutexAcquired {
                mutex,
                task_id: caller,
            }),
            LockOutcome::Contended { owner } => self.emit(KernelEvent::MutexContended {
                mutex,
                task_id: caller,
                owner,
            }),
            LockOutcome::AlreadyHeld | LockOutcome::Stalled { .. } => {}
        }
        Ok(outcome)
    }

    fn unlock_mutex(&mut self, caller: TaskId, mutex: MutexId) -> Result<(), KernelError> {
        let released = self.mutexes.get_mut(mutex)?.release(mutex, caller);
        match released {
            Ok(()) => {
                self.emit(KernelEvent::MutexReleased {
                    mutex,
                    task_id: caller,
                });
                Ok(())
            }
            Err(err) => {
                if let KernelError::NotOwner { owner, .. } = &err {
                    self.emit(KernelEvent::UnlockRejected {
                        mutex,
                        task_id: caller,
                        owner: *owner,
                    });
                }
                Err(err)
            }
        }
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

/// The context handed to a task body while it runs
struct TaskFrame<'k> {
    kernel: &'k mut Kernel,
    task_id: TaskId,
}

impl TaskContext for TaskFrame<'_> {
    fn task_id(&self) -> TaskId {
        self.task_id
    }

    fn now(&self) -> u64 {
        self.kernel.now()
    }

    fn yield_now(&mut self) {
        self.kernel.yield_task(self.task_id);
    }

    fn sleep(&mut self, ticks: u64) {
        self.kernel.sleep_task(self.task_id, ticks);
    }

    fn lock(&mut self, mutex: MutexId) -> Result<LockOutcome, KernelError> {
        self.kernel.lock_mutex(self.task_id, mutex)
    }

    fn try_lock(&mut self, mutex: MutexId) -> Result<LockOutcome, KernelError> {
        self.kernel.try_lock_mutex(self.task_id, mutex)
    }

    fn unlock(&mut self, mutex: MutexId) -> Result<(), KernelError> {
        self.kernel.unlock_mutex(self.task_id, mutex)
    }
}
