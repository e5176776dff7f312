//! Test utilities for scheduling scenarios
//!
//! Helpers that turn the audit trail into shapes tests can assert on, and
//! ready-made task bodies for the common "do a unit of work, then sleep"
//! pattern.

use crate::audit::EventAuditLog;
use crate::Kernel;
use core_types::TaskId;
use kernel_api::{KernelEvent, TaskContext};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Every dispatch in the audit log as `(tick, task)`, in order
///
/// Includes nested dispatches triggered by yield and sleep.
pub fn dispatch_trace(audit_log: &EventAuditLog) -> Vec<(u64, TaskId)> {
    audit_log
        .records()
        .filter_map(|record| match record.event {
            KernelEvent::TaskDispatched { task_id, .. } => Some((record.tick, task_id)),
            _ => None,
        })
        .collect()
}

/// Dispatches grouped by the tick they happened on
pub fn dispatches_by_tick(audit_log: &EventAuditLog) -> BTreeMap<u64, Vec<TaskId>> {
    let mut by_tick: BTreeMap<u64, Vec<TaskId>> = BTreeMap::new();
    for (tick, task_id) in dispatch_trace(audit_log) {
        by_tick.entry(tick).or_default().push(task_id);
    }
    by_tick
}

/// Ticks at which `task_id` was dispatched
pub fn dispatch_ticks(audit_log: &EventAuditLog, task_id: TaskId) -> Vec<u64> {
    dispatch_trace(audit_log)
        .into_iter()
        .filter(|(_, id)| *id == task_id)
        .map(|(tick, _)| tick)
        .collect()
}

/// Shared record of which task ran, in execution order
pub type RunLog = Rc<RefCell<Vec<TaskId>>>;

/// Creates an empty run log
pub fn run_log() -> RunLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// A body that records its run in `log` and then sleeps for `ticks`
pub fn sleeper(log: &RunLog, ticks: u64) -> impl FnMut(&mut dyn TaskContext) + 'static {
    let log = Rc::clone(log);
    move |ctx: &mut dyn TaskContext| {
        log.borrow_mut().push(ctx.task_id());
        ctx.sleep(ticks);
    }
}

/// A body that records its run in `log` and returns without blocking
pub fn worker(log: &RunLog) -> impl FnMut(&mut dyn TaskContext) + 'static {
    let log = Rc::clone(log);
    move |ctx: &mut dyn TaskContext| log.borrow_mut().push(ctx.task_id())
}

/// Runs `cycles` cycles and returns the dispatches of each, nested ones included
pub fn run_and_collect(kernel: &mut Kernel, cycles: usize) -> Vec<Vec<TaskId>> {
    let start = kernel.now();
    kernel.run_cycles(cycles);
    let by_tick = dispatches_by_tick(kernel.audit_log());
    (1..=cycles as u64)
        .map(|offset| by_tick.get(&(start + offset)).cloned().unwrap_or_default())
        .collect()
}
