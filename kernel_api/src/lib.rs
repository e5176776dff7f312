//! # Kernel API
//!
//! This crate defines the interface between task code and the kernel.
//!
//! ## Philosophy
//!
//! The kernel provides **mechanisms**, not policies:
//! - Task bodies (behavior capturing its own state, not pointer + callback)
//! - Cooperative control transfer (explicit yield and sleep)
//! - Mutual exclusion (a lock with a recorded owner)
//! - Structured events (values, not formatted text)
//!
//! ## Design Goals
//!
//! 1. **Testability**: The task-facing API is a trait and can be stubbed
//! 2. **Explicitness**: No hidden globals; a task only sees its own context
//! 3. **Closed errors**: Contention and idleness are states, not failures
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - Preemptive (a task runs until it yields, sleeps or returns)
//! - Interrupt driven
//! - Multi-core

pub mod error;
pub mod event;
pub mod kernel;

pub use error::KernelError;
pub use event::{EventRecord, EventSink, KernelEvent};
pub use kernel::{BoundEntry, EntryFn, LockOutcome, TaskBody, TaskContext, TaskState};
