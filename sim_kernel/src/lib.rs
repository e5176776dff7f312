//! # Simulated Cooperative Kernel
//!
//! This crate is the core of the kernel: the tick source, the task
//! registry, the priority round-robin scheduler and the mutex.
//!
//! ## Purpose
//!
//! The kernel models a small real-time kernel for resource-constrained
//! devices, in-process:
//! - Runs under `cargo test`
//! - Deterministic (time only moves when a cycle runs, no real concurrency)
//! - Bounded (fixed task capacity chosen at construction)
//! - Inspectable (every transition lands in the audit log)
//!
//! ## Philosophy
//!
//! **Cooperative, not preemptive.**
//!
//! A running task keeps the processor until it returns, yields or sleeps.
//! Code between two of those points is atomic with respect to other tasks,
//! which is the whole concurrency-safety contract task bodies rely on.
//!
//! ## Example
//!
//! ```
//! use core_types::Priority;
//! use kernel_api::TaskContext;
//! use sim_kernel::{CycleOutcome, Kernel};
//!
//! let mut kernel = Kernel::new();
//! let id = kernel
//!     .create_task(|ctx: &mut dyn TaskContext| ctx.sleep(2), Priority(1))
//!     .unwrap();
//!
//! assert_eq!(kernel.tick(), CycleOutcome::Dispatched(id));
//! assert_eq!(kernel.tick(), CycleOutcome::Idle);
//! assert_eq!(kernel.tick(), CycleOutcome::Dispatched(id));
//! ```

pub mod audit;
pub mod kernel;
pub mod mutex;
pub mod registry;
pub mod scheduler;
pub mod test_utils;
pub mod timer;

pub use audit::EventAuditLog;
pub use kernel::{Kernel, KernelConfig};
pub use mutex::{MutexState, MutexTable};
pub use registry::{TaskRecord, TaskRegistry};
pub use scheduler::{CycleOutcome, Scheduler, Selection};
pub use timer::TickCounter;
