//! # Medical Kernel Host Runtime
//!
//! This crate hosts the cooperative kernel as a process and runs the
//! medical device workload on it.
//!
//! ## Philosophy
//!
//! - **Host owns I/O**: Tasks never print; they hand telemetry to the host
//! - **One stream**: Kernel events, task logs and data samples share one
//!   JSON-lines output, in the order they happened
//! - **Deterministic mode is first-class**: A zero tick interval runs the
//!   same schedule as fast as possible, for tests
//!
//! ## Responsibilities
//!
//! The host runtime:
//! - Boots a kernel and installs the workload
//! - Drives the tick source on a wall-clock cadence
//! - Writes output to stdout or an event log file
//!
//! ## Non-Responsibilities
//!
//! The host does NOT:
//! - Preempt tasks or deliver interrupts
//! - Parse or act on the telemetry it writes

pub mod demo;
pub mod runtime;

pub use demo::{MedicalData, MedicalDemo, Telemetry, VitalSample};
pub use runtime::{HostRuntime, HostRuntimeConfig, HostRuntimeError};
