//! # Core Types
//!
//! This crate defines the fundamental types shared by the kernel crates.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: Identities are typed and cannot be confused.
//! - **Bounded**: Identifiers are dense integers that index fixed arenas.
//!
//! ## Key Types
//!
//! - [`TaskId`]: Identifier for a schedulable task
//! - [`MutexId`]: Identifier for a kernel mutex
//! - [`Priority`]: Scheduling precedence (higher wins)

pub mod ids;
pub mod priority;

pub use ids::{MutexId, TaskId};
pub use priority::Priority;
