//! # Hardware Abstraction Layer (HAL)
//!
//! This crate defines the hardware seams the kernel depends on.
//!
//! ## Philosophy
//!
//! **Architecture must be fully abstracted and swappable.**
//!
//! The kernel only ever sees traits; a simulated device and a real timer
//! peripheral are interchangeable behind them.

pub mod timer;

pub use timer::TimerDevice;
