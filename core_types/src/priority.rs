//! Task priority

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scheduling priority of a task
///
/// Higher numeric value = higher precedence. The scheduler never runs a
/// lower-priority task while a higher-priority one is ready.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Priority(pub u8);

impl Priority {
    /// Lowest possible precedence
    pub const LOWEST: Priority = Priority(0);
    /// Highest possible precedence
    pub const HIGHEST: Priority = Priority(u8::MAX);

    /// Returns the raw value
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl From<u8> for Priority {
    fn from(value: u8) -> Self {
        Priority(value)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
