//! # Timer Device
//!
//! Hardware abstraction for the kernel's tick source.
//!
//! ## Philosophy
//!
//! **Time is a service, not a global variable.**
//!
//! This trait provides access to a monotonic tick counter. It does NOT:
//! - Provide wall-clock time
//! - Block or sleep (polling only)
//! - Implement scheduling (that's for the kernel)
//!
//! On a real device the counter is advanced by a hardware timer interrupt.
//! In simulation it is advanced once per scheduling cycle by the kernel.

/// Hardware timer device trait
///
/// Provides access to a monotonic tick counter. Ticks are cumulative
/// and never decrease.
///
/// # Examples
///
/// ```
/// use hal::TimerDevice;
///
/// fn elapsed<T: TimerDevice>(timer: &mut T, since: u64) -> u64 {
///     timer.poll_ticks().saturating_sub(since)
/// }
/// ```
pub trait TimerDevice {
    /// Returns the current tick count
    ///
    /// Monotonic, cumulative since initialization, and non-blocking.
    fn poll_ticks(&mut self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestTimer {
        ticks: u64,
    }

    impl TimerDevice for TestTimer {
        fn poll_ticks(&mut self) -> u64 {
            self.ticks
        }
    }

    #[test]
    fn test_timer_monotonic() {
        let mut timer = TestTimer { ticks: 0 };
        let t1 = timer.poll_ticks();
        timer.ticks += 100;
        let t2 = timer.poll_ticks();
        timer.ticks += 50;
        let t3 = timer.poll_ticks();

        assert!(t2 >= t1);
        assert!(t3 >= t2);
        assert_eq!(t3 - t1, 150);
    }

    #[test]
    fn test_timer_usable_as_trait_object() {
        let mut timer = TestTimer { ticks: 42 };
        let device: &mut dyn TimerDevice = &mut timer;
        assert_eq!(device.poll_ticks(), 42);
    }
}
