//! # Tick Counter
//!
//! The kernel's tick source.
//!
//! ## Philosophy
//!
//! **Determinism enables thorough testing.**
//!
//! The counter starts at zero and only advances when the kernel runs a
//! dispatch cycle, exactly one tick per cycle. It is never reset or moved
//! backwards, so sleep deadlines computed from it stay valid for the
//! kernel's lifetime.

use hal::TimerDevice;

/// Monotonic per-kernel tick counter
///
/// # Examples
///
/// ```
/// use sim_kernel::timer::TickCounter;
/// use hal::TimerDevice;
///
/// let mut ticks = TickCounter::new();
/// assert_eq!(ticks.poll_ticks(), 0);
///
/// ticks.advance();
/// ticks.advance();
/// assert_eq!(ticks.poll_ticks(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TickCounter {
    ticks: u64,
}

impl TickCounter {
    /// Creates a counter starting at tick 0
    pub fn new() -> Self {
        Self { ticks: 0 }
    }

    /// Advances the counter by exactly one tick and returns the new value
    ///
    /// Saturates at `u64::MAX`; monotonicity holds even there.
    pub fn advance(&mut self) -> u64 {
        self.ticks = self.ticks.saturating_add(1);
        self.ticks
    }

    /// Returns the current tick without requiring mutable access
    pub fn current_ticks(&self) -> u64 {
        self.ticks
    }

    /// Returns the absolute tick `delta` ticks from now
    pub fn deadline_after(&self, delta: u64) -> u64 {
        self.ticks.saturating_add(delta)
    }

    /// Returns true once the counter has reached `deadline`
    pub fn has_reached(&self, deadline: u64) -> bool {
        self.ticks >= deadline
    }
}

impl TimerDevice for TickCounter {
    fn poll_ticks(&mut self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_counter_starts_at_zero() {
        let mut ticks = TickCounter::new();
        assert_eq!(ticks.poll_ticks(), 0);
        assert_eq!(ticks.current_ticks(), 0);
    }

    #[test]
    fn test_advance_is_one_tick() {
        let mut ticks = TickCounter::new();
        assert_eq!(ticks.advance(), 1);
        assert_eq!(ticks.advance(), 2);
        assert_eq!(ticks.current_ticks(), 2);
    }

    #[test]
    fn test_deadline_and_reached() {
        let mut ticks = TickCounter::new();
        ticks.advance();
        let deadline = ticks.deadline_after(2);
        assert_eq!(deadline, 3);
        assert!(!ticks.has_reached(deadline));
        ticks.advance();
        assert!(!ticks.has_reached(deadline));
        ticks.advance();
        assert!(ticks.has_reached(deadline));
    }

    #[test]
    fn test_zero_delta_deadline_is_reached_immediately() {
        let ticks = TickCounter::new();
        assert!(ticks.has_reached(ticks.deadline_after(0)));
    }

    #[test]
    fn test_saturates_instead_of_wrapping() {
        let mut ticks = TickCounter { ticks: u64::MAX };
        assert_eq!(ticks.advance(), u64::MAX);
        assert_eq!(ticks.deadline_after(10), u64::MAX);
    }

    #[test]
    fn test_deterministic_sequence() {
        let mut a = TickCounter::new();
        let mut b = TickCounter::new();
        for _ in 0..5 {
            a.advance();
            b.advance();
        }
        assert_eq!(a.poll_ticks(), b.poll_ticks());
        assert_eq!(a.current_ticks(), 5);
    }
}
