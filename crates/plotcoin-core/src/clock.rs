//! Simulation clock.
//!
//! Time is a count of whole simulated seconds since the session started.
//! Every periodic process (bot analysis, lottery draws, energy accounting,
//! weather) is expressed as a period in seconds on this timeline; nothing
//! reads wall-clock time.
//!
//! All arithmetic is checked. The clock never moves backwards.

/// Seconds in one minute.
pub const SECONDS_PER_MINUTE: u64 = 60;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Time counter would overflow.
    #[error("clock overflow: cannot advance beyond u64::MAX seconds")]
    TickOverflow,

    /// Attempted to move the clock to an earlier time.
    #[error("clock cannot move backwards from {now}s to {target}s")]
    Backwards {
        /// The current time.
        now: u64,
        /// The requested time.
        target: u64,
    },
}

/// Simulated time in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimClock {
    /// Seconds elapsed since the session started.
    now: u64,
}

impl SimClock {
    /// A clock at time zero.
    pub const fn new() -> Self {
        Self { now: 0 }
    }

    /// Create a clock at an explicit time (useful for tests).
    pub const fn at(now: u64) -> Self {
        Self { now }
    }

    /// Current time in seconds.
    pub const fn now(&self) -> u64 {
        self.now
    }

    /// Whole minutes elapsed.
    pub fn minutes(&self) -> u64 {
        self.now.checked_div(SECONDS_PER_MINUTE).unwrap_or(0)
    }

    /// Advance by `secs` seconds. Returns the new time.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self, secs: u64) -> Result<u64, ClockError> {
        self.now = self.now.checked_add(secs).ok_or(ClockError::TickOverflow)?;
        Ok(self.now)
    }

    /// Jump to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Backwards`] if `target` is earlier than now.
    pub const fn set(&mut self, target: u64) -> Result<(), ClockError> {
        if target < self.now {
            return Err(ClockError::Backwards {
                now: self.now,
                target,
            });
        }
        self.now = target;
        Ok(())
    }

    /// The time `secs` seconds from now.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] on overflow.
    pub fn after(&self, secs: u64) -> Result<u64, ClockError> {
        self.now.checked_add(secs).ok_or(ClockError::TickOverflow)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let clock = SimClock::new();
        assert_eq!(clock.now(), 0);
        assert_eq!(clock.minutes(), 0);
    }

    #[test]
    fn advance_accumulates() {
        let mut clock = SimClock::new();
        assert_eq!(clock.advance(90).unwrap(), 90);
        assert_eq!(clock.advance(30).unwrap(), 120);
        assert_eq!(clock.minutes(), 2);
    }

    #[test]
    fn advance_overflow_is_an_error() {
        let mut clock = SimClock::at(u64::MAX);
        assert!(matches!(clock.advance(1), Err(ClockError::TickOverflow)));
        assert_eq!(clock.now(), u64::MAX);
    }

    #[test]
    fn set_rejects_going_backwards() {
        let mut clock = SimClock::at(100);
        assert!(matches!(
            clock.set(50),
            Err(ClockError::Backwards { now: 100, target: 50 })
        ));
        clock.set(100).unwrap();
        clock.set(250).unwrap();
        assert_eq!(clock.now(), 250);
    }

    #[test]
    fn after_does_not_move_the_clock() {
        let clock = SimClock::at(10);
        assert_eq!(clock.after(600).unwrap(), 610);
        assert_eq!(clock.now(), 10);
        assert!(SimClock::at(u64::MAX).after(1).is_err());
    }
}
