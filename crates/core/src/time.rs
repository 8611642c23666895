use chrono::{DateTime, Duration, Utc};

/// Time source shared by sessions and services.
///
/// `Fixed` lets tests step time forward by hand, which is how debounced
/// advances are exercised without real timers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Instant `delay_ms` milliseconds from now.
    #[must_use]
    pub fn deadline_after(&self, delay_ms: u64) -> DateTime<Utc> {
        let delay = i64::try_from(delay_ms).unwrap_or(i64::MAX);
        self.now()
            .checked_add_signed(Duration::milliseconds(delay))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Moves a fixed clock forward. No effect on the system clock.
    pub fn advance_ms(&mut self, delta_ms: i64) {
        if let Clock::Fixed(t) = self {
            *t += Duration::milliseconds(delta_ms);
        }
    }
}

/// Deterministic timestamp for tests (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_steps_forward() {
        let mut clock = fixed_clock();
        let deadline = clock.deadline_after(300);
        assert!(deadline > clock.now());
        clock.advance_ms(300);
        assert_eq!(clock.now(), deadline);
    }

    #[test]
    fn system_clock_ignores_advance() {
        let mut clock = Clock::system();
        clock.advance_ms(10_000);
        assert_eq!(clock, Clock::System);
    }
}
