use std::time::{Duration, Instant};

/// Default quiescence delay before an automatic flush.
pub const DEFAULT_FLUSH_DELAY: Duration = Duration::from_millis(2000);

/// Quiescence deadline for automatic flushes.
///
/// Every recorded action pushes the deadline back by `delay`; the flush is
/// due once no action arrived for that long. Time is passed in so callers
/// decide how to wait (a tokio sleep, an event loop tick, a test).
#[derive(Debug, Clone, PartialEq)]
pub struct FlushTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl FlushTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Restart the countdown from `now`.
    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Time left until the deadline, `None` when nothing is scheduled.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}

impl Default for FlushTimer {
    fn default() -> Self {
        Self::new(DEFAULT_FLUSH_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_timer_is_never_due() {
        let timer = FlushTimer::default();
        assert!(!timer.is_due(Instant::now()));
        assert_eq!(timer.remaining(Instant::now()), None);
    }

    #[test]
    fn due_after_delay() {
        let start = Instant::now();
        let mut timer = FlushTimer::new(Duration::from_millis(100));

        timer.touch(start);

        assert!(!timer.is_due(start + Duration::from_millis(99)));
        assert!(timer.is_due(start + Duration::from_millis(100)));
    }

    #[test]
    fn touch_resets_the_deadline() {
        // Given a timer armed at t0
        let start = Instant::now();
        let mut timer = FlushTimer::new(Duration::from_millis(100));
        timer.touch(start);

        // When another edit lands at t0 + 80ms
        timer.touch(start + Duration::from_millis(80));

        // Then the original deadline has passed without the timer firing
        assert!(!timer.is_due(start + Duration::from_millis(150)));
        assert_eq!(
            timer.remaining(start + Duration::from_millis(150)),
            Some(Duration::from_millis(30))
        );
    }

    #[test]
    fn cancel_disarms() {
        let start = Instant::now();
        let mut timer = FlushTimer::new(Duration::ZERO);
        timer.touch(start);
        timer.cancel();
        assert!(!timer.is_armed());
        assert!(!timer.is_due(start + Duration::from_secs(1)));
    }
}
