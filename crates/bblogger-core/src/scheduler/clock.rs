//! Wall-clock abstraction so the poll loop can run against simulated time.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta};

/// Source of the current local time and of blocking sleeps.
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
    fn sleep(&self, duration: Duration);
}

/// The real clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Simulated clock: `sleep` returns immediately and moves time forward.
#[derive(Debug)]
pub struct MockClock {
    now: Cell<DateTime<Local>>,
    sleeps: RefCell<Vec<Duration>>,
}

impl MockClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Cell::new(start),
            sleeps: RefCell::new(Vec::new()),
        }
    }

    /// Moves time forward without recording a sleep.
    pub fn advance(&self, by: Duration) {
        let by = TimeDelta::from_std(by).unwrap_or(TimeDelta::zero());
        self.now.set(self.now.get() + by);
    }

    /// Every sleep requested so far.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Local> {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
        self.advance(duration);
    }
}

impl<K: Clock + ?Sized> Clock for &K {
    fn now(&self) -> DateTime<Local> {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn mock_sleep_advances_time() {
        let start = Local.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
        let clock = MockClock::new(start);

        clock.sleep(Duration::from_secs(90));
        clock.advance(Duration::from_secs(30));

        assert_eq!(clock.now(), start + TimeDelta::minutes(2));
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(90)]);
    }
}
