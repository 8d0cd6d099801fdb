// # Clock Trait
//
// Source of "today" for loan dates, due dates, return dates and the
// overdue classification.
//
// Dates are calendar days: the local wall clock truncated to its date
// component. Nothing in shelfsync works with timestamps.

use chrono::{Local, NaiveDate};
use std::sync::Mutex;

/// Trait for calendar clocks
///
/// Injected into the synchronizer so tests can pin "today".
pub trait Clock: Send + Sync {
    /// The current calendar date
    fn today(&self) -> NaiveDate;
}

/// Clock backed by the local system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock that always reports a fixed date until moved
#[derive(Debug)]
pub struct FixedClock {
    today: Mutex<NaiveDate>,
}

impl FixedClock {
    /// Create a clock pinned to `today`
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    /// Move the clock to another date
    pub fn set(&self, today: NaiveDate) {
        *self.today.lock().unwrap_or_else(|p| p.into_inner()) = today;
    }

    /// Move the clock forward by `days`
    pub fn advance_days(&self, days: i64) {
        let mut guard = self.today.lock().unwrap_or_else(|p| p.into_inner());
        *guard += chrono::Duration::days(days);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.today.lock().unwrap_or_else(|p| p.into_inner())
    }
}
