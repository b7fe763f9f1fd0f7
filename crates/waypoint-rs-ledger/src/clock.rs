//! Time source for record timestamps.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wraps a clock so readings never go backwards, even if the wall clock does.
pub struct MonotonicClock {
    inner: Arc<dyn Clock>,
    last: Mutex<Option<DateTime<Utc>>>,
}

impl MonotonicClock {
    pub fn new(inner: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            last: Mutex::new(None),
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> DateTime<Utc> {
        let reading = self.inner.now();
        let mut last = self.last.lock();
        let now = match *last {
            Some(previous) if previous > reading => previous,
            _ => reading,
        };
        *last = Some(now);
        now
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, MonotonicClock};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    struct ScriptedClock(Mutex<Vec<DateTime<Utc>>>);

    impl Clock for ScriptedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0.lock().remove(0)
        }
    }

    #[test]
    fn monotonic_clock_holds_back_regressions() {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let scripted = ScriptedClock(Mutex::new(vec![
            base,
            base - Duration::seconds(30),
            base + Duration::seconds(5),
        ]));
        let clock = MonotonicClock::new(Arc::new(scripted));
        assert_eq!(clock.now(), base);
        assert_eq!(clock.now(), base);
        assert_eq!(clock.now(), base + Duration::seconds(5));
    }
}
