use jiff::{SignedDuration, Timestamp};
use parking_lot::Mutex;
use std::sync::Arc;

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current time of the clock
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a store and the test driving it
/// can hold separate handles.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            inner: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: Timestamp) {
        *self.inner.lock() = now;
    }

    /// Moves the clock forward (or backward, for a negative duration).
    pub fn advance(&self, by: SignedDuration) {
        let mut now = self.inner.lock();
        *now = now.saturating_add(by).unwrap_or(*now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.inner.lock()
    }
}

impl<C: Clock> Clock for Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_works() {
        // test that the clock starts at the given time
        let base = Timestamp::from_second(0).unwrap();
        let clock = ManualClock::new(base);
        assert_eq!(clock.now(), base);

        clock.advance(SignedDuration::from_secs(1000));
        assert_eq!(clock.now(), Timestamp::from_second(1000).unwrap());

        let target = Timestamp::from_second(5).unwrap();
        clock.set(target);
        assert_eq!(clock.now(), target);
    }

    #[test]
    fn clones_share_time() {
        let clock = ManualClock::new(Timestamp::from_second(10).unwrap());
        let handle = clock.clone();

        handle.advance(SignedDuration::from_secs(5));
        assert_eq!(clock.now(), Timestamp::from_second(15).unwrap());
    }

    #[test]
    fn concurrent_advances_all_apply() {
        let clock = ManualClock::new(Timestamp::from_second(0).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let clock = clock.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        clock.advance(SignedDuration::from_secs(1));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(clock.now(), Timestamp::from_second(800).unwrap());
    }
}
