//! Expiring cached values with an injectable clock.
//!
//! Replaces ad-hoc "value + last-fetched timestamp" field pairs with an
//! explicit [`Cached`] value type. Expiry is computed against a [`Clock`]
//! so it is deterministic under test.

use std::time::{Duration, Instant};

/// Source of the current time.
///
/// Production code uses [`SystemClock`]; tests inject a fake that can be
/// advanced manually.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Clock backed by `Instant::now()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A value with an expiry deadline.
#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub value: T,
    pub expires_at: Instant,
}

impl<T> Cached<T> {
    /// Cache `value` for `ttl` starting from the clock's current time.
    pub fn with_ttl(value: T, ttl: Duration, clock: &dyn Clock) -> Self {
        Self {
            value,
            expires_at: clock.now() + ttl,
        }
    }

    /// Whether the value is still valid at the clock's current time.
    pub fn is_fresh(&self, clock: &dyn Clock) -> bool {
        clock.now() < self.expires_at
    }

    /// The cached value, or `None` once expired.
    pub fn get(&self, clock: &dyn Clock) -> Option<&T> {
        self.is_fresh(clock).then_some(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeClock {
        now: Mutex<Instant>,
    }

    impl FakeClock {
        fn new() -> Self {
            Self {
                now: Mutex::new(Instant::now()),
            }
        }

        fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            *self.now.lock().unwrap()
        }
    }

    #[test]
    fn fresh_before_ttl_elapses() {
        let clock = FakeClock::new();
        let cached = Cached::with_ttl(true, Duration::from_secs(60), &clock);

        assert!(cached.is_fresh(&clock));
        assert_eq!(cached.get(&clock), Some(&true));
    }

    #[test]
    fn expires_after_ttl() {
        let clock = FakeClock::new();
        let cached = Cached::with_ttl("health".to_string(), Duration::from_secs(60), &clock);

        clock.advance(Duration::from_secs(61));

        assert!(!cached.is_fresh(&clock));
        assert_eq!(cached.get(&clock), None);
    }

    #[test]
    fn boundary_is_exclusive() {
        let clock = FakeClock::new();
        let cached = Cached::with_ttl(1u32, Duration::from_secs(10), &clock);

        clock.advance(Duration::from_secs(10));
        assert!(!cached.is_fresh(&clock));
    }
}
