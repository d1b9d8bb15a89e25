use std::{
    cell::Cell,
    rc::Rc,
    thread,
    time::{
        Duration,
        Instant,
    },
};

/// Monotonic time source and delay primitive.
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&self) -> Duration;

    fn delay(&self, duration: Duration);
}

impl<T> Clock for &T
where
    T: Clock + ?Sized,
{
    #[inline]
    fn now(&self) -> Duration {
        (**self).now()
    }

    #[inline]
    fn delay(&self, duration: Duration) {
        (**self).delay(duration)
    }
}

impl<T> Clock for Box<T>
where
    T: Clock + ?Sized,
{
    #[inline]
    fn now(&self) -> Duration {
        (**self).now()
    }

    #[inline]
    fn delay(&self, duration: Duration) {
        (**self).delay(duration)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    #[inline]
    fn delay(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Virtual clock that moves forward by `step` every time it is read.
///
/// Clones share the same timeline, so a test can hold one handle while an
/// engine owns another. Delays advance the timeline without sleeping.
#[derive(Debug, Clone)]
pub struct StepClock {
    now:  Rc<Cell<Duration>>,
    step: Duration,
}

impl StepClock {
    pub fn new(step: Duration) -> Self {
        Self {
            now: Rc::new(Cell::new(Duration::ZERO)),
            step,
        }
    }

    #[inline]
    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }

    /// Current reading without advancing.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.now.get()
    }
}

impl Default for StepClock {
    fn default() -> Self {
        Self::new(Duration::from_millis(1))
    }
}

impl Clock for StepClock {
    fn now(&self) -> Duration {
        let now = self.now.get();
        self.now.set(now + self.step);

        now
    }

    #[inline]
    fn delay(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// Point after which a blocking call gives up. Measured once per call and
/// shared by every layer that call passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    start: Duration,
    limit: Duration,
}

impl Deadline {
    #[inline]
    pub fn new(start: Duration, limit: Duration) -> Self {
        Self {
            start,
            limit,
        }
    }

    #[inline]
    pub fn limit(&self) -> Duration {
        self.limit
    }

    #[inline]
    pub fn expired(&self, now: Duration) -> bool {
        now.saturating_sub(self.start) > self.limit
    }
}

/// Per-call receive mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Wait {
    pub blocking: bool,
    /// `None` or zero falls back to the instance default.
    pub timeout:  Option<Duration>,
}

impl Wait {
    /// Single polling step, unless the instance blocks by default.
    pub const POLL: Self = Self {
        blocking: false,
        timeout:  None,
    };

    /// Block with the instance default timeout.
    pub const BLOCK: Self = Self {
        blocking: true,
        timeout:  None,
    };

    #[inline]
    pub const fn timeout(timeout: Duration) -> Self {
        Self {
            blocking: true,
            timeout:  Some(timeout),
        }
    }

    #[inline]
    pub const fn millis(ms: u64) -> Self {
        Self::timeout(Duration::from_millis(ms))
    }

    /// Effective timeout given the instance default.
    #[inline]
    pub fn limit(&self, default: Duration) -> Duration {
        match self.timeout {
            Some(timeout) if !timeout.is_zero() => timeout,
            _ => default,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_step_clock_shares_timeline() {
        let clock = StepClock::new(Duration::from_millis(2));
        let handle = clock.clone();

        assert_eq!(clock.now(), Duration::ZERO);
        assert_eq!(handle.now(), Duration::from_millis(2));

        handle.delay(Duration::from_millis(10));
        assert_eq!(clock.elapsed(), Duration::from_millis(14));
    }

    #[test]
    fn test_deadline_is_strict() {
        let deadline = Deadline::new(Duration::from_millis(5), Duration::from_millis(10));

        assert!(!deadline.expired(Duration::from_millis(15)));
        assert!(deadline.expired(Duration::from_millis(16)));
        assert!(!deadline.expired(Duration::ZERO));
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let default = Duration::from_millis(1000);

        assert_eq!(Wait::millis(0).limit(default), default);
        assert_eq!(Wait::BLOCK.limit(default), default);
        assert_eq!(Wait::millis(500).limit(default), Duration::from_millis(500));
    }
}
