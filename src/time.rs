//! Wall-clock time for the face, plus the software clock and the one-second
//! ticker the firmware loop runs on.
//!
//! The RTC is read at boot and then hourly; in between `SoftClock` extrapolates from the
//! system timer, and `SecondTicker` tells the main loop when a new second
//! has started.

const SECONDS_PER_DAY: u32 = 86_400;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimeError {
    OutOfRange,
}

/// Time of day, 24-hour.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WallTime {
    hour: u8,
    minute: u8,
    second: u8,
}

impl WallTime {
    pub const MIDNIGHT: WallTime = WallTime {
        hour: 0,
        minute: 0,
        second: 0,
    };

    pub const fn new(hour: u8, minute: u8, second: u8) -> Result<Self, TimeError> {
        if hour > 23 || minute > 59 || second > 59 {
            return Err(TimeError::OutOfRange);
        }
        Ok(Self { hour, minute, second })
    }

    /// Any count of seconds, wrapped into one day.
    pub const fn from_seconds_of_day(secs: u32) -> Self {
        let secs = secs % SECONDS_PER_DAY;
        Self {
            hour: (secs / 3600) as u8,
            minute: (secs % 3600 / 60) as u8,
            second: (secs % 60) as u8,
        }
    }

    // UTC time of day of a Unix timestamp.
    pub const fn from_unix(ts: u32) -> Self {
        Self::from_seconds_of_day(ts)
    }

    #[inline]
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    #[inline]
    pub const fn minute(&self) -> u8 {
        self.minute
    }

    #[inline]
    pub const fn second(&self) -> u8 {
        self.second
    }

    pub const fn seconds_of_day(&self) -> u32 {
        self.hour as u32 * 3600 + self.minute as u32 * 60 + self.second as u32
    }
}

/// Anything that can tell the current time of day.
pub trait TimeSource {
    fn now(&mut self) -> WallTime;
}

/// Unix seconds extrapolated from a monotonic millisecond counter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SoftClock {
    base_unix: u32,
    base_ms: u64,
}

impl SoftClock {
    pub const fn new(unix: u32, now_ms: u64) -> Self {
        Self {
            base_unix: unix,
            base_ms: now_ms,
        }
    }

    // Re-anchor, e.g. after reading the RTC again
    pub fn set(&mut self, unix: u32, now_ms: u64) {
        self.base_unix = unix;
        self.base_ms = now_ms;
    }

    pub fn unix_now(&self, now_ms: u64) -> u32 {
        let elapsed = now_ms.saturating_sub(self.base_ms) / 1000;
        self.base_unix.saturating_add(elapsed.min(u32::MAX as u64) as u32)
    }

    pub fn wall_time(&self, now_ms: u64) -> WallTime {
        WallTime::from_unix(self.unix_now(now_ms))
    }
}

/// `SoftClock` bound to a millisecond counter, e.g. the system timer.
pub struct MonotonicClock<F> {
    clock: SoftClock,
    millis: F,
}

impl<F: FnMut() -> u64> MonotonicClock<F> {
    pub fn new(unix: u32, mut millis: F) -> Self {
        let now = millis();
        Self {
            clock: SoftClock::new(unix, now),
            millis,
        }
    }

    pub fn set(&mut self, unix: u32) {
        let now = (self.millis)();
        self.clock.set(unix, now);
    }

    pub fn unix_now(&mut self) -> u32 {
        let now = (self.millis)();
        self.clock.unix_now(now)
    }
}

impl<F: FnMut() -> u64> TimeSource for MonotonicClock<F> {
    fn now(&mut self) -> WallTime {
        WallTime::from_unix(self.unix_now())
    }
}

/// Fires once per elapsed second, aligned to the instant it was started.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SecondTicker {
    next_ms: u64,
}

impl SecondTicker {
    pub const PERIOD_MS: u64 = 1000;

    pub const fn new(now_ms: u64) -> Self {
        Self {
            next_ms: now_ms + Self::PERIOD_MS,
        }
    }

    /// `Some(n)` once one or more boundaries have passed since the last call,
    /// where `n` is how many (a late poll coalesces missed ticks).
    pub fn poll(&mut self, now_ms: u64) -> Option<u32> {
        if now_ms < self.next_ms {
            return None;
        }
        let elapsed = (now_ms - self.next_ms) / Self::PERIOD_MS + 1;
        self.next_ms += elapsed * Self::PERIOD_MS;
        Some(elapsed.min(u32::MAX as u64) as u32)
    }

    pub fn next_ms(&self) -> u64 {
        self.next_ms
    }
}
