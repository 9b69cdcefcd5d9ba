//! Clock-tagged timestamps and durations
//!
//! Latency is measured by sampling `clock_gettime` directly and doing exact
//! seconds/nanoseconds arithmetic on the raw `timespec` values. Each value is
//! tagged with the clock it was read from, so a `Duration<Monotonic>` cannot
//! be subtracted from or added to a `Duration<MonotonicRaw>`: the mix does
//! not type-check.

use crate::error::{Error, Result};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Div, Sub};

/// Nanoseconds per second
pub const NANOS_PER_SEC: i64 = 1_000_000_000;

/// A clock source usable with `clock_gettime`
pub trait Clock: Copy + Default + fmt::Debug + Send + Sync + 'static {
    /// `clockid_t` passed to `clock_gettime`
    const ID: libc::clockid_t;
    /// Human-readable name, used in error messages
    const NAME: &'static str;
}

/// `CLOCK_MONOTONIC`: slewed by NTP, never jumps backwards
#[derive(Debug, Clone, Copy, Default)]
pub struct Monotonic;

impl Clock for Monotonic {
    const ID: libc::clockid_t = libc::CLOCK_MONOTONIC;
    const NAME: &'static str = "CLOCK_MONOTONIC";
}

/// `CLOCK_MONOTONIC_RAW`: hardware clock without NTP slewing
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicRaw;

impl Clock for MonotonicRaw {
    const ID: libc::clockid_t = libc::CLOCK_MONOTONIC_RAW;
    const NAME: &'static str = "CLOCK_MONOTONIC_RAW";
}

/// Seconds/nanoseconds value read from clock `C`
///
/// Serves both as a point in time (from [`Duration::now`]) and as the
/// distance between two such points. Nanoseconds are kept in
/// `[0, NANOS_PER_SEC)`; seconds may go negative when subtracting a later
/// sample from an earlier one.
pub struct Duration<C: Clock = Monotonic> {
    secs: i64,
    nanos: i64,
    _clock: PhantomData<C>,
}

impl<C: Clock> Duration<C> {
    /// Zero duration
    pub const ZERO: Self = Self::from_parts(0, 0);

    /// Build a duration from raw parts without normalizing
    pub const fn from_parts(secs: i64, nanos: i64) -> Self {
        Self {
            secs,
            nanos,
            _clock: PhantomData,
        }
    }

    /// Sample the current value of clock `C`
    ///
    /// # Errors
    ///
    /// `ClockUnavailable` if `clock_gettime` fails (e.g. the clock id is not
    /// supported by the running kernel).
    #[inline]
    pub fn now() -> Result<Self> {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };

        let ret = unsafe { libc::clock_gettime(C::ID, &mut ts) };
        if ret != 0 {
            return Err(Error::ClockUnavailable {
                clock: C::NAME,
                source: std::io::Error::last_os_error(),
            });
        }

        Ok(Self::from_parts(ts.tv_sec as i64, ts.tv_nsec as i64))
    }

    #[inline]
    pub fn secs(&self) -> i64 {
        self.secs
    }

    #[inline]
    pub fn nanos(&self) -> i64 {
        self.nanos
    }

    /// Add two durations, carrying whole seconds out of the nanosecond sum
    ///
    /// # Errors
    ///
    /// `Overflow` if the seconds component (including the carry) does not
    /// fit in an `i64`.
    pub fn checked_add(self, other: Self) -> Result<Self> {
        let mut secs = self.secs.checked_add(other.secs).ok_or(Error::Overflow)?;
        let mut nanos = self.nanos + other.nanos;

        if nanos >= NANOS_PER_SEC {
            nanos -= NANOS_PER_SEC;
            secs = secs.checked_add(1).ok_or(Error::Overflow)?;
        }

        Ok(Self::from_parts(secs, nanos))
    }

    /// True if the value is below zero
    pub fn is_negative(&self) -> bool {
        self.secs < 0
    }
}

impl<C: Clock> Sub for Duration<C> {
    type Output = Self;

    /// Exact subtraction, borrowing one second when the nanosecond difference
    /// is negative
    fn sub(self, other: Self) -> Self {
        let mut secs = self.secs - other.secs;
        let mut nanos = self.nanos - other.nanos;

        if nanos < 0 {
            secs -= 1;
            nanos += NANOS_PER_SEC;
        }

        Self::from_parts(secs, nanos)
    }
}

impl<C: Clock> Div<u64> for Duration<C> {
    type Output = Self;

    /// Approximate division used for averaging accumulated latencies
    ///
    /// The seconds are integer-divided and the remainder is spread into the
    /// nanoseconds as `(1e9 / n) * (secs % n)`. The original nanosecond
    /// component is then added back undivided, so the result is only exact
    /// when the nanosecond component is zero. Whole seconds carried out of the
    /// nanosecond sum are normalized back into the seconds.
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero, like integer division.
    fn div(self, n: u64) -> Self {
        assert!(n > 0, "attempt to divide a duration by zero");
        let n = i64::try_from(n).unwrap_or(i64::MAX);

        let whole = self.secs / n;
        let fraction = (NANOS_PER_SEC / n) * (self.secs % n);
        let nanos = self.nanos + fraction;

        Self::from_parts(
            whole + nanos.div_euclid(NANOS_PER_SEC),
            nanos.rem_euclid(NANOS_PER_SEC),
        )
    }
}

impl<C: Clock> Clone for Duration<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: Clock> Copy for Duration<C> {}

impl<C: Clock> PartialEq for Duration<C> {
    fn eq(&self, other: &Self) -> bool {
        self.secs == other.secs && self.nanos == other.nanos
    }
}

impl<C: Clock> Eq for Duration<C> {}

impl<C: Clock> PartialOrd for Duration<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C: Clock> Ord for Duration<C> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.secs, self.nanos).cmp(&(other.secs, other.nanos))
    }
}

impl<C: Clock> Default for Duration<C> {
    fn default() -> Self {
        Self::ZERO
    }
}

impl<C: Clock> fmt::Debug for Duration<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Duration")
            .field("clock", &C::NAME)
            .field("secs", &self.secs)
            .field("nanos", &self.nanos)
            .finish()
    }
}

/// Renders as `<secs>.<nanos>` with the nanoseconds zero-padded to 9 digits
impl<C: Clock> fmt::Display for Duration<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.secs, self.nanos)
    }
}

/// Serialized as the display string so no precision is lost to floats
impl<C: Clock> Serialize for Duration<C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
