// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Timestamps and the injectable clock seam.
//!
//! Every timestamp in the substrate comes from a [`Clock`] so tests can
//! freeze and advance time explicitly. Wall-clock UTC is the production
//! default; nothing in the core ever calls `SystemTime::now` directly.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Nanoseconds since the Unix epoch, UTC.
///
/// A plain `u64` under the hood: totally ordered, copyable, and canonically
/// encoded as 8 little-endian bytes. Saturating arithmetic keeps retention
/// math panic-free at the epoch boundary.
#[repr(transparent)]
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The Unix epoch itself.
    pub const EPOCH: Self = Self(0);

    /// Constructs from nanoseconds since the Unix epoch.
    #[must_use]
    pub fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Constructs from milliseconds since the Unix epoch.
    #[must_use]
    pub fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    /// Nanoseconds since the Unix epoch.
    #[must_use]
    pub fn as_nanos(self) -> u64 {
        self.0
    }

    /// Whole milliseconds since the Unix epoch.
    #[must_use]
    pub fn as_millis(self) -> u64 {
        self.0 / 1_000_000
    }

    /// This timestamp moved forward by `d`, saturating at `u64::MAX`.
    #[must_use]
    pub fn saturating_add(self, d: Duration) -> Self {
        let nanos = u64::try_from(d.as_nanos()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(nanos))
    }

    /// This timestamp moved backward by `d`, saturating at the epoch.
    #[must_use]
    pub fn saturating_sub(self, d: Duration) -> Self {
        let nanos = u64::try_from(d.as_nanos()).unwrap_or(u64::MAX);
        Self(self.0.saturating_sub(nanos))
    }

    /// Elapsed duration since `earlier`, or `None` if `earlier` is later.
    #[must_use]
    pub fn checked_duration_since(self, earlier: Self) -> Option<Duration> {
        self.0.checked_sub(earlier.0).map(Duration::from_nanos)
    }
}

/// Source of timestamps for record creation and retention evaluation.
///
/// The trait is object-safe so components can hold `&dyn Clock` without
/// generics leaking into their public types.
pub trait Clock {
    /// The current instant.
    fn now(&self) -> Timestamp;
}

/// Wall-clock UTC. The production default.
///
/// Clock skew before the Unix epoch collapses to the epoch rather than
/// failing — matching the best-effort timestamp handling used elsewhere in
/// this codebase.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp(u64::try_from(since_epoch.as_nanos()).unwrap_or(u64::MAX))
    }
}

/// Settable clock for tests.
///
/// Interior mutability lets a single instance be shared by reference with
/// the component under test while the test body advances time.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Default)]
pub struct ManualClock(std::sync::atomic::AtomicU64);

#[cfg(any(test, feature = "testing"))]
impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self(std::sync::atomic::AtomicU64::new(start.as_nanos()))
    }

    /// Jumps to an absolute instant.
    pub fn set(&self, to: Timestamp) {
        self.0
            .store(to.as_nanos(), std::sync::atomic::Ordering::SeqCst);
    }

    /// Moves time forward by `d`.
    pub fn advance(&self, d: Duration) {
        let nanos = u64::try_from(d.as_nanos()).unwrap_or(u64::MAX);
        self.0.fetch_add(nanos, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(any(test, feature = "testing"))]
impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.0.load(std::sync::atomic::Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_is_frozen_until_advanced() {
        let clock = ManualClock::new(Timestamp::from_millis(1_000));
        assert_eq!(clock.now(), clock.now());
        clock.advance(Duration::from_millis(5));
        assert_eq!(clock.now(), Timestamp::from_millis(1_005));
    }

    #[test]
    fn saturating_arithmetic_holds_at_bounds() {
        let t = Timestamp::EPOCH;
        assert_eq!(t.saturating_sub(Duration::from_secs(1)), Timestamp::EPOCH);
        let late = Timestamp::from_nanos(u64::MAX);
        assert_eq!(
            late.saturating_add(Duration::from_secs(1)).as_nanos(),
            u64::MAX
        );
    }

    #[test]
    fn duration_since_ordering() {
        let a = Timestamp::from_millis(10);
        let b = Timestamp::from_millis(25);
        assert_eq!(
            b.checked_duration_since(a),
            Some(Duration::from_millis(15))
        );
        assert_eq!(a.checked_duration_since(b), None);
    }
}
