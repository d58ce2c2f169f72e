// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Retention policies over captured snapshots.
//!
//! Evaluation is pure: it partitions the offered snapshots into keep and
//! delete sets and returns a [`RetentionPlan`]. The plan is always a
//! success value — even one that deletes everything — and the core never
//! executes it; a collaborator does, against whatever store holds the
//! snapshots.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use reverie_codec::{Hash, Timestamp};

use crate::snapshot::BranchSnapshot;

/// How much snapshot history to keep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetentionPolicy {
    /// Keep snapshots captured within the trailing window.
    ///
    /// A snapshot exactly on the boundary (`captured_at == now - max_age`)
    /// is kept. `max_age` of zero keeps nothing captured before `now`.
    ByAge {
        /// Trailing window length.
        max_age: Duration,
    },

    /// Keep the `max_count` most recently captured snapshots.
    ///
    /// Ties on `captured_at` break by hash so evaluation is deterministic.
    /// `max_count` of zero keeps nothing.
    ByCount {
        /// Number of snapshots to keep.
        max_count: usize,
    },

    /// Keep snapshots satisfying **both** constraints: recent enough and
    /// among the `max_count` newest.
    Combined {
        /// Trailing window length.
        max_age: Duration,
        /// Number of snapshots to keep.
        max_count: usize,
    },
}

/// The outcome of a retention evaluation.
///
/// Snapshots are identified by hash. Both lists preserve the input order;
/// every offered snapshot appears in exactly one of them.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RetentionPlan {
    /// Hashes of snapshots to keep.
    pub to_keep: Vec<Hash>,
    /// Hashes of snapshots eligible for deletion.
    pub to_delete: Vec<Hash>,
    /// `true` when the plan was produced for inspection only.
    pub is_dry_run: bool,
}

impl RetentionPlan {
    /// Number of snapshots the plan retains.
    #[must_use]
    pub fn kept(&self) -> usize {
        self.to_keep.len()
    }

    /// Number of snapshots the plan releases.
    #[must_use]
    pub fn deleted(&self) -> usize {
        self.to_delete.len()
    }
}

impl RetentionPolicy {
    /// Partitions `snapshots` into keep and delete sets as of `now`.
    ///
    /// Pure: nothing outside the returned plan changes, regardless of
    /// `dry_run`. The flag only records the caller's intent for the
    /// collaborator that executes the plan.
    #[must_use]
    pub fn evaluate(
        &self,
        snapshots: &[BranchSnapshot],
        now: Timestamp,
        dry_run: bool,
    ) -> RetentionPlan {
        let kept = self.kept_hashes(snapshots, now);

        let mut plan = RetentionPlan {
            to_keep: Vec::new(),
            to_delete: Vec::new(),
            is_dry_run: dry_run,
        };
        for snapshot in snapshots {
            if kept.contains(&snapshot.hash) {
                plan.to_keep.push(snapshot.hash);
            } else {
                plan.to_delete.push(snapshot.hash);
            }
        }
        debug!(
            kept = plan.kept(),
            deleted = plan.deleted(),
            dry_run,
            "retention evaluated"
        );
        plan
    }

    /// The set of hashes this policy keeps, as of `now`.
    fn kept_hashes(&self, snapshots: &[BranchSnapshot], now: Timestamp) -> BTreeSet<Hash> {
        match *self {
            Self::ByAge { max_age } => Self::kept_by_age(snapshots, now, max_age),
            Self::ByCount { max_count } => Self::kept_by_count(snapshots, max_count),
            Self::Combined { max_age, max_count } => {
                // Kept iff kept by BOTH constituent policies.
                let by_age = Self::kept_by_age(snapshots, now, max_age);
                let by_count = Self::kept_by_count(snapshots, max_count);
                by_age.intersection(&by_count).copied().collect()
            }
        }
    }

    fn kept_by_age(
        snapshots: &[BranchSnapshot],
        now: Timestamp,
        max_age: Duration,
    ) -> BTreeSet<Hash> {
        let cutoff = now.saturating_sub(max_age);
        snapshots
            .iter()
            .filter(|s| s.captured_at >= cutoff)
            .map(|s| s.hash)
            .collect()
    }

    fn kept_by_count(snapshots: &[BranchSnapshot], max_count: usize) -> BTreeSet<Hash> {
        let mut ranked: Vec<(&Timestamp, &Hash)> = snapshots
            .iter()
            .map(|s| (&s.captured_at, &s.hash))
            .collect();
        // Newest first; equal capture times order by hash bytes.
        ranked.sort_by(|a, b| b.0.cmp(a.0).then_with(|| a.1.cmp(b.1)));
        ranked.into_iter().take(max_count).map(|(_, h)| *h).collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use reverie_codec::{Clock, ManualClock};

    use super::*;
    use crate::branch::BranchLog;
    use crate::snapshot::capture;

    /// Five snapshots captured at t = 1s, 2s, …, 5s; clock left at 5s.
    fn five_snapshots(clock: &ManualClock) -> Vec<BranchSnapshot> {
        let mut log = BranchLog::new("main").unwrap();
        (1..=5u64)
            .map(|t| {
                clock.set(Timestamp::from_millis(t * 1_000));
                log.append("event", vec![u8::try_from(t).unwrap()], clock)
                    .unwrap();
                capture(&log, clock, None)
            })
            .collect()
    }

    #[test]
    fn by_count_keeps_the_newest() {
        let clock = ManualClock::new(Timestamp::EPOCH);
        let snapshots = five_snapshots(&clock);

        let plan =
            RetentionPolicy::ByCount { max_count: 3 }.evaluate(&snapshots, clock.now(), true);
        assert_eq!(plan.kept(), 3);
        assert_eq!(plan.deleted(), 2);
        // t=1s and t=2s go; t=3,4,5 stay.
        assert_eq!(plan.to_delete, vec![snapshots[0].hash, snapshots[1].hash]);
        assert_eq!(
            plan.to_keep,
            vec![snapshots[2].hash, snapshots[3].hash, snapshots[4].hash]
        );
        assert!(plan.is_dry_run);
    }

    #[test]
    fn by_age_boundary_is_inclusive() {
        let clock = ManualClock::new(Timestamp::EPOCH);
        let snapshots = five_snapshots(&clock);

        // now = 5s, window = 2s => cutoff = 3s; t=3s sits exactly on the
        // boundary and is kept.
        let plan = RetentionPolicy::ByAge {
            max_age: Duration::from_secs(2),
        }
        .evaluate(&snapshots, clock.now(), false);
        assert_eq!(plan.kept(), 3);
        assert_eq!(plan.to_delete, vec![snapshots[0].hash, snapshots[1].hash]);
    }

    #[test]
    fn zero_limits_delete_everything() {
        let clock = ManualClock::new(Timestamp::EPOCH);
        let snapshots = five_snapshots(&clock);
        // Move past the last capture so nothing sits on the zero-age boundary.
        clock.advance(Duration::from_millis(1));

        let by_count =
            RetentionPolicy::ByCount { max_count: 0 }.evaluate(&snapshots, clock.now(), false);
        assert_eq!(by_count.kept(), 0);
        assert_eq!(by_count.deleted(), 5);

        let by_age = RetentionPolicy::ByAge {
            max_age: Duration::ZERO,
        }
        .evaluate(&snapshots, clock.now(), false);
        assert_eq!(by_age.kept(), 0);
    }

    #[test]
    fn empty_input_yields_empty_plan() {
        let plan = RetentionPolicy::ByCount { max_count: 3 }.evaluate(
            &[],
            Timestamp::from_millis(1),
            false,
        );
        assert_eq!(plan, RetentionPlan {
            to_keep: vec![],
            to_delete: vec![],
            is_dry_run: false,
        });
    }

    #[test]
    fn combined_is_the_intersection() {
        let clock = ManualClock::new(Timestamp::EPOCH);
        let snapshots = five_snapshots(&clock);
        let now = clock.now();

        let age = Duration::from_secs(3); // keeps t=2..=5
        let count = 2; // keeps t=4,5

        let combined = RetentionPolicy::Combined {
            max_age: age,
            max_count: count,
        }
        .evaluate(&snapshots, now, true);
        let by_age = RetentionPolicy::ByAge { max_age: age }.evaluate(&snapshots, now, true);
        let by_count =
            RetentionPolicy::ByCount { max_count: count }.evaluate(&snapshots, now, true);

        let intersection: Vec<Hash> = snapshots
            .iter()
            .map(|s| s.hash)
            .filter(|h| by_age.to_keep.contains(h) && by_count.to_keep.contains(h))
            .collect();
        assert_eq!(combined.to_keep, intersection);
        assert_eq!(combined.kept(), 2);
    }

    #[test]
    fn count_larger_than_input_keeps_all() {
        let clock = ManualClock::new(Timestamp::EPOCH);
        let snapshots = five_snapshots(&clock);
        let plan =
            RetentionPolicy::ByCount { max_count: 99 }.evaluate(&snapshots, clock.now(), false);
        assert_eq!(plan.kept(), 5);
        assert_eq!(plan.deleted(), 0);
    }
}
