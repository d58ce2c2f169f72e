// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Immutable branch snapshots and their hash contract.
//!
//! A snapshot freezes one branch at an instant: the ordered event records,
//! optional derived vectors, and a BLAKE3 hash over the canonical form
//! (hash field excluded). Equal branch content captured under a frozen
//! clock yields byte-equal canonical encodings and therefore equal hashes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use reverie_codec::{
    compute_hash, domain, Canonical, CanonicalEncoder, Clock, Hash, Timestamp,
};

use crate::branch::{BranchEvent, BranchLog};

/// Collaborator-supplied embedding hook.
///
/// A pure function from text to a feature vector. Consulted only during
/// snapshot capture; the core stores the vectors opaquely and never
/// inspects their contents.
pub trait Embedder {
    /// Embeds one event body rendered as text.
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// An immutable, hash-verified picture of one branch at an instant.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct BranchSnapshot {
    /// Name of the captured branch.
    pub branch_name: String,
    /// Capture instant (UTC).
    pub captured_at: Timestamp,
    /// The branch's events in submission order, frozen.
    pub events: Vec<BranchEvent>,
    /// Derived feature vectors, one per event, when an embedder was
    /// supplied at capture time; empty otherwise.
    pub vectors: Vec<Vec<f32>>,
    /// BLAKE3 hash of the canonical snapshot form (excluding this field).
    pub hash: Hash,
}

impl BranchSnapshot {
    /// The snapshot hash as lowercase hex.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        reverie_codec::hash_hex(&self.hash)
    }
}

impl Canonical for BranchSnapshot {
    fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
        enc.put_str(&self.branch_name);
        enc.put_u64(self.captured_at.as_nanos());
        enc.put_len(self.events.len());
        for event in &self.events {
            event.encode_canonical(enc);
        }
        enc.put_len(self.vectors.len());
        for vector in &self.vectors {
            enc.put_len(vector.len());
            for component in vector {
                enc.put_f32_bits(*component);
            }
        }
    }
}

/// Captures a read-consistent snapshot of `branch`.
///
/// The event slice is cloned; the log itself is untouched and no lock is
/// held by the core — callers sharing a log across threads wrap it the
/// same way they wrap the DAG. When `embedder` is supplied, each event
/// body is rendered as (lossy) UTF-8 and embedded into one vector per
/// event.
#[must_use]
pub fn capture(
    branch: &BranchLog,
    clock: &dyn Clock,
    embedder: Option<&dyn Embedder>,
) -> BranchSnapshot {
    let events = branch.events().to_vec();
    let vectors = embedder.map_or_else(Vec::new, |e| {
        events
            .iter()
            .map(|event| e.embed(&String::from_utf8_lossy(&event.body)))
            .collect()
    });

    let mut snapshot = BranchSnapshot {
        branch_name: branch.name().to_owned(),
        captured_at: clock.now(),
        events,
        vectors,
        hash: [0u8; 32],
    };
    snapshot.hash = compute_hash(&snapshot, domain::SNAPSHOT_V1);
    debug!(
        branch = %snapshot.branch_name,
        events = snapshot.events.len(),
        hash = %reverie_codec::short_hex(&snapshot.hash),
        "branch captured"
    );
    snapshot
}

/// Recomputes the snapshot hash over its canonical bytes and compares.
#[must_use]
pub fn verify(snapshot: &BranchSnapshot) -> bool {
    reverie_codec::verify_hash(snapshot, domain::SNAPSHOT_V1, &snapshot.hash)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use reverie_codec::{canonical_bytes, ManualClock};

    use super::*;

    struct FixedEmbedder;

    impl Embedder for FixedEmbedder {
        fn embed(&self, text: &str) -> Vec<f32> {
            #[allow(clippy::cast_precision_loss)]
            vec![text.len() as f32, 1.0]
        }
    }

    fn populated_log(clock: &ManualClock) -> BranchLog {
        let mut log = BranchLog::new("main").unwrap();
        log.append("draft", b"draft1".to_vec(), clock).unwrap();
        log.append("critique", b"crit1".to_vec(), clock).unwrap();
        log
    }

    #[test]
    fn frozen_clock_capture_is_byte_identical() {
        let clock = ManualClock::new(Timestamp::from_millis(42));
        let log = populated_log(&clock);

        let a = capture(&log, &clock, None);
        let b = capture(&log, &clock, None);
        assert_eq!(canonical_bytes(&a), canonical_bytes(&b));
        assert_eq!(a.hash, b.hash);
    }

    #[test]
    fn capture_time_is_part_of_the_hash() {
        let clock = ManualClock::new(Timestamp::from_millis(42));
        let log = populated_log(&clock);

        let a = capture(&log, &clock, None);
        clock.advance(std::time::Duration::from_millis(1));
        let b = capture(&log, &clock, None);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn verify_detects_tampering() {
        let clock = ManualClock::new(Timestamp::from_millis(42));
        let log = populated_log(&clock);

        let mut snapshot = capture(&log, &clock, None);
        assert!(verify(&snapshot));
        snapshot.events[0].body = b"edited".to_vec();
        assert!(!verify(&snapshot));
    }

    #[test]
    fn embedder_yields_one_vector_per_event() {
        let clock = ManualClock::new(Timestamp::from_millis(42));
        let log = populated_log(&clock);

        let snapshot = capture(&log, &clock, Some(&FixedEmbedder));
        assert_eq!(snapshot.vectors.len(), snapshot.events.len());
        assert!(verify(&snapshot));

        // Vectors participate in the hash.
        let bare = capture(&log, &clock, None);
        assert_ne!(snapshot.hash, bare.hash);
    }

    #[test]
    fn empty_branch_captures_cleanly() {
        let clock = ManualClock::new(Timestamp::from_millis(42));
        let log = BranchLog::new("empty").unwrap();
        let snapshot = capture(&log, &clock, None);
        assert!(snapshot.events.is_empty());
        assert!(verify(&snapshot));
    }
}
