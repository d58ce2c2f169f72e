// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Named, append-only branch event logs.

use serde::{Deserialize, Serialize};

use reverie_codec::{check_field_len, Canonical, CanonicalEncoder, Clock, Timestamp};

use crate::error::EpochError;

/// One opaque event record within a branch.
///
/// `seq` is assigned by the owning [`BranchLog`] at append time and
/// preserves submission order; the core never interprets `body`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BranchEvent {
    /// Zero-based position within the branch.
    pub seq: u64,
    /// Short tag classifying the event.
    pub kind: String,
    /// Opaque event bytes.
    pub body: Vec<u8>,
    /// Append instant (UTC).
    pub recorded_at: Timestamp,
}

impl Canonical for BranchEvent {
    fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
        enc.put_u64(self.seq);
        enc.put_str(&self.kind);
        enc.put_bytes(&self.body);
        enc.put_u64(self.recorded_at.as_nanos());
    }
}

/// A named, ordered sequence of reasoning events.
///
/// Append-only: events are never edited or removed. Snapshot capture reads
/// the event slice; it never mutates the log.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BranchLog {
    name: String,
    events: Vec<BranchEvent>,
}

impl BranchLog {
    /// Creates an empty branch.
    ///
    /// # Errors
    ///
    /// [`EpochError::InvalidArgument`] for an empty name.
    pub fn new(name: impl Into<String>) -> Result<Self, EpochError> {
        let name = name.into();
        if name.is_empty() {
            return Err(EpochError::InvalidArgument("branch name must not be empty"));
        }
        Ok(Self {
            name,
            events: Vec::new(),
        })
    }

    /// The branch name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends one event, assigning the next sequence number.
    ///
    /// # Errors
    ///
    /// [`EpochError::InvalidArgument`] for an empty kind;
    /// [`EpochError::Codec`] for an oversize body.
    pub fn append(
        &mut self,
        kind: impl Into<String>,
        body: Vec<u8>,
        clock: &dyn Clock,
    ) -> Result<u64, EpochError> {
        let kind = kind.into();
        if kind.is_empty() {
            return Err(EpochError::InvalidArgument("event kind must not be empty"));
        }
        check_field_len(body.len())?;

        let seq = self.events.len() as u64;
        self.events.push(BranchEvent {
            seq,
            kind,
            body,
            recorded_at: clock.now(),
        });
        Ok(seq)
    }

    /// The events in submission order.
    #[must_use]
    pub fn events(&self) -> &[BranchEvent] {
        &self.events
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// `true` when no events have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use reverie_codec::ManualClock;

    use super::*;

    #[test]
    fn append_preserves_submission_order() {
        let clock = ManualClock::new(Timestamp::from_millis(10));
        let mut log = BranchLog::new("observations").unwrap();
        assert_eq!(log.append("draft", b"a".to_vec(), &clock).unwrap(), 0);
        assert_eq!(log.append("critique", b"b".to_vec(), &clock).unwrap(), 1);
        assert_eq!(log.append("final", b"c".to_vec(), &clock).unwrap(), 2);

        let seqs: Vec<u64> = log.events().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn empty_names_and_kinds_rejected() {
        assert!(matches!(
            BranchLog::new(""),
            Err(EpochError::InvalidArgument(_))
        ));
        let clock = ManualClock::new(Timestamp::from_millis(10));
        let mut log = BranchLog::new("b").unwrap();
        assert!(matches!(
            log.append("", vec![], &clock),
            Err(EpochError::InvalidArgument(_))
        ));
        assert!(log.is_empty());
    }
}
