// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The epoch projector: folding branch snapshots into a numbered log.
//!
//! An epoch is a bundle of one snapshot per participating branch, stamped
//! with the next sequential epoch number and a content hash over the
//! bundle. The number is the ordering handle; the hash is the tamper
//! check. Both exist on every epoch — neither substitutes for the other.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use reverie_codec::{
    compute_hash, domain, Canonical, CanonicalEncoder, Clock, Hash, Timestamp,
};

use crate::branch::BranchLog;
use crate::error::EpochError;
use crate::snapshot::{capture, BranchSnapshot, Embedder};

/// A numbered, content-hashed bundle of branch snapshots.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Epoch {
    /// Position in the epoch log, starting at 1, gap-free.
    pub epoch_number: u64,
    /// BLAKE3 hash over the canonical epoch contents.
    pub epoch_id: Hash,
    /// Creation instant (UTC).
    pub created_at: Timestamp,
    /// One snapshot per participating branch, keyed by branch name.
    pub branches: BTreeMap<String, BranchSnapshot>,
    /// Opaque annotations recorded with the epoch.
    pub metadata: BTreeMap<String, String>,
}

impl Epoch {
    /// The epoch id as lowercase hex.
    #[must_use]
    pub fn id_hex(&self) -> String {
        reverie_codec::hash_hex(&self.epoch_id)
    }

    /// Total events across all branch snapshots in this epoch.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.branches.values().map(|s| s.events.len()).sum()
    }
}

impl Canonical for Epoch {
    fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
        enc.put_u64(self.epoch_number);
        enc.put_u64(self.created_at.as_nanos());
        // Merkle-style: each branch contributes its name and snapshot hash;
        // the snapshot hash already commits to the snapshot contents.
        enc.put_len(self.branches.len());
        for (name, snapshot) in &self.branches {
            enc.put_str(name);
            enc.put_hash(&snapshot.hash);
        }
        enc.put_sorted_pairs(
            self.metadata.len(),
            self.metadata.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        );
    }
}

/// Aggregates over the whole epoch log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Number of epochs created (and not cleared).
    pub total_epochs: u64,
    /// Sum of branch counts across all epochs.
    pub total_branches: u64,
    /// Sum of snapshot event counts across all epochs.
    pub total_events: u64,
    /// `total_events / total_branches`, or 0 when no branches exist.
    pub average_events_per_branch: f64,
    /// Creation time of the newest epoch, if any.
    pub last_epoch_time: Option<Timestamp>,
}

/// Subscriber interface for epoch creation.
///
/// Fired synchronously from inside `create_epoch`, after the epoch is
/// appended. Handlers must not call back into the same projector.
pub trait EpochObserver: Send + Sync {
    /// Called after an epoch is sealed and appended.
    fn on_epoch_created(&self, epoch: &Epoch);
}

/// Assembles branch snapshots into the numbered epoch log.
///
/// Plain single-owner structure; wrap in [`SharedProjector`] to serialize
/// concurrent `create_epoch` calls.
#[derive(Default)]
pub struct EpochProjector {
    epochs: Vec<Epoch>,
    observers: Vec<Arc<dyn EpochObserver>>,
}

impl std::fmt::Debug for EpochProjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EpochProjector")
            .field("epochs", &self.epochs.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl EpochProjector {
    /// Creates an empty projector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a synchronous observer.
    pub fn subscribe(&mut self, observer: Arc<dyn EpochObserver>) {
        self.observers.push(observer);
    }

    /// Captures all provided branches and seals them into the next epoch.
    ///
    /// All-or-nothing: validation and every capture complete before the
    /// epoch log changes; any failure leaves the log exactly as it was.
    ///
    /// # Errors
    ///
    /// - [`EpochError::InvalidArgument`] for an empty branch set.
    /// - [`EpochError::DuplicateBranch`] when two logs share a name.
    pub fn create_epoch(
        &mut self,
        branches: &[&BranchLog],
        metadata: BTreeMap<String, String>,
        clock: &dyn Clock,
        embedder: Option<&dyn Embedder>,
    ) -> Result<&Epoch, EpochError> {
        if branches.is_empty() {
            return Err(EpochError::InvalidArgument(
                "an epoch needs at least one branch",
            ));
        }

        // Capture first; the log is only touched once every branch has a
        // snapshot.
        let mut captured: BTreeMap<String, BranchSnapshot> = BTreeMap::new();
        for branch in branches {
            let snapshot = capture(branch, clock, embedder);
            if captured
                .insert(snapshot.branch_name.clone(), snapshot)
                .is_some()
            {
                return Err(EpochError::DuplicateBranch(branch.name().to_owned()));
            }
        }

        let epoch_number = self.epochs.len() as u64 + 1;
        let mut epoch = Epoch {
            epoch_number,
            epoch_id: [0u8; 32],
            created_at: clock.now(),
            branches: captured,
            metadata,
        };
        epoch.epoch_id = compute_hash(&epoch, domain::EPOCH_V1);

        info!(
            epoch = epoch.epoch_number,
            id = %reverie_codec::short_hex(&epoch.epoch_id),
            branches = epoch.branches.len(),
            "epoch sealed"
        );
        self.epochs.push(epoch);
        let sealed = &self.epochs[self.epochs.len() - 1];
        for observer in &self.observers {
            observer.on_epoch_created(sealed);
        }
        Ok(sealed)
    }

    /// The most recent epoch, if any.
    #[must_use]
    pub fn latest_epoch(&self) -> Option<&Epoch> {
        self.epochs.last()
    }

    /// Looks up an epoch by number.
    ///
    /// # Errors
    ///
    /// [`EpochError::EpochNotFound`] for numbers outside `1..=count`.
    pub fn get_epoch(&self, number: u64) -> Result<&Epoch, EpochError> {
        number
            .checked_sub(1)
            .and_then(|idx| self.epochs.get(usize::try_from(idx).ok()?))
            .ok_or(EpochError::EpochNotFound(number))
    }

    /// Epochs created within `[start, end]` (inclusive on both ends), in
    /// creation order.
    pub fn epochs_in_range(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> impl Iterator<Item = &Epoch> {
        self.epochs
            .iter()
            .filter(move |e| e.created_at >= start && e.created_at <= end)
    }

    /// Number of epochs in the log. O(1).
    #[must_use]
    pub fn epoch_count(&self) -> usize {
        self.epochs.len()
    }

    /// Aggregates over the whole log.
    #[must_use]
    pub fn metrics(&self) -> EpochMetrics {
        let total_branches: u64 = self.epochs.iter().map(|e| e.branches.len() as u64).sum();
        let total_events: u64 = self.epochs.iter().map(|e| e.event_count() as u64).sum();
        #[allow(clippy::cast_precision_loss)]
        let average_events_per_branch = if total_branches == 0 {
            0.0
        } else {
            total_events as f64 / total_branches as f64
        };
        EpochMetrics {
            total_epochs: self.epochs.len() as u64,
            total_branches,
            total_events,
            average_events_per_branch,
            last_epoch_time: self.epochs.last().map(|e| e.created_at),
        }
    }

    /// Drops all epochs and resets numbering.
    ///
    /// Test utility; production deployments typically never call it.
    pub fn clear(&mut self) {
        self.epochs.clear();
    }
}

/// Cloneable handle that serializes projector access.
///
/// `create_epoch` calls queue on the mutex, so epoch numbers stay
/// contiguous under concurrency; readers receive point-in-time clones and
/// can never observe a partially constructed epoch.
#[derive(Clone, Debug, Default)]
pub struct SharedProjector {
    inner: Arc<Mutex<EpochProjector>>,
}

impl SharedProjector {
    /// Wraps an existing projector.
    #[must_use]
    pub fn new(projector: EpochProjector) -> Self {
        Self {
            inner: Arc::new(Mutex::new(projector)),
        }
    }

    /// Serialized epoch creation; returns a clone of the sealed epoch.
    ///
    /// # Errors
    ///
    /// See [`EpochProjector::create_epoch`].
    pub fn create_epoch(
        &self,
        branches: &[&BranchLog],
        metadata: BTreeMap<String, String>,
        clock: &dyn Clock,
        embedder: Option<&dyn Embedder>,
    ) -> Result<Epoch, EpochError> {
        self.inner
            .lock()
            .create_epoch(branches, metadata, clock, embedder)
            .cloned()
    }

    /// Point-in-time clone of the latest epoch.
    #[must_use]
    pub fn latest_epoch(&self) -> Option<Epoch> {
        self.inner.lock().latest_epoch().cloned()
    }

    /// Point-in-time clone of epoch `number`.
    ///
    /// # Errors
    ///
    /// See [`EpochProjector::get_epoch`].
    pub fn get_epoch(&self, number: u64) -> Result<Epoch, EpochError> {
        self.inner.lock().get_epoch(number).cloned()
    }

    /// Current metrics.
    #[must_use]
    pub fn metrics(&self) -> EpochMetrics {
        self.inner.lock().metrics()
    }

    /// Current epoch count.
    #[must_use]
    pub fn epoch_count(&self) -> usize {
        self.inner.lock().epoch_count()
    }
}
