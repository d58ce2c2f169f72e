// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reasoning node records.

use serde::{Deserialize, Serialize};

use reverie_codec::{
    compute_hash, domain, Canonical, CanonicalEncoder, Clock, Hash, Timestamp,
};

use crate::error::DagError;
use crate::ident::NodeId;
use crate::payload::Payload;

/// A content-addressed reasoning artifact.
///
/// The hash covers `type_name`, the payload, the ordered parent list, and
/// `created_at` — the id is assigned at creation and deliberately excluded
/// so that identical content submitted twice is detectable by hash
/// equality. Once admitted to a [`ReasoningDag`] the record is immutable.
///
/// [`ReasoningDag`]: crate::ReasoningDag
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ReasoningNode {
    /// Opaque 128-bit identifier, assigned at creation.
    pub id: NodeId,
    /// Short tag classifying the payload (e.g. `Draft`, `Critique`).
    pub type_name: String,
    /// The artifact content.
    pub payload: Payload,
    /// Ordered parent node ids; empty for a root.
    pub parent_ids: Vec<NodeId>,
    /// Creation instant (UTC).
    pub created_at: Timestamp,
    /// BLAKE3 content hash of the canonical form.
    pub hash: Hash,
}

impl ReasoningNode {
    /// Creates a node, assigning a fresh id and computing the content hash.
    ///
    /// # Errors
    ///
    /// - [`DagError::InvalidArgument`] for an empty `type_name`.
    /// - [`DagError::Codec`] when the payload exceeds encoding bounds.
    pub fn new(
        type_name: impl Into<String>,
        payload: impl Into<Payload>,
        parent_ids: Vec<NodeId>,
        clock: &dyn Clock,
    ) -> Result<Self, DagError> {
        let type_name = type_name.into();
        if type_name.is_empty() {
            return Err(DagError::InvalidArgument("node type_name must not be empty"));
        }
        let payload = payload.into();
        payload.validate()?;

        let mut node = Self {
            id: NodeId::new(),
            type_name,
            payload,
            parent_ids,
            created_at: clock.now(),
            hash: [0u8; 32],
        };
        node.hash = compute_hash(&node, domain::NODE_V1);
        Ok(node)
    }

    /// Reconstitutes a node from stored parts (adapter boundary).
    ///
    /// The provided hash is trusted here and re-verified when the record is
    /// admitted to a graph, so a tampered store surfaces as
    /// [`DagError::IntegrityViolation`] at that point.
    #[must_use]
    pub fn from_parts(
        id: NodeId,
        type_name: String,
        payload: Payload,
        parent_ids: Vec<NodeId>,
        created_at: Timestamp,
        hash: Hash,
    ) -> Self {
        Self {
            id,
            type_name,
            payload,
            parent_ids,
            created_at,
            hash,
        }
    }

    /// `true` when the node has no parents.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_ids.is_empty()
    }

    /// The content hash as lowercase hex.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        reverie_codec::hash_hex(&self.hash)
    }
}

impl Canonical for ReasoningNode {
    fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
        enc.put_str(&self.type_name);
        self.payload.encode_canonical(enc);
        enc.put_len(self.parent_ids.len());
        for parent in &self.parent_ids {
            enc.put_id(parent.as_bytes());
        }
        enc.put_u64(self.created_at.as_nanos());
    }
}
