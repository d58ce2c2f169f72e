// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Transition edge records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use reverie_codec::{
    check_field_len, compute_hash, domain, Canonical, CanonicalEncoder, Clock, Hash, Timestamp,
};

use crate::error::DagError;
use crate::ident::{EdgeId, NodeId};

/// A typed hyperedge from one or more input nodes to exactly one output.
///
/// Edges record how an artifact was derived: the operation name tags the
/// transition kind, metadata carries opaque annotations, and the optional
/// confidence/duration fields describe the producing step. Like nodes,
/// edges are hashed at construction and immutable after admission.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct TransitionEdge {
    /// Opaque 128-bit identifier, assigned at creation.
    pub id: EdgeId,
    /// Ordered, non-empty input node ids.
    pub input_ids: Vec<NodeId>,
    /// The single output node id.
    pub output_id: NodeId,
    /// Tag for the transition kind (e.g. `UseCritique`).
    pub operation_name: String,
    /// Opaque annotations; sorted keys give a canonical encoding.
    pub metadata: BTreeMap<String, String>,
    /// Optional confidence in `[0.0, 1.0]`.
    pub confidence: Option<f64>,
    /// Optional duration of the producing step, in milliseconds.
    pub duration_ms: Option<u64>,
    /// Creation instant (UTC).
    pub created_at: Timestamp,
    /// BLAKE3 content hash of the canonical form.
    pub hash: Hash,
}

impl TransitionEdge {
    /// Creates an edge, assigning a fresh id and computing the content hash.
    ///
    /// # Errors
    ///
    /// [`DagError::InvalidArgument`] for an empty input list, an empty
    /// operation name, or a confidence outside `[0.0, 1.0]`;
    /// [`DagError::Codec`] when a metadata entry exceeds encoding bounds.
    pub fn new(
        input_ids: Vec<NodeId>,
        output_id: NodeId,
        operation_name: impl Into<String>,
        metadata: BTreeMap<String, String>,
        confidence: Option<f64>,
        duration_ms: Option<u64>,
        clock: &dyn Clock,
    ) -> Result<Self, DagError> {
        let operation_name = operation_name.into();
        if input_ids.is_empty() {
            return Err(DagError::InvalidArgument("edge input_ids must not be empty"));
        }
        if operation_name.is_empty() {
            return Err(DagError::InvalidArgument(
                "edge operation_name must not be empty",
            ));
        }
        if let Some(c) = confidence {
            if !(0.0..=1.0).contains(&c) {
                return Err(DagError::InvalidArgument(
                    "edge confidence must lie in [0.0, 1.0]",
                ));
            }
        }
        for (k, v) in &metadata {
            check_field_len(k.len())?;
            check_field_len(v.len())?;
        }

        let mut edge = Self {
            id: EdgeId::new(),
            input_ids,
            output_id,
            operation_name,
            metadata,
            confidence,
            duration_ms,
            created_at: clock.now(),
            hash: [0u8; 32],
        };
        edge.hash = compute_hash(&edge, domain::EDGE_V1);
        Ok(edge)
    }

    /// Reconstitutes an edge from stored parts (adapter boundary).
    ///
    /// The provided hash is re-verified on admission to a graph.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: EdgeId,
        input_ids: Vec<NodeId>,
        output_id: NodeId,
        operation_name: String,
        metadata: BTreeMap<String, String>,
        confidence: Option<f64>,
        duration_ms: Option<u64>,
        created_at: Timestamp,
        hash: Hash,
    ) -> Self {
        Self {
            id,
            input_ids,
            output_id,
            operation_name,
            metadata,
            confidence,
            duration_ms,
            created_at,
            hash,
        }
    }

    /// The content hash as lowercase hex.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        reverie_codec::hash_hex(&self.hash)
    }
}

impl Canonical for TransitionEdge {
    fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
        enc.put_len(self.input_ids.len());
        for input in &self.input_ids {
            enc.put_id(input.as_bytes());
        }
        enc.put_id(self.output_id.as_bytes());
        enc.put_str(&self.operation_name);
        enc.put_sorted_pairs(
            self.metadata.len(),
            self.metadata.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        );
        enc.put_opt_f64_bits(self.confidence);
        enc.put_opt_u64(self.duration_ms);
        enc.put_u64(self.created_at.as_nanos());
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use reverie_codec::{verify_hash, ManualClock};

    use super::*;

    fn clock() -> ManualClock {
        ManualClock::new(Timestamp::from_millis(1_700_000_000_000))
    }

    fn edge(confidence: Option<f64>) -> Result<TransitionEdge, DagError> {
        TransitionEdge::new(
            vec![NodeId::new()],
            NodeId::new(),
            "UseCritique",
            BTreeMap::new(),
            confidence,
            None,
            &clock(),
        )
    }

    #[test]
    fn hash_is_computed_at_creation() {
        let e = edge(Some(0.85)).unwrap();
        assert!(verify_hash(&e, domain::EDGE_V1, &e.hash));
    }

    #[test]
    fn confidence_bounds_are_enforced() {
        assert!(edge(Some(0.0)).is_ok());
        assert!(edge(Some(1.0)).is_ok());
        assert!(matches!(
            edge(Some(1.01)),
            Err(DagError::InvalidArgument(_))
        ));
        assert!(matches!(
            edge(Some(-0.01)),
            Err(DagError::InvalidArgument(_))
        ));
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let err = TransitionEdge::new(
            vec![],
            NodeId::new(),
            "UseCritique",
            BTreeMap::new(),
            None,
            None,
            &clock(),
        )
        .unwrap_err();
        assert!(matches!(err, DagError::InvalidArgument(_)));
    }

    #[test]
    fn metadata_insertion_order_does_not_affect_hash() {
        let c = clock();
        let inputs = vec![NodeId::new()];
        let output = NodeId::new();

        let mut m1 = BTreeMap::new();
        m1.insert("b".to_owned(), "2".to_owned());
        m1.insert("a".to_owned(), "1".to_owned());
        let mut m2 = BTreeMap::new();
        m2.insert("a".to_owned(), "1".to_owned());
        m2.insert("b".to_owned(), "2".to_owned());

        let e1 =
            TransitionEdge::new(inputs.clone(), output, "Op", m1, None, None, &c).unwrap();
        let e2 = TransitionEdge::new(inputs, output, "Op", m2, None, None, &c).unwrap();
        assert_eq!(e1.hash, e2.hash);
    }
}
