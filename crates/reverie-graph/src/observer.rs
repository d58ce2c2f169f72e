// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Synchronous graph observers.
//!
//! Fan-out is an explicit subscription list, not an implicit event graph:
//! the DAG holds its subscribers and invokes them inline from the mutating
//! call. Handlers must be small and must never call back into
//! state-changing operations on the instance that fired them.

use crate::edge::TransitionEdge;
use crate::node::ReasoningNode;

/// Subscriber interface for graph mutations.
///
/// All methods default to no-ops so implementations subscribe only to the
/// events they care about. `Send + Sync` because observers ride along when
/// a graph is wrapped in [`SharedDag`].
///
/// [`SharedDag`]: crate::SharedDag
pub trait GraphObserver: Send + Sync {
    /// Called after a node is admitted.
    fn on_node_added(&self, node: &ReasoningNode) {
        let _ = node;
    }

    /// Called after an edge is admitted.
    fn on_edge_added(&self, edge: &TransitionEdge) {
        let _ = edge;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use reverie_codec::{ManualClock, Timestamp};

    use super::*;
    use crate::ReasoningDag;

    #[derive(Default)]
    struct Counter {
        nodes: AtomicUsize,
        edges: AtomicUsize,
    }

    impl GraphObserver for Counter {
        fn on_node_added(&self, _node: &ReasoningNode) {
            self.nodes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_edge_added(&self, _edge: &TransitionEdge) {
            self.edges.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn observers_fire_only_on_success() {
        let clock = ManualClock::new(Timestamp::from_millis(1));
        let counter = Arc::new(Counter::default());
        let mut dag = ReasoningDag::new();
        dag.subscribe(counter.clone());

        let n = ReasoningNode::new("Draft", "d", vec![], &clock).unwrap();
        dag.add_node(n.clone()).unwrap();
        assert_eq!(counter.nodes.load(Ordering::SeqCst), 1);

        // A rejected duplicate must not notify.
        let _ = dag.add_node(n);
        assert_eq!(counter.nodes.load(Ordering::SeqCst), 1);
        assert_eq!(counter.edges.load(Ordering::SeqCst), 0);
    }
}
