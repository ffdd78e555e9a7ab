//! Pipeline graph container.
//!
//! A [`Pipeline`] owns a tiny DAG of [`Node`]s. Building a pipeline only records
//! nodes and edges; nothing runs until a [`PCollection`](crate::PCollection)
//! collect method hands the graph to the [`Runner`](crate::Runner).

use crate::node::Node;
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Opaque handle for a node in a pipeline graph.
///
/// Ids are assigned sequentially per pipeline and are cheap to copy and hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(u64);

impl NodeId {
    /// Return the underlying numeric value.
    #[must_use]
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Shared handle to a pipeline graph. Cloning shares the same graph.
#[derive(Clone, Default)]
pub struct Pipeline {
    inner: Arc<Mutex<PipelineInner>>,
}

#[derive(Default)]
struct PipelineInner {
    next_id: u64,
    nodes: HashMap<NodeId, Node>,
    edges: Vec<(NodeId, NodeId)>,
}

impl Pipeline {
    fn lock(&self) -> MutexGuard<'_, PipelineInner> {
        // Nodes are only ever inserted whole, so a poisoned graph is still consistent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn insert_node(&self, node: Node) -> NodeId {
        let mut g = self.lock();
        let id = NodeId(g.next_id);
        g.next_id += 1;
        g.nodes.insert(id, node);
        id
    }

    pub(crate) fn connect(&self, from: NodeId, to: NodeId) {
        self.lock().edges.push((from, to));
    }

    /// Walk back from `terminal` to its source and return the chain in execution order.
    pub(crate) fn chain_to(&self, terminal: NodeId) -> Result<Vec<Node>> {
        let g = self.lock();
        let mut chain = Vec::new();
        let mut cur = terminal;
        loop {
            let node = g
                .nodes
                .get(&cur)
                .cloned()
                .ok_or_else(|| anyhow!("missing node {cur:?}"))?;
            chain.push(node);
            match g.edges.iter().find(|(_, to)| *to == cur) {
                Some((from, _)) => cur = *from,
                None => break,
            }
        }
        drop(g);
        chain.reverse();
        Ok(chain)
    }

    /// Number of nodes recorded so far.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.lock().nodes.len()
    }

    /// Number of edges recorded so far.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.lock().edges.len()
    }
}
