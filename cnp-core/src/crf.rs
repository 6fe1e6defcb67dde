//! The call/return forest (C5): a bipartite graph of cluster nodes
//! `(head, position)` and label nodes `(slot, position)`, built with
//! `petgraph` the way the GLR engine this crate is descended from builds
//! its graph-structured stack rather than by hand-rolling pointer-linked
//! nodes.

use crate::label::Slot;
use cnp_index::HeadIdx;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CrfNode {
    Cluster { head: HeadIdx, at: usize },
    Label { slot: Slot, at: usize },
}

#[derive(Default)]
pub struct Crf {
    graph: DiGraph<CrfNode, ()>,
    clusters: HashMap<(HeadIdx, usize), NodeIndex>,
    labels: HashMap<(Slot, usize), NodeIndex>,
}

impl Crf {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn cluster_exists(&self, head: HeadIdx, at: usize) -> Option<NodeIndex> {
        self.clusters.get(&(head, at)).copied()
    }

    /// Interns the cluster node `(head, at)`, creating it if absent.
    /// Returns whether it was newly created.
    pub fn cluster(&mut self, head: HeadIdx, at: usize) -> (NodeIndex, bool) {
        if let Some(&idx) = self.clusters.get(&(head, at)) {
            return (idx, false);
        }
        let idx = self.graph.add_node(CrfNode::Cluster { head, at });
        self.clusters.insert((head, at), idx);
        (idx, true)
    }

    /// Interns the label node `(slot, at)`, creating it if absent. Returns
    /// whether it was newly created.
    pub fn label(&mut self, slot: Slot, at: usize) -> (NodeIndex, bool) {
        if let Some(&idx) = self.labels.get(&(slot, at)) {
            return (idx, false);
        }
        let idx = self.graph.add_node(CrfNode::Label { slot, at });
        self.labels.insert((slot, at), idx);
        (idx, true)
    }

    /// Adds the edge `cluster -> label` if absent. Returns whether it was
    /// newly added.
    pub fn add_edge_if_absent(&mut self, cluster: NodeIndex, label: NodeIndex) -> bool {
        if self.graph.find_edge(cluster, label).is_some() {
            return false;
        }
        self.graph.add_edge(cluster, label, ());
        true
    }

    /// The `(label, position)` pairs hanging off a cluster node, i.e. the
    /// set `P[(X, j)]` the spec describes as attached to the cluster.
    pub fn children(&self, cluster: NodeIndex) -> impl Iterator<Item = (Slot, usize)> + '_ {
        self.graph.neighbors(cluster).filter_map(move |n| match self.graph[n] {
            CrfNode::Label { slot, at } => Some((slot, at)),
            CrfNode::Cluster { .. } => None,
        })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
