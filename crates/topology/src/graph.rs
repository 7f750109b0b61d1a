use crate::model::{Edge, Node, NodeKey};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// How a trace moved from one node to the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Hop {
    /// Physical cable between two ports. Counts as one hop.
    Cable(Edge),
    /// Front/rear pairing inside a pass-through device. Free in hop counts.
    Internal,
    /// Crossing an endpoint device from one cabled port to another. Free in hop counts.
    Device,
}

impl Hop {
    pub fn is_cable(&self) -> bool {
        matches!(self, Self::Cable(_))
    }

    pub fn edge(&self) -> Option<&Edge> {
        match self {
            Self::Cable(edge) => Some(edge),
            Self::Internal | Self::Device => None,
        }
    }
}

/// Per-node bookkeeping recorded the first time a trace reaches a node.
#[derive(Debug, Clone)]
pub struct Visit {
    pub node: Node,
    /// Cable hops from the root
    pub hops: usize,
    /// Steps from the root, cable and internal alike
    pub steps: usize,
}

/// Outcome of reaching a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discovery {
    New(NodeIndex),
    Seen(NodeIndex),
}

/// Request-scoped record of everything a trace has visited.
///
/// Nodes are stored in discovery order and each non-root node keeps exactly one incoming edge
/// pointing at the node it was first reached from, so the graph doubles as the visited set and
/// the parent map.
#[derive(Debug, Default)]
pub struct TopologyGraph {
    graph: DiGraph<Visit, Hop>,
    index: HashMap<NodeKey, NodeIndex>,
}

impl TopologyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A graph holding only `root`, which gets index `0`.
    pub fn with_root(root: Node) -> (Self, NodeIndex) {
        let mut graph = Self::new();
        let key = root.key();
        let idx = graph.graph.add_node(Visit {
            node: root,
            hops: 0,
            steps: 0,
        });
        graph.index.insert(key, idx);
        (graph, idx)
    }

    /// Add a trace root. Returns `None` if the node was already visited.
    pub fn add_root(&mut self, node: Node) -> Option<NodeIndex> {
        let key = node.key();
        if self.index.contains_key(&key) {
            return None;
        }
        let idx = self.graph.add_node(Visit {
            node,
            hops: 0,
            steps: 0,
        });
        self.index.insert(key, idx);
        Some(idx)
    }

    /// Reach `node` from `parent` over `hop`. Already visited nodes are left untouched.
    pub fn discover(&mut self, parent: NodeIndex, node: Node, hop: Hop) -> Discovery {
        if let Some(&existing) = self.index.get(&node.key()) {
            return Discovery::Seen(existing);
        }
        let (hops, steps) = {
            let from = &self.graph[parent];
            (from.hops + usize::from(hop.is_cable()), from.steps + 1)
        };
        let key = node.key();
        let idx = self.graph.add_node(Visit { node, hops, steps });
        self.graph.add_edge(parent, idx, hop);
        self.index.insert(key, idx);
        Discovery::New(idx)
    }

    pub fn find(&self, key: &NodeKey) -> Option<NodeIndex> {
        self.index.get(key).copied()
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn visit(&self, idx: NodeIndex) -> &Visit {
        &self.graph[idx]
    }

    /// The node `idx` was first reached from, and how.
    pub fn parent(&self, idx: NodeIndex) -> Option<(NodeIndex, &Hop)> {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .next()
            .map(|e| (e.source(), e.weight()))
    }

    /// Root-to-`idx` chain of nodes and the hops between them.
    pub fn trail(&self, idx: NodeIndex) -> (Vec<Node>, Vec<Hop>) {
        let mut nodes = vec![self.graph[idx].node.clone()];
        let mut hops = Vec::new();
        let mut current = idx;
        while let Some((parent, hop)) = self.parent(current) {
            nodes.push(self.graph[parent].node.clone());
            hops.push(hop.clone());
            current = parent;
        }
        nodes.reverse();
        hops.reverse();
        (nodes, hops)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Distinct cable ids traversed so far.
    pub fn cable_ids(&self) -> BTreeSet<u64> {
        self.graph
            .edge_weights()
            .filter_map(|hop| hop.edge().map(|e| e.cable_id))
            .collect()
    }

    /// Traversed cables whose status is missing or not `connected`, ordered by cable id.
    pub fn flagged_cables(&self) -> Vec<Edge> {
        self.graph
            .edge_weights()
            .filter_map(Hop::edge)
            .filter(|e| e.is_flagged())
            .map(|e| (e.cable_id, e.clone()))
            .collect::<BTreeMap<_, _>>()
            .into_values()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CableStatus, PortKind};

    fn node(device: &str, port: &str, id: u64, kind: PortKind) -> Node {
        Node {
            device_id: id,
            device_name: device.to_string(),
            interface_id: id,
            interface_name: port.to_string(),
            port_kind: kind,
        }
    }

    #[test]
    fn internal_hops_are_free_but_take_a_step() {
        let mut graph = TopologyGraph::new();
        let root = graph
            .add_root(node("switch-01", "eth0", 1, PortKind::Regular))
            .expect("root");
        let Discovery::New(front) = graph.discover(
            root,
            node("patch-01", "front1", 2, PortKind::FrontPort),
            Hop::Cable(Edge::connected(10)),
        ) else {
            panic!("front port should be new");
        };
        let Discovery::New(rear) = graph.discover(
            front,
            node("patch-01", "rear1", 3, PortKind::RearPort),
            Hop::Internal,
        ) else {
            panic!("rear port should be new");
        };

        assert_eq!(graph.visit(rear).hops, 1);
        assert_eq!(graph.visit(rear).steps, 2);

        let (nodes, hops) = graph.trail(rear);
        let labels: Vec<String> = nodes.iter().map(Node::label).collect();
        assert_eq!(labels, vec!["switch-01:eth0", "patch-01:front1", "patch-01:rear1"]);
        assert_eq!(hops, vec![Hop::Cable(Edge::connected(10)), Hop::Internal]);
    }

    #[test]
    fn revisits_are_reported_not_recorded() {
        let mut graph = TopologyGraph::new();
        let eth0 = node("switch-01", "eth0", 1, PortKind::Regular);
        let root = graph.add_root(eth0.clone()).expect("root");
        assert_eq!(
            graph.discover(root, eth0.clone(), Hop::Device),
            Discovery::Seen(root)
        );
        assert!(graph.add_root(eth0).is_none());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn flagged_cables_are_deduplicated() {
        let mut graph = TopologyGraph::new();
        let root = graph
            .add_root(node("a", "eth0", 1, PortKind::Regular))
            .expect("root");
        let planned = Edge {
            status: Some(CableStatus::Planned),
            ..Edge::connected(5)
        };
        graph.discover(root, node("b", "eth0", 2, PortKind::Regular), Hop::Cable(planned.clone()));
        graph.discover(root, node("c", "eth0", 3, PortKind::Regular), Hop::Cable(planned));
        assert_eq!(graph.flagged_cables().len(), 1);
        assert_eq!(graph.cable_ids(), BTreeSet::from([5]));
    }
}
