//! Exhaustive trace outward from a single port.
//!
//! Each level expands the cables of every frontier port concurrently and merges the results in
//! frontier order. Every reached node is recorded once; reaching a visited node again marks a
//! cycle on the branch instead of re-entering it.

use crate::annotation::Annotation;
use crate::error::{Result, TraceError};
use crate::expand::{Beyond, Expander};
use crate::fetcher::ConnectionFetcher;
use crate::graph::{Discovery, Hop, TopologyGraph};
use crate::model::{Edge, Node};
use crate::resolver::Classification;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeOptions {
    /// Step budget. Cable hops and internal front/rear hops both spend one step.
    pub max_depth: usize,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self { max_depth: 10 }
    }
}

/// One recorded node. `id` is the discovery index; the root is `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub id: usize,
    pub node: Node,
    pub parent: Option<usize>,
    /// Hop from the parent
    pub via: Option<Hop>,
    /// Cable hops from the root
    pub depth: usize,
    pub steps: usize,
    /// Reached node with nothing beyond it; the root is never a leaf
    pub leaf: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeSummary {
    pub leaf_count: usize,
    pub max_depth_reached: usize,
    pub cycle_count: usize,
    pub unmapped_count: usize,
    pub total_nodes: usize,
    pub total_cables: usize,
    pub truncated: bool,
    pub flagged_cables: Vec<Edge>,
}

/// Nested rendering of a [`TraceTree`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeBranch {
    pub node: Node,
    pub via: Option<Hop>,
    pub depth: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeBranch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceTree {
    pub root: Node,
    pub max_depth: usize,
    /// Every recorded node in discovery order
    pub entries: Vec<TreeEntry>,
    pub summary: TreeSummary,
}

impl TraceTree {
    pub fn children(&self, id: usize) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter().filter(move |e| e.parent == Some(id))
    }

    pub fn leaves(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter().filter(|e| e.leaf)
    }

    pub fn find(&self, label: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.node.label() == label)
    }

    pub fn nested(&self) -> TreeBranch {
        self.branch(0)
    }

    fn branch(&self, id: usize) -> TreeBranch {
        let entry = &self.entries[id];
        TreeBranch {
            node: entry.node.clone(),
            via: entry.via.clone(),
            depth: entry.depth,
            annotations: entry.annotations.clone(),
            children: self.children(id).map(|c| self.branch(c.id)).collect(),
        }
    }
}

struct TreeState {
    graph: TopologyGraph,
    entries: Vec<TreeEntry>,
    cycle_count: usize,
    unmapped_count: usize,
}

impl TreeState {
    fn record(&mut self, idx: NodeIndex) {
        let visit = self.graph.visit(idx);
        let (parent, via) = match self.graph.parent(idx) {
            Some((parent, hop)) => (Some(parent.index()), Some(hop.clone())),
            None => (None, None),
        };
        self.entries.push(TreeEntry {
            id: idx.index(),
            node: visit.node.clone(),
            parent,
            via,
            depth: visit.hops,
            steps: visit.steps,
            leaf: false,
            annotations: Vec::new(),
        });
    }

    fn annotate(&mut self, idx: NodeIndex, annotation: Annotation) {
        match &annotation {
            Annotation::CycleDetected { .. } => self.cycle_count += 1,
            Annotation::UnmappedPort { .. } => self.unmapped_count += 1,
            _ => {}
        }
        self.entries[idx.index()].annotations.push(annotation);
    }

    /// Reach `node` from `from`; new nodes are recorded, revisits annotate `from`.
    fn reach(&mut self, from: NodeIndex, node: Node, hop: Hop) -> Option<NodeIndex> {
        let label = node.label();
        match self.graph.discover(from, node, hop) {
            Discovery::New(idx) => {
                self.record(idx);
                Some(idx)
            }
            Discovery::Seen(_) => {
                self.annotate(from, Annotation::CycleDetected { node: label });
                None
            }
        }
    }

    /// Add the internal counterparts of pass-through `idx` if the budget allows.
    fn pass_through(
        &mut self,
        idx: NodeIndex,
        counterparts: Vec<Node>,
        max_depth: usize,
        next: &mut Vec<NodeIndex>,
    ) {
        if self.graph.visit(idx).steps >= max_depth {
            self.annotate(idx, Annotation::DepthLimit);
            return;
        }
        for counterpart in counterparts {
            if let Some(child) = self.reach(idx, counterpart, Hop::Internal) {
                next.push(child);
            }
        }
    }
}

pub struct TreeSearch {
    fetcher: Arc<dyn ConnectionFetcher>,
    expander: Expander,
    options: TreeOptions,
}

impl TreeSearch {
    pub(crate) fn new(
        fetcher: Arc<dyn ConnectionFetcher>,
        expander: Expander,
        options: TreeOptions,
    ) -> Self {
        Self {
            fetcher,
            expander,
            options,
        }
    }

    pub async fn trace(&self, device: &str, interface: &str) -> Result<TraceTree> {
        let max_depth = self.options.max_depth;
        let root = self
            .expander
            .bounded(self.fetcher.port(device, interface))
            .await?
            .ok_or_else(|| {
                TraceError::BackendUnavailable(
                    "trace deadline reached while resolving the start interface".to_string(),
                )
            })?;

        let (graph, root_idx) = TopologyGraph::with_root(root.clone());
        let mut state = TreeState {
            graph,
            entries: Vec::new(),
            cycle_count: 0,
            unmapped_count: 0,
        };
        state.record(root_idx);

        let mut frontier = vec![root_idx];
        let mut truncated = false;
        match self.expander.bounded(self.expander.resolver().classify(&root)).await {
            Ok(Some(Classification::PassThrough { counterparts })) if max_depth > 0 => {
                state.pass_through(root_idx, counterparts, max_depth, &mut frontier);
            }
            Ok(Some(_)) => {}
            Ok(None) => truncated = true,
            Err(TraceError::UnmappedPort { device, port }) => {
                state.annotate(root_idx, Annotation::UnmappedPort { device, port });
            }
            Err(e) => return Err(e),
        }
        if truncated {
            frontier.clear();
        }

        while !frontier.is_empty() {
            let (expand, exhausted): (Vec<NodeIndex>, Vec<NodeIndex>) = frontier
                .drain(..)
                .partition(|&idx| state.graph.visit(idx).steps < max_depth);
            for idx in exhausted {
                state.annotate(idx, Annotation::DepthLimit);
            }
            if expand.is_empty() {
                break;
            }

            let nodes = expand
                .iter()
                .map(|&idx| state.graph.visit(idx).node.clone())
                .collect();
            let Some(expansions) = self.expander.expand_level(nodes).await? else {
                truncated = true;
                break;
            };

            let mut next = Vec::new();
            for (&from, expansion) in expand.iter().zip(expansions) {
                if expansion.reached.is_empty() {
                    state.annotate(from, Annotation::NoCable);
                    continue;
                }
                if expansion.cable_ids.len() > 1 {
                    state.annotate(
                        from,
                        Annotation::MultipleCables {
                            cable_ids: expansion.cable_ids.iter().copied().collect(),
                        },
                    );
                }
                for reached in expansion.reached {
                    let Some(peer) = state.reach(from, reached.peer, Hop::Cable(reached.edge))
                    else {
                        continue;
                    };
                    match reached.beyond {
                        Beyond::Terminal | Beyond::Device(_) => {}
                        Beyond::Unmapped { device, port } => {
                            state.annotate(peer, Annotation::UnmappedPort { device, port });
                        }
                        Beyond::Through(counterparts) => {
                            state.pass_through(peer, counterparts, max_depth, &mut next);
                        }
                    }
                }
            }
            frontier = next;
        }

        let TreeState {
            graph,
            mut entries,
            cycle_count,
            unmapped_count,
        } = state;

        let mut has_children = vec![false; entries.len()];
        for entry in &entries {
            if let Some(parent) = entry.parent {
                has_children[parent] = true;
            }
        }
        for entry in &mut entries {
            entry.leaf = entry.parent.is_some() && !has_children[entry.id];
        }

        let summary = TreeSummary {
            leaf_count: entries.iter().filter(|e| e.leaf).count(),
            max_depth_reached: entries.iter().map(|e| e.depth).max().unwrap_or(0),
            cycle_count,
            unmapped_count,
            total_nodes: entries.len(),
            total_cables: graph.cable_ids().len(),
            truncated,
            flagged_cables: graph.flagged_cables(),
        };
        log::info!(
            "tree from {}: {} nodes, {} leaves, {} cycles, truncated={}",
            root.label(),
            summary.total_nodes,
            summary.leaf_count,
            summary.cycle_count,
            summary.truncated
        );

        Ok(TraceTree {
            root,
            max_depth,
            entries,
            summary,
        })
    }
}
