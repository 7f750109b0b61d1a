//! Bidirectional breadth-first search between two devices.
//!
//! Both devices contribute every cabled port as a root. Each round expands one cable level on
//! each side that still has work (the smaller frontier is merged first), and after each merge the
//! newly discovered nodes are checked against the other side's visited set. The first round that
//! produces a joinable meeting point ends the search. Further meeting points found in that same
//! round become alternate paths when more than one result is requested.

use crate::annotation::Annotation;
use crate::error::{Result, TraceError};
use crate::expand::{Beyond, Expander, Expansion};
use crate::fetcher::ConnectionFetcher;
use crate::graph::{Discovery, Hop, TopologyGraph};
use crate::model::{DeviceProfile, Edge, Node, NodeKey};
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathOptions {
    /// Maximum number of cable levels each side may expand
    pub max_depth: usize,
    /// Cross intermediate endpoint devices through their other cabled ports
    pub via_devices: bool,
    /// Paths to return: the shortest plus up to `max_results - 1` alternates
    pub max_results: usize,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            max_depth: 6,
            via_devices: false,
            max_results: 1,
        }
    }
}

/// Why a path search ended without a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathReason {
    /// One of the devices has no cabled ports.
    NoConnections,
    /// Both frontiers were exhausted without meeting.
    NoPath,
    /// Both sides hit `max_depth` with work left.
    DepthExceeded,
    /// The trace deadline passed.
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingPoint {
    pub node: Node,
    pub source_hops: usize,
    pub target_hops: usize,
}

/// Another distinct path found in the round the frontiers met.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternatePath {
    pub hop_count: usize,
    pub nodes: Vec<Node>,
    pub links: Vec<Hop>,
    pub meeting_point: MeetingPoint,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explored {
    pub source: usize,
    pub target: usize,
    pub rounds: usize,
}

/// Result of a device-to-device trace.
///
/// `nodes[i]` and `nodes[i + 1]` are joined by `links[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathTrace {
    pub source: String,
    pub target: String,
    pub found: bool,
    pub hop_count: usize,
    pub nodes: Vec<Node>,
    pub links: Vec<Hop>,
    pub meeting_point: Option<MeetingPoint>,
    pub reason: Option<PathReason>,
    pub message: Option<String>,
    pub depth_exceeded: bool,
    pub truncated: bool,
    pub flagged_cables: Vec<Edge>,
    pub annotations: Vec<Annotation>,
    pub explored: Explored,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<AlternatePath>,
}

impl PathTrace {
    fn trivial(device: &DeviceProfile) -> Self {
        Self {
            source: device.name.clone(),
            target: device.name.clone(),
            found: true,
            hop_count: 0,
            nodes: Vec::new(),
            links: Vec::new(),
            meeting_point: None,
            reason: None,
            message: Some("source and target are the same device".to_string()),
            depth_exceeded: false,
            truncated: false,
            flagged_cables: Vec::new(),
            annotations: Vec::new(),
            explored: Explored::default(),
            alternatives: Vec::new(),
        }
    }

    fn missing(source: &str, target: &str, reason: PathReason, message: String) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            found: false,
            hop_count: 0,
            nodes: Vec::new(),
            links: Vec::new(),
            meeting_point: None,
            reason: Some(reason),
            message: Some(message),
            depth_exceeded: reason == PathReason::DepthExceeded,
            truncated: reason == PathReason::Timeout,
            flagged_cables: Vec::new(),
            annotations: Vec::new(),
            explored: Explored::default(),
            alternatives: Vec::new(),
        }
    }

    /// Cables along the path, in order.
    pub fn cables(&self) -> impl Iterator<Item = &Edge> {
        self.links.iter().filter_map(Hop::edge)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Source,
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arrival {
    Root,
    Cable,
    Inside,
}

/// Two partial paths may be stitched at a node only if the combined path enters it one way and
/// leaves it the other (cable in, internal out or vice versa), or if the node is a trace root.
fn joinable(a: Arrival, b: Arrival) -> bool {
    matches!(
        (a, b),
        (Arrival::Root, _)
            | (_, Arrival::Root)
            | (Arrival::Cable, Arrival::Inside)
            | (Arrival::Inside, Arrival::Cable)
    )
}

struct Side {
    graph: TopologyGraph,
    frontier: Vec<NodeIndex>,
    level: usize,
    annotations: Vec<Annotation>,
}

impl Side {
    fn new(roots: Vec<Node>) -> Self {
        let mut graph = TopologyGraph::new();
        let frontier = roots
            .into_iter()
            .filter_map(|node| graph.add_root(node))
            .collect();
        Self {
            graph,
            frontier,
            level: 0,
            annotations: Vec::new(),
        }
    }

    fn eligible(&self, max_depth: usize) -> bool {
        !self.frontier.is_empty() && self.level < max_depth
    }

    fn frontier_nodes(&self) -> Vec<Node> {
        self.frontier
            .iter()
            .map(|&idx| self.graph.visit(idx).node.clone())
            .collect()
    }

    fn arrival(&self, idx: NodeIndex) -> Arrival {
        match self.graph.parent(idx) {
            None => Arrival::Root,
            Some((_, Hop::Cable(_))) => Arrival::Cable,
            Some(_) => Arrival::Inside,
        }
    }

    /// Merge one level of expansions. Returns newly visited nodes in discovery order.
    fn apply(&mut self, expansions: Vec<Expansion>) -> Vec<NodeIndex> {
        let frontier = std::mem::take(&mut self.frontier);
        let mut discovered = Vec::new();

        for (&from, expansion) in frontier.iter().zip(expansions) {
            if expansion.cable_ids.len() > 1 {
                self.annotations.push(Annotation::MultipleCables {
                    cable_ids: expansion.cable_ids.iter().copied().collect(),
                });
            }
            for reached in expansion.reached {
                let Discovery::New(peer) =
                    self.graph
                        .discover(from, reached.peer, Hop::Cable(reached.edge))
                else {
                    continue;
                };
                discovered.push(peer);

                let (beyond, hop) = match reached.beyond {
                    Beyond::Terminal => continue,
                    Beyond::Unmapped { device, port } => {
                        self.annotations
                            .push(Annotation::UnmappedPort { device, port });
                        continue;
                    }
                    Beyond::Through(nodes) => (nodes, Hop::Internal),
                    Beyond::Device(nodes) => (nodes, Hop::Device),
                };
                for node in beyond {
                    if let Discovery::New(idx) = self.graph.discover(peer, node, hop.clone()) {
                        discovered.push(idx);
                        self.frontier.push(idx);
                    }
                }
            }
        }

        self.level += 1;
        discovered
    }
}

/// Every joinable meeting point among `discovered`, best first: lowest combined hop count, ties
/// in discovery order.
fn meetings(mine: &Side, theirs: &Side, discovered: &[NodeIndex]) -> Vec<(NodeIndex, NodeIndex)> {
    let mut found: Vec<(usize, NodeIndex, NodeIndex)> = discovered
        .iter()
        .filter_map(|&idx| {
            let key = mine.graph.visit(idx).node.key();
            let other = theirs.graph.find(&key)?;
            joinable(mine.arrival(idx), theirs.arrival(other)).then(|| {
                let combined = mine.graph.visit(idx).hops + theirs.graph.visit(other).hops;
                (combined, idx, other)
            })
        })
        .collect();
    // stable: equal hop counts keep discovery order
    found.sort_by_key(|&(combined, _, _)| combined);
    found.into_iter().map(|(_, idx, other)| (idx, other)).collect()
}

struct Stitched {
    nodes: Vec<Node>,
    links: Vec<Hop>,
    meeting_point: MeetingPoint,
}

impl Stitched {
    fn new(source: &Side, target: &Side, source_idx: NodeIndex, target_idx: NodeIndex) -> Self {
        let (mut nodes, mut links) = source.graph.trail(source_idx);
        let (target_nodes, target_links) = target.graph.trail(target_idx);
        nodes.extend(target_nodes.into_iter().rev().skip(1));
        links.extend(target_links.into_iter().rev());
        Self {
            nodes,
            links,
            meeting_point: MeetingPoint {
                node: source.graph.visit(source_idx).node.clone(),
                source_hops: source.graph.visit(source_idx).hops,
                target_hops: target.graph.visit(target_idx).hops,
            },
        }
    }

    fn route(&self) -> Vec<NodeKey> {
        self.nodes.iter().map(Node::key).collect()
    }

    fn hop_count(&self) -> usize {
        self.links.iter().filter(|hop| hop.is_cable()).count()
    }
}

enum Level {
    Skipped,
    Expanded(Vec<Expansion>),
    TimedOut,
}

pub struct BidirectionalSearch {
    fetcher: Arc<dyn ConnectionFetcher>,
    expander: Expander,
    options: PathOptions,
}

impl BidirectionalSearch {
    pub(crate) fn new(
        fetcher: Arc<dyn ConnectionFetcher>,
        expander: Expander,
        options: PathOptions,
    ) -> Self {
        let expander = expander.via_devices(options.via_devices);
        Self {
            fetcher,
            expander,
            options,
        }
    }

    pub async fn trace(&self, source: &str, target: &str) -> Result<PathTrace> {
        let started = Instant::now();
        let source_device = self.lookup(self.fetcher.device(source)).await?;
        let target_device = self.lookup(self.fetcher.device(target)).await?;

        if source_device.id == target_device.id {
            return Ok(PathTrace::trivial(&source_device));
        }

        let source_ports = self
            .lookup(self.fetcher.device_ports(source_device.id))
            .await?;
        let target_ports = self
            .lookup(self.fetcher.device_ports(target_device.id))
            .await?;
        for (device, ports) in [(&source_device, &source_ports), (&target_device, &target_ports)] {
            if ports.is_empty() {
                return Ok(PathTrace::missing(
                    &source_device.name,
                    &target_device.name,
                    PathReason::NoConnections,
                    format!("device '{}' has no cabled interfaces", device.name),
                ));
            }
        }

        let mut source_side = Side::new(source_ports);
        let mut target_side = Side::new(target_ports);
        let mut rounds = 0usize;

        let outcome = loop {
            let source_ok = source_side.eligible(self.options.max_depth);
            let target_ok = target_side.eligible(self.options.max_depth);
            if !source_ok && !target_ok {
                let pending = !source_side.frontier.is_empty() || !target_side.frontier.is_empty();
                break Err(if pending {
                    PathReason::DepthExceeded
                } else {
                    PathReason::NoPath
                });
            }

            let source_first = match (source_ok, target_ok) {
                (true, true) => source_side.frontier.len() <= target_side.frontier.len(),
                (source_ok, _) => source_ok,
            };
            rounds += 1;
            log::debug!(
                "round {rounds}: expanding source={} target={} (source first: {source_first})",
                if source_ok { source_side.frontier.len() } else { 0 },
                if target_ok { target_side.frontier.len() } else { 0 },
            );

            let (source_level, target_level) = tokio::try_join!(
                self.expand(source_ok.then(|| source_side.frontier_nodes())),
                self.expand(target_ok.then(|| target_side.frontier_nodes())),
            )?;
            if matches!(source_level, Level::TimedOut) || matches!(target_level, Level::TimedOut) {
                break Err(PathReason::Timeout);
            }

            let order = if source_first {
                [(Role::Source, source_level), (Role::Target, target_level)]
            } else {
                [(Role::Target, target_level), (Role::Source, source_level)]
            };
            let mut met: Vec<(NodeIndex, NodeIndex)> = Vec::new();
            for (role, level) in order {
                let Level::Expanded(expansions) = level else {
                    continue;
                };
                let (mine, theirs) = match role {
                    Role::Source => (&mut source_side, &target_side),
                    Role::Target => (&mut target_side, &source_side),
                };
                let discovered = mine.apply(expansions);
                met = meetings(mine, theirs, &discovered)
                    .into_iter()
                    .map(|(idx, other)| match role {
                        Role::Source => (idx, other),
                        Role::Target => (other, idx),
                    })
                    .collect();
                if !met.is_empty() {
                    break;
                }
            }
            let mut met = met.into_iter();
            if let Some(first) = met.next() {
                break Ok((first, met.collect::<Vec<_>>()));
            }
        };

        let explored = Explored {
            source: source_side.graph.len(),
            target: target_side.graph.len(),
            rounds,
        };
        let mut annotations = std::mem::take(&mut source_side.annotations);
        annotations.extend(std::mem::take(&mut target_side.annotations));

        let trace = match outcome {
            Ok(((source_idx, target_idx), others)) => {
                let best = Stitched::new(&source_side, &target_side, source_idx, target_idx);
                let mut seen = HashSet::from([best.route()]);
                let alternatives = others
                    .into_iter()
                    .map(|(s, t)| Stitched::new(&source_side, &target_side, s, t))
                    .filter(|path| seen.insert(path.route()))
                    .take(self.options.max_results.saturating_sub(1))
                    .map(|path| AlternatePath {
                        hop_count: path.hop_count(),
                        nodes: path.nodes,
                        links: path.links,
                        meeting_point: path.meeting_point,
                    })
                    .collect();

                let hop_count = best.hop_count();
                let flagged_cables = best
                    .links
                    .iter()
                    .filter_map(Hop::edge)
                    .filter(|edge| edge.is_flagged())
                    .map(|edge| (edge.cable_id, edge.clone()))
                    .collect::<BTreeMap<_, _>>()
                    .into_values()
                    .collect();
                PathTrace {
                    source: source_device.name.clone(),
                    target: target_device.name.clone(),
                    found: true,
                    hop_count,
                    meeting_point: Some(best.meeting_point),
                    nodes: best.nodes,
                    links: best.links,
                    reason: None,
                    message: None,
                    depth_exceeded: false,
                    truncated: false,
                    flagged_cables,
                    annotations,
                    explored,
                    alternatives,
                }
            }
            Err(reason) => {
                let message = match reason {
                    PathReason::DepthExceeded => format!(
                        "no path within {} cable levels per side",
                        self.options.max_depth
                    ),
                    PathReason::Timeout => "trace deadline reached before the frontiers met".to_string(),
                    PathReason::NoConnections | PathReason::NoPath => format!(
                        "no cable path between '{}' and '{}'",
                        source_device.name, target_device.name
                    ),
                };
                PathTrace {
                    annotations,
                    explored,
                    ..PathTrace::missing(&source_device.name, &target_device.name, reason, message)
                }
            }
        };

        log::info!(
            "trace {} -> {}: found={} hops={} explored={}+{} in {:?}",
            trace.source,
            trace.target,
            trace.found,
            trace.hop_count,
            trace.explored.source,
            trace.explored.target,
            started.elapsed()
        );
        Ok(trace)
    }

    async fn lookup<T>(&self, fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
        self.expander.bounded(fut).await?.ok_or_else(|| {
            TraceError::BackendUnavailable("trace deadline reached while resolving devices".to_string())
        })
    }

    async fn expand(&self, nodes: Option<Vec<Node>>) -> Result<Level> {
        let Some(nodes) = nodes else {
            return Ok(Level::Skipped);
        };
        Ok(match self.expander.expand_level(nodes).await? {
            Some(expansions) => Level::Expanded(expansions),
            None => Level::TimedOut,
        })
    }
}
