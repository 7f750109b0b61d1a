//! One-level frontier expansion shared by both search engines.
//!
//! Fetching is the only part of a trace that talks to the backend, so it is the only part that
//! runs concurrently. Results come back indexed by frontier position; the engines merge them in
//! that order, which keeps traces over unchanged data reproducible.

use crate::error::{Result, TraceError};
use crate::fetcher::ConnectionFetcher;
use crate::model::{Edge, Node};
use crate::resolver::{Classification, PassThroughResolver};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// What lies beyond the far end of a cable.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Beyond {
    /// The peer terminates the path.
    Terminal,
    /// The peer is a pass-through port wired to these counterparts.
    Through(Vec<Node>),
    /// The peer sits on an endpoint device that may be crossed through these other ports.
    Device(Vec<Node>),
    /// The peer is a pass-through port with no declared counterpart.
    Unmapped { device: String, port: String },
}

#[derive(Debug, Clone)]
pub(crate) struct Reached {
    pub edge: Edge,
    pub peer: Node,
    pub beyond: Beyond,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Expansion {
    pub reached: Vec<Reached>,
    /// Distinct cable ids seen on the expanded port; more than one is an integrity problem
    pub cable_ids: BTreeSet<u64>,
}

#[derive(Clone)]
pub(crate) struct Expander {
    fetcher: Arc<dyn ConnectionFetcher>,
    resolver: PassThroughResolver,
    workers: usize,
    deadline: Option<Instant>,
    via_devices: bool,
}

impl Expander {
    pub(crate) fn new(
        fetcher: Arc<dyn ConnectionFetcher>,
        resolver: PassThroughResolver,
        workers: usize,
        deadline: Option<Instant>,
    ) -> Self {
        Self {
            fetcher,
            resolver,
            workers: workers.max(1),
            deadline,
            via_devices: false,
        }
    }

    pub(crate) fn via_devices(mut self, enabled: bool) -> Self {
        self.via_devices = enabled;
        self
    }

    pub(crate) fn resolver(&self) -> &PassThroughResolver {
        &self.resolver
    }

    /// Await `fut` under the trace deadline. `Ok(None)` means the deadline passed.
    pub(crate) async fn bounded<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T>>,
    ) -> Result<Option<T>> {
        match self.deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, fut).await {
                Ok(value) => value.map(Some),
                Err(_) => Ok(None),
            },
            None => fut.await.map(Some),
        }
    }

    /// Expand every node of one frontier level, at most `workers` at a time.
    ///
    /// Returns `Ok(None)` when the trace deadline passes first; in-flight fetches are aborted.
    pub(crate) async fn expand_level(&self, nodes: Vec<Node>) -> Result<Option<Vec<Expansion>>> {
        let total = nodes.len();
        if total == 0 {
            return Ok(Some(Vec::new()));
        }

        let permits = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();
        for (position, node) in nodes.into_iter().enumerate() {
            let expander = self.clone();
            let permits = permits.clone();
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                (position, expander.expand_one(&node).await)
            });
        }

        let mut slots: Vec<Option<Expansion>> = (0..total).map(|_| None).collect();
        loop {
            let joined = match self.deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, tasks.join_next()).await
                {
                    Ok(joined) => joined,
                    Err(_) => {
                        tasks.abort_all();
                        log::debug!("trace deadline reached with {} fetches in flight", tasks.len());
                        return Ok(None);
                    }
                },
                None => tasks.join_next().await,
            };
            let Some(joined) = joined else {
                break;
            };
            let (position, expansion) = joined
                .map_err(|e| TraceError::BackendUnavailable(format!("fetch task failed: {e}")))?;
            slots[position] = Some(expansion?);
        }

        Ok(Some(slots.into_iter().flatten().collect()))
    }

    async fn expand_one(&self, node: &Node) -> Result<Expansion> {
        let links = self.fetcher.neighbors(node).await?;
        let mut expansion = Expansion {
            reached: Vec::with_capacity(links.len()),
            cable_ids: links.iter().map(|l| l.edge.cable_id).collect(),
        };

        for link in links {
            let beyond = match self.resolver.classify(&link.peer).await {
                Ok(Classification::PassThrough { counterparts }) => Beyond::Through(counterparts),
                Ok(Classification::Endpoint) if self.via_devices => {
                    let siblings: Vec<Node> = self
                        .fetcher
                        .device_ports(link.peer.device_id)
                        .await?
                        .into_iter()
                        .filter(|n| n.key() != link.peer.key())
                        .collect();
                    if siblings.is_empty() {
                        Beyond::Terminal
                    } else {
                        Beyond::Device(siblings)
                    }
                }
                Ok(Classification::Endpoint) => Beyond::Terminal,
                Err(TraceError::UnmappedPort { device, port }) => Beyond::Unmapped { device, port },
                Err(e) => return Err(e),
            };
            expansion.reached.push(Reached {
                edge: link.edge,
                peer: link.peer,
                beyond,
            });
        }

        Ok(expansion)
    }
}
