use crate::bidirectional::{BidirectionalSearch, PathOptions, PathTrace};
use crate::error::{Result, TraceError};
use crate::expand::Expander;
use crate::fetcher::ConnectionFetcher;
use crate::model::CableDetail;
use crate::resolver::{DeviceTypeCatalog, PassThroughPolicy, PassThroughResolver};
use crate::tree::{TraceTree, TreeOptions, TreeSearch};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Hard ceiling on caller-supplied depth limits.
pub const MAX_DEPTH_CEILING: usize = 32;

/// Hard ceiling on the number of paths one device trace returns.
pub const MAX_RESULTS_CEILING: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracerConfig {
    pub path_max_depth: usize,
    pub tree_max_depth: usize,
    /// Per-trace deadline. `None` disables it.
    pub timeout: Option<Duration>,
    /// Concurrent backend fetches per frontier level
    pub workers: usize,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            path_max_depth: 6,
            tree_max_depth: 10,
            timeout: Some(Duration::from_millis(15_000)),
            workers: 4,
        }
    }
}

/// Entry point for every trace operation.
///
/// A `Tracer` is cheap to clone and holds no per-trace state: each call builds a fresh resolver
/// cache and visited set, so concurrent traces never observe each other.
#[derive(Clone)]
pub struct Tracer {
    fetcher: Arc<dyn ConnectionFetcher>,
    policy: Arc<PassThroughPolicy>,
    catalog: Option<Arc<dyn DeviceTypeCatalog>>,
    config: TracerConfig,
}

impl Tracer {
    pub fn new(fetcher: Arc<dyn ConnectionFetcher>, policy: PassThroughPolicy) -> Self {
        Self {
            fetcher,
            policy: Arc::new(policy),
            catalog: None,
            config: TracerConfig::default(),
        }
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn DeviceTypeCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_config(mut self, config: TracerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    /// Shortest cable path between two devices.
    pub async fn trace_devices_connection(
        &self,
        source: &str,
        target: &str,
        max_depth: Option<usize>,
        via_devices: bool,
    ) -> Result<PathTrace> {
        self.trace_devices_paths(source, target, max_depth, via_devices, 1)
            .await
    }

    /// Shortest cable path plus up to `max_results - 1` alternates met in the same round.
    pub async fn trace_devices_paths(
        &self,
        source: &str,
        target: &str,
        max_depth: Option<usize>,
        via_devices: bool,
        max_results: usize,
    ) -> Result<PathTrace> {
        let source = required("source_device", source)?;
        let target = required("target_device", target)?;
        let options = PathOptions {
            max_depth: clamp_depth(max_depth.unwrap_or(self.config.path_max_depth)),
            via_devices,
            max_results: max_results.clamp(1, MAX_RESULTS_CEILING),
        };
        log::debug!("trace_devices_connection {source} -> {target} ({options:?})");
        BidirectionalSearch::new(self.fetcher.clone(), self.expander(), options)
            .trace(source, target)
            .await
    }

    /// Everything reachable from one interface.
    pub async fn trace_from_interface(
        &self,
        device: &str,
        interface: &str,
        max_depth: Option<usize>,
    ) -> Result<TraceTree> {
        let device = required("device_name", device)?;
        let interface = required("interface_name", interface)?;
        let options = TreeOptions {
            max_depth: clamp_depth(max_depth.unwrap_or(self.config.tree_max_depth)),
        };
        log::debug!("trace_from_interface {device}:{interface} ({options:?})");
        TreeSearch::new(self.fetcher.clone(), self.expander(), options)
            .trace(device, interface)
            .await
    }

    /// Full record of one cable.
    pub async fn cable(&self, cable_id: u64) -> Result<CableDetail> {
        let expander = self.expander();
        expander
            .bounded(self.fetcher.cable(cable_id))
            .await?
            .ok_or_else(|| TraceError::BackendUnavailable(format!("timed out fetching cable {cable_id}")))
    }

    fn expander(&self) -> Expander {
        let resolver = PassThroughResolver::new(
            self.fetcher.clone(),
            self.policy.clone(),
            self.catalog.clone(),
        );
        let deadline = self
            .config
            .timeout
            .map(|timeout| tokio::time::Instant::now() + timeout);
        Expander::new(self.fetcher.clone(), resolver, self.config.workers, deadline)
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TraceError::InvalidRequest(format!("{field} must not be empty")));
    }
    Ok(value)
}

fn clamp_depth(depth: usize) -> usize {
    depth.min(MAX_DEPTH_CEILING)
}
