use crate::api::NetBoxClient;
use crate::error::{ClientError, Result};
use crate::fetcher::NetBoxFetcher;
use crate::reference::ReferenceCache;
use crate::settings::Settings;
use async_trait::async_trait;
use netbox_topology::{
    CableDetail, ConnectionFetcher, DeviceProfile, Link, MemoryFetcher, Node, TraceError, Tracer,
};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    NetBox,
    Inventory,
    Unconfigured,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NetBox => "netbox",
            Self::Inventory => "inventory",
            Self::Unconfigured => "unconfigured",
        }
    }
}

/// The data source traces run against, chosen once from [`Settings`].
pub struct Backend {
    pub kind: BackendKind,
    pub fetcher: Arc<dyn ConnectionFetcher>,
    pub reference: Option<Arc<ReferenceCache>>,
}

impl Backend {
    /// Inventory snapshot if configured, else the live API, else a backend that fails every call
    /// with `backend_unavailable`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        if let Some(path) = &settings.inventory {
            let fetcher = load_inventory(path)?;
            log::info!(
                "using inventory snapshot {} ({} devices, {} cables)",
                path.display(),
                fetcher.device_count(),
                fetcher.cable_count()
            );
            return Ok(Self {
                kind: BackendKind::Inventory,
                fetcher: Arc::new(fetcher),
                reference: None,
            });
        }

        let missing = settings.missing_backend();
        if !missing.is_empty() {
            log::warn!("NetBox configuration missing ({}); traces will fail", missing.join(", "));
            return Ok(Self {
                kind: BackendKind::Unconfigured,
                fetcher: Arc::new(UnconfiguredFetcher { missing }),
                reference: None,
            });
        }

        let client = NetBoxClient::new(&settings.netbox)?;
        log::info!("using NetBox API at {}", client.base_url());
        let reference = settings
            .reference
            .enabled
            .then(|| Arc::new(ReferenceCache::new(client.clone())));
        Ok(Self {
            kind: BackendKind::NetBox,
            fetcher: Arc::new(NetBoxFetcher::new(client)),
            reference,
        })
    }

    pub fn tracer(&self, settings: &Settings) -> Tracer {
        let tracer = Tracer::new(self.fetcher.clone(), settings.policy())
            .with_config(settings.tracer_config());
        match &self.reference {
            Some(reference) => tracer.with_catalog(reference.clone()),
            None => tracer,
        }
    }

    /// Start the periodic reference-data refresh, if this backend has reference data.
    pub fn spawn_reference_refresh(&self, settings: &Settings) -> Option<JoinHandle<()>> {
        let reference = self.reference.as_ref()?;
        let interval = settings.refresh_interval()?;
        Some(reference.spawn_refresh(interval))
    }
}

pub fn load_inventory(path: &Path) -> Result<MemoryFetcher> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ClientError::Config(format!("failed to read {}: {e}", path.display())))?;
    MemoryFetcher::from_json(&raw)
        .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))
}

struct UnconfiguredFetcher {
    missing: Vec<&'static str>,
}

impl UnconfiguredFetcher {
    fn error(&self) -> TraceError {
        TraceError::BackendUnavailable(format!(
            "NetBox is not configured: set {} (or NETBOX_INVENTORY)",
            self.missing.join(" and ")
        ))
    }
}

#[async_trait]
impl ConnectionFetcher for UnconfiguredFetcher {
    async fn device(&self, _name: &str) -> netbox_topology::Result<DeviceProfile> {
        Err(self.error())
    }

    async fn device_by_id(&self, _id: u64) -> netbox_topology::Result<DeviceProfile> {
        Err(self.error())
    }

    async fn device_ports(&self, _device_id: u64) -> netbox_topology::Result<Vec<Node>> {
        Err(self.error())
    }

    async fn port(&self, _device: &str, _name: &str) -> netbox_topology::Result<Node> {
        Err(self.error())
    }

    async fn neighbors(&self, _node: &Node) -> netbox_topology::Result<Vec<Link>> {
        Err(self.error())
    }

    async fn counterparts(&self, _node: &Node) -> netbox_topology::Result<Vec<Node>> {
        Err(self.error())
    }

    async fn cable(&self, _cable_id: u64) -> netbox_topology::Result<CableDetail> {
        Err(self.error())
    }
}
