use crate::error::{Result, TraceError};
use crate::fetcher::ConnectionFetcher;
use crate::model::{DeviceProfile, Node};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Which devices are transparent to a trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassThroughPolicy {
    /// Device role slugs that mark a device as pass-through
    pub roles: BTreeSet<String>,
    /// Device type slugs that mark a device as pass-through
    pub device_types: BTreeSet<String>,
    /// Treat every front/rear port as pass-through regardless of device metadata
    pub port_kinds_transparent: bool,
}

impl Default for PassThroughPolicy {
    fn default() -> Self {
        Self {
            roles: BTreeSet::from(["patch-panel".to_string()]),
            device_types: BTreeSet::new(),
            port_kinds_transparent: false,
        }
    }
}

impl PassThroughPolicy {
    fn declares(&self, device: &DeviceProfile, catalog: Option<&dyn DeviceTypeCatalog>) -> bool {
        if device.role.as_ref().is_some_and(|r| self.roles.contains(r)) {
            return true;
        }
        let Some(device_type) = device.device_type.as_deref() else {
            return false;
        };
        self.device_types.contains(device_type)
            || catalog.is_some_and(|c| c.is_pass_through(device_type))
    }
}

/// Process-wide reference data about device types, consulted read-only during classification.
pub trait DeviceTypeCatalog: Send + Sync {
    fn is_pass_through(&self, device_type_slug: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// The port terminates the path.
    Endpoint,
    /// The port is internally wired to `counterparts` on the same device.
    PassThrough { counterparts: Vec<Node> },
}

/// Decides whether a port reached mid-trace ends the path or must be traversed.
///
/// Device profiles are cached for the lifetime of one trace only.
#[derive(Clone)]
pub struct PassThroughResolver {
    fetcher: Arc<dyn ConnectionFetcher>,
    policy: Arc<PassThroughPolicy>,
    catalog: Option<Arc<dyn DeviceTypeCatalog>>,
    devices: Arc<Mutex<HashMap<u64, DeviceProfile>>>,
}

impl PassThroughResolver {
    pub fn new(
        fetcher: Arc<dyn ConnectionFetcher>,
        policy: Arc<PassThroughPolicy>,
        catalog: Option<Arc<dyn DeviceTypeCatalog>>,
    ) -> Self {
        Self {
            fetcher,
            policy,
            catalog,
            devices: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Classify `node`.
    ///
    /// Fails with [`TraceError::UnmappedPort`] when a pass-through port has no declared
    /// counterpart of the opposite kind; callers annotate the branch and keep tracing.
    pub async fn classify(&self, node: &Node) -> Result<Classification> {
        let Some(wanted) = node.port_kind.opposite() else {
            return Ok(Classification::Endpoint);
        };

        if !self.policy.port_kinds_transparent {
            let device = self.device(node.device_id).await?;
            if !self.policy.declares(&device, self.catalog.as_deref()) {
                return Ok(Classification::Endpoint);
            }
        }

        let counterparts: Vec<Node> = self
            .fetcher
            .counterparts(node)
            .await?
            .into_iter()
            .filter(|c| c.port_kind == wanted && c.device_id == node.device_id)
            .collect();

        if counterparts.is_empty() {
            return Err(TraceError::UnmappedPort {
                device: node.device_name.clone(),
                port: node.interface_name.clone(),
            });
        }
        Ok(Classification::PassThrough { counterparts })
    }

    async fn device(&self, device_id: u64) -> Result<DeviceProfile> {
        let cached = self.devices.lock().await.get(&device_id).cloned();
        if let Some(profile) = cached {
            return Ok(profile);
        }
        let profile = self.fetcher.device_by_id(device_id).await?;
        self.devices
            .lock()
            .await
            .insert(device_id, profile.clone());
        Ok(profile)
    }
}
