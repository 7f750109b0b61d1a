//! Process-wide reference data (device roles and device types).
//!
//! Loaded once at start-up and refreshed on a timer. Traces only read it, through
//! [`DeviceTypeCatalog`]; a failed refresh keeps the previous snapshot.

use crate::api::NetBoxClient;
use crate::error::Result;
use crate::wire::{DeviceTypeRecord, RoleRecord};
use netbox_topology::DeviceTypeCatalog;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleInfo {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTypeInfo {
    pub id: u64,
    pub slug: String,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub interface_templates: u64,
    pub front_port_templates: u64,
    pub rear_port_templates: u64,
}

impl DeviceTypeInfo {
    /// Rear-port templates and no interfaces: a panel, not a network device.
    pub fn is_pass_through(&self) -> bool {
        self.rear_port_templates > 0 && self.interface_templates == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub roles: Vec<RoleInfo>,
    pub device_types: Vec<DeviceTypeInfo>,
    pub loaded_at: Option<SystemTime>,
}

impl ReferenceData {
    pub fn device_type(&self, slug: &str) -> Option<&DeviceTypeInfo> {
        self.device_types.iter().find(|t| t.slug == slug)
    }
}

impl From<RoleRecord> for RoleInfo {
    fn from(record: RoleRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            slug: record.slug,
        }
    }
}

impl From<DeviceTypeRecord> for DeviceTypeInfo {
    fn from(record: DeviceTypeRecord) -> Self {
        Self {
            id: record.id,
            slug: record.slug,
            model: record.model,
            manufacturer: record.manufacturer.map(|m| m.name),
            interface_templates: record.interface_template_count,
            front_port_templates: record.front_port_template_count,
            rear_port_templates: record.rear_port_template_count,
        }
    }
}

pub struct ReferenceCache {
    client: Option<NetBoxClient>,
    data: RwLock<Arc<ReferenceData>>,
}

impl ReferenceCache {
    pub fn new(client: NetBoxClient) -> Self {
        Self {
            client: Some(client),
            data: RwLock::new(Arc::new(ReferenceData::default())),
        }
    }

    /// A fixed snapshot that never refreshes.
    pub fn from_data(data: ReferenceData) -> Self {
        Self {
            client: None,
            data: RwLock::new(Arc::new(data)),
        }
    }

    pub fn snapshot(&self) -> Arc<ReferenceData> {
        match self.data.read() {
            Ok(data) => data.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Reload roles and device types. On failure the previous snapshot stays in place.
    pub async fn refresh(&self) -> Result<()> {
        let Some(client) = &self.client else {
            return Ok(());
        };
        let (roles, device_types) = tokio::try_join!(
            client.list_all::<RoleRecord>("/api/dcim/device-roles/", &[]),
            client.list_all::<DeviceTypeRecord>("/api/dcim/device-types/", &[]),
        )?;
        let data = ReferenceData {
            roles: roles.into_iter().map(RoleInfo::from).collect(),
            device_types: device_types.into_iter().map(DeviceTypeInfo::from).collect(),
            loaded_at: Some(SystemTime::now()),
        };
        log::info!(
            "reference data refreshed: {} roles, {} device types ({} pass-through)",
            data.roles.len(),
            data.device_types.len(),
            data.device_types.iter().filter(|t| t.is_pass_through()).count()
        );
        match self.data.write() {
            Ok(mut slot) => *slot = Arc::new(data),
            Err(poisoned) => *poisoned.into_inner() = Arc::new(data),
        }
        Ok(())
    }

    /// Refresh now and then every `interval`, until the returned task is aborted.
    pub fn spawn_refresh(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(err) = cache.refresh().await {
                    log::warn!("reference data refresh failed, keeping previous snapshot: {err}");
                }
            }
        })
    }
}

impl DeviceTypeCatalog for ReferenceCache {
    fn is_pass_through(&self, device_type_slug: &str) -> bool {
        self.snapshot()
            .device_type(device_type_slug)
            .is_some_and(DeviceTypeInfo::is_pass_through)
    }
}
