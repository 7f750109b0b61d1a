//! In-memory inventory snapshots.
//!
//! A snapshot is a JSON document of devices, ports and cables. It backs [`MemoryFetcher`], which is
//! used for offline tracing and as the reference fetcher in tests.

use crate::error::{Result, TraceError};
use crate::fetcher::ConnectionFetcher;
use crate::model::{
    CableDetail, CableSide, CableStatus, DeviceProfile, Edge, Link, Node, NodeKey, PortKind,
    Termination,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub devices: Vec<InventoryDevice>,
    #[serde(default)]
    pub ports: Vec<InventoryPort>,
    #[serde(default)]
    pub cables: Vec<InventoryCable>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryDevice {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryPort {
    #[serde(default)]
    pub id: Option<u64>,
    pub device: String,
    pub name: String,
    #[serde(default = "default_port_kind")]
    pub kind: PortKind,
    /// Rear port a front port is internally wired to.
    #[serde(default)]
    pub rear_port: Option<String>,
}

fn default_port_kind() -> PortKind {
    PortKind::Regular
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryCable {
    pub id: u64,
    #[serde(default)]
    pub status: Option<CableStatus>,
    #[serde(default)]
    pub cable_type: Option<String>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub length_unit: Option<String>,
    pub a: Vec<PortRef>,
    pub b: Vec<PortRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortRef {
    pub device: String,
    pub port: String,
    /// Only needed when a device has several port kinds sharing a name.
    #[serde(default)]
    pub kind: Option<PortKind>,
}

impl Inventory {
    pub fn builder() -> InventoryBuilder {
        InventoryBuilder::default()
    }
}

/// Fluent construction of small topologies, mostly for tests and demos.
#[derive(Debug, Default)]
pub struct InventoryBuilder {
    inventory: Inventory,
}

impl InventoryBuilder {
    pub fn device(mut self, name: &str, role: Option<&str>) -> Self {
        self.inventory.devices.push(InventoryDevice {
            id: None,
            name: name.to_string(),
            role: role.map(str::to_string),
            device_type: None,
        });
        self
    }

    pub fn interface(self, device: &str, name: &str) -> Self {
        self.port(device, name, PortKind::Regular, None)
    }

    pub fn front_port(self, device: &str, name: &str, rear_port: Option<&str>) -> Self {
        self.port(device, name, PortKind::FrontPort, rear_port)
    }

    pub fn rear_port(self, device: &str, name: &str) -> Self {
        self.port(device, name, PortKind::RearPort, None)
    }

    fn port(mut self, device: &str, name: &str, kind: PortKind, rear_port: Option<&str>) -> Self {
        self.inventory.ports.push(InventoryPort {
            id: None,
            device: device.to_string(),
            name: name.to_string(),
            kind,
            rear_port: rear_port.map(str::to_string),
        });
        self
    }

    pub fn cable(self, id: u64, a: (&str, &str), b: (&str, &str)) -> Self {
        self.cable_with_status(id, a, b, Some(CableStatus::Connected))
    }

    pub fn cable_with_status(
        mut self,
        id: u64,
        a: (&str, &str),
        b: (&str, &str),
        status: Option<CableStatus>,
    ) -> Self {
        let port_ref = |(device, port): (&str, &str)| PortRef {
            device: device.to_string(),
            port: port.to_string(),
            kind: None,
        };
        self.inventory.cables.push(InventoryCable {
            id,
            status,
            cable_type: None,
            length: None,
            length_unit: None,
            a: vec![port_ref(a)],
            b: vec![port_ref(b)],
        });
        self
    }

    pub fn build(self) -> Inventory {
        self.inventory
    }
}

#[derive(Debug)]
struct MemoryPort {
    node: Node,
    rear_port: Option<String>,
}

#[derive(Debug)]
struct MemoryCable {
    edge: Edge,
    cable_type: Option<String>,
    a: Vec<NodeKey>,
    b: Vec<NodeKey>,
}

/// [`ConnectionFetcher`] over an in-memory [`Inventory`].
#[derive(Debug)]
pub struct MemoryFetcher {
    devices: Vec<DeviceProfile>,
    device_by_name: HashMap<String, usize>,
    ports: Vec<MemoryPort>,
    port_by_key: HashMap<NodeKey, usize>,
    ports_by_device: HashMap<u64, Vec<usize>>,
    cables: BTreeMap<u64, MemoryCable>,
    cables_by_port: HashMap<NodeKey, Vec<u64>>,
}

impl MemoryFetcher {
    pub fn new(inventory: Inventory) -> Result<Self> {
        let mut fetcher = Self {
            devices: Vec::new(),
            device_by_name: HashMap::new(),
            ports: Vec::new(),
            port_by_key: HashMap::new(),
            ports_by_device: HashMap::new(),
            cables: BTreeMap::new(),
            cables_by_port: HashMap::new(),
        };

        let mut next_device_id = inventory
            .devices
            .iter()
            .filter_map(|d| d.id)
            .max()
            .unwrap_or(0)
            + 1;
        for device in inventory.devices {
            if fetcher.device_by_name.contains_key(&device.name) {
                return Err(TraceError::InvalidInventory(format!(
                    "duplicate device '{}'",
                    device.name
                )));
            }
            let id = device.id.unwrap_or_else(|| {
                let id = next_device_id;
                next_device_id += 1;
                id
            });
            fetcher
                .device_by_name
                .insert(device.name.clone(), fetcher.devices.len());
            fetcher.devices.push(DeviceProfile {
                id,
                name: device.name,
                role: device.role,
                device_type: device.device_type,
            });
        }

        let mut next_port_id: HashMap<PortKind, u64> = HashMap::new();
        for port in &inventory.ports {
            if let Some(id) = port.id {
                let next = next_port_id.entry(port.kind).or_insert(1);
                *next = (*next).max(id + 1);
            }
        }
        for port in inventory.ports {
            let device = fetcher
                .device_named(&port.device)
                .map_err(|_| {
                    TraceError::InvalidInventory(format!(
                        "port '{}' references unknown device '{}'",
                        port.name, port.device
                    ))
                })?
                .clone();
            if fetcher.find_port(device.id, &port.name, Some(port.kind)).is_some() {
                return Err(TraceError::InvalidInventory(format!(
                    "duplicate {} '{}' on device '{}'",
                    port.kind.as_str(),
                    port.name,
                    device.name
                )));
            }
            let id = port.id.unwrap_or_else(|| {
                let next = next_port_id.entry(port.kind).or_insert(1);
                let id = *next;
                *next += 1;
                id
            });
            let node = Node {
                device_id: device.id,
                device_name: device.name.clone(),
                interface_id: id,
                interface_name: port.name,
                port_kind: port.kind,
            };
            if fetcher.port_by_key.contains_key(&node.key()) {
                return Err(TraceError::InvalidInventory(format!(
                    "duplicate {} id {id}",
                    port.kind.as_str()
                )));
            }
            let idx = fetcher.ports.len();
            fetcher.port_by_key.insert(node.key(), idx);
            fetcher.ports_by_device.entry(device.id).or_default().push(idx);
            fetcher.ports.push(MemoryPort {
                node,
                rear_port: port.rear_port,
            });
        }

        for port in &fetcher.ports {
            if let Some(rear) = port.rear_port.as_deref() {
                if fetcher
                    .find_port(port.node.device_id, rear, Some(PortKind::RearPort))
                    .is_none()
                {
                    return Err(TraceError::InvalidInventory(format!(
                        "front port '{}' maps to unknown rear port '{rear}'",
                        port.node
                    )));
                }
            }
        }

        for cable in inventory.cables {
            if fetcher.cables.contains_key(&cable.id) {
                return Err(TraceError::InvalidInventory(format!(
                    "duplicate cable id {}",
                    cable.id
                )));
            }
            let a = fetcher.resolve_refs(&cable.a)?;
            let b = fetcher.resolve_refs(&cable.b)?;
            for key in a.iter().chain(b.iter()) {
                let cables = fetcher.cables_by_port.entry(*key).or_default();
                if !cables.contains(&cable.id) {
                    cables.push(cable.id);
                }
            }
            fetcher.cables.insert(
                cable.id,
                MemoryCable {
                    edge: Edge {
                        cable_id: cable.id,
                        status: cable.status,
                        length: cable.length,
                        length_unit: cable.length_unit,
                    },
                    cable_type: cable.cable_type,
                    a,
                    b,
                },
            );
        }

        Ok(fetcher)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let inventory: Inventory = serde_json::from_str(raw)
            .map_err(|e| TraceError::InvalidInventory(format!("malformed snapshot: {e}")))?;
        Self::new(inventory)
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn cable_count(&self) -> usize {
        self.cables.len()
    }

    fn device_named(&self, name: &str) -> Result<&DeviceProfile> {
        self.device_by_name
            .get(name)
            .map(|&idx| &self.devices[idx])
            .ok_or_else(|| TraceError::not_found("Device", name))
    }

    fn find_port(&self, device_id: u64, name: &str, kind: Option<PortKind>) -> Option<&MemoryPort> {
        let candidates = self.ports_by_device.get(&device_id)?;
        candidates
            .iter()
            .map(|&idx| &self.ports[idx])
            .filter(|p| p.node.interface_name == name)
            .filter(|p| kind.map_or(true, |k| p.node.port_kind == k))
            .min_by_key(|p| p.node.port_kind)
    }

    fn resolve_refs(&self, refs: &[PortRef]) -> Result<Vec<NodeKey>> {
        refs.iter()
            .map(|r| {
                let device = self
                    .device_named(&r.device)
                    .map_err(|_| TraceError::InvalidInventory(format!(
                        "cable references unknown device '{}'",
                        r.device
                    )))?;
                self.find_port(device.id, &r.port, r.kind)
                    .map(|p| p.node.key())
                    .ok_or_else(|| {
                        TraceError::InvalidInventory(format!(
                            "cable references unknown port '{}:{}'",
                            r.device, r.port
                        ))
                    })
            })
            .collect()
    }

    fn port_for(&self, node: &Node) -> Result<&MemoryPort> {
        self.port_by_key
            .get(&node.key())
            .map(|&idx| &self.ports[idx])
            .ok_or_else(|| TraceError::not_found("Port", node.label()))
    }

    fn termination(&self, key: &NodeKey, side: CableSide) -> Option<Termination> {
        let port = self.port_by_key.get(key).map(|&idx| &self.ports[idx])?;
        let front_ports = if port.node.port_kind == PortKind::RearPort {
            self.front_ports_of(port)
                .map(|p| p.node.interface_name.clone())
                .collect()
        } else {
            Vec::new()
        };
        Some(Termination {
            side,
            port_kind: port.node.port_kind,
            device: port.node.device_name.clone(),
            port: port.node.interface_name.clone(),
            rear_port: port.rear_port.clone(),
            front_ports,
        })
    }

    fn front_ports_of<'a>(&'a self, rear: &'a MemoryPort) -> impl Iterator<Item = &'a MemoryPort> {
        self.ports_by_device
            .get(&rear.node.device_id)
            .into_iter()
            .flatten()
            .map(|&idx| &self.ports[idx])
            .filter(move |p| {
                p.node.port_kind == PortKind::FrontPort
                    && p.rear_port.as_deref() == Some(rear.node.interface_name.as_str())
            })
    }
}

#[async_trait]
impl ConnectionFetcher for MemoryFetcher {
    async fn device(&self, name: &str) -> Result<DeviceProfile> {
        self.device_named(name).cloned()
    }

    async fn device_by_id(&self, id: u64) -> Result<DeviceProfile> {
        self.devices
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| TraceError::not_found("Device", id.to_string()))
    }

    async fn device_ports(&self, device_id: u64) -> Result<Vec<Node>> {
        if !self.devices.iter().any(|d| d.id == device_id) {
            return Err(TraceError::not_found("Device", device_id.to_string()));
        }
        Ok(self
            .ports_by_device
            .get(&device_id)
            .into_iter()
            .flatten()
            .map(|&idx| &self.ports[idx].node)
            .filter(|node| self.cables_by_port.contains_key(&node.key()))
            .cloned()
            .collect())
    }

    async fn port(&self, device: &str, name: &str) -> Result<Node> {
        let profile = self.device_named(device)?;
        self.find_port(profile.id, name, None)
            .map(|p| p.node.clone())
            .ok_or_else(|| TraceError::not_found("Port", format!("{device}:{name}")))
    }

    async fn neighbors(&self, node: &Node) -> Result<Vec<Link>> {
        self.port_for(node)?;
        let key = node.key();
        let mut links = Vec::new();
        for cable_id in self.cables_by_port.get(&key).into_iter().flatten() {
            let Some(cable) = self.cables.get(cable_id) else {
                continue;
            };
            let in_a = cable.a.contains(&key);
            let in_b = cable.b.contains(&key);
            let mut peers: Vec<&NodeKey> = Vec::new();
            if in_a {
                peers.extend(cable.b.iter());
            }
            if in_b {
                peers.extend(cable.a.iter());
            }
            for peer in peers {
                if *peer == key {
                    continue;
                }
                if let Some(&idx) = self.port_by_key.get(peer) {
                    links.push(Link {
                        edge: cable.edge.clone(),
                        peer: self.ports[idx].node.clone(),
                    });
                }
            }
        }
        Ok(links)
    }

    async fn counterparts(&self, node: &Node) -> Result<Vec<Node>> {
        let port = self.port_for(node)?;
        match node.port_kind {
            PortKind::Regular => Ok(Vec::new()),
            PortKind::FrontPort => Ok(port
                .rear_port
                .as_deref()
                .and_then(|rear| self.find_port(node.device_id, rear, Some(PortKind::RearPort)))
                .map(|p| vec![p.node.clone()])
                .unwrap_or_default()),
            PortKind::RearPort => Ok(self.front_ports_of(port).map(|p| p.node.clone()).collect()),
        }
    }

    async fn cable(&self, cable_id: u64) -> Result<CableDetail> {
        let cable = self
            .cables
            .get(&cable_id)
            .ok_or_else(|| TraceError::not_found("Cable", cable_id.to_string()))?;
        let terminations = cable
            .a
            .iter()
            .filter_map(|key| self.termination(key, CableSide::A))
            .chain(cable.b.iter().filter_map(|key| self.termination(key, CableSide::B)))
            .collect();
        Ok(CableDetail {
            cable_id,
            cable_type: cable.cable_type.clone(),
            status: cable.edge.status,
            length: cable.edge.length,
            length_unit: cable.edge.length_unit.clone(),
            terminations,
        })
    }
}
