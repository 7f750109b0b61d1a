//! NetBox REST payloads, decoded leniently: unknown fields are ignored and optional fields may be
//! absent or `null` across NetBox releases.

use netbox_topology::{CableStatus, DeviceProfile, Edge, Node, PortKind};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Nested {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NestedSlug {
    pub id: u64,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Choice {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DeviceRecord {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<NestedSlug>,
    /// Pre-3.6 spelling of `role`
    #[serde(default)]
    pub device_role: Option<NestedSlug>,
    #[serde(default)]
    pub device_type: Option<NestedSlug>,
}

impl DeviceRecord {
    pub fn into_profile(self) -> DeviceProfile {
        DeviceProfile {
            name: self.name.unwrap_or_else(|| unnamed_device(self.id)),
            id: self.id,
            role: self.role.or(self.device_role).and_then(|r| r.slug),
            device_type: self.device_type.and_then(|t| t.slug),
        }
    }
}

/// Interface, front port or rear port record.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PortRecord {
    pub id: u64,
    pub name: String,
    pub device: Nested,
    /// Front ports only
    #[serde(default)]
    pub rear_port: Option<Nested>,
}

impl PortRecord {
    pub fn into_node(self, kind: PortKind) -> Node {
        Node {
            device_id: self.device.id,
            device_name: self
                .device
                .name
                .unwrap_or_else(|| unnamed_device(self.device.id)),
            interface_id: self.id,
            interface_name: self.name,
            port_kind: kind,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TerminationObject {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub device: Option<Nested>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TerminationRecord {
    pub object_type: String,
    pub object_id: u64,
    #[serde(default)]
    pub object: Option<TerminationObject>,
}

impl TerminationRecord {
    pub fn port_kind(&self) -> Option<PortKind> {
        match self.object_type.as_str() {
            "dcim.interface" => Some(PortKind::Regular),
            "dcim.frontport" => Some(PortKind::FrontPort),
            "dcim.rearport" => Some(PortKind::RearPort),
            _ => None,
        }
    }

    pub fn matches(&self, node: &Node) -> bool {
        self.object_id == node.interface_id && self.port_kind() == Some(node.port_kind)
    }

    /// The port behind this termination. `None` for circuit, power and console terminations.
    pub fn to_node(&self) -> Option<Node> {
        let kind = self.port_kind()?;
        let object = self.object.as_ref()?;
        let device = object.device.as_ref()?;
        Some(Node {
            device_id: device.id,
            device_name: device
                .name
                .clone()
                .unwrap_or_else(|| unnamed_device(device.id)),
            interface_id: object.id,
            interface_name: object
                .name
                .clone()
                .unwrap_or_else(|| format!("port-{}", object.id)),
            port_kind: kind,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CableRecord {
    pub id: u64,
    #[serde(default, rename = "type")]
    pub cable_type: Option<String>,
    #[serde(default)]
    pub status: Option<Choice>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub length_unit: Option<Choice>,
    #[serde(default)]
    pub a_terminations: Vec<TerminationRecord>,
    #[serde(default)]
    pub b_terminations: Vec<TerminationRecord>,
}

impl CableRecord {
    pub fn status(&self) -> Option<CableStatus> {
        let value = self.status.as_ref()?.value.clone();
        serde_json::from_value(serde_json::Value::String(value)).ok()
    }

    pub fn edge(&self) -> Edge {
        Edge {
            cable_id: self.id,
            status: self.status(),
            length: self.length,
            length_unit: self.length_unit.as_ref().map(|u| u.value.clone()),
        }
    }

    pub fn cable_type(&self) -> Option<String> {
        self.cable_type.clone().filter(|t| !t.is_empty())
    }

    /// Terminations on the far side of the cable from `node`.
    pub fn peers_of(&self, node: &Node) -> Vec<&TerminationRecord> {
        let mut peers = Vec::new();
        if self.a_terminations.iter().any(|t| t.matches(node)) {
            peers.extend(self.b_terminations.iter());
        }
        if self.b_terminations.iter().any(|t| t.matches(node)) {
            peers.extend(self.a_terminations.iter());
        }
        peers.retain(|t| !t.matches(node));
        peers
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RoleRecord {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ManufacturerRecord {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DeviceTypeRecord {
    pub id: u64,
    pub slug: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<ManufacturerRecord>,
    #[serde(default)]
    pub interface_template_count: u64,
    #[serde(default)]
    pub front_port_template_count: u64,
    #[serde(default)]
    pub rear_port_template_count: u64,
}

fn unnamed_device(id: u64) -> String {
    format!("device-{id}")
}

/// List endpoint for a port kind.
pub(crate) fn port_endpoint(kind: PortKind) -> &'static str {
    match kind {
        PortKind::Regular => "/api/dcim/interfaces/",
        PortKind::FrontPort => "/api/dcim/front-ports/",
        PortKind::RearPort => "/api/dcim/rear-ports/",
    }
}

/// Cable list filter selecting cables attached to a port of this kind.
pub(crate) fn cable_filter(kind: PortKind) -> &'static str {
    match kind {
        PortKind::Regular => "interface_id",
        PortKind::FrontPort => "frontport_id",
        PortKind::RearPort => "rearport_id",
    }
}
