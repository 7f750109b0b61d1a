use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of physical port a cable terminates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortKind {
    /// Device interface (switch port, NIC, ...)
    Regular,
    /// Patch-panel front port, internally paired with a rear port
    FrontPort,
    /// Patch-panel rear port, internally paired with one or more front ports
    RearPort,
}

impl PortKind {
    /// The port kind an internal pass-through hop must land on.
    pub fn opposite(self) -> Option<Self> {
        match self {
            Self::Regular => None,
            Self::FrontPort => Some(Self::RearPort),
            Self::RearPort => Some(Self::FrontPort),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::FrontPort => "front_port",
            Self::RearPort => "rear_port",
        }
    }
}

/// Identity of a port. Backend ids are unique per port kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey {
    pub port_kind: PortKind,
    pub port_id: u64,
}

/// A device + port location in the cabling topology.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    pub device_id: u64,
    pub device_name: String,
    pub interface_id: u64,
    pub interface_name: String,
    pub port_kind: PortKind,
}

impl Node {
    pub fn key(&self) -> NodeKey {
        NodeKey {
            port_kind: self.port_kind,
            port_id: self.interface_id,
        }
    }

    /// `device:port`, the form agents use to name a port.
    pub fn label(&self) -> String {
        format!("{}:{}", self.device_name, self.interface_name)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.device_name, self.interface_name)
    }
}

/// Cable lifecycle status as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CableStatus {
    Connected,
    Planned,
    Decommissioning,
    #[serde(other)]
    Unknown,
}

/// A physical cable between two ports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub cable_id: u64,
    #[serde(default)]
    pub status: Option<CableStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_unit: Option<String>,
}

impl Edge {
    pub fn connected(cable_id: u64) -> Self {
        Self {
            cable_id,
            status: Some(CableStatus::Connected),
            length: None,
            length_unit: None,
        }
    }

    /// Cables that are missing a status or are not `connected` stay traversable but get flagged.
    pub fn is_flagged(&self) -> bool {
        self.status != Some(CableStatus::Connected)
    }
}

/// One cable hop as seen from a port: the cable and the port at its far end.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub edge: Edge,
    pub peer: Node,
}

/// Device metadata used for pass-through classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub id: u64,
    pub name: String,
    /// Device role slug (e.g. `patch-panel`)
    #[serde(default)]
    pub role: Option<String>,
    /// Device type slug
    #[serde(default)]
    pub device_type: Option<String>,
}

/// Full cable record, as returned by `get_cable`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CableDetail {
    pub cable_id: u64,
    pub cable_type: Option<String>,
    pub status: Option<CableStatus>,
    pub length: Option<f64>,
    pub length_unit: Option<String>,
    pub terminations: Vec<Termination>,
}

/// One end of a cable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Termination {
    pub side: CableSide,
    pub port_kind: PortKind,
    pub device: String,
    pub port: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rear_port: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub front_ports: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CableSide {
    A,
    B,
}
