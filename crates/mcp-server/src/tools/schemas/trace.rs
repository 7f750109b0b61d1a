use netbox_topology::{PathTrace, TraceTree, TreeBranch};
use rmcp::schemars;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TraceDevicesRequest {
    /// Device the path starts from
    #[schemars(description = "Source device name, exactly as in NetBox")]
    pub source_device: String,

    /// Device the path ends at
    #[schemars(description = "Target device name, exactly as in NetBox")]
    pub target_device: String,

    #[schemars(
        description = "Maximum cable levels explored from each side (default: 6, capped at 32)."
    )]
    pub max_depth: Option<usize>,

    #[schemars(
        description = "Continue through intermediate endpoint devices (switch to switch) instead of only through patch panels (default: false)."
    )]
    pub via_devices: Option<bool>,

    #[schemars(
        description = "Paths to return: the shortest plus alternates found where the searches met (default: 1, capped at 10)."
    )]
    pub max_results: Option<usize>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TraceInterfaceRequest {
    #[schemars(description = "Device that owns the starting port")]
    pub device_name: String,

    #[schemars(description = "Interface, front port or rear port name on that device")]
    pub interface_name: String,

    #[schemars(
        description = "Depth budget; cable hops and patch-panel pass-throughs each cost one (default: 10, capped at 32)."
    )]
    pub max_depth: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TracePathResult {
    #[serde(flatten)]
    pub trace: PathTrace,
    /// Mermaid flowchart of the path
    pub mermaid: String,
}

#[derive(Debug, Serialize)]
pub struct TraceTreeResult {
    #[serde(flatten)]
    pub tree: TraceTree,
    /// Same entries, nested under their parents
    pub branches: TreeBranch,
    /// Mermaid flowchart of the tree
    pub mermaid: String,
}
