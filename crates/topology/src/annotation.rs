use serde::{Deserialize, Serialize};

/// Non-fatal findings attached to a node or branch of a trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Annotation {
    /// A pass-through port without a declared front/rear mapping; the branch ends here.
    UnmappedPort { device: String, port: String },
    /// The branch reached a node that was already visited.
    CycleDetected { node: String },
    /// The backend reports more than one cable on a single port.
    MultipleCables { cable_ids: Vec<u64> },
    /// The depth budget ran out before this node could be expanded.
    DepthLimit,
    /// The port has no cable attached.
    NoCable,
}
