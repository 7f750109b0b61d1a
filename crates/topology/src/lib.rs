//! # NetBox Topology
//!
//! Cable-topology tracing over NetBox-style cabling data.
//!
//! ## Features
//!
//! - **Device-to-device paths** - bidirectional BFS, shortest path in cable hops
//! - **Interface trees** - everything physically reachable from one port, with cycle and
//!   depth annotations
//! - **Patch-panel traversal** - front/rear port pairing is followed transparently, including
//!   rear ports with several positions
//! - **Pluggable backends** - live NetBox or an in-memory inventory snapshot
//!
//! ## Architecture
//!
//! ```text
//! Tracer (per-call deadline, depth clamp)
//!     │
//!     ├──> BidirectionalSearch          TreeSearch
//!     │      └─ both sides expand         └─ level worklist from one port
//!     │         one cable level per round
//!     │
//!     ├──> Expander (JoinSet + Semaphore, merged in frontier order)
//!     │      ├─ ConnectionFetcher::neighbors
//!     │      └─ PassThroughResolver::classify
//!     │
//!     └──> TopologyGraph (petgraph)
//!            ├─ Nodes: ports, in discovery order
//!            └─ Edges: cable / internal / device hops to the first parent
//! ```

mod annotation;
mod bidirectional;
mod error;
mod expand;
mod fetcher;
mod graph;
mod memory;
mod mermaid;
mod model;
mod resolver;
mod tracer;
mod tree;

pub use annotation::Annotation;
pub use bidirectional::{
    AlternatePath, Explored, MeetingPoint, PathOptions, PathReason, PathTrace,
};
pub use error::{Result, TraceError};
pub use fetcher::ConnectionFetcher;
pub use graph::{Discovery, Hop, TopologyGraph, Visit};
pub use memory::{
    Inventory, InventoryBuilder, InventoryCable, InventoryDevice, InventoryPort, MemoryFetcher,
    PortRef,
};
pub use mermaid::{path_mermaid, tree_mermaid};
pub use model::{
    CableDetail, CableSide, CableStatus, DeviceProfile, Edge, Link, Node, NodeKey, PortKind,
    Termination,
};
pub use resolver::{Classification, DeviceTypeCatalog, PassThroughPolicy, PassThroughResolver};
pub use tracer::{Tracer, TracerConfig, MAX_DEPTH_CEILING, MAX_RESULTS_CEILING};
pub use tree::{TraceTree, TreeBranch, TreeEntry, TreeOptions, TreeSummary};
