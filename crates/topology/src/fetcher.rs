use crate::error::Result;
use crate::model::{CableDetail, DeviceProfile, Link, Node};
use async_trait::async_trait;

/// Read-only access to the cabling data of an inventory backend.
///
/// Every operation is a single logical query: implementations drain backend pagination before
/// returning, because a partial neighbor list silently hides paths. Transport failures surface as
/// [`TraceError::BackendUnavailable`](crate::TraceError::BackendUnavailable), missing objects as
/// [`TraceError::NotFound`](crate::TraceError::NotFound).
#[async_trait]
pub trait ConnectionFetcher: Send + Sync {
    /// Look up a device by name.
    async fn device(&self, name: &str) -> Result<DeviceProfile>;

    /// Look up a device by backend id.
    async fn device_by_id(&self, id: u64) -> Result<DeviceProfile>;

    /// All cabled ports (interfaces, front ports, rear ports) of one device, in one round-trip per
    /// port kind.
    async fn device_ports(&self, device_id: u64) -> Result<Vec<Node>>;

    /// Look up a port by device name and port name. Interfaces win over front/rear ports that share
    /// the same name.
    async fn port(&self, device: &str, name: &str) -> Result<Node>;

    /// Directly cabled neighbors of a port (one cable hop). A port normally terminates at most one
    /// cable; more than one distinct cable id here is a data-integrity condition the caller reports.
    async fn neighbors(&self, node: &Node) -> Result<Vec<Link>>;

    /// Internal front/rear pairing of a port on its own device. Empty when no mapping is declared
    /// and always empty for regular interfaces.
    async fn counterparts(&self, node: &Node) -> Result<Vec<Node>>;

    /// Full cable record by id.
    async fn cable(&self, cable_id: u64) -> Result<CableDetail>;
}
