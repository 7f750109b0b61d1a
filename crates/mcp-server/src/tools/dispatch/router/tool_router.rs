use super::super::*;

use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_router};

pub(in crate::tools::dispatch) fn build_tool_router() -> ToolRouter<NetBoxTopologyService> {
    NetBoxTopologyService::tool_router()
}

#[tool_router]
impl NetBoxTopologyService {
    /// Backend, defaults and pass-through roles.
    #[tool(
        description = "Return the backend in use (netbox, inventory or unconfigured), default trace depths and timeout, and the device roles treated as patch panels."
    )]
    pub async fn capabilities(
        &self,
        Parameters(request): Parameters<CapabilitiesRequest>,
    ) -> Result<CallToolResult, McpError> {
        super::capabilities::capabilities(self, request).await
    }

    /// Shortest physical path between two devices.
    #[tool(
        description = "Find the shortest physical cable path between two devices. Searches from both ends at once, follows patch panels front-to-rear transparently, and reports the ordered ports, cables, meeting point and a mermaid diagram. Hop counts are cable hops."
    )]
    pub async fn trace_devices_connection(
        &self,
        Parameters(request): Parameters<TraceDevicesRequest>,
    ) -> Result<CallToolResult, McpError> {
        super::trace::trace_devices_connection(self, request).await
    }

    /// Everything reachable from one port.
    #[tool(
        description = "Trace everything physically reachable from one interface (or front/rear port), following cables and patch-panel pairings. Returns a tree with leaves, cycle, unmapped-port and depth-limit annotations, summary counts and a mermaid diagram."
    )]
    pub async fn trace_from_interface(
        &self,
        Parameters(request): Parameters<TraceInterfaceRequest>,
    ) -> Result<CallToolResult, McpError> {
        super::trace::trace_from_interface(self, request).await
    }

    /// One cable by id.
    #[tool(
        description = "Fetch one cable by id: type, status, length and every termination, including the rear port behind a front port and the front ports behind a rear port."
    )]
    pub async fn get_cable(
        &self,
        Parameters(request): Parameters<GetCableRequest>,
    ) -> Result<CallToolResult, McpError> {
        super::cable::get_cable(self, request).await
    }
}
