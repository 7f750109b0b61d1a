//! MCP tool dispatch for NetBox topology tracing.

mod router;
mod service;

use super::schemas::cable::GetCableRequest;
use super::schemas::capabilities::CapabilitiesRequest;
use super::schemas::trace::{
    TraceDevicesRequest, TraceInterfaceRequest, TracePathResult, TraceTreeResult,
};
use netbox_client::BackendKind;
use netbox_topology::Tracer;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::model::{CallToolResult, Content};
use rmcp::ErrorData as McpError;

/// NetBox topology MCP service
#[derive(Clone)]
pub struct NetBoxTopologyService {
    tracer: Tracer,
    backend: BackendKind,
    pass_through_roles: Vec<String>,
    tool_router: ToolRouter<Self>,
}
