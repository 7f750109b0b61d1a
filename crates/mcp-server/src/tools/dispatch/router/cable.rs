use super::super::{CallToolResult, Content, GetCableRequest, McpError, NetBoxTopologyService};
use super::error::{attach_structured_content, trace_error};
use super::render::cable_doc;

/// One cable with its terminations
pub(in crate::tools::dispatch) async fn get_cable(
    service: &NetBoxTopologyService,
    request: GetCableRequest,
) -> Result<CallToolResult, McpError> {
    let cable = match service.tracer().cable(request.cable_id).await {
        Ok(cable) => cable,
        Err(err) => return Ok(trace_error(service, &err, None)),
    };
    Ok(attach_structured_content(
        CallToolResult::success(vec![Content::text(cable_doc(&cable))]),
        &cable,
        "get_cable",
    ))
}
