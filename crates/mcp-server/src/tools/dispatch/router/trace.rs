use super::super::{
    CallToolResult, Content, McpError, NetBoxTopologyService, TraceDevicesRequest,
    TraceInterfaceRequest, TracePathResult, TraceTreeResult,
};
use super::error::{attach_structured_content, trace_error};
use super::render::{path_doc, tree_doc};
use netbox_protocol::ToolNextAction;
use netbox_topology::{path_mermaid, tree_mermaid};
use serde_json::json;

/// Shortest cable path between two devices
pub(in crate::tools::dispatch) async fn trace_devices_connection(
    service: &NetBoxTopologyService,
    request: TraceDevicesRequest,
) -> Result<CallToolResult, McpError> {
    let via_devices = request.via_devices.unwrap_or(false);
    let max_results = request.max_results.unwrap_or(1);
    let trace = match service
        .tracer()
        .trace_devices_paths(
            &request.source_device,
            &request.target_device,
            request.max_depth,
            via_devices,
            max_results,
        )
        .await
    {
        Ok(trace) => trace,
        Err(err) => {
            let retry = ToolNextAction {
                tool: "trace_devices_connection".to_string(),
                args: json!({
                    "source_device": request.source_device,
                    "target_device": request.target_device,
                    "max_depth": request.max_depth,
                    "via_devices": via_devices,
                    "max_results": max_results,
                }),
                reason: "retry the same trace".to_string(),
            };
            return Ok(trace_error(service, &err, Some(retry)));
        }
    };

    let mermaid = path_mermaid(&trace);
    let doc = path_doc(&trace, &mermaid);
    let result = TracePathResult { trace, mermaid };
    Ok(attach_structured_content(
        CallToolResult::success(vec![Content::text(doc)]),
        &result,
        "trace_devices_connection",
    ))
}

/// Everything reachable from one port
pub(in crate::tools::dispatch) async fn trace_from_interface(
    service: &NetBoxTopologyService,
    request: TraceInterfaceRequest,
) -> Result<CallToolResult, McpError> {
    let tree = match service
        .tracer()
        .trace_from_interface(
            &request.device_name,
            &request.interface_name,
            request.max_depth,
        )
        .await
    {
        Ok(tree) => tree,
        Err(err) => {
            let retry = ToolNextAction {
                tool: "trace_from_interface".to_string(),
                args: json!({
                    "device_name": request.device_name,
                    "interface_name": request.interface_name,
                    "max_depth": request.max_depth,
                }),
                reason: "retry the same trace".to_string(),
            };
            return Ok(trace_error(service, &err, Some(retry)));
        }
    };

    let mermaid = tree_mermaid(&tree);
    let branches = tree.nested();
    let doc = tree_doc(&tree, &branches, &mermaid);
    let result = TraceTreeResult {
        tree,
        branches,
        mermaid,
    };
    Ok(attach_structured_content(
        CallToolResult::success(vec![Content::text(doc)]),
        &result,
        "trace_from_interface",
    ))
}
