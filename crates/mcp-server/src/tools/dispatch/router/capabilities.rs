use super::super::{CallToolResult, CapabilitiesRequest, Content, McpError, NetBoxTopologyService};
use super::error::attach_structured_content;
use crate::tools::context_doc::ContextDocBuilder;
use netbox_protocol::{Capabilities, CapabilitiesServer, TraceDefaults, CAPABILITIES_SCHEMA_VERSION};
use netbox_topology::{MAX_DEPTH_CEILING, MAX_RESULTS_CEILING};

/// Backend in use and the defaults applied to trace requests.
pub(in crate::tools::dispatch) async fn capabilities(
    service: &NetBoxTopologyService,
    _request: CapabilitiesRequest,
) -> Result<CallToolResult, McpError> {
    let config = service.tracer().config();
    let output = Capabilities {
        schema_version: CAPABILITIES_SCHEMA_VERSION,
        server: CapabilitiesServer {
            name: "netbox-mcp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        backend: service.backend().as_str().to_string(),
        defaults: TraceDefaults {
            path_max_depth: config.path_max_depth,
            tree_max_depth: config.tree_max_depth,
            max_depth_ceiling: MAX_DEPTH_CEILING,
            max_results_ceiling: MAX_RESULTS_CEILING,
            timeout_ms: config
                .timeout
                .map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX))
                .unwrap_or(0),
            workers: config.workers,
        },
        pass_through_roles: service.pass_through_roles().to_vec(),
    };

    let mut doc = ContextDocBuilder::new();
    doc.push_answer(&format!(
        "capabilities: {} {} backend={}",
        output.server.name, output.server.version, output.backend
    ));
    doc.push_note(&format!(
        "defaults: path_max_depth={} tree_max_depth={} ceiling={} timeout_ms={} workers={}",
        output.defaults.path_max_depth,
        output.defaults.tree_max_depth,
        output.defaults.max_depth_ceiling,
        output.defaults.timeout_ms,
        output.defaults.workers
    ));
    doc.push_note(&format!(
        "pass_through_roles: {}",
        output.pass_through_roles.join(", ")
    ));
    if output.backend == "unconfigured" {
        doc.push_note("hint: set NETBOX_URL and NETBOX_API_TOKEN, or NETBOX_INVENTORY");
    }

    Ok(attach_structured_content(
        CallToolResult::success(vec![Content::text(doc.finish())]),
        &output,
        "capabilities",
    ))
}
