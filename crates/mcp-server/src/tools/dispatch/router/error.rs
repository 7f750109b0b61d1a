use super::super::{CallToolResult, Content, NetBoxTopologyService};
use crate::tools::context_doc::ContextDocBuilder;
use netbox_client::BackendKind;
use netbox_protocol::{codes, ErrorEnvelope, ToolNextAction};
use netbox_topology::TraceError;
use serde::Serialize;
use serde_json::json;

fn render_details_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::String(s) => s.split_whitespace().collect::<Vec<_>>().join(" "),
        serde_json::Value::Array(values) => format!("<array len={}>", values.len()),
        serde_json::Value::Object(values) => format!("<object keys={}>", values.len()),
        other => other.to_string(),
    }
}

fn render_details_notes(details: &serde_json::Value) -> Vec<String> {
    match details {
        serde_json::Value::Object(map) => {
            let mut keys = map.keys().collect::<Vec<_>>();
            keys.sort();
            keys.into_iter()
                .filter_map(|key| {
                    map.get(key)
                        .map(|value| format!("details.{key}={}", render_details_value(value)))
                })
                .collect()
        }
        other => vec![format!("details={}", render_details_value(other))],
    }
}

pub(in crate::tools::dispatch) fn tool_error_envelope(error: ErrorEnvelope) -> CallToolResult {
    let mut doc = ContextDocBuilder::new();
    doc.push_answer(&format!("error: {}", error.code));
    doc.push_note(&error.message);
    if let Some(hint) = error.hint.as_deref() {
        if !hint.trim().is_empty() {
            doc.push_note(&format!("hint: {hint}"));
        }
    }
    if let Some(details) = error.details.as_ref() {
        for line in render_details_notes(details) {
            doc.push_note(&line);
        }
    }
    for action in &error.next_actions {
        doc.push_note(&format!("next: {} ({})", action.tool, action.reason));
    }

    let mut result = CallToolResult::error(vec![Content::text(doc.finish())]);
    result.structured_content = Some(json!({ "error": error }));
    result
}

pub(in crate::tools::dispatch) fn internal_error(message: impl Into<String>) -> CallToolResult {
    tool_error_envelope(ErrorEnvelope::new(codes::INTERNAL, message))
}

/// Map a trace failure to an envelope with a hint for the agent and, where a retry makes sense,
/// the call to repeat.
pub(in crate::tools::dispatch) fn trace_error(
    service: &NetBoxTopologyService,
    err: &TraceError,
    retry: Option<ToolNextAction>,
) -> CallToolResult {
    log::debug!("trace failed: {err}");
    let envelope = ErrorEnvelope::new(err.code(), err.to_string());
    let envelope = match err {
        TraceError::NotFound { kind, name } => envelope
            .with_hint(format!(
                "{kind} names must match NetBox exactly (case-sensitive); check the spelling"
            ))
            .with_details(json!({ "kind": kind, "name": name })),
        TraceError::BackendUnavailable(_) if service.backend() == BackendKind::Unconfigured => {
            envelope.with_hint(
                "Set NETBOX_URL and NETBOX_API_TOKEN for the live API, or NETBOX_INVENTORY for an offline snapshot, then restart the server",
            )
        }
        TraceError::BackendUnavailable(_) => {
            let envelope = envelope
                .with_hint("The backend failed or the trace ran out of time; retry, or lower max_depth");
            match retry {
                Some(action) => envelope.with_next_action(action),
                None => envelope,
            }
        }
        TraceError::UnmappedPort { device, port } => envelope
            .with_hint("Declare the front/rear port mapping for this panel in NetBox")
            .with_details(json!({ "device": device, "port": port })),
        TraceError::InvalidRequest(_) | TraceError::InvalidInventory(_) => envelope,
    };
    tool_error_envelope(envelope)
}

pub(in crate::tools::dispatch) fn attach_structured_content<T: Serialize>(
    mut result: CallToolResult,
    payload: &T,
    tool: &'static str,
) -> CallToolResult {
    match serde_json::to_value(payload) {
        Ok(value) => {
            result.structured_content = Some(value);
            result
        }
        Err(err) => internal_error(format!(
            "Error: failed to serialize {tool} structured_content ({err})"
        )),
    }
}
