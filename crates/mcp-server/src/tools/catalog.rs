#[derive(Clone, Copy, Debug)]
pub(crate) struct ToolDescriptor {
    pub(crate) name: &'static str,
    pub(crate) summary: &'static str,
}

pub(crate) const TOOL_CATALOG: &[ToolDescriptor] = &[
    ToolDescriptor {
        name: "capabilities",
        summary: "Backend in use, default depths and timeout, pass-through roles.",
    },
    ToolDescriptor {
        name: "trace_devices_connection",
        summary: "Shortest physical path between two devices (cable hops, patch panels followed).",
    },
    ToolDescriptor {
        name: "trace_from_interface",
        summary: "Everything reachable from one interface, as a tree with cycle/depth annotations.",
    },
    ToolDescriptor {
        name: "get_cable",
        summary: "One cable by id: status, length, terminations and panel pairings.",
    },
];

pub(crate) fn tool_instructions() -> String {
    let mut out = String::from(
        "Physical cable tracing over NetBox. Device and interface names are exact NetBox names; \
         ports are written device:port.\n\nTools:\n",
    );
    for tool in TOOL_CATALOG {
        out.push_str(&format!("- {}: {}\n", tool.name, tool.summary));
    }
    out.push_str(
        "\nEvery result has a `.context` text summary and structured_content with the full \
         result plus a mermaid diagram.",
    );
    out
}
