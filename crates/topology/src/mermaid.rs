//! Mermaid flowcharts for trace results.

use crate::bidirectional::PathTrace;
use crate::graph::Hop;
use crate::tree::TraceTree;

pub fn path_mermaid(trace: &PathTrace) -> String {
    if !trace.found {
        return format!(
            "graph LR\n    src[\"{}\"] -. no path .- dst[\"{}\"]",
            mermaid_safe(&trace.source),
            mermaid_safe(&trace.target)
        );
    }
    if trace.nodes.is_empty() {
        return format!("graph LR\n    n0[\"{}\"]", mermaid_safe(&trace.source));
    }

    let mut lines = vec!["graph LR".to_string()];
    for (i, node) in trace.nodes.iter().enumerate() {
        lines.push(format!("    n{i}[\"{}\"]", mermaid_safe(&node.label())));
    }
    for (i, hop) in trace.links.iter().enumerate() {
        lines.push(format!("    n{i} {} n{}", arrow(hop), i + 1));
    }
    lines.join("\n")
}

pub fn tree_mermaid(tree: &TraceTree) -> String {
    let mut lines = vec!["graph TD".to_string()];
    for entry in &tree.entries {
        let mut label = mermaid_safe(&entry.node.label());
        if !entry.annotations.is_empty() {
            label.push_str(" (!)");
        }
        lines.push(format!("    n{}[\"{label}\"]", entry.id));
    }
    for entry in &tree.entries {
        if let (Some(parent), Some(hop)) = (entry.parent, entry.via.as_ref()) {
            lines.push(format!("    n{parent} {} n{}", arrow(hop), entry.id));
        }
    }
    lines.join("\n")
}

fn arrow(hop: &Hop) -> String {
    match hop {
        Hop::Cable(edge) if edge.is_flagged() => format!("-- \"#{} ?\" -->", edge.cable_id),
        Hop::Cable(edge) => format!("-- \"#{}\" -->", edge.cable_id),
        Hop::Internal => "-.->".to_string(),
        Hop::Device => "==>".to_string(),
    }
}

fn mermaid_safe(s: &str) -> String {
    s.replace('"', "'").replace(['<', '>', '[', ']'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bidirectional::{Explored, PathTrace};
    use crate::model::{Edge, Node, PortKind};

    fn node(device: &str, port: &str, id: u64) -> Node {
        Node {
            device_id: id,
            device_name: device.to_string(),
            interface_id: id,
            interface_name: port.to_string(),
            port_kind: PortKind::Regular,
        }
    }

    #[test]
    fn path_renders_cables_in_order() {
        let trace = PathTrace {
            source: "switch-01".to_string(),
            target: "server-01".to_string(),
            found: true,
            hop_count: 1,
            nodes: vec![node("switch-01", "eth0", 1), node("server-01", "eth<0>", 2)],
            links: vec![Hop::Cable(Edge::connected(7))],
            meeting_point: None,
            reason: None,
            message: None,
            depth_exceeded: false,
            truncated: false,
            flagged_cables: Vec::new(),
            annotations: Vec::new(),
            explored: Explored::default(),
            alternatives: Vec::new(),
        };
        let rendered = path_mermaid(&trace);
        assert_eq!(
            rendered,
            "graph LR\n    n0[\"switch-01:eth0\"]\n    n1[\"server-01:eth_0_\"]\n    n0 -- \"#7\" --> n1"
        );
    }
}
