//! `.context` text for trace results.

use crate::tools::context_doc::ContextDocBuilder;
use netbox_topology::{
    Annotation, CableDetail, CableStatus, Edge, Hop, PathTrace, TraceTree, TreeBranch,
};

fn status_label(status: Option<CableStatus>) -> &'static str {
    match status {
        Some(CableStatus::Connected) => "connected",
        Some(CableStatus::Planned) => "planned",
        Some(CableStatus::Decommissioning) => "decommissioning",
        Some(CableStatus::Unknown) => "unknown",
        None => "no status",
    }
}

fn cable_label(edge: &Edge) -> String {
    if edge.is_flagged() {
        format!("cable #{} ({})", edge.cable_id, status_label(edge.status))
    } else {
        format!("cable #{}", edge.cable_id)
    }
}

fn via_label(hop: &Hop) -> String {
    match hop {
        Hop::Cable(edge) => format!("via {}", cable_label(edge)),
        Hop::Internal => "via panel".to_string(),
        Hop::Device => "via device".to_string(),
    }
}

fn annotation_label(annotation: &Annotation) -> String {
    match annotation {
        Annotation::UnmappedPort { device, port } => format!("unmapped_port {device}:{port}"),
        Annotation::CycleDetected { node } => format!("cycle -> {node}"),
        Annotation::MultipleCables { cable_ids } => {
            let ids: Vec<String> = cable_ids.iter().map(|id| format!("#{id}")).collect();
            format!("multiple_cables {}", ids.join(","))
        }
        Annotation::DepthLimit => "depth_limit".to_string(),
        Annotation::NoCable => "no_cable".to_string(),
    }
}

fn flagged_note(doc: &mut ContextDocBuilder, flagged: &[Edge]) {
    if flagged.is_empty() {
        return;
    }
    let cables: Vec<String> = flagged.iter().map(cable_label).collect();
    doc.push_note(&format!("flagged: {}", cables.join(", ")));
}

fn mermaid_block(doc: &mut ContextDocBuilder, mermaid: &str) {
    doc.push_blank();
    doc.push_note("mermaid:");
    doc.push_block_smart(mermaid);
}

pub(super) fn path_doc(trace: &PathTrace, mermaid: &str) -> String {
    let mut doc = ContextDocBuilder::new();
    if !trace.found {
        let reason = trace
            .reason
            .and_then(|r| serde_json::to_value(r).ok())
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        doc.push_answer(&format!(
            "path: {} -> {} found=false reason={reason}",
            trace.source, trace.target
        ));
    } else {
        doc.push_answer(&format!(
            "path: {} -> {} found=true hops={}",
            trace.source, trace.target, trace.hop_count
        ));
    }
    if let Some(message) = trace.message.as_deref() {
        doc.push_note(message);
    }

    for (i, node) in trace.nodes.iter().enumerate() {
        let via = i
            .checked_sub(1)
            .and_then(|prev| trace.links.get(prev))
            .map(via_label);
        doc.push_ref_header(&node.label(), via.as_deref());
    }
    if let Some(meeting) = &trace.meeting_point {
        doc.push_note(&format!(
            "meeting_point={} source_hops={} target_hops={}",
            meeting.node.label(),
            meeting.source_hops,
            meeting.target_hops
        ));
    }
    flagged_note(&mut doc, &trace.flagged_cables);
    for annotation in &trace.annotations {
        doc.push_note(&annotation_label(annotation));
    }
    for (i, alternate) in trace.alternatives.iter().enumerate() {
        let route: Vec<String> = alternate.nodes.iter().map(|n| n.label()).collect();
        doc.push_note(&format!(
            "alternate[{}] hops={}: {}",
            i + 1,
            alternate.hop_count,
            route.join(" > ")
        ));
    }
    doc.push_note(&format!(
        "explored source={} target={} rounds={}",
        trace.explored.source, trace.explored.target, trace.explored.rounds
    ));
    if trace.found && !trace.nodes.is_empty() {
        mermaid_block(&mut doc, mermaid);
    }
    doc.finish()
}

fn push_branch(doc: &mut ContextDocBuilder, branch: &TreeBranch, indent: usize) {
    let mut label = Vec::new();
    if let Some(via) = &branch.via {
        label.push(via_label(via));
    }
    for annotation in &branch.annotations {
        label.push(format!("[{}]", annotation_label(annotation)));
    }
    doc.push_ref_header(
        &format!("{}{}", "  ".repeat(indent), branch.node.label()),
        Some(&label.join(" ")),
    );
    for child in &branch.children {
        push_branch(doc, child, indent + 1);
    }
}

pub(super) fn tree_doc(tree: &TraceTree, branches: &TreeBranch, mermaid: &str) -> String {
    let summary = &tree.summary;
    let mut doc = ContextDocBuilder::new();
    doc.push_answer(&format!(
        "tree: {} nodes={} cables={} leaves={} depth={}",
        tree.root.label(),
        summary.total_nodes,
        summary.total_cables,
        summary.leaf_count,
        summary.max_depth_reached
    ));
    doc.push_note(&format!(
        "max_depth={} cycles={} unmapped={} truncated={}",
        tree.max_depth, summary.cycle_count, summary.unmapped_count, summary.truncated
    ));
    flagged_note(&mut doc, &summary.flagged_cables);
    push_branch(&mut doc, branches, 0);
    mermaid_block(&mut doc, mermaid);
    doc.finish()
}

pub(super) fn cable_doc(cable: &CableDetail) -> String {
    let mut doc = ContextDocBuilder::new();
    let mut answer = format!("cable #{} status={}", cable.cable_id, status_label(cable.status));
    if let Some(kind) = cable.cable_type.as_deref() {
        answer.push_str(&format!(" type={kind}"));
    }
    if let Some(length) = cable.length {
        let unit = cable.length_unit.as_deref().unwrap_or("");
        answer.push_str(&format!(" length={length}{unit}"));
    }
    doc.push_answer(&answer);
    for termination in &cable.terminations {
        let mut label = format!("side={:?} {}", termination.side, termination.port_kind.as_str());
        if let Some(rear) = termination.rear_port.as_deref() {
            label.push_str(&format!(" rear={rear}"));
        }
        if !termination.front_ports.is_empty() {
            label.push_str(&format!(" fronts={}", termination.front_ports.join(",")));
        }
        doc.push_ref_header(&format!("{}:{}", termination.device, termination.port), Some(&label));
    }
    doc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flagged_cables_show_their_status() {
        let mut edge = Edge::connected(9);
        assert_eq!(cable_label(&edge), "cable #9");
        edge.status = Some(CableStatus::Planned);
        assert_eq!(cable_label(&edge), "cable #9 (planned)");
        edge.status = None;
        assert_eq!(via_label(&Hop::Cable(edge)), "via cable #9 (no status)");
    }

    #[test]
    fn annotations_are_compact() {
        assert_eq!(
            annotation_label(&Annotation::MultipleCables { cable_ids: vec![4, 5] }),
            "multiple_cables #4,#5"
        );
        assert_eq!(
            annotation_label(&Annotation::CycleDetected {
                node: "patch-01:front1".to_string()
            }),
            "cycle -> patch-01:front1"
        );
    }
}
