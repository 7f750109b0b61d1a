use async_trait::async_trait;
use netbox_topology::{
    Annotation, CableDetail, CableStatus, ConnectionFetcher, DeviceProfile, Hop, Inventory,
    InventoryBuilder, Link, MemoryFetcher, Node, PassThroughPolicy, PathReason, TraceError,
    Tracer, TracerConfig,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn tracer(inventory: Inventory) -> Tracer {
    let fetcher = MemoryFetcher::new(inventory).expect("valid inventory");
    Tracer::new(Arc::new(fetcher), PassThroughPolicy::default())
}

fn labels(nodes: &[Node]) -> Vec<String> {
    nodes.iter().map(Node::label).collect()
}

fn patch_panel(builder: InventoryBuilder, name: &str, fronts: &[&str]) -> InventoryBuilder {
    let mut builder = builder.device(name, Some("patch-panel")).rear_port(name, "rear1");
    for front in fronts {
        builder = builder.front_port(name, front, Some("rear1"));
    }
    builder
}

/// switch-01:eth0 -> patch-01 front1/rear1 -> server-01:eth0
fn single_patch() -> Inventory {
    patch_panel(
        Inventory::builder()
            .device("switch-01", Some("access-switch"))
            .interface("switch-01", "eth0")
            .device("server-01", Some("server"))
            .interface("server-01", "eth0"),
        "patch-01",
        &["front1"],
    )
    .cable(1, ("switch-01", "eth0"), ("patch-01", "front1"))
    .cable(2, ("patch-01", "rear1"), ("server-01", "eth0"))
    .build()
}

/// Three patch panels between the switch and the server.
fn patch_chain() -> Inventory {
    let mut builder = Inventory::builder()
        .device("switch-01", Some("access-switch"))
        .interface("switch-01", "eth0")
        .device("server-01", Some("server"))
        .interface("server-01", "eth0");
    for panel in ["patch-01", "patch-02", "patch-03"] {
        builder = patch_panel(builder, panel, &["front1"]);
    }
    builder
        .cable(1, ("switch-01", "eth0"), ("patch-01", "front1"))
        .cable(2, ("patch-01", "rear1"), ("patch-02", "rear1"))
        .cable(3, ("patch-02", "front1"), ("patch-03", "front1"))
        .cable(4, ("patch-03", "rear1"), ("server-01", "eth0"))
        .build()
}

/// Two panels whose second front ports are patched back into each other.
fn looped_panels() -> Inventory {
    let builder = Inventory::builder()
        .device("switch-01", Some("access-switch"))
        .interface("switch-01", "eth0")
        .device("server-01", Some("server"))
        .interface("server-01", "eth0");
    let builder = patch_panel(builder, "patch-01", &["front1", "front2"]);
    patch_panel(builder, "patch-02", &["front1", "front2"])
        .cable(1, ("switch-01", "eth0"), ("patch-01", "front1"))
        .cable(2, ("patch-01", "rear1"), ("patch-02", "rear1"))
        .cable(3, ("patch-02", "front1"), ("server-01", "eth0"))
        .cable(4, ("patch-02", "front2"), ("patch-01", "front2"))
        .build()
}

#[tokio::test]
async fn parallel_cables_surface_as_alternatives() {
    let tracer = tracer(
        Inventory::builder()
            .device("switch-01", None)
            .interface("switch-01", "eth0")
            .interface("switch-01", "eth1")
            .device("server-01", None)
            .interface("server-01", "eth0")
            .interface("server-01", "eth1")
            .cable(7, ("switch-01", "eth0"), ("server-01", "eth0"))
            .cable(8, ("switch-01", "eth1"), ("server-01", "eth1"))
            .build(),
    );

    let trace = tracer
        .trace_devices_paths("switch-01", "server-01", None, false, 3)
        .await
        .expect("trace");
    let cables: Vec<u64> = trace.cables().map(|e| e.cable_id).collect();
    assert_eq!(cables, vec![7]);
    assert_eq!(trace.alternatives.len(), 1);
    assert_eq!(trace.alternatives[0].hop_count, 1);
    assert_eq!(
        labels(&trace.alternatives[0].nodes),
        vec!["switch-01:eth1", "server-01:eth1"]
    );

    let single = tracer
        .trace_devices_connection("switch-01", "server-01", None, false)
        .await
        .expect("trace");
    assert!(single.alternatives.is_empty());
}

#[tokio::test]
async fn direct_cable_is_one_hop() {
    let tracer = tracer(
        Inventory::builder()
            .device("switch-01", None)
            .interface("switch-01", "eth0")
            .device("server-01", None)
            .interface("server-01", "eth0")
            .cable(7, ("switch-01", "eth0"), ("server-01", "eth0"))
            .build(),
    );

    let trace = tracer
        .trace_devices_connection("switch-01", "server-01", None, false)
        .await
        .expect("trace");
    assert!(trace.found);
    assert_eq!(trace.hop_count, 1);
    assert_eq!(labels(&trace.nodes), vec!["switch-01:eth0", "server-01:eth0"]);
    assert_eq!(trace.cables().map(|e| e.cable_id).collect::<Vec<_>>(), vec![7]);
    let meeting = trace.meeting_point.expect("meeting point");
    assert_eq!((meeting.source_hops, meeting.target_hops), (1, 0));
}

#[tokio::test]
async fn patch_panel_is_traversed_transparently() {
    let trace = tracer(single_patch())
        .trace_devices_connection("switch-01", "server-01", None, false)
        .await
        .expect("trace");
    assert!(trace.found);
    assert_eq!(trace.hop_count, 2);
    assert_eq!(
        labels(&trace.nodes),
        vec![
            "switch-01:eth0",
            "patch-01:front1",
            "patch-01:rear1",
            "server-01:eth0"
        ]
    );
    assert_eq!(trace.links.len(), trace.nodes.len() - 1);
    assert!(matches!(trace.links[1], Hop::Internal));
    assert!(trace.flagged_cables.is_empty());
}

#[tokio::test]
async fn reversed_trace_mirrors_the_path() {
    let tracer = tracer(single_patch());
    let forward = tracer
        .trace_devices_connection("switch-01", "server-01", None, false)
        .await
        .expect("forward");
    let backward = tracer
        .trace_devices_connection("server-01", "switch-01", None, false)
        .await
        .expect("backward");

    assert_eq!(forward.hop_count, backward.hop_count);
    let mut reversed = labels(&backward.nodes);
    reversed.reverse();
    assert_eq!(labels(&forward.nodes), reversed);
}

#[tokio::test]
async fn long_patch_chain_meets_in_the_middle() {
    let trace = tracer(patch_chain())
        .trace_devices_connection("switch-01", "server-01", None, false)
        .await
        .expect("trace");
    assert!(trace.found);
    assert_eq!(trace.hop_count, 4);
    assert_eq!(trace.nodes.first().map(Node::label).as_deref(), Some("switch-01:eth0"));
    assert_eq!(trace.nodes.last().map(Node::label).as_deref(), Some("server-01:eth0"));
    assert_eq!(trace.explored.rounds, 2);
}

#[tokio::test]
async fn shallow_depth_reports_depth_exceeded() {
    let trace = tracer(patch_chain())
        .trace_devices_connection("switch-01", "server-01", Some(1), false)
        .await
        .expect("trace");
    assert!(!trace.found);
    assert!(trace.depth_exceeded);
    assert_eq!(trace.reason, Some(PathReason::DepthExceeded));
}

#[tokio::test]
async fn disconnected_devices_report_no_path() {
    let trace = tracer(
        Inventory::builder()
            .device("switch-01", None)
            .interface("switch-01", "eth0")
            .device("server-01", None)
            .interface("server-01", "eth0")
            .device("a", None)
            .interface("a", "eth0")
            .device("b", None)
            .interface("b", "eth0")
            .cable(1, ("switch-01", "eth0"), ("a", "eth0"))
            .cable(2, ("server-01", "eth0"), ("b", "eth0"))
            .build(),
    )
    .trace_devices_connection("switch-01", "server-01", None, false)
    .await
    .expect("trace");
    assert!(!trace.found);
    assert!(!trace.depth_exceeded);
    assert_eq!(trace.reason, Some(PathReason::NoPath));
}

#[tokio::test]
async fn device_without_cables_reports_no_connections() {
    let trace = tracer(
        Inventory::builder()
            .device("switch-01", None)
            .interface("switch-01", "eth0")
            .device("server-01", None)
            .interface("server-01", "eth0")
            .device("lonely-01", None)
            .interface("lonely-01", "eth0")
            .cable(1, ("switch-01", "eth0"), ("server-01", "eth0"))
            .build(),
    )
    .trace_devices_connection("switch-01", "lonely-01", None, false)
    .await
    .expect("trace");
    assert!(!trace.found);
    assert_eq!(trace.reason, Some(PathReason::NoConnections));
    assert!(trace.message.unwrap_or_default().contains("lonely-01"));
}

#[tokio::test]
async fn same_device_is_a_trivial_path() {
    let trace = tracer(single_patch())
        .trace_devices_connection("switch-01", " switch-01 ", None, false)
        .await
        .expect("trace");
    assert!(trace.found);
    assert_eq!(trace.hop_count, 0);
    assert!(trace.nodes.is_empty());
}

#[tokio::test]
async fn unknown_device_is_not_found() {
    let err = tracer(single_patch())
        .trace_devices_connection("switch-01", "nope", None, false)
        .await
        .expect_err("unknown device");
    assert_eq!(err.code(), "not_found");
}

#[tokio::test]
async fn blank_names_are_rejected() {
    let err = tracer(single_patch())
        .trace_from_interface("  ", "eth0", None)
        .await
        .expect_err("blank device");
    assert!(matches!(err, TraceError::InvalidRequest(_)));
}

#[tokio::test]
async fn planned_cables_are_traversed_and_flagged() {
    let trace = tracer(
        Inventory::builder()
            .device("switch-01", None)
            .interface("switch-01", "eth0")
            .device("server-01", None)
            .interface("server-01", "eth0")
            .cable_with_status(
                3,
                ("switch-01", "eth0"),
                ("server-01", "eth0"),
                Some(CableStatus::Planned),
            )
            .build(),
    )
    .trace_devices_connection("switch-01", "server-01", None, false)
    .await
    .expect("trace");
    assert!(trace.found);
    assert_eq!(
        trace.flagged_cables.iter().map(|e| e.cable_id).collect::<Vec<_>>(),
        vec![3]
    );
}

#[tokio::test]
async fn loopback_cable_on_source_device_is_ignored() {
    let tracer = tracer(
        Inventory::builder()
            .device("switch-01", None)
            .interface("switch-01", "eth0")
            .interface("switch-01", "eth1")
            .interface("switch-01", "eth2")
            .device("server-01", None)
            .interface("server-01", "eth0")
            .cable(1, ("switch-01", "eth0"), ("switch-01", "eth1"))
            .cable(2, ("switch-01", "eth2"), ("server-01", "eth0"))
            .build(),
    );

    for via_devices in [false, true] {
        let trace = tracer
            .trace_devices_connection("switch-01", "server-01", None, via_devices)
            .await
            .expect("trace");
        assert!(trace.found, "via_devices={via_devices}");
        assert_eq!(trace.hop_count, 1);
        assert_eq!(trace.cables().map(|e| e.cable_id).collect::<Vec<_>>(), vec![2]);
    }
}

#[tokio::test]
async fn path_annotates_port_with_multiple_cables() {
    let trace = tracer(
        Inventory::builder()
            .device("switch-01", None)
            .interface("switch-01", "eth0")
            .device("spare-01", None)
            .interface("spare-01", "eth0")
            .device("server-01", None)
            .interface("server-01", "eth0")
            .cable(1, ("switch-01", "eth0"), ("spare-01", "eth0"))
            .cable(2, ("switch-01", "eth0"), ("server-01", "eth0"))
            .build(),
    )
    .trace_devices_connection("switch-01", "server-01", None, false)
    .await
    .expect("trace");

    assert!(trace.found);
    assert_eq!(trace.hop_count, 1);
    assert_eq!(trace.cables().map(|e| e.cable_id).collect::<Vec<_>>(), vec![2]);
    assert!(trace.annotations.contains(&Annotation::MultipleCables {
        cable_ids: vec![1, 2]
    }));
}

#[tokio::test]
async fn endpoint_devices_are_crossed_only_when_asked() {
    let inventory = Inventory::builder()
        .device("switch-01", None)
        .interface("switch-01", "eth0")
        .device("firewall-01", Some("firewall"))
        .interface("firewall-01", "eth0")
        .interface("firewall-01", "eth1")
        .device("server-01", None)
        .interface("server-01", "eth0")
        .cable(1, ("switch-01", "eth0"), ("firewall-01", "eth0"))
        .cable(2, ("firewall-01", "eth1"), ("server-01", "eth0"))
        .build();
    let tracer = tracer(inventory);

    let blocked = tracer
        .trace_devices_connection("switch-01", "server-01", None, false)
        .await
        .expect("trace");
    assert!(!blocked.found);

    let crossed = tracer
        .trace_devices_connection("switch-01", "server-01", None, true)
        .await
        .expect("trace");
    assert!(crossed.found);
    assert_eq!(crossed.hop_count, 2);
    assert_eq!(
        labels(&crossed.nodes),
        vec![
            "switch-01:eth0",
            "firewall-01:eth0",
            "firewall-01:eth1",
            "server-01:eth0"
        ]
    );
    assert!(matches!(crossed.links[1], Hop::Device));
}

#[tokio::test]
async fn tree_reaches_server_through_patch_panel() {
    let tree = tracer(single_patch())
        .trace_from_interface("switch-01", "eth0", None)
        .await
        .expect("tree");

    let server = tree.find("server-01:eth0").expect("server leaf");
    assert!(server.leaf);
    assert_eq!(server.depth, 2);
    assert_eq!(tree.summary.leaf_count, 1);
    assert_eq!(tree.summary.max_depth_reached, 2);
    assert_eq!(tree.summary.total_nodes, 4);
    assert_eq!(tree.summary.total_cables, 2);
    assert_eq!(tree.nested().children.len(), 1);
}

#[tokio::test]
async fn tree_annotates_unmapped_front_port() {
    let tree = tracer(
        Inventory::builder()
            .device("switch-01", None)
            .interface("switch-01", "eth1")
            .device("patch-01", Some("patch-panel"))
            .rear_port("patch-01", "rear1")
            .front_port("patch-01", "front1", Some("rear1"))
            .front_port("patch-01", "front2", None)
            .cable(1, ("switch-01", "eth1"), ("patch-01", "front2"))
            .build(),
    )
    .trace_from_interface("switch-01", "eth1", None)
    .await
    .expect("tree");

    let front2 = tree.find("patch-01:front2").expect("front2 recorded");
    assert!(front2.leaf);
    assert_eq!(
        front2.annotations,
        vec![Annotation::UnmappedPort {
            device: "patch-01".to_string(),
            port: "front2".to_string(),
        }]
    );
    assert_eq!(tree.summary.unmapped_count, 1);
}

#[tokio::test]
async fn tree_detects_patch_loops() {
    let tree = tracer(looped_panels())
        .trace_from_interface("switch-01", "eth0", None)
        .await
        .expect("tree");
    assert!(tree.summary.cycle_count >= 1);
    assert!(tree.find("server-01:eth0").is_some());
    let looped = tree.find("patch-01:front2").expect("looped front");
    assert!(looped
        .annotations
        .iter()
        .any(|a| matches!(a, Annotation::CycleDetected { .. })));
}

#[tokio::test]
async fn tree_is_reproducible() {
    let tracer = tracer(looped_panels());
    let first = tracer
        .trace_from_interface("switch-01", "eth0", None)
        .await
        .expect("tree");
    let second = tracer
        .trace_from_interface("switch-01", "eth0", None)
        .await
        .expect("tree");
    assert_eq!(first, second);
}

#[tokio::test]
async fn zero_depth_tree_is_root_only() {
    let tree = tracer(single_patch())
        .trace_from_interface("switch-01", "eth0", Some(0))
        .await
        .expect("tree");
    assert_eq!(tree.entries.len(), 1);
    assert_eq!(tree.entries[0].annotations, vec![Annotation::DepthLimit]);
    assert!(!tree.entries[0].leaf);
    assert_eq!(tree.summary.leaf_count, 0);
}

#[tokio::test]
async fn tree_reports_uncabled_start_port() {
    let tree = tracer(
        Inventory::builder()
            .device("switch-01", None)
            .interface("switch-01", "eth9")
            .build(),
    )
    .trace_from_interface("switch-01", "eth9", None)
    .await
    .expect("tree");
    assert_eq!(tree.entries.len(), 1);
    assert_eq!(tree.entries[0].annotations, vec![Annotation::NoCable]);
    assert_eq!(tree.summary.leaf_count, 0);
}

#[tokio::test]
async fn tree_reports_multiple_cables_on_one_port() {
    let tree = tracer(
        Inventory::builder()
            .device("switch-01", None)
            .interface("switch-01", "eth0")
            .device("a", None)
            .interface("a", "eth0")
            .device("b", None)
            .interface("b", "eth0")
            .cable(1, ("switch-01", "eth0"), ("a", "eth0"))
            .cable(2, ("switch-01", "eth0"), ("b", "eth0"))
            .build(),
    )
    .trace_from_interface("switch-01", "eth0", None)
    .await
    .expect("tree");
    assert_eq!(
        tree.entries[0].annotations,
        vec![Annotation::MultipleCables {
            cable_ids: vec![1, 2]
        }]
    );
    assert_eq!(tree.summary.leaf_count, 2);
}

#[tokio::test]
async fn cable_detail_lists_both_ends() {
    let cable: CableDetail = tracer(single_patch()).cable(2).await.expect("cable");
    let ends: Vec<(String, String)> = cable
        .terminations
        .iter()
        .map(|t| (t.device.clone(), t.port.clone()))
        .collect();
    assert_eq!(
        ends,
        vec![
            ("patch-01".to_string(), "rear1".to_string()),
            ("server-01".to_string(), "eth0".to_string())
        ]
    );
    assert_eq!(cable.terminations[0].front_ports, vec!["front1".to_string()]);
}

/// Delegates to a [`MemoryFetcher`] but degrades the cable lookups.
struct DegradedFetcher {
    inner: MemoryFetcher,
    failure: Failure,
}

enum Failure {
    Unavailable,
    Slow(Duration),
}

#[async_trait]
impl ConnectionFetcher for DegradedFetcher {
    async fn device(&self, name: &str) -> netbox_topology::Result<DeviceProfile> {
        self.inner.device(name).await
    }

    async fn device_by_id(&self, id: u64) -> netbox_topology::Result<DeviceProfile> {
        self.inner.device_by_id(id).await
    }

    async fn device_ports(&self, device_id: u64) -> netbox_topology::Result<Vec<Node>> {
        self.inner.device_ports(device_id).await
    }

    async fn port(&self, device: &str, name: &str) -> netbox_topology::Result<Node> {
        self.inner.port(device, name).await
    }

    async fn neighbors(&self, node: &Node) -> netbox_topology::Result<Vec<Link>> {
        match self.failure {
            Failure::Unavailable => Err(TraceError::BackendUnavailable(
                "connection refused".to_string(),
            )),
            Failure::Slow(delay) => {
                tokio::time::sleep(delay).await;
                self.inner.neighbors(node).await
            }
        }
    }

    async fn counterparts(&self, node: &Node) -> netbox_topology::Result<Vec<Node>> {
        self.inner.counterparts(node).await
    }

    async fn cable(&self, cable_id: u64) -> netbox_topology::Result<CableDetail> {
        self.inner.cable(cable_id).await
    }
}

fn degraded(failure: Failure) -> Tracer {
    let inner = MemoryFetcher::new(single_patch()).expect("valid inventory");
    Tracer::new(
        Arc::new(DegradedFetcher { inner, failure }),
        PassThroughPolicy::default(),
    )
    .with_config(TracerConfig {
        timeout: Some(Duration::from_millis(100)),
        ..TracerConfig::default()
    })
}

#[tokio::test]
async fn backend_failure_is_not_a_missing_path() {
    let err = degraded(Failure::Unavailable)
        .trace_devices_connection("switch-01", "server-01", None, false)
        .await
        .expect_err("backend down");
    assert_eq!(err.code(), "backend_unavailable");

    let err = degraded(Failure::Unavailable)
        .trace_from_interface("switch-01", "eth0", None)
        .await
        .expect_err("backend down");
    assert_eq!(err.code(), "backend_unavailable");
}

#[tokio::test(start_paused = true)]
async fn deadline_truncates_instead_of_hanging() {
    let tracer = degraded(Failure::Slow(Duration::from_secs(5)));

    let trace = tracer
        .trace_devices_connection("switch-01", "server-01", None, false)
        .await
        .expect("trace");
    assert!(!trace.found);
    assert!(trace.truncated);
    assert_eq!(trace.reason, Some(PathReason::Timeout));

    let tree = tracer
        .trace_from_interface("switch-01", "eth0", None)
        .await
        .expect("tree");
    assert!(tree.summary.truncated);
    assert_eq!(tree.entries.len(), 1);
}
