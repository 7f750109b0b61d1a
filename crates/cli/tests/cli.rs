use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

const SNAPSHOT: &str = r#"{
    "devices": [
        {"name": "switch-01", "role": "access-switch"},
        {"name": "patch-01", "role": "patch-panel"},
        {"name": "server-01", "role": "server"},
        {"name": "lonely-01"}
    ],
    "ports": [
        {"device": "switch-01", "name": "eth0"},
        {"device": "patch-01", "name": "rear1", "kind": "rear_port"},
        {"device": "patch-01", "name": "front1", "kind": "front_port", "rear_port": "rear1"},
        {"device": "server-01", "name": "eth0"},
        {"device": "lonely-01", "name": "eth0"}
    ],
    "cables": [
        {"id": 1, "status": "connected",
         "a": [{"device": "switch-01", "port": "eth0"}],
         "b": [{"device": "patch-01", "port": "front1"}]},
        {"id": 2, "status": "planned",
         "a": [{"device": "patch-01", "port": "rear1"}],
         "b": [{"device": "server-01", "port": "eth0"}]}
    ]
}"#;

fn setup_inventory() -> tempfile::TempDir {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("inventory.json"), SNAPSHOT).unwrap();
    temp
}

#[allow(deprecated)]
fn netbox_trace(temp: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("netbox-trace").expect("binary");
    cmd.env_remove("NETBOX_URL")
        .env_remove("NETBOX_API_TOKEN")
        .env_remove("NETBOX_MCP_CONFIG")
        .env_remove("NETBOX_INVENTORY")
        .arg("--inventory")
        .arg(temp.path().join("inventory.json"));
    cmd
}

fn run_json(cmd: &mut Command) -> (bool, Value) {
    let output = cmd.output().expect("command run");
    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    (output.status.success(), body)
}

#[test]
fn devices_prints_the_path_with_flagged_cables() {
    let temp = setup_inventory();
    let (ok, body) = run_json(netbox_trace(&temp).args(["devices", "switch-01", "server-01"]));
    assert!(ok, "{body}");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["result"]["found"], true);
    assert_eq!(body["result"]["hop_count"], 2);
    assert_eq!(body["result"]["flagged_cables"][0]["cable_id"], 2);
}

#[test]
fn devices_without_cables_report_no_connections() {
    let temp = setup_inventory();
    let (ok, body) = run_json(netbox_trace(&temp).args(["devices", "switch-01", "lonely-01"]));
    assert!(ok, "{body}");
    assert_eq!(body["result"]["found"], false);
    assert_eq!(body["result"]["reason"], "no_connections");
}

#[test]
fn interface_prints_the_tree() {
    let temp = setup_inventory();
    let (ok, body) = run_json(netbox_trace(&temp).args(["interface", "switch-01", "eth0"]));
    assert!(ok, "{body}");
    assert_eq!(body["result"]["summary"]["total_cables"], 2);
    assert_eq!(body["result"]["summary"]["leaf_count"], 1);
}

#[test]
fn unknown_device_exits_non_zero_with_an_envelope() {
    let temp = setup_inventory();
    let (ok, body) = run_json(netbox_trace(&temp).args(["interface", "core-99", "eth0"]));
    assert!(!ok);
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"]["code"], "not_found");
}

#[test]
fn mermaid_format_prints_a_flowchart() {
    let temp = setup_inventory();
    netbox_trace(&temp)
        .args(["--format", "mermaid", "interface", "switch-01", "eth0"])
        .assert()
        .success()
        .stdout(predicates::str::starts_with("graph TD"))
        .stdout(predicates::str::contains("#2 ?"));
}

#[test]
fn cable_lists_terminations() {
    let temp = setup_inventory();
    let (ok, body) = run_json(netbox_trace(&temp).args(["cable", "1"]));
    assert!(ok, "{body}");
    assert_eq!(body["result"]["terminations"][1]["rear_port"], "rear1");
}

#[test]
#[allow(deprecated)]
fn missing_configuration_is_reported_per_trace() {
    Command::cargo_bin("netbox-trace")
        .expect("binary")
        .env_remove("NETBOX_URL")
        .env_remove("NETBOX_API_TOKEN")
        .env_remove("NETBOX_MCP_CONFIG")
        .env_remove("NETBOX_INVENTORY")
        .args(["cable", "1"])
        .assert()
        .failure()
        .stdout(predicates::str::contains("backend_unavailable"))
        .stdout(predicates::str::contains("NETBOX_URL"));
}
