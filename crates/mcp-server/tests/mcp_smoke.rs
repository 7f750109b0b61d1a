use anyhow::{Context, Result};
use netbox_topology::Inventory;
use rmcp::{model::CallToolRequestParam, service::ServiceExt, transport::TokioChildProcess};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

fn locate_netbox_mcp_bin() -> Result<PathBuf> {
    if let Some(path) = option_env!("CARGO_BIN_EXE_netbox-mcp") {
        return Ok(PathBuf::from(path));
    }

    // `.../target/{debug|release}/deps/<test>` -> `.../target/{debug|release}/netbox-mcp`
    if let Ok(exe) = std::env::current_exe() {
        if let Some(target_profile_dir) = exe.parent().and_then(|p| p.parent()) {
            let candidate = target_profile_dir.join("netbox-mcp");
            if candidate.exists() {
                return Ok(candidate);
            }
        }
    }

    anyhow::bail!("failed to locate netbox-mcp binary")
}

fn write_snapshot(dir: &std::path::Path) -> Result<PathBuf> {
    let inventory = Inventory::builder()
        .device("switch-01", Some("access-switch"))
        .interface("switch-01", "eth0")
        .device("server-01", Some("server"))
        .interface("server-01", "eth0")
        .device("patch-01", Some("patch-panel"))
        .rear_port("patch-01", "rear1")
        .front_port("patch-01", "front1", Some("rear1"))
        .cable(1, ("switch-01", "eth0"), ("patch-01", "front1"))
        .cable(2, ("patch-01", "rear1"), ("server-01", "eth0"))
        .build();
    let path = dir.join("inventory.json");
    std::fs::write(&path, serde_json::to_vec(&inventory)?).context("write snapshot")?;
    Ok(path)
}

async fn call(
    service: &rmcp::service::RunningService<rmcp::RoleClient, ()>,
    name: &'static str,
    args: serde_json::Value,
) -> Result<rmcp::model::CallToolResult> {
    tokio::time::timeout(
        Duration::from_secs(10),
        service.call_tool(CallToolRequestParam {
            name: name.into(),
            arguments: args.as_object().cloned(),
        }),
    )
    .await
    .with_context(|| format!("timeout calling {name}"))?
    .with_context(|| format!("{name} failed"))
}

#[tokio::test]
async fn mcp_exposes_trace_tools_over_an_inventory_snapshot() -> Result<()> {
    let bin = locate_netbox_mcp_bin()?;
    let tmp = tempfile::tempdir().context("tempdir")?;
    let snapshot = write_snapshot(tmp.path())?;

    let mut cmd = Command::new(bin);
    cmd.env("NETBOX_INVENTORY", &snapshot);
    cmd.env_remove("NETBOX_URL");
    cmd.env_remove("NETBOX_API_TOKEN");
    cmd.env_remove("NETBOX_MCP_CONFIG");
    cmd.env("RUST_LOG", "warn");

    let transport = TokioChildProcess::new(cmd).context("spawn mcp server")?;
    let service = tokio::time::timeout(Duration::from_secs(10), ().serve(transport))
        .await
        .context("timeout starting MCP server")??;

    let tools = tokio::time::timeout(
        Duration::from_secs(10),
        service.list_tools(Default::default()),
    )
    .await
    .context("timeout listing tools")??;
    let tool_names: HashSet<&str> = tools.tools.iter().map(|t| t.name.as_ref()).collect();
    for expected in [
        "capabilities",
        "trace_devices_connection",
        "trace_from_interface",
        "get_cable",
    ] {
        assert!(
            tool_names.contains(expected),
            "missing tool '{expected}' (available: {tool_names:?})"
        );
    }

    let path = call(
        &service,
        "trace_devices_connection",
        serde_json::json!({"source_device": "switch-01", "target_device": "server-01"}),
    )
    .await?;
    assert_ne!(path.is_error, Some(true), "path trace returned error");
    let structured = path
        .structured_content
        .context("path trace missing structured_content")?;
    assert_eq!(structured["found"], true);
    assert_eq!(structured["hop_count"], 2);

    let tree = call(
        &service,
        "trace_from_interface",
        serde_json::json!({"device_name": "server-01", "interface_name": "eth0", "max_depth": 4}),
    )
    .await?;
    assert_ne!(tree.is_error, Some(true), "tree trace returned error");
    let tree_text = tree
        .content
        .first()
        .and_then(|c| c.as_text())
        .map(|t| t.text.as_str())
        .context("tree trace missing text output")?;
    assert!(
        tree_text.contains("switch-01:eth0"),
        "expected the far end in the tree output"
    );

    let missing = call(
        &service,
        "trace_from_interface",
        serde_json::json!({"device_name": "server-01", "interface_name": "eth9"}),
    )
    .await?;
    assert_eq!(missing.is_error, Some(true));
    let error = missing
        .structured_content
        .context("error missing structured_content")?;
    assert_eq!(error["error"]["code"], "not_found");

    let cable = call(&service, "get_cable", serde_json::json!({"cable_id": 2})).await?;
    assert_ne!(cable.is_error, Some(true), "get_cable returned error");

    service.cancel().await.context("shutdown mcp service")?;
    Ok(())
}
