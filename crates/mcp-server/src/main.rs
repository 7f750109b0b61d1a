//! NetBox Topology MCP Server
//!
//! Traces physical cable paths through NetBox for AI agents via MCP protocol.
//!
//! ## Tools
//!
//! - `trace_devices_connection` - Shortest cable path between two devices
//! - `trace_from_interface` - Everything physically reachable from one interface
//! - `get_cable` - Full record of one cable, with patch-panel pairings
//! - `capabilities` - Backend in use and the trace defaults
//!
//! ## Usage
//!
//! Add to your MCP client configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "netbox-topology": {
//!       "command": "netbox-mcp",
//!       "env": {
//!         "NETBOX_URL": "https://netbox.example.com",
//!         "NETBOX_API_TOKEN": "..."
//!       }
//!     }
//!   }
//! }
//! ```

use anyhow::{Context, Result};
use netbox_client::{Backend, Settings};
use rmcp::transport::stdio;
use rmcp::ServiceExt;

mod tools;

use tools::NetBoxTopologyService;

#[tokio::main]
async fn main() -> Result<()> {
    // Configure logging to stderr only (stdout is for MCP protocol)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    log::info!("Starting NetBox topology MCP server");

    let settings = Settings::load(None).context("failed to load settings")?;
    let backend = Backend::from_settings(&settings).context("failed to initialise backend")?;
    let refresh = backend.spawn_reference_refresh(&settings);

    let service = NetBoxTopologyService::new(backend.tracer(&settings), backend.kind, &settings);
    let server = service.serve(stdio()).await?;

    // Wait for shutdown
    server.waiting().await?;

    if let Some(refresh) = refresh {
        refresh.abort();
    }
    log::info!("NetBox topology MCP server stopped");
    Ok(())
}
