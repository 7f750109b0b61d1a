use super::router;
use super::NetBoxTopologyService;
use crate::tools::catalog;
use netbox_client::{BackendKind, Settings};
use netbox_topology::Tracer;
use rmcp::model::{Implementation, ServerCapabilities, ServerInfo};
use rmcp::{tool_handler, ServerHandler};

impl NetBoxTopologyService {
    pub fn new(tracer: Tracer, backend: BackendKind, settings: &Settings) -> Self {
        Self {
            tracer,
            backend,
            pass_through_roles: settings.trace.pass_through_roles.clone(),
            tool_router: router::build_tool_router(),
        }
    }

    pub(in crate::tools::dispatch) fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    pub(in crate::tools::dispatch) fn backend(&self) -> BackendKind {
        self.backend
    }

    pub(in crate::tools::dispatch) fn pass_through_roles(&self) -> &[String] {
        &self.pass_through_roles
    }
}

#[tool_handler]
impl ServerHandler for NetBoxTopologyService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(catalog::tool_instructions()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }
}
