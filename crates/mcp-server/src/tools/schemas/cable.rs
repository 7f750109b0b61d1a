use rmcp::schemars;
use serde::Deserialize;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetCableRequest {
    #[schemars(description = "NetBox cable id (as reported in trace results)")]
    pub cable_id: u64,
}
