//! Data sources for the topology tracer: the live NetBox REST API, offline inventory snapshots,
//! and the settings that choose between them.

mod api;
mod backend;
mod error;
mod fetcher;
mod reference;
mod settings;
mod wire;

pub use api::NetBoxClient;
pub use backend::{load_inventory, Backend, BackendKind};
pub use error::{ClientError, Result};
pub use fetcher::NetBoxFetcher;
pub use reference::{DeviceTypeInfo, ReferenceCache, ReferenceData, RoleInfo};
pub use settings::{NetBoxSettings, ReferenceSettings, Settings, TraceSettings, CONFIG_ENV};
