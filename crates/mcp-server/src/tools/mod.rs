//! NetBox topology MCP tool surface.
//!
//! Schemas, dispatch and rendering live in separate submodules; the tracing itself is done by
//! `netbox_topology::Tracer`.

pub(crate) mod catalog;
mod context_doc;
mod dispatch;
mod schemas;

pub use dispatch::NetBoxTopologyService;
