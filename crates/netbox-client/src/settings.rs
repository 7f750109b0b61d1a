//! Layered settings: built-in defaults, an optional TOML file, then environment variables.

use crate::error::{ClientError, Result};
use netbox_topology::{PassThroughPolicy, TracerConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "NETBOX_MCP_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetBoxSettings {
    pub url: Option<String>,
    pub token: Option<String>,
    pub page_size: usize,
    pub request_timeout_ms: u64,
}

impl Default for NetBoxSettings {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            page_size: 200,
            request_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceSettings {
    pub path_max_depth: usize,
    pub tree_max_depth: usize,
    /// `0` disables the per-trace deadline
    pub timeout_ms: u64,
    pub workers: usize,
    pub pass_through_roles: Vec<String>,
    pub pass_through_device_types: Vec<String>,
    pub transparent_ports: bool,
}

impl Default for TraceSettings {
    fn default() -> Self {
        let tracer = TracerConfig::default();
        Self {
            path_max_depth: tracer.path_max_depth,
            tree_max_depth: tracer.tree_max_depth,
            timeout_ms: tracer
                .timeout
                .map_or(0, |t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX)),
            workers: tracer.workers,
            pass_through_roles: vec!["patch-panel".to_string()],
            pass_through_device_types: Vec::new(),
            transparent_ports: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceSettings {
    pub enabled: bool,
    pub refresh_interval_hours: u64,
}

impl Default for ReferenceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            refresh_interval_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub netbox: NetBoxSettings,
    /// Offline inventory snapshot; takes precedence over the live API.
    pub inventory: Option<PathBuf>,
    pub trace: TraceSettings,
    pub reference: ReferenceSettings,
}

impl Settings {
    /// Resolve settings from `config` (or `NETBOX_MCP_CONFIG`) and the process environment.
    pub fn load(config: Option<&Path>) -> Result<Self> {
        Self::load_with(config, |key| std::env::var(key).ok())
    }

    pub fn load_with(config: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config = config
            .map(Path::to_path_buf)
            .or_else(|| env(CONFIG_ENV).filter(|v| !v.trim().is_empty()).map(PathBuf::from));
        let mut settings = match config {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        settings.apply_env(env)?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&raw)
            .map_err(|e| ClientError::Config(format!("failed to parse {}: {e}", path.display())))
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = var("NETBOX_URL") {
            self.netbox.url = Some(url);
        }
        if let Some(token) = var("NETBOX_API_TOKEN") {
            self.netbox.token = Some(token);
        }
        if let Some(path) = var("NETBOX_INVENTORY") {
            self.inventory = Some(PathBuf::from(path));
        }
        if let Some(depth) = parse_var(&var, "NETBOX_MCP_MAX_DEPTH")? {
            self.trace.path_max_depth = depth;
            self.trace.tree_max_depth = depth;
        }
        if let Some(timeout) = parse_var(&var, "NETBOX_MCP_TRACE_TIMEOUT_MS")? {
            self.trace.timeout_ms = timeout;
        }
        if let Some(workers) = parse_var::<usize>(&var, "NETBOX_MCP_WORKERS")? {
            self.trace.workers = workers.max(1);
        }
        if let Some(roles) = var("NETBOX_MCP_PASS_THROUGH_ROLES") {
            self.trace.pass_through_roles = split_list(&roles);
        }
        if let Some(transparent) = var("NETBOX_MCP_TRANSPARENT_PORTS") {
            self.trace.transparent_ports = parse_bool("NETBOX_MCP_TRANSPARENT_PORTS", &transparent)?;
        }
        if let Some(hours) = parse_var(&var, "NETBOX_RESOURCE_UPDATE_INTERVAL_HOURS")? {
            self.reference.refresh_interval_hours = hours;
        }
        if let Some(page_size) = parse_var::<usize>(&var, "NETBOX_PAGE_SIZE")? {
            self.netbox.page_size = page_size.max(1);
        }
        if let Some(timeout) = parse_var(&var, "NETBOX_REQUEST_TIMEOUT_MS")? {
            self.netbox.request_timeout_ms = timeout;
        }
        Ok(())
    }

    /// Variables that must be set before the live API can be used.
    pub fn missing_backend(&self) -> Vec<&'static str> {
        if self.inventory.is_some() {
            return Vec::new();
        }
        let mut missing = Vec::new();
        if self.netbox.url.is_none() {
            missing.push("NETBOX_URL");
        }
        if self.netbox.token.is_none() {
            missing.push("NETBOX_API_TOKEN");
        }
        missing
    }

    pub fn tracer_config(&self) -> TracerConfig {
        TracerConfig {
            path_max_depth: self.trace.path_max_depth,
            tree_max_depth: self.trace.tree_max_depth,
            timeout: (self.trace.timeout_ms > 0).then(|| Duration::from_millis(self.trace.timeout_ms)),
            workers: self.trace.workers.max(1),
        }
    }

    pub fn policy(&self) -> PassThroughPolicy {
        PassThroughPolicy {
            roles: self.trace.pass_through_roles.iter().cloned().collect::<BTreeSet<_>>(),
            device_types: self
                .trace
                .pass_through_device_types
                .iter()
                .cloned()
                .collect(),
            port_kinds_transparent: self.trace.transparent_ports,
        }
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.reference.enabled && self.reference.refresh_interval_hours > 0)
            .then(|| Duration::from_secs(self.reference.refresh_interval_hours * 3600))
    }
}

fn parse_var<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    var(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| ClientError::Config(format!("{key} must be a number, got '{raw}'")))
        })
        .transpose()
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ClientError::Config(format!("{key} must be a boolean, got '{raw}'"))),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
