//! Configuration schema for Waypoint.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use waypoint_rs_protocol::{Domain, ListOrder};

/// Root config for the Waypoint servers.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WaypointConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl WaypointConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> WaypointConfigBuilder {
        WaypointConfigBuilder::new()
    }
}

/// Builder for assembling a `WaypointConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct WaypointConfigBuilder {
    config: WaypointConfig,
}

impl WaypointConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the storage root that holds every domain directory.
    pub fn storage_root(mut self, root: impl Into<String>) -> Self {
        self.config.storage.root = root.into();
        self
    }

    /// Override the directory name used for one domain.
    pub fn directory(mut self, domain: Domain, directory: impl Into<String>) -> Self {
        self.config
            .storage
            .directories
            .insert(domain.tag().to_string(), directory.into());
        self
    }

    /// Replace the search defaults.
    pub fn search(mut self, search: SearchConfig) -> Self {
        self.config.search = search;
        self
    }

    /// Replace the global tool configuration.
    pub fn tools(mut self, tools: ToolsConfig) -> Self {
        self.config.tools = tools;
        self
    }

    /// Finalize and return the built `WaypointConfig`.
    pub fn build(self) -> WaypointConfig {
        self.config
    }
}

/// Durable storage layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory; each domain namespace lives in a child directory.
    #[serde(default = "default_storage_root")]
    pub root: String,
    /// Directory name overrides keyed by domain tag.
    #[serde(default)]
    pub directories: BTreeMap<String, String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            directories: BTreeMap::new(),
        }
    }
}

impl StorageConfig {
    /// Storage root as a path.
    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(&self.root)
    }

    /// Directory name for a domain, honoring overrides.
    pub fn directory_for(&self, domain: Domain) -> &str {
        self.directories
            .get(domain.tag())
            .map(String::as_str)
            .unwrap_or_else(|| domain.default_directory())
    }
}

fn default_storage_root() -> String {
    ".".to_string()
}

/// Search defaults shared by every domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Items kept per result list when the request does not set `max_results`.
    #[serde(default = "default_max_results")]
    pub default_max_results: usize,
    /// Default order for search listings.
    #[serde(default)]
    pub list_order: ListOrder,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_max_results: default_max_results(),
            list_order: ListOrder::default(),
        }
    }
}

fn default_max_results() -> usize {
    20
}

/// Global tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolsConfig {
    #[serde(default)]
    pub output_policy: ToolOutputPolicyConfig,
}

/// Output policy for tool results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutputPolicyConfig {
    #[serde(default = "default_max_string_bytes")]
    pub max_string_bytes: usize,
    #[serde(default = "default_max_array_len")]
    pub max_array_len: usize,
    #[serde(default = "default_max_object_entries")]
    pub max_object_entries: usize,
    #[serde(default)]
    pub redact_keys: Vec<String>,
    #[serde(default)]
    pub redact_values: Vec<String>,
    #[serde(default = "default_redaction_replacement")]
    pub replacement: String,
}

impl Default for ToolOutputPolicyConfig {
    fn default() -> Self {
        Self {
            max_string_bytes: default_max_string_bytes(),
            max_array_len: default_max_array_len(),
            max_object_entries: default_max_object_entries(),
            redact_keys: Vec::new(),
            redact_values: Vec::new(),
            replacement: default_redaction_replacement(),
        }
    }
}

/// Default maximum string size for tool output in bytes.
fn default_max_string_bytes() -> usize {
    32 * 1024
}

/// Record details can be long; arrays are capped well above `max_results`.
fn default_max_array_len() -> usize {
    256
}

fn default_max_object_entries() -> usize {
    256
}

/// Default replacement marker for redacted fields.
fn default_redaction_replacement() -> String {
    "[REDACTED]".to_string()
}
