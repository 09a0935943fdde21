//! Configuration loading and management

use crate::core::error::{ConfigError, ProcessResult};
use crate::table::{ActionSet, CloudProperty, Layout};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Process run by `download` when a table does not name its own
pub const DEFAULT_DOWNLOAD_PROCESS: &str = "fs.system.Download";

/// Configuration for one table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Table identifier (argument 0 of every request)
    pub id: String,

    /// Display name, defaults to the id
    #[serde(default)]
    pub name: Option<String>,

    /// Model the CRUD actions bind to when they name no process
    #[serde(default)]
    pub bind: Option<String>,

    /// Layout, must include the primary key column
    pub layout: Layout,

    /// Action handlers
    #[serde(default)]
    pub action: ActionSet,

    /// Cloud properties (extension points)
    #[serde(default)]
    pub cloud_props: Vec<CloudProperty>,
}

/// Download policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// File extensions (without the dot) that may be downloaded
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Process used when a table has no download process of its own
    #[serde(default = "default_download_process")]
    pub default_process: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
            default_process: default_download_process(),
        }
    }
}

fn default_allowed_extensions() -> Vec<String> {
    [
        "png", "jpg", "jpeg", "gif", "bmp", "webp", "svg", "ico", "pdf", "doc", "docx", "xls",
        "xlsx", "ppt", "pptx", "txt", "csv", "md", "zip", "mp3", "mp4", "wav", "mov",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_download_process() -> String {
    DEFAULT_DOWNLOAD_PROCESS.to_string()
}

/// Complete configuration: tables plus shared policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TablesConfig {
    /// Prefix for registered operation names (e.g. `widgets.table`)
    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

impl TablesConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> ProcessResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.to_string()),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> ProcessResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject empty identifiers and duplicate names
    pub fn validate(&self) -> ProcessResult<()> {
        let mut ids = HashSet::new();
        for table in &self.tables {
            if table.id.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "id".to_string(),
                    value: String::new(),
                    message: "table id cannot be empty".to_string(),
                }
                .into());
            }
            if table.layout.primary.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("{}.layout.primary", table.id),
                    value: String::new(),
                    message: "primary key column is required".to_string(),
                }
                .into());
            }
            if !ids.insert(table.id.as_str()) {
                return Err(ConfigError::Duplicate {
                    kind: "table".to_string(),
                    name: table.id.clone(),
                }
                .into());
            }

            let mut keys = HashSet::new();
            for prop in &table.cloud_props {
                let key = prop.key();
                if !keys.insert(key.clone()) {
                    return Err(ConfigError::Duplicate {
                        kind: format!("cloud property in table '{}'", table.id),
                        name: key,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}
