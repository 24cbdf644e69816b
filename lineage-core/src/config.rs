use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// ## Structure
///
/// ```text
/// LineageConfig
///   ├── store: StoreConfig
///   │   ├── group_padding: f64              (40)
///   │   ├── default_node_width: f64         (150)
///   │   ├── default_node_height: f64        (50)
///   │   ├── canvas_width: f64               (400)
///   │   ├── canvas_height: f64              (400)
///   │   ├── prune_dangling_edges: bool      (false)
///   │   └── rng_seed: Option<u64>
///   └── storage: StorageConfig
///       ├── backend: StorageBackend         (file)
///       ├── data_dir: PathBuf               (".lineage")
///       └── database: String                ("lineage.db")
/// ```
///
/// Every field has a default, so an empty YAML document is a valid config.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct LineageConfig {
    pub store: StoreConfig,
    pub storage: StorageConfig,
}

impl LineageConfig {
    /// Load from a YAML file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Tuning knobs for `GraphStore`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Space left around members when a group is created.
    pub group_padding: f64,
    /// Width assumed for a node with no measured size when grouping.
    pub default_node_width: f64,
    /// Height assumed for a node with no measured size when grouping.
    pub default_node_height: f64,
    /// New nodes are placed at random inside `[0, canvas_width) x [0, canvas_height)`.
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// Also drop edges whose endpoint was deleted by `delete_selected`.
    pub prune_dangling_edges: bool,
    /// Fixed seed for initial node placement; random when unset.
    pub rng_seed: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            group_padding: 40.0,
            default_node_width: 150.0,
            default_node_height: 50.0,
            canvas_width: 400.0,
            canvas_height: 400.0,
            prune_dangling_edges: false,
            rng_seed: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Memory,
    #[default]
    File,
    Database,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory holding `nodes.json` and `edges.json` for the file backend.
    pub data_dir: PathBuf,
    /// SQLite path for the database backend; `:memory:` is accepted.
    pub database: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            data_dir: PathBuf::from(".lineage"),
            database: "lineage.db".to_string(),
        }
    }
}
