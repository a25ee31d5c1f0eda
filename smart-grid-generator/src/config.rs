use serde::Deserialize;
use smart_grid_client::{FileSystem, ObjectStoreFileSystem, StoreError};
use std::{fmt, fs, path::PathBuf, sync::Arc};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Inclusive integer range, e.g. `{ first = 98001, last = 98100 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RangeConfig {
    pub first: u32,
    pub last: u32,
}

impl RangeConfig {
    pub fn values(&self) -> Vec<u32> {
        (self.first..=self.last).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParamsConfig {
    #[serde(default = "default_zip_codes")]
    pub zip_codes: RangeConfig,
    #[serde(default = "default_meter_ids")]
    pub meter_ids: RangeConfig,
    /// Number of zip codes per batch. The name suggests a batch count, but
    /// the value has always been used as the batch size.
    pub num_of_batches: usize,
    /// Readings generated per zip code in a batch.
    pub num_of_meter_reading: usize,
    /// Upper bound, in seconds, of the random delay before each batch starts.
    pub max_sleep_timer: u64,
}

fn default_zip_codes() -> RangeConfig {
    RangeConfig { first: 98001, last: 98100 }
}

fn default_meter_ids() -> RangeConfig {
    RangeConfig { first: 1, last: 4 }
}

impl ParamsConfig {
    pub fn zip_codes(&self) -> Vec<String> {
        self.zip_codes.values().into_iter().map(|z| z.to_string()).collect()
    }

    pub fn meter_ids(&self) -> Vec<u32> {
        self.meter_ids.values()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Azure,
    Local,
    Memory,
}

#[derive(Clone, Deserialize)]
pub struct DataLakeConfig {
    #[serde(default)]
    pub kind: StoreKind,
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub container: String,
    /// Folder inside the container that receives the batch files.
    #[serde(default)]
    pub folder: String,
    pub local_root: Option<PathBuf>,
}

impl fmt::Debug for DataLakeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let access_key = if self.access_key.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("DataLakeConfig")
            .field("kind", &self.kind)
            .field("account_name", &self.account_name)
            .field("access_key", &access_key)
            .field("container", &self.container)
            .field("folder", &self.folder)
            .field("local_root", &self.local_root)
            .finish()
    }
}

impl DataLakeConfig {
    /// Build the store handle shared by every batch of the run.
    pub fn connect(&self) -> Result<Arc<dyn FileSystem>, StoreError> {
        let fs = match self.kind {
            StoreKind::Azure => {
                ObjectStoreFileSystem::azure(&self.account_name, &self.access_key, &self.container)?
            }
            StoreKind::Local => {
                let root = self
                    .local_root
                    .as_ref()
                    .ok_or_else(|| StoreError::Connect("data_lake.local_root is not set".to_string()))?;
                ObjectStoreFileSystem::local(root)?
            }
            StoreKind::Memory => ObjectStoreFileSystem::in_memory(),
        };
        Ok(Arc::new(fs))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub params: ParamsConfig,
    pub data_lake: DataLakeConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        use std::env;

        let path = env::var("SMART_GRID_CONFIG").unwrap_or_else(|_| "smart-grid-config.toml".to_string());
        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read { path, source })?;

        let mut cfg: AppConfig = toml::from_str(&contents)?;
        if let Ok(key) = env::var("DATA_LAKE_ACCESS_KEY") {
            cfg.data_lake.access_key = key;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.params;
        if p.num_of_batches == 0 {
            return Err(ConfigError::Invalid("params.num_of_batches must be at least 1".to_string()));
        }
        if p.num_of_meter_reading == 0 {
            return Err(ConfigError::Invalid("params.num_of_meter_reading must be at least 1".to_string()));
        }
        if p.max_sleep_timer == 0 {
            return Err(ConfigError::Invalid("params.max_sleep_timer must be at least 1".to_string()));
        }
        for (name, range) in [("zip_codes", p.zip_codes), ("meter_ids", p.meter_ids)] {
            if range.first > range.last {
                return Err(ConfigError::Invalid(format!(
                    "params.{name}: first ({}) is greater than last ({})",
                    range.first, range.last
                )));
            }
        }

        let dl = &self.data_lake;
        match dl.kind {
            StoreKind::Azure => {
                for (name, value) in [
                    ("account_name", &dl.account_name),
                    ("access_key", &dl.access_key),
                    ("container", &dl.container),
                ] {
                    if value.trim().is_empty() {
                        return Err(ConfigError::Invalid(format!("data_lake.{name} is required for azure")));
                    }
                }
            }
            StoreKind::Local if dl.local_root.is_none() => {
                return Err(ConfigError::Invalid("data_lake.local_root is required for local".to_string()));
            }
            StoreKind::Local | StoreKind::Memory => {}
        }

        Ok(())
    }
}
