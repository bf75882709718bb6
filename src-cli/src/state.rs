use anyhow::Context;
use bridge_config::{BridgeConfig, ConfigManager};
use bridge_schema::SchemaRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct CliState {
    pub(crate) config: BridgeConfig,
    pub(crate) schema_dir: PathBuf,
    /// Set when this run created the config file; logged once tracing is up.
    pub(crate) created_config: Option<PathBuf>,
}

impl CliState {
    pub fn initialize(config_dir: Option<&Path>, schema_dir: Option<&Path>) -> anyhow::Result<Self> {
        let config_manager = match config_dir {
            Some(dir) => ConfigManager::with_dir(dir),
            None => ConfigManager::new(),
        }
        .context("initialize config manager")?;
        let config = config_manager.load().context("load bridge config")?;

        let schema_dir = match schema_dir {
            Some(dir) => dir.to_path_buf(),
            None => config_manager.schema_dir(&config),
        };

        let created_config = config_manager
            .wrote_default()
            .then(|| config_manager.config_path().to_path_buf());

        Ok(Self {
            config,
            schema_dir,
            created_config,
        })
    }

    pub fn load_registry(&self) -> anyhow::Result<Arc<SchemaRegistry>> {
        let registry = SchemaRegistry::from_dir(&self.schema_dir)
            .with_context(|| format!("load schema from {}", self.schema_dir.display()))?;
        Ok(Arc::new(registry))
    }
}
