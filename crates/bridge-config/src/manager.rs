use crate::{BridgeConfig, ConfigError};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

const ORG: &str = "io";
const AUTHOR: &str = "AegisInbox";
const APP: &str = "FacadeBridge";

#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
    config_path: PathBuf,
    wrote_default: bool,
}

impl ConfigManager {
    pub fn new() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from(ORG, AUTHOR, APP).ok_or(ConfigError::MissingDirectories)?;
        Self::with_dir(dirs.config_dir())
    }

    /// Uses `config_dir` directly instead of the per-user project directory.
    pub fn with_dir(config_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref().to_path_buf();
        fs::create_dir_all(&config_dir)?;

        let config_path = config_dir.join("config.toml");
        let wrote_default = !config_path.exists();
        if wrote_default {
            let initial = BridgeConfig::default();
            let content = toml::to_string_pretty(&initial)?;
            fs::write(&config_path, content)?;
            tracing::info!(path = %config_path.display(), "wrote default bridge config");
        }

        Ok(Self {
            config_dir,
            config_path,
            wrote_default,
        })
    }

    pub fn load(&self) -> Result<BridgeConfig, ConfigError> {
        let content = fs::read_to_string(&self.config_path)?;
        let config: BridgeConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &BridgeConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content)?;
        Ok(())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// True when this manager created `config.toml` with defaults.
    pub fn wrote_default(&self) -> bool {
        self.wrote_default
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn schema_dir(&self, config: &BridgeConfig) -> PathBuf {
        if config.schema.dir.is_absolute() {
            config.schema.dir.clone()
        } else {
            self.config_dir.join(&config.schema.dir)
        }
    }
}
