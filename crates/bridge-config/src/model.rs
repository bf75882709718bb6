use crate::ConfigError;
use bridge_core::Role;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeConfig {
    pub version: u32,
    /// Role this process plays on the bridge, e.g. `desktop` or `web`.
    pub role: Role,
    pub schema: SchemaConfig,
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemaConfig {
    /// Directory of facade/struct documents. Relative paths resolve against the config dir.
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchConfig {
    pub max_in_flight: usize,
    pub call_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            version: 1,
            role: Role::new("desktop"),
            schema: SchemaConfig {
                dir: PathBuf::from("ipc-schema"),
            },
            dispatch: DispatchConfig {
                max_in_flight: 64,
                call_timeout_secs: 30,
            },
            logging: LoggingConfig::default(),
        }
    }
}

impl BridgeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let role = self.role.as_str();
        if role.trim().is_empty() {
            return Err(ConfigError::Invalid("role must not be empty".to_string()));
        }
        if role.trim() != role {
            return Err(ConfigError::Invalid(format!(
                "role `{role}` has leading or trailing whitespace"
            )));
        }
        if self.dispatch.max_in_flight == 0 {
            return Err(ConfigError::Invalid(
                "dispatch.max_in_flight must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
