use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub executor: ExecutorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Path to the YAML file mapping alert identifiers to commands.
    /// The file is re-read on every request, so it may be edited (or
    /// created) while the service is running.
    pub mapping_path: PathBuf,
    pub command_timeout_secs: u64,
}

impl Config {
    pub fn load() -> crate::Result<Self> {
        // Load environment variables from .env file if it exists
        let _ = dotenvy::dotenv();

        let config = Config {
            server: ServerConfig {
                addr: std::env::var("SERVER_ADDR")
                    .unwrap_or_else(|_| "0.0.0.0:9999".to_string()),
            },
            executor: ExecutorConfig {
                mapping_path: std::env::var("ALERTS_CONFIG_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("alerts_config.yaml")),
                command_timeout_secs: std::env::var("COMMAND_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            },
        };

        if config.executor.command_timeout_secs == 0 {
            return Err(crate::Error::Config(
                "COMMAND_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        // A missing mapping file is not a startup failure: individual
        // requests report it instead, and the operator can drop the
        // file in later.
        if !config.executor.mapping_path.exists() {
            tracing::warn!(
                "Mapping file {} does not exist yet; alerts will fail until it is created",
                config.executor.mapping_path.display()
            );
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                addr: "0.0.0.0:9999".to_string(),
            },
            executor: ExecutorConfig {
                mapping_path: PathBuf::from("alerts_config.yaml"),
                command_timeout_secs: 60,
            },
        }
    }
}
