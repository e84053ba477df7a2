//! Alert-to-command mapping.
//!
//! The mapping document associates alert identifiers with one or more
//! shell command strings:
//!
//! ```yaml
//! alert:
//!   - "42":
//!       command: "echo ok"
//!   - "disk-full":
//!       command:
//!         - "df -h"
//!         - "journalctl -n 50"
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum MappingError {
    /// The mapping source is missing or unreadable. Reported per
    /// alert; the service keeps running.
    #[error("Configuration file not found")]
    Unavailable,
    /// The mapping source exists but does not parse into the expected
    /// shape. This is a deployment bug and fails the request.
    #[error("Invalid mapping file: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct MappingFile {
    #[serde(default)]
    pub alert: Vec<HashMap<String, AlertEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct AlertEntry {
    pub command: CommandSpec,
}

/// A single command string or an ordered list of them. A scalar is
/// indistinguishable from a one-element list downstream.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CommandSpec {
    One(String),
    Many(Vec<String>),
}

impl CommandSpec {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            CommandSpec::One(command) => vec![command],
            CommandSpec::Many(commands) => commands,
        }
    }

    /// An empty scalar or an empty list configures nothing to run.
    pub fn is_empty(&self) -> bool {
        match self {
            CommandSpec::One(command) => command.is_empty(),
            CommandSpec::Many(commands) => commands.is_empty(),
        }
    }
}

impl MappingFile {
    /// First entry carrying the identifier wins; later duplicates are
    /// dead. An entry with an empty command is treated as a miss, the
    /// same as no entry at all.
    pub fn commands_for(&self, alert_id: &str) -> Option<Vec<String>> {
        self.alert
            .iter()
            .find_map(|entry| entry.get(alert_id))
            .filter(|entry| !entry.command.is_empty())
            .map(|entry| entry.command.clone().into_vec())
    }
}

#[async_trait]
pub trait MappingSource: Send + Sync {
    /// Looks up the commands configured for `alert_id`. `Ok(None)` is
    /// a legitimate outcome (nothing configured), not an error.
    async fn resolve(&self, alert_id: &str) -> Result<Option<Vec<String>>, MappingError>;
}

/// File-backed mapping source. The file is read and parsed in full on
/// every lookup so operators can edit it without restarting the
/// service.
pub struct FileMappingSource {
    path: PathBuf,
}

impl FileMappingSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MappingSource for FileMappingSource {
    async fn resolve(&self, alert_id: &str) -> Result<Option<Vec<String>>, MappingError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to read mapping file {}: {}", self.path.display(), e);
                return Err(MappingError::Unavailable);
            }
        };

        let mapping: MappingFile =
            serde_yaml::from_str(&raw).map_err(|e| MappingError::Invalid(e.to_string()))?;

        Ok(mapping.commands_for(alert_id))
    }
}

/// In-memory mapping source for tests.
pub struct StaticMappingSource {
    commands: HashMap<String, Vec<String>>,
}

impl StaticMappingSource {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    pub fn with_command(mut self, alert_id: impl Into<String>, commands: Vec<String>) -> Self {
        self.commands.insert(alert_id.into(), commands);
        self
    }
}

impl Default for StaticMappingSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MappingSource for StaticMappingSource {
    async fn resolve(&self, alert_id: &str) -> Result<Option<Vec<String>>, MappingError> {
        Ok(self.commands.get(alert_id).cloned())
    }
}
